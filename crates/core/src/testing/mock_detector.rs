//! Mock voice detector for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tools::{DetectionRequest, ToolError, VoiceDetector};

/// Mock implementation of the [`VoiceDetector`] trait.
///
/// Records each request together with the manifest contents at call time.
#[derive(Debug, Default)]
pub struct MockDetector {
    requests: Arc<RwLock<Vec<DetectionRequest>>>,
    manifests: Arc<RwLock<Vec<String>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every detection fail.
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Get all recorded detection requests.
    pub async fn recorded_requests(&self) -> Vec<DetectionRequest> {
        self.requests.read().await.clone()
    }

    /// Manifest contents read at each call, in call order.
    pub async fn recorded_manifests(&self) -> Vec<String> {
        self.manifests.read().await.clone()
    }
}

#[async_trait]
impl VoiceDetector for MockDetector {
    fn name(&self) -> &str {
        "mock"
    }

    async fn detect(&self, request: &DetectionRequest) -> Result<(), ToolError> {
        let manifest = tokio::fs::read_to_string(&request.manifest_path).await?;
        self.manifests.write().await.push(manifest);
        self.requests.write().await.push(request.clone());

        if *self.fail.read().await {
            return Err(ToolError::failed("mock", Some(2), None));
        }
        Ok(())
    }
}
