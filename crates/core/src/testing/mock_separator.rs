//! Mock separator for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tools::{Separator, ToolError};

/// Mock implementation of the [`Separator`] trait.
///
/// Records `(input, out_dir)` pairs and writes a `vocals.wav` stem into the
/// output directory. Inputs whose item directory is in the failing set are
/// rejected.
#[derive(Debug, Default)]
pub struct MockSeparator {
    calls: Arc<RwLock<Vec<(PathBuf, PathBuf)>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MockSeparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make separating any input whose parent directory is `item_id` fail.
    pub async fn fail_item(&self, item_id: &str) {
        self.failing.write().await.insert(item_id.to_string());
    }

    /// Get all recorded `(input, out_dir)` calls.
    pub async fn recorded_calls(&self) -> Vec<(PathBuf, PathBuf)> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl Separator for MockSeparator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn separate(&self, input: &Path, out_dir: &Path) -> Result<(), ToolError> {
        self.calls
            .write()
            .await
            .push((input.to_path_buf(), out_dir.to_path_buf()));

        let item_id = input
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if self.failing.read().await.contains(item_id) {
            return Err(ToolError::failed(
                "mock",
                Some(1),
                Some(format!("cannot separate {}", input.display())),
            ));
        }

        tokio::fs::write(out_dir.join("vocals.wav"), b"RIFF").await?;
        Ok(())
    }
}
