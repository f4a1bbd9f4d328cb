//! Mock media source for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::tools::{FetchRequest, MediaSource, ToolError, TransferProgress};

/// Mock implementation of the [`MediaSource`] trait.
///
/// Provides controllable behavior for testing:
/// - Configure the item ids listed per channel
/// - Make individual items fail, hang, or return without finishing
/// - Track fetch requests for assertions
///
/// A successful fetch writes a small `.wav` file into the request's output
/// directory so downstream stages can discover it.
#[derive(Debug, Default)]
pub struct MockMediaSource {
    channels: Arc<RwLock<HashMap<String, Vec<String>>>>,
    failing_channels: Arc<RwLock<HashSet<String>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    hanging: Arc<RwLock<HashSet<String>>>,
    unfinished: Arc<RwLock<HashSet<String>>>,
    fetch_delay: Arc<RwLock<Duration>>,
    fetches: Arc<RwLock<Vec<FetchRequest>>>,
}

impl MockMediaSource {
    /// Create a new mock source with no channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the item ids listed for a channel.
    pub async fn set_channel(&self, channel: &str, ids: &[&str]) {
        self.channels.write().await.insert(
            channel.to_string(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
    }

    /// Make listing a channel fail.
    pub async fn fail_listing(&self, channel: &str) {
        self.failing_channels
            .write()
            .await
            .insert(channel.to_string());
    }

    /// Make fetching an item fail.
    pub async fn fail_item(&self, item_id: &str) {
        self.failing.write().await.insert(item_id.to_string());
    }

    /// Make fetching an item never return.
    pub async fn hang_item(&self, item_id: &str) {
        self.hanging.write().await.insert(item_id.to_string());
    }

    /// Make fetching an item return successfully without a finished signal.
    pub async fn set_unfinished(&self, item_id: &str) {
        self.unfinished.write().await.insert(item_id.to_string());
    }

    /// Set the simulated duration of every fetch.
    pub async fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.write().await = delay;
    }

    /// Get all recorded fetch requests, in call order.
    pub async fn recorded_fetches(&self) -> Vec<FetchRequest> {
        self.fetches.read().await.clone()
    }

    /// Item ids fetched so far, in call order.
    pub async fn fetched_ids(&self) -> Vec<String> {
        self.fetches
            .read()
            .await
            .iter()
            .map(|r| r.key.item_id.clone())
            .collect()
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_items(&self, group_id: &str) -> Result<Vec<String>, ToolError> {
        if self.failing_channels.read().await.contains(group_id) {
            return Err(ToolError::failed(
                "mock",
                Some(1),
                Some(format!("channel {} unavailable", group_id)),
            ));
        }
        Ok(self
            .channels
            .read()
            .await
            .get(group_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<(), ToolError> {
        self.fetches.write().await.push(request.clone());
        let item_id = request.key.item_id.as_str();

        let delay = *self.fetch_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.hanging.read().await.contains(item_id) {
            std::future::pending::<()>().await;
        }

        if self.failing.read().await.contains(item_id) {
            return Err(ToolError::failed(
                "mock",
                Some(1),
                Some(format!("ERROR: {} unavailable", item_id)),
            ));
        }

        progress(TransferProgress::Downloading { percent: 50.0 });

        let file = request
            .output_dir
            .join(format!("mock_{}.wav", item_id.replace('_', "-")));
        tokio::fs::write(&file, b"RIFF\0\0\0\0WAVE").await?;

        if self.unfinished.read().await.contains(item_id) {
            return Ok(());
        }

        progress(TransferProgress::Downloading { percent: 100.0 });
        progress(TransferProgress::Finished);
        Ok(())
    }
}
