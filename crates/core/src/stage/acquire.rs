//! Acquisition stage: fetches every video of the configured channels.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::config::AcquireConfig;
use super::traits::Stage;
use super::types::{Batch, Candidate, StageError};
use crate::config::ConfigError;
use crate::dispatcher::JobError;
use crate::ledger::ItemKey;
use crate::tools::{FetchRequest, MediaSource, TransferProgress};

pub const ACQUIRE_STAGE: &str = "acquire";

/// Downloads `{save_dir}/{channel}/{video}/` for every listed video.
pub struct AcquireStage {
    channels: Vec<String>,
    save_dir: PathBuf,
    concurrency: usize,
    timeout: Option<Duration>,
    source: Arc<dyn MediaSource>,
}

impl AcquireStage {
    /// Builds the stage, merging `channel_ids` with the lines of `channels_file`.
    pub fn new(config: AcquireConfig, source: Arc<dyn MediaSource>) -> Result<Self, ConfigError> {
        let mut channels = config.channel_ids;

        if let Some(path) = &config.channels_file {
            let contents = std::fs::read_to_string(path)
                .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
            channels.extend(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from),
            );
        }

        let mut seen = HashSet::new();
        channels.retain(|c| seen.insert(c.clone()));

        if channels.is_empty() {
            return Err(ConfigError::ValidationError(
                "acquire requires at least one channel".to_string(),
            ));
        }

        Ok(Self {
            channels,
            save_dir: config.save_dir,
            concurrency: config.num_workers,
            timeout: config.timeout_secs.map(Duration::from_secs),
            source,
        })
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    fn output_template(&self, key: &ItemKey) -> String {
        let dir = self.save_dir.join(&key.group_id).join(&key.item_id);
        format!(
            "{}/%(title)s_{}.%(ext)s",
            dir.display(),
            key.item_id.replace('_', "-")
        )
    }
}

#[async_trait]
impl Stage for AcquireStage {
    type Input = ();

    fn name(&self) -> &str {
        ACQUIRE_STAGE
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn enumerate(&self) -> Result<Vec<Candidate<()>>, StageError> {
        let mut candidates = Vec::new();

        for channel in &self.channels {
            let ids = self.source.list_items(channel).await?;
            tracing::info!(channel = %channel, videos = ids.len(), "Listed channel");

            let mut seen = HashSet::new();
            for id in ids {
                if seen.insert(id.clone()) {
                    candidates.push(Candidate::new(ItemKey::new(channel.as_str(), id), ()));
                }
            }
        }

        Ok(candidates)
    }

    async fn execute(&self, batch: &Batch<()>) -> Result<(), JobError> {
        for member in &batch.members {
            let key = &member.key;
            let output_dir = self.save_dir.join(&key.group_id).join(&key.item_id);
            tokio::fs::create_dir_all(&output_dir).await?;

            let request = FetchRequest {
                key: key.clone(),
                output_template: self.output_template(key),
                output_dir,
            };

            let finished = AtomicBool::new(false);
            let on_progress = |progress: TransferProgress| match progress {
                TransferProgress::Downloading { percent } => {
                    tracing::trace!(key = %request.key, percent, "Downloading");
                }
                TransferProgress::Finished => finished.store(true, Ordering::SeqCst),
            };

            self.source.fetch(&request, &on_progress).await?;

            if !finished.load(Ordering::SeqCst) {
                return Err(JobError::Unfinished);
            }
            tracing::debug!(key = %key, "Download finished");
        }
        Ok(())
    }
}
