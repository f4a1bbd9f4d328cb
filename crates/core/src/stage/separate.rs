//! Music separation stage: splits each acquired track into stems.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::config::SeparateConfig;
use super::scan::discover_audio;
use super::traits::Stage;
use super::types::{Batch, Candidate, StageError};
use crate::config::ConfigError;
use crate::dispatcher::JobError;
use crate::tools::Separator;

pub const SEPARATE_STAGE: &str = "separate_music";

/// Runs the separator over every `{group}/{item}/*.wav` under the input root.
/// Stems for an item are written beneath `{out_path}/{group}/{item}/`.
pub struct SeparateMusicStage {
    in_path: PathBuf,
    out_path: PathBuf,
    concurrency: usize,
    timeout: Option<Duration>,
    separator: Arc<dyn Separator>,
}

impl SeparateMusicStage {
    pub fn new(config: SeparateConfig, separator: Arc<dyn Separator>) -> Result<Self, ConfigError> {
        if !config.in_path.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "separate_music in_path is not a directory: {}",
                config.in_path.display()
            )));
        }

        let out_path = config.out_path.unwrap_or_else(|| config.in_path.clone());
        std::fs::create_dir_all(&out_path).map_err(|e| {
            ConfigError::ValidationError(format!(
                "cannot create separate_music out_path {}: {}",
                out_path.display(),
                e
            ))
        })?;

        Ok(Self {
            in_path: config.in_path,
            out_path,
            concurrency: config.num_workers,
            timeout: config.timeout_secs.map(Duration::from_secs),
            separator,
        })
    }

    pub fn out_path(&self) -> &PathBuf {
        &self.out_path
    }
}

#[async_trait]
impl Stage for SeparateMusicStage {
    type Input = PathBuf;

    fn name(&self) -> &str {
        SEPARATE_STAGE
    }

    fn concurrency(&self) -> usize {
        self.concurrency
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn enumerate(&self) -> Result<Vec<Candidate<PathBuf>>, StageError> {
        discover_audio(&self.in_path)
    }

    async fn execute(&self, batch: &Batch<PathBuf>) -> Result<(), JobError> {
        for member in &batch.members {
            if !member.input.is_file() {
                return Err(JobError::InputMissing {
                    path: member.input.clone(),
                });
            }

            let out_dir = self
                .out_path
                .join(&member.key.group_id)
                .join(&member.key.item_id);
            tokio::fs::create_dir_all(&out_dir).await?;

            tracing::debug!(
                key = %member.key,
                separator = self.separator.name(),
                input = %member.input.display(),
                "Separating"
            );
            self.separator.separate(&member.input, &out_dir).await?;
        }
        Ok(())
    }
}
