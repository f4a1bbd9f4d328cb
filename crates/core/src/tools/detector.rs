//! Command-line voice-activity detector.

use async_trait::async_trait;
use std::path::PathBuf;

use super::error::ToolError;
use super::process::run_tool;
use super::traits::{DetectionRequest, VoiceDetector};

/// Invokes a detection script with a manifest and the VAD thresholds.
pub struct CommandDetector {
    tool: PathBuf,
    extra_args: Vec<String>,
}

impl CommandDetector {
    pub fn new(tool: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            extra_args,
        }
    }

    fn args(&self, request: &DetectionRequest) -> Vec<String> {
        let mut args = vec![
            "--manifest".to_string(),
            request.manifest_path.to_string_lossy().to_string(),
            "--out-dir".to_string(),
            request.out_dir.to_string_lossy().to_string(),
            "--batch-size".to_string(),
            request.batch_size.to_string(),
            "--onset".to_string(),
            request.params.onset.to_string(),
            "--offset".to_string(),
            request.params.offset.to_string(),
            "--pad-offset".to_string(),
            request.params.pad_offset.to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[async_trait]
impl VoiceDetector for CommandDetector {
    fn name(&self) -> &str {
        "vad-command"
    }

    async fn detect(&self, request: &DetectionRequest) -> Result<(), ToolError> {
        run_tool(&self.tool, &self.args(request), |line| {
            tracing::trace!(tool = "vad", "{}", line);
        })
        .await
    }
}
