//! Demucs music separation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ToolError;
use super::process::run_tool;
use super::traits::Separator;

/// Runs the `demucs` CLI on one file at a time.
pub struct DemucsSeparator {
    tool: PathBuf,
    model: String,
    device: String,
}

impl DemucsSeparator {
    pub fn new(tool: impl Into<PathBuf>, model: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            model: model.into(),
            device: device.into(),
        }
    }

    fn args(&self, input: &Path, out_dir: &Path) -> Vec<String> {
        vec![
            "-d".to_string(),
            self.device.clone(),
            "-o".to_string(),
            out_dir.to_string_lossy().to_string(),
            "-n".to_string(),
            self.model.clone(),
            input.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl Separator for DemucsSeparator {
    fn name(&self) -> &str {
        "demucs"
    }

    async fn separate(&self, input: &Path, out_dir: &Path) -> Result<(), ToolError> {
        run_tool(&self.tool, &self.args(input, out_dir), |line| {
            tracing::trace!(tool = "demucs", "{}", line);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let separator = DemucsSeparator::new("demucs", "hdemucs_mmi", "cpu");
        let args = separator.args(Path::new("/in/ch/vid/a.wav"), Path::new("/out"));
        assert_eq!(
            args,
            vec!["-d", "cpu", "-o", "/out", "-n", "hdemucs_mmi", "/in/ch/vid/a.wav"]
        );
    }
}
