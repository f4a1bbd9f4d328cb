//! Error types for external tools.

use std::path::PathBuf;
use thiserror::Error;

use crate::dispatcher::JobError;

/// Errors that can occur while driving an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool binary not found.
    #[error("Tool not found at path: {path}")]
    NotFound { path: PathBuf },

    /// Tool ran but exited unsuccessfully.
    #[error("{tool} exited with code {code:?}")]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: Option<String>,
    },

    /// Tool output could not be interpreted.
    #[error("Failed to parse {tool} output: {reason}")]
    Parse { tool: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn failed(tool: impl Into<String>, code: Option<i32>, stderr: Option<String>) -> Self {
        Self::Failed {
            tool: tool.into(),
            code,
            stderr,
        }
    }

    fn tool_name(&self) -> String {
        match self {
            Self::NotFound { path } => path.display().to_string(),
            Self::Failed { tool, .. } | Self::Parse { tool, .. } => tool.clone(),
            Self::Io(_) => "tool".to_string(),
        }
    }
}

impl From<ToolError> for JobError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::Io(io) => JobError::Io(io),
            other => {
                let reason = match &other {
                    ToolError::Failed {
                        stderr: Some(stderr),
                        ..
                    } if !stderr.trim().is_empty() => format!("{}: {}", other, stderr.trim()),
                    _ => other.to_string(),
                };
                JobError::collaborator(other.tool_name(), reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_with_stderr_into_job_error() {
        let err = ToolError::failed("demucs", Some(2), Some("CUDA out of memory\n".to_string()));
        match JobError::from(err) {
            JobError::Collaborator { tool, reason } => {
                assert_eq!(tool, "demucs");
                assert_eq!(reason, "demucs exited with code Some(2): CUDA out of memory");
            }
            other => panic!("Expected collaborator error, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found_into_job_error() {
        let err = ToolError::NotFound {
            path: PathBuf::from("/usr/bin/yt-dlp"),
        };
        match JobError::from(err) {
            JobError::Collaborator { tool, reason } => {
                assert_eq!(tool, "/usr/bin/yt-dlp");
                assert!(reason.contains("Tool not found"));
            }
            other => panic!("Expected collaborator error, got {:?}", other),
        }
    }

    #[test]
    fn test_io_stays_io() {
        let err = ToolError::Io(std::io::Error::other("pipe closed"));
        assert!(matches!(JobError::from(err), JobError::Io(_)));
    }
}
