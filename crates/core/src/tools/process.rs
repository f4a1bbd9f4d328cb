//! Subprocess plumbing shared by the tool implementations.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::error::ToolError;

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Runs `program` to completion, handing each stdout line to `on_line`.
///
/// The child is killed if the returned future is dropped, so callers can
/// bound it with `tokio::time::timeout`.
pub(crate) async fn run_tool<F>(program: &Path, args: &[String], mut on_line: F) -> Result<(), ToolError>
where
    F: FnMut(&str) + Send,
{
    let tool = program.display().to_string();
    tracing::debug!(tool = %tool, ?args, "Running tool");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound {
                    path: program.to_path_buf(),
                }
            } else {
                ToolError::Io(e)
            }
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ToolError::Io(std::io::Error::other("stdout not captured")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ToolError::Io(std::io::Error::other("stderr not captured")))?;

    let stderr_task = tokio::spawn(async move {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail.into_iter().collect::<Vec<_>>().join("\n")
    });

    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines.next_line().await? {
        on_line(&line);
    }

    let status = child.wait().await?;
    let stderr_tail = stderr_task.await.unwrap_or_default();

    if status.success() {
        Ok(())
    } else {
        Err(ToolError::failed(
            tool,
            status.code(),
            if stderr_tail.is_empty() {
                None
            } else {
                Some(stderr_tail)
            },
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_collects_stdout_lines() {
        let mut lines = Vec::new();
        run_tool(
            Path::new("sh"),
            &["-c".to_string(), "echo one; echo two".to_string()],
            |line| lines.push(line.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let result = run_tool(
            Path::new("sh"),
            &["-c".to_string(), "echo bad input >&2; exit 3".to_string()],
            |_| {},
        )
        .await;

        match result {
            Err(ToolError::Failed { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.as_deref(), Some("bad input"));
            }
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let program = PathBuf::from("/nonexistent/roar-test-tool");
        let result = run_tool(&program, &[], |_| {}).await;
        assert!(matches!(result, Err(ToolError::NotFound { .. })));
    }
}
