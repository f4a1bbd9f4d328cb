//! yt-dlp backed media source.

use async_trait::async_trait;
use regex_lite::Regex;
use std::path::PathBuf;

use super::error::ToolError;
use super::process::run_tool;
use super::traits::{FetchRequest, MediaSource, TransferProgress};

/// Lists and downloads YouTube channel audio through the `yt-dlp` binary.
pub struct YtDlpSource {
    tool: PathBuf,
    extra_args: Vec<String>,
}

impl YtDlpSource {
    pub fn new(tool: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            extra_args,
        }
    }

    pub fn channel_url(channel_id: &str) -> String {
        format!("https://youtube.com/channel/{}", channel_id)
    }

    pub fn video_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }

    fn list_args(&self, channel_id: &str) -> Vec<String> {
        vec![
            "--flat-playlist".to_string(),
            "--print".to_string(),
            "id".to_string(),
            "--no-warnings".to_string(),
            Self::channel_url(channel_id),
        ]
    }

    fn fetch_args(&self, request: &FetchRequest) -> Vec<String> {
        let mut args = vec![
            "--quiet".to_string(),
            "--progress".to_string(),
            "--newline".to_string(),
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "-x".to_string(),
            "--audio-format".to_string(),
            "wav".to_string(),
            "--audio-quality".to_string(),
            "192".to_string(),
            "-o".to_string(),
            request.output_template.clone(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(Self::video_url(&request.key.item_id));
        args
    }

    /// Extracts the percentage from a `[download]  42.5% of ...` line.
    pub fn parse_progress(re: &Regex, line: &str) -> Option<f32> {
        re.captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f32>().ok())
    }

    fn progress_regex() -> Option<Regex> {
        Regex::new(r"^\[download\]\s+(\d+(?:\.\d+)?)%").ok()
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn list_items(&self, group_id: &str) -> Result<Vec<String>, ToolError> {
        let mut ids = Vec::new();
        run_tool(&self.tool, &self.list_args(group_id), |line| {
            let id = line.trim();
            if !id.is_empty() {
                ids.push(id.to_string());
            }
        })
        .await?;

        tracing::debug!(channel = group_id, videos = ids.len(), "yt-dlp listing finished");
        Ok(ids)
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<(), ToolError> {
        let re = Self::progress_regex();

        run_tool(&self.tool, &self.fetch_args(request), |line| {
            if let Some(ref re) = re {
                if let Some(percent) = Self::parse_progress(re, line) {
                    progress(TransferProgress::Downloading { percent });
                }
            }
        })
        .await?;

        progress(TransferProgress::Finished);
        Ok(())
    }
}
