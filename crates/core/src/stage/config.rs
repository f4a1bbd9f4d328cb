//! Configuration for the pipeline stages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::tools::VadParams;

/// Configuration for the acquisition stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Channels to acquire.
    #[serde(default)]
    pub channel_ids: Vec<String>,

    /// Optional file with one channel id per line, appended to `channel_ids`.
    #[serde(default)]
    pub channels_file: Option<PathBuf>,

    /// Root directory; items land in `{save_dir}/{channel}/{video}/`.
    pub save_dir: PathBuf,

    /// Maximum parallel downloads (0 = one worker per video).
    #[serde(default)]
    pub num_workers: usize,

    /// Extra arguments passed to the download tool.
    #[serde(default)]
    pub downloader_args: Vec<String>,

    /// Path to the download tool.
    #[serde(default = "default_downloader")]
    pub tool: PathBuf,

    /// Per-video timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Configuration for the music separation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparateConfig {
    /// Root of `{group}/{item}/*.wav` input files.
    pub in_path: PathBuf,

    /// Output root for separated stems (defaults to `in_path`).
    #[serde(default)]
    pub out_path: Option<PathBuf>,

    /// Maximum parallel separations (0 = one worker per file).
    #[serde(default)]
    pub num_workers: usize,

    /// Separation model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Device the model runs on.
    #[serde(default = "default_device")]
    pub device: String,

    /// Path to the separation tool.
    #[serde(default = "default_separator")]
    pub tool: PathBuf,

    /// Per-file timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Configuration for the voice-activity detection stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    /// Root of `{group}/{item}/*.wav` input files.
    pub in_path: PathBuf,

    /// Output root for detection results and manifests (defaults to `in_path`).
    #[serde(default)]
    pub out_path: Option<PathBuf>,

    /// Maximum parallel detector runs (0 = one worker per manifest).
    #[serde(default)]
    pub num_workers: usize,

    /// Batch size handed to the detector.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Files per manifest (0 = all pending files in one manifest).
    #[serde(default)]
    pub files_per_manifest: usize,

    /// Detection thresholds.
    #[serde(default)]
    pub vad: VadParams,

    /// Path to the detection tool.
    #[serde(default = "default_detector")]
    pub tool: PathBuf,

    /// Extra arguments passed to the detection tool.
    #[serde(default)]
    pub tool_args: Vec<String>,

    /// Per-manifest timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_downloader() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_separator() -> PathBuf {
    PathBuf::from("demucs")
}

fn default_detector() -> PathBuf {
    PathBuf::from("roar-vad")
}

fn default_model() -> String {
    "hdemucs_mmi".to_string()
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_batch_size() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_minimal() {
        let toml = r#"
            save_dir = "data/raw"
            channel_ids = ["UC1", "UC2"]
        "#;
        let config: AcquireConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.channel_ids, vec!["UC1", "UC2"]);
        assert_eq!(config.num_workers, 0);
        assert_eq!(config.tool, PathBuf::from("yt-dlp"));
        assert!(config.channels_file.is_none());
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_acquire_requires_save_dir() {
        let result: Result<AcquireConfig, _> = toml::from_str(r#"channel_ids = ["UC1"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_separate_defaults() {
        let config: SeparateConfig = toml::from_str(r#"in_path = "data/raw""#).unwrap();
        assert_eq!(config.model, "hdemucs_mmi");
        assert_eq!(config.device, "cpu");
        assert_eq!(config.tool, PathBuf::from("demucs"));
        assert!(config.out_path.is_none());
    }

    #[test]
    fn test_vad_defaults() {
        let config: VadConfig = toml::from_str(r#"in_path = "data/raw""#).unwrap();
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.files_per_manifest, 0);
        assert_eq!(config.vad, VadParams::default());
        assert_eq!(config.vad.onset, 0.8);
        assert_eq!(config.vad.offset, 0.6);
        assert_eq!(config.vad.pad_offset, -0.05);
    }

    #[test]
    fn test_vad_partial_params() {
        let toml = r#"
            in_path = "data/raw"
            batch_size = 8

            [vad]
            onset = 0.5
        "#;
        let config: VadConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.vad.onset, 0.5);
        assert_eq!(config.vad.offset, 0.6);
    }
}
