//! Trait definitions for the external collaborators driven by each stage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ToolError;
use crate::ledger::ItemKey;

/// Progress reported by a media source while transferring one item.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferProgress {
    Downloading { percent: f32 },
    /// Terminal signal: the item's files are in place.
    Finished,
}

/// A request to fetch one remote item.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub key: ItemKey,
    /// Directory the item's files land in: `{save_dir}/{group}/{item}`.
    pub output_dir: PathBuf,
    /// Output filename template understood by the download tool.
    pub output_template: String,
}

/// Remote source of items grouped by a parent collection (e.g. a channel).
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Returns the name of this source implementation.
    fn name(&self) -> &str;

    /// Lists the item ids belonging to a group.
    async fn list_items(&self, group_id: &str) -> Result<Vec<String>, ToolError>;

    /// Transfers one item. Implementations must call `progress` with
    /// [`TransferProgress::Finished`] once the item has been fully written.
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: &(dyn Fn(TransferProgress) + Send + Sync),
    ) -> Result<(), ToolError>;
}

/// Separates an audio file into stems beneath an output root.
#[async_trait]
pub trait Separator: Send + Sync {
    fn name(&self) -> &str;

    async fn separate(&self, input: &Path, out_dir: &Path) -> Result<(), ToolError>;
}

/// Voice-activity detection thresholds handed to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VadParams {
    #[serde(default = "default_onset")]
    pub onset: f32,
    #[serde(default = "default_offset")]
    pub offset: f32,
    #[serde(default = "default_pad_offset")]
    pub pad_offset: f32,
}

impl Default for VadParams {
    fn default() -> Self {
        Self {
            onset: default_onset(),
            offset: default_offset(),
            pad_offset: default_pad_offset(),
        }
    }
}

fn default_onset() -> f32 {
    0.8
}

fn default_offset() -> f32 {
    0.6
}

fn default_pad_offset() -> f32 {
    -0.05
}

/// A detection run over one manifest.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    pub manifest_path: PathBuf,
    pub out_dir: PathBuf,
    pub batch_size: usize,
    pub params: VadParams,
}

/// Runs voice-activity detection over a manifest of audio files.
#[async_trait]
pub trait VoiceDetector: Send + Sync {
    fn name(&self) -> &str;

    async fn detect(&self, request: &DetectionRequest) -> Result<(), ToolError>;
}
