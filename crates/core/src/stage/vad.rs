//! Voice-activity detection stage.
//!
//! Pending files are grouped into JSON-lines manifests and the detector is
//! run once per manifest.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::config::VadConfig;
use super::scan::discover_audio;
use super::traits::Stage;
use super::types::{Batch, Candidate, StageError};
use crate::config::ConfigError;
use crate::dispatcher::JobError;
use crate::ledger::ItemKey;
use crate::tools::{DetectionRequest, VadParams, VoiceDetector};

pub const VAD_STAGE: &str = "voice_activity_detect";

const MANIFEST_GROUP: &str = "manifest";
const MANIFEST_DIR: &str = "manifests";

/// One line of a detection manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub audio_filepath: PathBuf,
    pub offset: f64,
    pub duration: Option<f64>,
    pub text: String,
    pub label: String,
}

impl ManifestEntry {
    pub fn infer(path: &Path) -> Self {
        Self {
            audio_filepath: path.to_path_buf(),
            offset: 0.0,
            duration: None,
            text: "-".to_string(),
            label: "infer".to_string(),
        }
    }
}

pub struct VoiceActivityStage {
    in_path: PathBuf,
    out_path: PathBuf,
    concurrency: usize,
    batch_size: usize,
    files_per_manifest: usize,
    params: VadParams,
    timeout: Option<Duration>,
    detector: Arc<dyn VoiceDetector>,
}

impl VoiceActivityStage {
    pub fn new(config: VadConfig, detector: Arc<dyn VoiceDetector>) -> Result<Self, ConfigError> {
        if config.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "voice_activity batch_size must be greater than 0".to_string(),
            ));
        }
        if !config.in_path.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "voice_activity in_path is not a directory: {}",
                config.in_path.display()
            )));
        }

        let out_path = config.out_path.unwrap_or_else(|| config.in_path.clone());

        Ok(Self {
            in_path: config.in_path,
            out_path,
            concurrency: config.num_workers,
            batch_size: config.batch_size,
            files_per_manifest: config.files_per_manifest,
            params: config.vad,
            timeout: config.timeout_secs.map(Duration::from_secs),
            detector,
        })
    }

    fn manifest_path(&self, key: &ItemKey) -> PathBuf {
        self.out_path
            .join(MANIFEST_DIR)
            .join(format!("{}.json", key.item_id))
    }
}

fn write_manifest(path: &Path, members: &[Candidate<PathBuf>]) -> Result<(), JobError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    for member in members {
        let line = serde_json::to_string(&ManifestEntry::infer(&member.input))
            .map_err(std::io::Error::other)?;
        writeln!(file, "{}", line)?;
    }
    file.flush()?;
    Ok(())
}

#[async_trait]
impl Stage for VoiceActivityStage {
    type Input = PathBuf;

    fn name(&self) -> &str {
        VAD_STAGE
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

    fn plan(&self, candidates: Vec<Candidate<PathBuf>>) -> Vec<Batch<PathBuf>> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let chunk = match self.files_per_manifest {
            0 => candidates.len(),
            n => n,
        };

        let mut batches = Vec::new();
        let mut rest = candidates.into_iter().peekable();
        while rest.peek().is_some() {
            let members: Vec<_> = rest.by_ref().take(chunk).collect();
            batches.push(Batch {
                key: ItemKey::new(MANIFEST_GROUP, format!("{:05}", batches.len())),
                members,
            });
        }
        batches
    }

    async fn execute(&self, batch: &Batch<PathBuf>) -> Result<(), JobError> {
        let manifest_path = self.manifest_path(&batch.key);

        let path = manifest_path.clone();
        let members = batch.members.clone();
        tokio::task::spawn_blocking(move || write_manifest(&path, &members))
            .await
            .map_err(|e| JobError::Panicked(e.to_string()))??;

        tracing::debug!(
            manifest = %manifest_path.display(),
            files = batch.members.len(),
            detector = self.detector.name(),
            "Running voice activity detection"
        );

        let request = DetectionRequest {
            manifest_path,
            out_dir: self.out_path.clone(),
            batch_size: self.batch_size,
            params: self.params,
        };
        self.detector.detect(&request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDetector;
    use std::fs;
    use tempfile::TempDir;

    fn config(in_path: PathBuf, files_per_manifest: usize) -> VadConfig {
        VadConfig {
            in_path,
            out_path: None,
            num_workers: 1,
            batch_size: 4,
            files_per_manifest,
            vad: VadParams::default(),
            tool: PathBuf::from("roar-vad"),
            tool_args: Vec::new(),
            timeout_secs: None,
        }
    }

    fn candidates(n: usize) -> Vec<Candidate<PathBuf>> {
        (0..n)
            .map(|i| {
                Candidate::new(
                    ItemKey::new("chA", format!("v{}", i)),
                    PathBuf::from(format!("/data/chA/v{}/a.wav", i)),
                )
            })
            .collect()
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(dir.path().to_path_buf(), 0);
        cfg.batch_size = 0;
        let result = VoiceActivityStage::new(cfg, Arc::new(MockDetector::new()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_plan_single_manifest() {
        let dir = TempDir::new().unwrap();
        let stage = VoiceActivityStage::new(
            config(dir.path().to_path_buf(), 0),
            Arc::new(MockDetector::new()),
        )
        .unwrap();

        let batches = stage.plan(candidates(5));
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].key, ItemKey::new("manifest", "00000"));
        assert_eq!(batches[0].members.len(), 5);
    }

    #[test]
    fn test_plan_chunks() {
        let dir = TempDir::new().unwrap();
        let stage = VoiceActivityStage::new(
            config(dir.path().to_path_buf(), 2),
            Arc::new(MockDetector::new()),
        )
        .unwrap();

        let batches = stage.plan(candidates(5));
        let sizes: Vec<usize> = batches.iter().map(|b| b.members.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(batches[2].key, ItemKey::new("manifest", "00002"));
    }

    #[test]
    fn test_plan_empty() {
        let dir = TempDir::new().unwrap();
        let stage = VoiceActivityStage::new(
            config(dir.path().to_path_buf(), 0),
            Arc::new(MockDetector::new()),
        )
        .unwrap();
        assert!(stage.plan(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_execute_writes_manifest() {
        let dir = TempDir::new().unwrap();
        let detector = Arc::new(MockDetector::new());
        let stage =
            VoiceActivityStage::new(config(dir.path().to_path_buf(), 0), detector.clone())
                .unwrap();

        let batch = stage.plan(candidates(2)).remove(0);
        stage.execute(&batch).await.unwrap();

        let manifest = dir.path().join("manifests").join("00000.json");
        let contents = fs::read_to_string(&manifest).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["audio_filepath"], "/data/chA/v0/a.wav");
        assert_eq!(first["offset"], 0.0);
        assert!(first["duration"].is_null());
        assert_eq!(first["text"], "-");
        assert_eq!(first["label"], "infer");

        let requests = detector.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].manifest_path, manifest);
        assert_eq!(requests[0].out_dir, dir.path().to_path_buf());
        assert_eq!(requests[0].batch_size, 4);
    }

    #[tokio::test]
    async fn test_execute_detector_failure() {
        let dir = TempDir::new().unwrap();
        let detector = Arc::new(MockDetector::new());
        detector.set_fail(true).await;
        let stage =
            VoiceActivityStage::new(config(dir.path().to_path_buf(), 0), detector.clone())
                .unwrap();

        let batch = stage.plan(candidates(1)).remove(0);
        let result = stage.execute(&batch).await;
        assert!(matches!(result, Err(JobError::Collaborator { .. })));
    }
}
