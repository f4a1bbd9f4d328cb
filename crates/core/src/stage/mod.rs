//! Pipeline stages and the generic driver that runs them.

mod acquire;
mod config;
mod runner;
mod scan;
mod separate;
mod traits;
mod types;
mod vad;

pub use acquire::{AcquireStage, ACQUIRE_STAGE};
pub use config::{AcquireConfig, SeparateConfig, VadConfig};
pub use runner::StageRunner;
pub use scan::{discover_audio, key_from_path};
pub use separate::{SeparateMusicStage, SEPARATE_STAGE};
pub use traits::Stage;
pub use types::{Batch, Candidate, StageError, StageReport};
pub use vad::{ManifestEntry, VoiceActivityStage, VAD_STAGE};
