use serde::{Deserialize, Serialize};

use crate::ledger::LedgerConfig;
use crate::stage::{AcquireConfig, SeparateConfig, VadConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Acquisition stage; omitted when only post-processing is wanted.
    #[serde(default)]
    pub acquire: Option<AcquireConfig>,
    /// Post-processing stages, run in order after acquisition.
    #[serde(default)]
    pub post_processors: Vec<PostProcessorConfig>,
}

/// A post-processing stage definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostProcessorConfig {
    VoiceActivity(VadConfig),
    SeparateMusic(SeparateConfig),
}

impl PostProcessorConfig {
    /// Ledger namespace of the configured stage.
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::VoiceActivity(_) => crate::stage::VAD_STAGE,
            Self::SeparateMusic(_) => crate::stage::SEPARATE_STAGE,
        }
    }
}
