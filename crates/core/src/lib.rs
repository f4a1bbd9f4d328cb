pub mod config;
pub mod dispatcher;
pub mod ledger;
pub mod stage;
pub mod testing;
pub mod tools;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, PostProcessorConfig,
};
pub use dispatcher::{Dispatcher, ItemFailure, ItemOutcome, ItemResult, JobError, WorkItem};
pub use ledger::{ItemKey, ItemStatus, LedgerConfig, LedgerError, LedgerSink, StatusLedger};
pub use stage::{
    AcquireStage, SeparateMusicStage, Stage, StageError, StageReport, StageRunner,
    VoiceActivityStage,
};
pub use tools::{
    CommandDetector, DemucsSeparator, MediaSource, Separator, ToolError, VoiceDetector,
    YtDlpSource,
};
