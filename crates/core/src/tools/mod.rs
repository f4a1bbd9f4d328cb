//! External collaborators driven by the pipeline stages.
//!
//! Each stage talks to its tool through a narrow trait ([`MediaSource`],
//! [`Separator`], [`VoiceDetector`]). The concrete implementations here run
//! the tools as subprocesses; mock implementations live in
//! [`crate::testing`].

mod demucs;
mod detector;
mod error;
mod process;
mod traits;
mod ytdlp;

pub use demucs::DemucsSeparator;
pub use detector::CommandDetector;
pub use error::ToolError;
pub use traits::{
    DetectionRequest, FetchRequest, MediaSource, Separator, TransferProgress, VadParams,
    VoiceDetector,
};
pub use ytdlp::YtDlpSource;
