//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the ledger sink and external
//! tool traits, so stages can be driven end to end without `yt-dlp`,
//! `demucs` or a detection model installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use roar_core::testing::MockMediaSource;
//!
//! let source = MockMediaSource::new();
//! source.set_channel("UC1", &["vid1", "vid2"]).await;
//! source.fail_item("vid2").await;
//! ```

mod mock_detector;
mod mock_separator;
mod mock_sink;
mod mock_source;

pub use mock_detector::MockDetector;
pub use mock_separator::MockSeparator;
pub use mock_sink::{RecordingSink, SharedBuffer};
pub use mock_source::MockMediaSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io;
    use std::path::{Path, PathBuf};

    /// Writes a placeholder audio file at `{root}/{group}/{item}/{name}`.
    pub fn audio_file(root: &Path, group: &str, item: &str, name: &str) -> io::Result<PathBuf> {
        let dir = root.join(group).join(item);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(name);
        std::fs::write(&path, b"RIFF\0\0\0\0WAVE")?;
        Ok(path)
    }

    /// Lays out `count` items `v01..` under one group, one wav file each.
    pub fn audio_tree(root: &Path, group: &str, count: usize) -> io::Result<Vec<PathBuf>> {
        (1..=count)
            .map(|i| {
                let item = format!("v{:02}", i);
                audio_file(root, group, &item, &format!("track_{}.wav", item))
            })
            .collect()
    }
}
