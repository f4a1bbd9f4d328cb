//! Discovery of audio files laid out as `{root}/{group}/{item}/{file}.wav`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::types::{Candidate, StageError};
use crate::ledger::ItemKey;

const AUDIO_EXTENSION: &str = "wav";

/// Derives an item's identity from its file path: the parent directory is
/// the item, the grandparent is the group.
pub fn key_from_path(path: &Path) -> Option<ItemKey> {
    let item_dir = path.parent()?;
    let group_dir = item_dir.parent()?;
    let item_id = item_dir.file_name()?.to_str()?;
    let group_id = group_dir.file_name()?.to_str()?;
    Some(ItemKey::new(group_id, item_id))
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(AUDIO_EXTENSION))
        .unwrap_or(false)
}

/// Finds every `.wav` file exactly two directories below `root`, in path
/// order. When an item directory holds several files only the first one is
/// kept.
pub fn discover_audio(root: &Path) -> Result<Vec<Candidate<PathBuf>>, StageError> {
    if !root.is_dir() {
        return Err(StageError::Enumerate(format!(
            "Input directory not found: {}",
            root.display()
        )));
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| StageError::Enumerate(e.to_string()))?;
        if !entry.file_type().is_file() || !is_audio(entry.path()) {
            continue;
        }

        let Some(key) = key_from_path(entry.path()) else {
            tracing::debug!(path = %entry.path().display(), "Skipping file with non UTF-8 parents");
            continue;
        };

        if !seen.insert(key.clone()) {
            tracing::warn!(
                key = %key,
                path = %entry.path().display(),
                "Item already has an audio file, ignoring extra file"
            );
            continue;
        }

        candidates.push(Candidate::new(key, entry.into_path()));
    }

    tracing::debug!(root = %root.display(), count = candidates.len(), "Discovered audio files");
    Ok(candidates)
}
