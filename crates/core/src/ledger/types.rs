//! Types for the status ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a single dispatchable item: the group it belongs to (e.g. a
/// channel) and the item itself (e.g. a video).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub group_id: String,
    pub item_id: String,
}

impl ItemKey {
    pub fn new(group_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            item_id: item_id.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_id, self.item_id)
    }
}

/// One status event for an item within a stage.
///
/// Sinks keep at most one record per `(stage, group_id, item_id)`; a later
/// record for the same key replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub stage: String,
    pub group_id: String,
    pub item_id: String,
    pub complete: bool,
    pub timestamp: DateTime<Utc>,
}

impl StatusRecord {
    /// Creates a record stamped with the current time.
    pub fn new(stage: impl Into<String>, key: &ItemKey, complete: bool) -> Self {
        Self {
            stage: stage.into(),
            group_id: key.group_id.clone(),
            item_id: key.item_id.clone(),
            complete,
            timestamp: Utc::now(),
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(&self.group_id, &self.item_id)
    }

    pub fn status_label(&self) -> &'static str {
        if self.complete {
            "complete"
        } else {
            "pending"
        }
    }
}

/// Where an item is in its per-stage lifecycle.
///
/// `Unseen` and `Pending` both count as "not complete": an item left pending
/// by a crashed run is attempted again on the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Unseen,
    Pending,
    Complete,
}

impl ItemStatus {
    pub fn from_record(record: Option<&StatusRecord>) -> Self {
        match record {
            None => Self::Unseen,
            Some(r) if r.complete => Self::Complete,
            Some(_) => Self::Pending,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_display() {
        let key = ItemKey::new("chA", "vid1");
        assert_eq!(key.to_string(), "chA/vid1");
    }

    #[test]
    fn test_record_carries_key() {
        let key = ItemKey::new("chA", "vid1");
        let record = StatusRecord::new("acquire", &key, false);
        assert_eq!(record.key(), key);
        assert_eq!(record.stage, "acquire");
        assert_eq!(record.status_label(), "pending");
    }

    #[test]
    fn test_status_from_record() {
        let key = ItemKey::new("g", "i");
        assert_eq!(ItemStatus::from_record(None), ItemStatus::Unseen);

        let pending = StatusRecord::new("s", &key, false);
        assert_eq!(ItemStatus::from_record(Some(&pending)), ItemStatus::Pending);
        assert!(!ItemStatus::Pending.is_complete());

        let complete = StatusRecord::new("s", &key, true);
        assert_eq!(ItemStatus::from_record(Some(&complete)), ItemStatus::Complete);
        assert!(ItemStatus::Complete.is_complete());
    }
}
