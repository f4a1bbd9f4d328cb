//! Types for the stage module.

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::dispatcher::ItemFailure;
use crate::ledger::{ItemKey, LedgerError};
use crate::tools::ToolError;

/// Errors that abort a stage run.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Failed to enumerate items: {0}")]
    Enumerate(String),

    /// The run was stopped before every work item finished.
    #[error("Stage run interrupted")]
    Interrupted,
}

impl From<ToolError> for StageError {
    fn from(e: ToolError) -> Self {
        Self::Enumerate(e.to_string())
    }
}

/// An item discovered by a stage, with the stage-specific input it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<I> {
    pub key: ItemKey,
    pub input: I,
}

impl<I> Candidate<I> {
    pub fn new(key: ItemKey, input: I) -> Self {
        Self { key, input }
    }
}

/// One dispatchable unit of a stage: one or more candidates run together.
#[derive(Debug, Clone)]
pub struct Batch<I> {
    /// Identity reported by the dispatcher.
    pub key: ItemKey,
    pub members: Vec<Candidate<I>>,
}

impl<I> Batch<I> {
    /// A batch holding exactly one candidate, identified by it.
    pub fn single(candidate: Candidate<I>) -> Self {
        Self {
            key: candidate.key.clone(),
            members: vec![candidate],
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.members.iter().map(|m| &m.key)
    }
}

/// Summary of one stage run.
#[derive(Debug)]
pub struct StageReport {
    pub stage: String,
    pub run_id: Uuid,
    /// Items discovered by enumeration.
    pub enumerated: usize,
    /// Items skipped because the ledger already marks them complete.
    pub skipped: usize,
    /// Work items handed to the dispatcher.
    pub dispatched: usize,
    /// Work items that succeeded.
    pub succeeded: usize,
    pub failures: Vec<ItemFailure>,
    pub elapsed: Duration,
}

impl StageReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
