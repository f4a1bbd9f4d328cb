//! Types for the dispatcher module.

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::ledger::{ItemKey, LedgerError};

/// Errors a single job can fail with.
#[derive(Debug, Error)]
pub enum JobError {
    /// An external tool reported a failure.
    #[error("{tool} failed: {reason}")]
    Collaborator { tool: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The transfer returned without ever reporting that it finished.
    #[error("Transfer ended without a finished signal")]
    Unfinished,

    #[error("Input not found: {path}")]
    InputMissing { path: PathBuf },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    pub fn collaborator(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Collaborator {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

pub type JobFuture = BoxFuture<'static, Result<(), JobError>>;

type Job = Box<dyn FnOnce() -> JobFuture + Send>;

/// The dispatcher's unit of execution: an item identity and the job to run for it.
pub struct WorkItem {
    key: ItemKey,
    job: Job,
}

impl WorkItem {
    pub fn new<F, Fut>(key: ItemKey, job: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), JobError>> + Send + 'static,
    {
        Self {
            key,
            job: Box::new(move || -> JobFuture { Box::pin(job()) }),
        }
    }

    pub fn key(&self) -> &ItemKey {
        &self.key
    }

    pub(crate) fn into_parts(self) -> (ItemKey, Job) {
        (self.key, self.job)
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem")
            .field("key", &self.key)
            .field("job", &"FnOnce")
            .finish()
    }
}

/// A job that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub key: ItemKey,
    pub elapsed: Duration,
}

/// A job that failed.
#[derive(Debug)]
pub struct ItemFailure {
    pub key: ItemKey,
    pub error: JobError,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.error)
    }
}

pub type ItemResult = Result<ItemOutcome, ItemFailure>;
