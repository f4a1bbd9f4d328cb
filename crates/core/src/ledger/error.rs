//! Error types for the ledger module.

use thiserror::Error;

/// Errors raised by a single ledger sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stage names become table names, so they are restricted to identifiers.
    #[error("Invalid stage name for ledger namespace: {0:?}")]
    InvalidStage(String),

    #[error("Sink is closed")]
    Closed,
}

impl From<rusqlite::Error> for SinkError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(e.to_string())
    }
}

/// A failure attributed to one named sink.
#[derive(Debug)]
pub struct SinkFailure {
    pub sink: String,
    pub error: SinkError,
}

/// Errors raised by the status ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// One or more sinks failed. Sinks not listed here received the event.
    #[error("{} ledger sink(s) failed: {}", .0.len(), describe(.0))]
    Sinks(Vec<SinkFailure>),

    #[error("Ledger is closed")]
    Closed,
}

impl LedgerError {
    pub(crate) fn single(sink: impl Into<String>, error: SinkError) -> Self {
        Self::Sinks(vec![SinkFailure {
            sink: sink.into(),
            error,
        }])
    }
}

fn describe(failures: &[SinkFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.sink, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}
