//! Resumable status ledger.
//!
//! The ledger records, per stage and per item, whether the item's job has
//! completed. Every event is fanned out to an ordered list of sinks; the first
//! durable sink is the source of truth used to skip finished work on rerun.

mod config;
mod console;
mod error;
mod sink;
mod sqlite;
mod status_ledger;
mod types;

pub use config::{ConsoleStream, LedgerConfig, SinkConfig};
pub use console::{ConsoleSink, TracingSink};
pub use error::{LedgerError, SinkError, SinkFailure};
pub use sink::{is_valid_stage_name, LedgerSink};
pub use sqlite::SqliteSink;
pub use status_ledger::StatusLedger;
pub use types::{ItemKey, ItemStatus, StatusRecord};
