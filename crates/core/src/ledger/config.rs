//! Configuration for the status ledger.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration: the ordered list of sinks every event is written to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_sinks")]
    pub sinks: Vec<SinkConfig>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            sinks: default_sinks(),
        }
    }
}

/// A single sink definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Durable SQLite store; required for resuming runs.
    Sqlite {
        #[serde(default = "default_db_path")]
        path: PathBuf,
    },
    /// One line per event on stdout or stderr.
    Console {
        #[serde(default)]
        stream: ConsoleStream,
    },
    /// Structured `tracing` events.
    Tracing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleStream {
    Stdout,
    #[default]
    Stderr,
}

fn default_sinks() -> Vec<SinkConfig> {
    vec![
        SinkConfig::Sqlite {
            path: default_db_path(),
        },
        SinkConfig::Console {
            stream: ConsoleStream::default(),
        },
    ]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("roar.db")
}
