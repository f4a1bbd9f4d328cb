use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{
    ConsoleSink, ConsoleStream, ItemKey, ItemStatus, LedgerConfig, LedgerError, LedgerSink,
    SinkConfig, SinkFailure, SqliteSink, StatusRecord, TracingSink,
};

/// Per-item, per-stage completion record fanned out to a list of sinks.
///
/// The first durable sink (in configured order) answers completion queries.
/// Sinks are written in order; a failing sink does not stop delivery to the
/// ones after it.
pub struct StatusLedger {
    sinks: Vec<Arc<dyn LedgerSink>>,
    closed: AtomicBool,
}

impl StatusLedger {
    pub fn new(sinks: Vec<Arc<dyn LedgerSink>>) -> Self {
        if !sinks.iter().any(|s| s.is_durable()) {
            tracing::warn!("No durable ledger sink configured; completed items will not be skipped on rerun");
        }
        Self {
            sinks,
            closed: AtomicBool::new(false),
        }
    }

    /// Build a ledger from configuration, opening every sink.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let mut sinks: Vec<Arc<dyn LedgerSink>> = Vec::with_capacity(config.sinks.len());

        for sink_config in &config.sinks {
            match sink_config {
                SinkConfig::Sqlite { path } => {
                    let sink = SqliteSink::open(path)
                        .map_err(|e| LedgerError::single(format!("sqlite:{}", path.display()), e))?;
                    tracing::info!(path = %path.display(), "Opened SQLite ledger sink");
                    sinks.push(Arc::new(sink));
                }
                SinkConfig::Console { stream } => {
                    let sink = match stream {
                        ConsoleStream::Stdout => ConsoleSink::stdout(),
                        ConsoleStream::Stderr => ConsoleSink::stderr(),
                    };
                    sinks.push(Arc::new(sink));
                }
                SinkConfig::Tracing => sinks.push(Arc::new(TracingSink)),
            }
        }

        Ok(Self::new(sinks))
    }

    pub fn sinks(&self) -> &[Arc<dyn LedgerSink>] {
        &self.sinks
    }

    pub fn has_durable_sink(&self) -> bool {
        self.sinks.iter().any(|s| s.is_durable())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Upsert the status of `key` for `stage` in every sink.
    pub fn log(&self, key: &ItemKey, stage: &str, complete: bool) -> Result<(), LedgerError> {
        if self.is_closed() {
            return Err(LedgerError::Closed);
        }

        let record = StatusRecord::new(stage, key, complete);
        let mut failures = Vec::new();

        for sink in &self.sinks {
            if let Err(error) = sink.write(&record) {
                tracing::error!(sink = sink.name(), key = %key, stage, "Ledger write failed: {}", error);
                failures.push(SinkFailure {
                    sink: sink.name().to_string(),
                    error,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Sinks(failures))
        }
    }

    /// Lifecycle state of `key` within `stage`.
    pub fn status(&self, key: &ItemKey, stage: &str) -> Result<ItemStatus, LedgerError> {
        if self.is_closed() {
            return Err(LedgerError::Closed);
        }

        let Some(sink) = self.sinks.iter().find(|s| s.is_durable()) else {
            return Ok(ItemStatus::Unseen);
        };

        let record = sink
            .lookup(stage, key)
            .map_err(|e| LedgerError::single(sink.name(), e))?;
        Ok(ItemStatus::from_record(record.as_ref()))
    }

    /// Whether `key` has been logged complete for `stage`.
    pub fn is_complete(&self, key: &ItemKey, stage: &str) -> Result<bool, LedgerError> {
        Ok(self.status(key, stage)?.is_complete())
    }

    /// Close every sink. Only the first call does anything.
    pub fn close(&self) -> Result<(), LedgerError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(LedgerError::Closed);
        }

        let failures: Vec<SinkFailure> = self
            .sinks
            .iter()
            .filter_map(|sink| {
                sink.close().err().map(|error| SinkFailure {
                    sink: sink.name().to_string(),
                    error,
                })
            })
            .collect();

        if failures.is_empty() {
            tracing::debug!(sinks = self.sinks.len(), "Ledger closed");
            Ok(())
        } else {
            Err(LedgerError::Sinks(failures))
        }
    }
}

impl Drop for StatusLedger {
    fn drop(&mut self) {
        if !self.is_closed() {
            tracing::warn!("Status ledger dropped without being closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::SinkError;
    use crate::testing::{RecordingSink, SharedBuffer};
    use tokio_test::assert_ok;

    fn sqlite_and_console() -> (Arc<SqliteSink>, SharedBuffer, StatusLedger) {
        let sqlite = Arc::new(SqliteSink::in_memory().unwrap());
        let buffer = SharedBuffer::new();
        let console = Arc::new(ConsoleSink::from_writer("console", buffer.clone()));
        let ledger = StatusLedger::new(vec![
            Arc::clone(&sqlite) as Arc<dyn LedgerSink>,
            console as Arc<dyn LedgerSink>,
        ]);
        (sqlite, buffer, ledger)
    }

    #[test]
    fn test_fan_out_to_durable_and_transient_sinks() {
        let (sqlite, buffer, ledger) = sqlite_and_console();
        let key = ItemKey::new("chA", "vid1");

        assert_ok!(ledger.log(&key, "acquire", true));

        assert_eq!(sqlite.records("acquire").unwrap().len(), 1);
        assert_eq!(buffer.lines().len(), 1);
        assert_ok!(ledger.close());
    }

    #[test]
    fn test_repeated_logging_keeps_last_value() {
        let (sqlite, _buffer, ledger) = sqlite_and_console();
        let key = ItemKey::new("chA", "vid1");

        for complete in [false, true, true, false, true] {
            assert_ok!(ledger.log(&key, "acquire", complete));
        }

        let records = sqlite.records("acquire").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].complete);
        assert_ok!(ledger.close());
    }

    #[test]
    fn test_status_transitions() {
        let (_sqlite, _buffer, ledger) = sqlite_and_console();
        let key = ItemKey::new("chA", "vid1");

        assert_eq!(ledger.status(&key, "acquire").unwrap(), ItemStatus::Unseen);
        assert!(!ledger.is_complete(&key, "acquire").unwrap());

        ledger.log(&key, "acquire", false).unwrap();
        assert_eq!(ledger.status(&key, "acquire").unwrap(), ItemStatus::Pending);
        assert!(!ledger.is_complete(&key, "acquire").unwrap());

        ledger.log(&key, "acquire", true).unwrap();
        assert_eq!(ledger.status(&key, "acquire").unwrap(), ItemStatus::Complete);
        assert!(ledger.is_complete(&key, "acquire").unwrap());

        // Completion is per stage.
        assert!(!ledger.is_complete(&key, "separate_music").unwrap());
        ledger.close().unwrap();
    }

    #[test]
    fn test_failed_sink_does_not_block_later_sinks() {
        let failing = Arc::new(RecordingSink::failing());
        let healthy = Arc::new(RecordingSink::new());
        let ledger = StatusLedger::new(vec![
            Arc::clone(&failing) as Arc<dyn LedgerSink>,
            Arc::clone(&healthy) as Arc<dyn LedgerSink>,
        ]);

        let result = ledger.log(&ItemKey::new("g", "i"), "acquire", true);

        match result {
            Err(LedgerError::Sinks(failures)) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].sink, "recording-failing");
                assert!(matches!(failures[0].error, SinkError::Database(_)));
            }
            other => panic!("Expected sink failure, got {:?}", other),
        }
        assert_eq!(healthy.records().len(), 1);
        ledger.close().unwrap();
    }

    #[test]
    fn test_close_only_once() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = StatusLedger::new(vec![Arc::clone(&sink) as Arc<dyn LedgerSink>]);

        assert_ok!(ledger.close());
        assert!(matches!(ledger.close(), Err(LedgerError::Closed)));
        assert_eq!(sink.close_count(), 1);
    }

    #[test]
    fn test_log_after_close_fails() {
        let (_sqlite, buffer, ledger) = sqlite_and_console();
        ledger.close().unwrap();

        let result = ledger.log(&ItemKey::new("g", "i"), "acquire", true);
        assert!(matches!(result, Err(LedgerError::Closed)));
        assert!(matches!(
            ledger.is_complete(&ItemKey::new("g", "i"), "acquire"),
            Err(LedgerError::Closed)
        ));
        assert!(buffer.lines().is_empty());
    }

    #[test]
    fn test_close_reports_failures_but_closes_all() {
        let failing = Arc::new(RecordingSink::failing());
        let healthy = Arc::new(RecordingSink::new());
        let ledger = StatusLedger::new(vec![
            Arc::clone(&failing) as Arc<dyn LedgerSink>,
            Arc::clone(&healthy) as Arc<dyn LedgerSink>,
        ]);

        assert!(matches!(ledger.close(), Err(LedgerError::Sinks(_))));
        assert_eq!(failing.close_count(), 1);
        assert_eq!(healthy.close_count(), 1);
    }

    #[test]
    fn test_without_durable_sink_nothing_is_complete() {
        let sink = Arc::new(RecordingSink::new());
        let ledger = StatusLedger::new(vec![sink as Arc<dyn LedgerSink>]);
        let key = ItemKey::new("g", "i");

        assert!(!ledger.has_durable_sink());
        ledger.log(&key, "acquire", true).unwrap();
        assert!(!ledger.is_complete(&key, "acquire").unwrap());
        ledger.close().unwrap();
    }

    #[test]
    fn test_empty_sink_list() {
        let ledger = StatusLedger::new(Vec::new());
        assert_ok!(ledger.log(&ItemKey::new("g", "i"), "acquire", true));
        assert_ok!(ledger.close());
    }

    #[test]
    fn test_first_durable_sink_answers_queries() {
        let primary = Arc::new(RecordingSink::durable());
        let secondary = Arc::new(RecordingSink::durable());
        let ledger = StatusLedger::new(vec![
            Arc::clone(&primary) as Arc<dyn LedgerSink>,
            Arc::clone(&secondary) as Arc<dyn LedgerSink>,
        ]);
        let key = ItemKey::new("g", "i");

        secondary
            .write(&StatusRecord::new("acquire", &key, true))
            .unwrap();
        assert!(!ledger.is_complete(&key, "acquire").unwrap());

        primary.write(&StatusRecord::new("acquire", &key, true)).unwrap();
        assert!(ledger.is_complete(&key, "acquire").unwrap());
        ledger.close().unwrap();
    }

    #[test]
    fn test_from_config_opens_sqlite_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("logs").join("status.db");
        let config = LedgerConfig {
            sinks: vec![SinkConfig::Sqlite {
                path: db_path.clone(),
            }, SinkConfig::Tracing],
        };

        let ledger = StatusLedger::from_config(&config).unwrap();
        assert_eq!(ledger.sinks().len(), 2);
        assert!(ledger.has_durable_sink());

        let key = ItemKey::new("chA", "vid1");
        ledger.log(&key, "acquire", true).unwrap();
        ledger.close().unwrap();

        // A second ledger on the same file sees the completion.
        let reopened = StatusLedger::from_config(&config).unwrap();
        assert!(reopened.is_complete(&key, "acquire").unwrap());
        reopened.close().unwrap();
        assert!(db_path.exists());
    }
}
