use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use super::{LedgerSink, SinkError, StatusRecord};

type Stream = Box<dyn Write + Send>;

/// Transient sink writing one human-readable line per event to a stream.
pub struct ConsoleSink {
    name: String,
    out: Mutex<Option<Stream>>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::from_writer("console:stdout", std::io::stdout())
    }

    pub fn stderr() -> Self {
        Self::from_writer("console:stderr", std::io::stderr())
    }

    /// Create a console sink over an arbitrary writer.
    pub fn from_writer(name: impl Into<String>, writer: impl Write + Send + 'static) -> Self {
        Self {
            name: name.into(),
            out: Mutex::new(Some(Box::new(writer))),
        }
    }

    pub fn format_line(record: &StatusRecord) -> String {
        format!(
            "{} - {} - status: {}, group: {}, item: {}",
            record.timestamp.to_rfc3339(),
            record.stage,
            record.status_label(),
            record.group_id,
            record.item_id
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Stream>>, SinkError> {
        self.out
            .lock()
            .map_err(|_| SinkError::Io(std::io::Error::other("console lock poisoned")))
    }
}

impl LedgerSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: &StatusRecord) -> Result<(), SinkError> {
        let mut out = self.lock()?;
        let stream = out.as_mut().ok_or(SinkError::Closed)?;
        writeln!(stream, "{}", Self::format_line(record))?;
        stream.flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        let mut out = self.lock()?;
        let mut stream = out.take().ok_or(SinkError::Closed)?;
        stream.flush()?;
        Ok(())
    }
}

/// Transient sink that forwards events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl LedgerSink for TracingSink {
    fn name(&self) -> &str {
        "tracing"
    }

    fn write(&self, record: &StatusRecord) -> Result<(), SinkError> {
        tracing::info!(
            stage = %record.stage,
            group_id = %record.group_id,
            item_id = %record.item_id,
            complete = record.complete,
            "Item status"
        );
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ItemKey;
    use crate::testing::SharedBuffer;

    #[test]
    fn test_writes_one_line_per_event() {
        let buffer = SharedBuffer::new();
        let sink = ConsoleSink::from_writer("test", buffer.clone());
        let key = ItemKey::new("chA", "vid1");

        sink.write(&StatusRecord::new("acquire", &key, false)).unwrap();
        sink.write(&StatusRecord::new("acquire", &key, true)).unwrap();

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("acquire - status: pending, group: chA, item: vid1"));
        assert!(lines[1].ends_with("acquire - status: complete, group: chA, item: vid1"));
    }

    #[test]
    fn test_console_sink_is_transient() {
        let sink = ConsoleSink::from_writer("test", SharedBuffer::new());
        let key = ItemKey::new("chA", "vid1");

        sink.write(&StatusRecord::new("acquire", &key, true)).unwrap();

        assert!(!sink.is_durable());
        assert!(sink.lookup("acquire", &key).unwrap().is_none());
    }

    #[test]
    fn test_write_after_close_fails() {
        let sink = ConsoleSink::from_writer("test", SharedBuffer::new());
        sink.close().unwrap();

        let result = sink.write(&StatusRecord::new("acquire", &ItemKey::new("g", "i"), true));
        assert!(matches!(result, Err(SinkError::Closed)));
    }

    #[test]
    fn test_tracing_sink_accepts_events() {
        let sink = TracingSink;
        let record = StatusRecord::new("acquire", &ItemKey::new("g", "i"), true);
        assert!(sink.write(&record).is_ok());
        assert!(sink.close().is_ok());
    }
}
