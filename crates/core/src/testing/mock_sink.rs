//! In-memory ledger sinks for testing.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::ledger::{ItemKey, LedgerSink, SinkError, StatusRecord};

/// A cloneable in-memory writer, for asserting on console sink output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as text.
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// The written text split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(String::from).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.bytes.lock().unwrap_or_else(|p| p.into_inner());
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A sink that records every write.
///
/// - `new()` is transient: it records but never answers lookups.
/// - `durable()` answers lookups from its own records.
/// - `failing()` rejects every write and close.
/// - `failing_on_complete()` is durable but rejects writes that mark an item
///   complete.
#[derive(Debug, Default)]
pub struct RecordingSink {
    name: String,
    durable: bool,
    fail: bool,
    fail_complete: bool,
    records: Mutex<Vec<StatusRecord>>,
    closes: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            name: "recording".to_string(),
            ..Self::default()
        }
    }

    pub fn durable() -> Self {
        Self {
            name: "recording-durable".to_string(),
            durable: true,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            name: "recording-failing".to_string(),
            fail: true,
            ..Self::default()
        }
    }

    pub fn failing_on_complete() -> Self {
        Self {
            name: "recording-failing-complete".to_string(),
            durable: true,
            fail_complete: true,
            ..Self::default()
        }
    }

    /// Every record written, in write order.
    pub fn records(&self) -> Vec<StatusRecord> {
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Number of times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl LedgerSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_durable(&self) -> bool {
        self.durable
    }

    fn write(&self, record: &StatusRecord) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::Database("simulated write failure".to_string()));
        }
        if self.fail_complete && record.complete {
            return Err(SinkError::Database("simulated complete write failure".to_string()));
        }
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(record.clone());
        Ok(())
    }

    fn lookup(&self, stage: &str, key: &ItemKey) -> Result<Option<StatusRecord>, SinkError> {
        if !self.durable {
            return Ok(None);
        }
        let records = self.records.lock().unwrap_or_else(|p| p.into_inner());
        Ok(records
            .iter()
            .rev()
            .find(|r| r.stage == stage && r.group_id == key.group_id && r.item_id == key.item_id)
            .cloned())
    }

    fn close(&self) -> Result<(), SinkError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SinkError::Database("simulated close failure".to_string()));
        }
        Ok(())
    }
}
