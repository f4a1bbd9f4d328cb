use super::{ItemKey, SinkError, StatusRecord};

/// One destination for ledger status events.
///
/// Sinks are shared by every concurrently running job, so implementations
/// serialize their own writes.
pub trait LedgerSink: Send + Sync {
    /// Name used when reporting failures.
    fn name(&self) -> &str;

    /// Whether this sink survives restarts and can answer `lookup`.
    fn is_durable(&self) -> bool {
        false
    }

    /// Write (upsert) a status record.
    fn write(&self, record: &StatusRecord) -> Result<(), SinkError>;

    /// Read back the record for a key. Transient sinks always return `None`.
    fn lookup(&self, _stage: &str, _key: &ItemKey) -> Result<Option<StatusRecord>, SinkError> {
        Ok(None)
    }

    /// Release the sink's resources.
    fn close(&self) -> Result<(), SinkError>;
}

/// Returns true when `stage` can be used as a ledger namespace.
pub fn is_valid_stage_name(stage: &str) -> bool {
    !stage.is_empty() && stage.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
