use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::sink::is_valid_stage_name;
use super::{ItemKey, LedgerSink, SinkError, StatusRecord};

struct SqliteState {
    conn: Option<Connection>,
    /// Stages whose `{stage}_logs` table this instance has already created.
    tables: HashSet<String>,
}

/// SQLite-backed durable ledger sink.
///
/// Each stage gets its own `{stage}_logs` table, created on first use.
pub struct SqliteSink {
    name: String,
    state: Mutex<SqliteState>,
}

impl SqliteSink {
    /// Open (or create) the database file, creating its parent directory if needed.
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn, format!("sqlite:{}", path.display())))
    }

    /// Create an in-memory SQLite sink (useful for testing)
    pub fn in_memory() -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn, "sqlite::memory:".to_string()))
    }

    fn from_connection(conn: Connection, name: String) -> Self {
        Self {
            name,
            state: Mutex::new(SqliteState {
                conn: Some(conn),
                tables: HashSet::new(),
            }),
        }
    }

    pub fn table_name(stage: &str) -> Result<String, SinkError> {
        if !is_valid_stage_name(stage) {
            return Err(SinkError::InvalidStage(stage.to_string()));
        }
        Ok(format!("{}_logs", stage))
    }

    /// All records stored for a stage, ordered by group then item.
    pub fn records(&self, stage: &str) -> Result<Vec<StatusRecord>, SinkError> {
        let mut state = self.lock()?;
        let table = Self::ensure_table(&mut state, stage)?;
        let conn = state.conn.as_ref().ok_or(SinkError::Closed)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT status, group_id, item_id, updated_at FROM {} ORDER BY group_id, item_id",
            table
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (status, group_id, item_id, updated_at) = row?;
            records.push(Self::to_record(stage, status, group_id, item_id, &updated_at)?);
        }
        Ok(records)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SqliteState>, SinkError> {
        self.state
            .lock()
            .map_err(|_| SinkError::Database("connection lock poisoned".to_string()))
    }

    fn ensure_table(state: &mut SqliteState, stage: &str) -> Result<String, SinkError> {
        let table = Self::table_name(stage)?;
        if state.tables.contains(stage) {
            return Ok(table);
        }

        let conn = state.conn.as_ref().ok_or(SinkError::Closed)?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                status INTEGER NOT NULL,
                group_id TEXT NOT NULL,
                item_id TEXT PRIMARY KEY,
                updated_at TEXT NOT NULL
            );
            "#,
            table
        ))?;
        tracing::debug!(table = %table, "Ledger table ready");

        state.tables.insert(stage.to_string());
        Ok(table)
    }

    fn to_record(
        stage: &str,
        status: i64,
        group_id: String,
        item_id: String,
        updated_at: &str,
    ) -> Result<StatusRecord, SinkError> {
        let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(updated_at)
            .map_err(|e| SinkError::Database(format!("Invalid timestamp: {}", e)))?
            .into();

        Ok(StatusRecord {
            stage: stage.to_string(),
            group_id,
            item_id,
            complete: status != 0,
            timestamp,
        })
    }
}

impl LedgerSink for SqliteSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn write(&self, record: &StatusRecord) -> Result<(), SinkError> {
        let mut state = self.lock()?;
        let table = Self::ensure_table(&mut state, &record.stage)?;
        let conn = state.conn.as_ref().ok_or(SinkError::Closed)?;

        // Rows are keyed by item_id alone, so an item id shared by two groups
        // keeps only the latest group's row.
        let previous_group: Option<String> = conn
            .query_row(
                &format!("SELECT group_id FROM {} WHERE item_id = ?", table),
                params![record.item_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(previous) = previous_group.filter(|g| *g != record.group_id) {
            tracing::warn!(
                stage = %record.stage,
                item_id = %record.item_id,
                previous_group = %previous,
                group_id = %record.group_id,
                "Item id reused across groups, replacing the other group's row"
            );
        }

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (status, group_id, item_id, updated_at) VALUES (?, ?, ?, ?)",
                table
            ),
            params![
                record.complete as i64,
                record.group_id,
                record.item_id,
                record.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn lookup(&self, stage: &str, key: &ItemKey) -> Result<Option<StatusRecord>, SinkError> {
        let mut state = self.lock()?;
        let table = Self::ensure_table(&mut state, stage)?;
        let conn = state.conn.as_ref().ok_or(SinkError::Closed)?;

        let row = conn
            .query_row(
                &format!(
                    "SELECT status, group_id, item_id, updated_at FROM {} WHERE item_id = ? AND group_id = ?",
                    table
                ),
                params![key.item_id, key.group_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((status, group_id, item_id, updated_at)) => Ok(Some(Self::to_record(
                stage,
                status,
                group_id,
                item_id,
                &updated_at,
            )?)),
            None => Ok(None),
        }
    }

    fn close(&self) -> Result<(), SinkError> {
        let mut state = self.lock()?;
        let conn = state.conn.take().ok_or(SinkError::Closed)?;
        state.tables.clear();
        conn.close().map_err(|(_, e)| SinkError::from(e))
    }
}
