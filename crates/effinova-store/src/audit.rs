//! Audit trail in the `logs` table.

use serde::Serialize;
use tracing::{error, info};

use crate::database::Database;
use crate::errors::Result;
use crate::value::{Row, Value};
use crate::values;

/// One audit entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Row id.
    pub id: i64,
    /// Acting user, if known.
    pub username: Option<String>,
    /// What happened (`excel_import`, `login`, ...).
    pub action: String,
    /// Write time as stored (`YYYY-MM-DD HH:MM:SS`).
    pub timestamp: Option<String>,
    /// Free-form detail.
    pub details: Option<String>,
    /// Affected table.
    pub table_name: Option<String>,
    /// Affected record id.
    pub record_id: Option<String>,
}

impl LogEntry {
    fn from_row(row: &Row) -> Self {
        Self {
            id: row.get_i64("id").unwrap_or_default(),
            username: row.get_string("username"),
            action: row.get_string("action").unwrap_or_default(),
            timestamp: row.get_string("timestamp"),
            details: row.get_string("details"),
            table_name: row.get_string("table_name"),
            record_id: row.get_string("record_id"),
        }
    }
}

const INSERT_SQL: &str = "INSERT INTO logs (username, action, details, table_name, record_id) \
    VALUES (?, ?, ?, ?, ?)";

impl Database {
    /// Append an audit entry. Never fails: a write error is logged and
    /// swallowed so auditing cannot break the operation being audited.
    pub fn log_action(
        &self,
        actor: &str,
        action: &str,
        details: Option<&str>,
        table: Option<&str>,
        record_id: Option<&str>,
    ) {
        let params = values![actor, action, details, table, record_id];
        match self.execute_update(INSERT_SQL, &params) {
            Ok(_) => info!(
                actor,
                action,
                table = table.unwrap_or_default(),
                record_id = record_id.unwrap_or_default(),
                "audit entry recorded"
            ),
            Err(e) => error!(actor, action, error = %e, "audit entry not recorded"),
        }
    }

    /// Most recent audit entries, newest first.
    pub fn recent_actions(&self, limit: u32) -> Result<Vec<LogEntry>> {
        let rows = self.fetch_all(
            "SELECT id, username, action, timestamp, details, table_name, record_id \
             FROM logs ORDER BY id DESC LIMIT ?",
            &[Value::from(limit)],
        )?;
        Ok(rows.iter().map(LogEntry::from_row).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
