//! Error types for the data-access layer.
//!
//! [`StoreError`] is returned by every fallible operation in this crate.
//! Statement failures carry the (truncated) SQL so callers can report them
//! without access to the log file.

use thiserror::Error;

/// Maximum number of SQL characters kept in errors and log lines.
pub const SQL_PREVIEW_CHARS: usize = 100;

/// Errors that can occur in the data-access layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` driver error outside statement execution.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// `SQLite` connection pool error (checkout timeout, open failure).
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// `MySQL` driver error outside statement execution.
    #[cfg(feature = "mysql")]
    #[error("mysql error: {0}")]
    MySql(#[from] mysql::Error),

    /// The backend did not answer the connectivity check.
    #[error("database unreachable: {0}")]
    Connectivity(String),

    /// A statement failed (malformed SQL, constraint violation, type mismatch).
    #[error("statement failed ({sql}): {message}")]
    Statement {
        /// Statement text, truncated to [`SQL_PREVIEW_CHARS`].
        sql: String,
        /// Driver error message.
        message: String,
    },

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// A stored value could not be decoded into the expected type.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Spreadsheet could not be read.
    #[error("import error: {0}")]
    Import(String),

    /// Filesystem error (working directories, database parent dir).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Build a [`StoreError::Statement`] from a driver error.
    pub fn statement(sql: &str, err: impl std::fmt::Display) -> Self {
        Self::Statement {
            sql: truncate_sql(sql),
            message: err.to_string(),
        }
    }
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Collapse whitespace and cut `sql` to [`SQL_PREVIEW_CHARS`] characters.
pub fn truncate_sql(sql: &str) -> String {
    let collapsed = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= SQL_PREVIEW_CHARS {
        collapsed
    } else {
        let mut cut: String = collapsed.chars().take(SQL_PREVIEW_CHARS).collect();
        cut.push_str("...");
        cut
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_display() {
        let err = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }

    #[test]
    fn statement_error_display() {
        let err = StoreError::statement("SELECT * FROM nope", "no such table: nope");
        assert_eq!(
            err.to_string(),
            "statement failed (SELECT * FROM nope): no such table: nope"
        );
    }

    #[test]
    fn migration_error_display() {
        let err = StoreError::Migration {
            message: "v2 failed: disk full".into(),
        };
        assert_eq!(err.to_string(), "migration error: v2 failed: disk full");
    }

    #[test]
    fn connectivity_error_display() {
        let err = StoreError::Connectivity("connection refused".into());
        assert_eq!(err.to_string(), "database unreachable: connection refused");
    }

    #[test]
    fn from_rusqlite_error() {
        let err: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn truncate_short_sql_untouched() {
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn truncate_collapses_whitespace() {
        assert_eq!(
            truncate_sql("SELECT id\n        FROM users\n  WHERE id = ?"),
            "SELECT id FROM users WHERE id = ?"
        );
    }

    #[test]
    fn truncate_long_sql() {
        let sql = format!("SELECT {} FROM employees", "a, ".repeat(100));
        let cut = truncate_sql(&sql);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SQL_PREVIEW_CHARS + 3);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let sql = "İşe_Giriş_Tarihi ".repeat(20);
        let cut = truncate_sql(&sql);
        assert!(cut.ends_with("..."));
    }
}
