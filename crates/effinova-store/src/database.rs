//! Connection manager and query executor.
//!
//! [`Database`] owns the pool for the configured backend and is cheap to
//! clone. Each operation checks out a [`Handle`], runs, and returns the
//! handle to the pool when it drops, on every exit path.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use effinova_settings::{DatabaseBackend, EffinovaSettings};
use rusqlite::Connection;
use tracing::{debug, error, info, warn};

use crate::dialect::Dialect;
use crate::errors::{Result, StoreError, truncate_sql};
use crate::sqlite::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use crate::value::{FromValue, QueryOutput, Row, Table, Value};

#[derive(Clone)]
enum Backend {
    Sqlite(ConnectionPool),
    #[cfg(feature = "mysql")]
    MySql { pool: ::mysql::Pool, autocommit: bool },
}

/// Pooled access to the configured relational store.
#[derive(Clone)]
pub struct Database {
    backend: Backend,
    dialect: Dialect,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open the backend named in `settings`.
    ///
    /// Creates the configured working directories and, for `SQLite`, the
    /// database file's parent directory.
    pub fn connect(settings: &EffinovaSettings) -> Result<Self> {
        for dir in settings.working_dirs() {
            ensure_dir(&dir)?;
        }

        match settings.database.backend {
            DatabaseBackend::Sqlite => {
                let path = settings.sqlite_path();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    ensure_dir(parent)?;
                }
                Self::open_sqlite(&path, &ConnectionConfig::from(&settings.database.sqlite))
            }
            #[cfg(feature = "mysql")]
            DatabaseBackend::Mysql => {
                let mysql = &settings.database.mysql;
                let pool = crate::mysql::connection::new_pool(mysql)?;
                Ok(Self {
                    backend: Backend::MySql {
                        pool,
                        autocommit: mysql.autocommit,
                    },
                    dialect: Dialect::MySql,
                })
            }
            #[cfg(not(feature = "mysql"))]
            DatabaseBackend::Mysql => Err(StoreError::Connectivity(
                "mysql backend requested but this build lacks the `mysql` feature".to_string(),
            )),
        }
    }

    /// Open a file-backed `SQLite` database.
    pub fn open_sqlite(path: &Path, config: &ConnectionConfig) -> Result<Self> {
        let pool = sqlite::new_file(&path.to_string_lossy(), config)?;
        info!(path = %path.display(), pool_size = config.pool_size, "sqlite database opened");
        Ok(Self {
            backend: Backend::Sqlite(pool),
            dialect: Dialect::Sqlite,
        })
    }

    /// Open a private in-memory `SQLite` database.
    ///
    /// The pool holds a single connection: keep at most one [`Handle`]
    /// alive at a time or the second checkout waits for the first.
    pub fn open_in_memory() -> Result<Self> {
        let pool = sqlite::new_in_memory(&ConnectionConfig::default())?;
        Ok(Self {
            backend: Backend::Sqlite(pool),
            dialect: Dialect::Sqlite,
        })
    }

    /// Dialect of the backend.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Check out a live handle. The pool validates the connection and
    /// reconnects when the cached one is dead.
    pub fn acquire(&self) -> Result<Handle> {
        let conn = match &self.backend {
            Backend::Sqlite(pool) => pool.get().map(Conn::Sqlite).map_err(|e| {
                error!(error = %e, "failed to acquire sqlite connection");
                StoreError::Pool(e)
            })?,
            #[cfg(feature = "mysql")]
            Backend::MySql { pool, autocommit } => {
                let conn = pool.get_conn().map_err(|e| {
                    error!(error = %e, "failed to acquire mysql connection");
                    StoreError::Connectivity(e.to_string())
                })?;
                Conn::MySql {
                    conn,
                    autocommit: *autocommit,
                }
            }
        };
        Ok(Handle {
            conn,
            dialect: self.dialect,
            in_transaction: false,
        })
    }

    /// Return a handle to the pool. Dropping it has the same effect.
    pub fn release(&self, handle: Handle) {
        debug!(dialect = self.dialect.name(), "connection released");
        drop(handle);
    }

    /// Run one statement; see [`Handle::execute`].
    pub fn execute(&self, sql: &str, params: &[Value], fetch: bool) -> Result<QueryOutput> {
        self.acquire()?.execute(sql, params, fetch)
    }

    /// Run a query and return every row.
    pub fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.acquire()?.fetch_all(sql, params)
    }

    /// Run a query and return the first row, if any.
    pub fn fetch_optional(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        self.acquire()?.fetch_optional(sql, params)
    }

    /// Run a query and decode the first column of the first row.
    pub fn fetch_scalar<T: FromValue>(&self, sql: &str, params: &[Value]) -> Result<T> {
        self.acquire()?.fetch_scalar(sql, params)
    }

    /// Run a mutation and return the affected-row count.
    pub fn execute_update(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.acquire()?.execute_update(sql, params)
    }

    /// Insert one row from a column → value mapping; returns the new id.
    pub fn insert(&self, table: &str, columns: &[(&str, Value)]) -> Result<i64> {
        self.acquire()?.insert(table, columns)
    }

    /// Run a query and return a column/row table.
    pub fn query_table(&self, sql: &str, params: &[Value]) -> Result<Table> {
        self.acquire()?.query_table(sql, params)
    }

    /// Lenient [`query_table`](Self::query_table): any failure is logged and
    /// an empty table is returned.
    pub fn get_dataframe(&self, sql: &str, params: &[Value]) -> Table {
        match self.query_table(sql, params) {
            Ok(table) => table,
            Err(e) => {
                warn!(sql = %truncate_sql(sql), error = %e, "query failed, returning empty table");
                Table::default()
            }
        }
    }

    /// Run `f` inside one transaction on one handle. Commits when `f`
    /// returns `Ok`, rolls back when it returns `Err`.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Handle) -> Result<T>,
    {
        let mut handle = self.acquire()?;
        handle.begin()?;
        match f(&mut handle) {
            Ok(value) => {
                handle.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = handle.rollback() {
                    error!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Probe the backend with `SELECT 1`.
    pub fn ping(&self) -> Result<()> {
        let row = self
            .acquire()
            .and_then(|mut h| h.fetch_optional("SELECT 1 AS ok", &[]))
            .map_err(|e| StoreError::Connectivity(e.to_string()))?;
        match row.and_then(|r| r.get_i64("ok")) {
            Some(1) => Ok(()),
            other => Err(StoreError::Connectivity(format!(
                "unexpected ping result {other:?}"
            ))),
        }
    }

    /// Whether the backend answers. Logs the outcome.
    pub fn test_connectivity(&self) -> bool {
        match self.ping() {
            Ok(()) => {
                info!(dialect = self.dialect.name(), "database reachable");
                true
            }
            Err(e) => {
                error!(dialect = self.dialect.name(), error = %e, "database unreachable");
                false
            }
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        info!(path = %dir.display(), "created directory");
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

enum Conn {
    Sqlite(PooledConnection),
    #[cfg(feature = "mysql")]
    MySql {
        conn: ::mysql::PooledConn,
        autocommit: bool,
    },
}

enum Raw {
    Rows(Arc<[String]>, Vec<Row>),
    Affected(u64, Option<i64>),
}

/// A checked-out connection. Returned to the pool on drop; an open
/// transaction is rolled back first.
pub struct Handle {
    conn: Conn,
    dialect: Dialect,
    in_transaction: bool,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("dialect", &self.dialect)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl Handle {
    /// Run one statement.
    ///
    /// With `fetch` the result set is returned as [`QueryOutput::Rows`];
    /// otherwise the affected-row count and generated id are returned and
    /// the change is committed (`SQLite` autocommit; `MySQL` explicit
    /// `COMMIT` when the session is not autocommit). Inside
    /// [`Database::transaction`] nothing is committed until the closure
    /// returns.
    pub fn execute(&mut self, sql: &str, params: &[Value], fetch: bool) -> Result<QueryOutput> {
        Ok(match self.run(sql, params, fetch)? {
            Raw::Rows(_, rows) => QueryOutput::Rows(rows),
            Raw::Affected(rows, last_insert_id) => QueryOutput::Affected {
                rows,
                last_insert_id,
            },
        })
    }

    /// Run a query and return every row.
    pub fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        Ok(self.execute(sql, params, true)?.into_rows())
    }

    /// Run a query and return the first row, if any.
    pub fn fetch_optional(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.fetch_all(sql, params)?.into_iter().next())
    }

    /// Run a query and decode the first column of the first row.
    pub fn fetch_scalar<T: FromValue>(&mut self, sql: &str, params: &[Value]) -> Result<T> {
        let row = self
            .fetch_optional(sql, params)?
            .ok_or_else(|| StoreError::statement(sql, "query returned no rows"))?;
        let value = row
            .values()
            .first()
            .ok_or_else(|| StoreError::statement(sql, "query returned no columns"))?;
        T::from_value(value)
    }

    /// Run a mutation and return the affected-row count.
    pub fn execute_update(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        Ok(self.execute(sql, params, false)?.affected())
    }

    /// Insert one row from a column → value mapping; returns the new id.
    pub fn insert(&mut self, table: &str, columns: &[(&str, Value)]) -> Result<i64> {
        let names: Vec<String> = columns
            .iter()
            .map(|(name, _)| self.dialect.quote_ident(name))
            .collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.dialect.quote_ident(table),
            names.join(", ")
        );
        let params: Vec<Value> = columns.iter().map(|(_, v)| v.clone()).collect();
        self.execute(&sql, &params, false)?
            .last_insert_id()
            .ok_or_else(|| StoreError::statement(&sql, "insert did not report a generated id"))
    }

    /// Run a query and return a column/row table. Column names are kept
    /// even when no rows match.
    pub fn query_table(&mut self, sql: &str, params: &[Value]) -> Result<Table> {
        match self.run(sql, params, true)? {
            Raw::Rows(columns, rows) => Ok(Table::from_rows(columns.to_vec(), rows)),
            Raw::Affected(..) => Ok(Table::default()),
        }
    }

    /// Open a savepoint inside the current transaction.
    pub fn savepoint(&mut self, name: &str) -> Result<()> {
        self.control(&format!("SAVEPOINT {name}"))
    }

    /// Release (keep) the work done since `savepoint(name)`.
    pub fn release_savepoint(&mut self, name: &str) -> Result<()> {
        self.control(&format!("RELEASE SAVEPOINT {name}"))
    }

    /// Undo the work done since `savepoint(name)`.
    pub fn rollback_to_savepoint(&mut self, name: &str) -> Result<()> {
        self.control(&format!("ROLLBACK TO SAVEPOINT {name}"))
    }

    /// Dialect of the connection.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether a transaction is open on this handle.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// The underlying `SQLite` connection (for migrations).
    pub fn sqlite_connection(&self) -> Option<&Connection> {
        match &self.conn {
            Conn::Sqlite(conn) => Some(conn),
            #[cfg(feature = "mysql")]
            Conn::MySql { .. } => None,
        }
    }

    pub(crate) fn begin(&mut self) -> Result<()> {
        self.control(self.dialect.begin_sql())?;
        self.in_transaction = true;
        Ok(())
    }

    pub(crate) fn commit(&mut self) -> Result<()> {
        self.control("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    pub(crate) fn rollback(&mut self) -> Result<()> {
        self.in_transaction = false;
        self.control("ROLLBACK")
    }

    fn run(&mut self, sql: &str, params: &[Value], fetch: bool) -> Result<Raw> {
        let rendered = self.dialect.render(sql);
        let commit = !self.in_transaction;
        let outcome: std::result::Result<Raw, String> = match &mut self.conn {
            Conn::Sqlite(conn) => {
                sqlite_run(conn, &rendered, params, fetch).map_err(|e| e.to_string())
            }
            #[cfg(feature = "mysql")]
            Conn::MySql { conn, autocommit } => {
                let result = if fetch {
                    crate::mysql::connection::fetch(conn, &rendered, params)
                        .map(|(columns, rows)| Raw::Rows(columns, rows))
                } else {
                    crate::mysql::connection::mutate(
                        conn,
                        &rendered,
                        params,
                        commit && !*autocommit,
                    )
                    .map(|(rows, id)| Raw::Affected(rows, id))
                };
                result.map_err(|e| e.to_string())
            }
        };
        #[cfg(not(feature = "mysql"))]
        let _ = commit;

        outcome.map_err(|message| {
            error!(
                sql = %truncate_sql(&rendered),
                params = ?params,
                error = %message,
                "statement failed"
            );
            StoreError::Statement {
                sql: truncate_sql(&rendered),
                message,
            }
        })
    }

    fn control(&mut self, sql: &str) -> Result<()> {
        let outcome = match &mut self.conn {
            Conn::Sqlite(conn) => conn.execute_batch(sql).map_err(|e| e.to_string()),
            #[cfg(feature = "mysql")]
            Conn::MySql { conn, .. } => {
                crate::mysql::connection::control(conn, sql).map_err(|e| e.to_string())
            }
        };
        outcome.map_err(|message| {
            error!(sql, error = %message, "transaction control failed");
            StoreError::statement(sql, message)
        })
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.in_transaction {
            warn!("handle dropped inside a transaction, rolling back");
            if let Err(e) = self.rollback() {
                error!(error = %e, "rollback on drop failed");
            }
        }
    }
}

fn sqlite_run(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    fetch: bool,
) -> rusqlite::Result<Raw> {
    let mut stmt = conn.prepare(sql)?;
    let bound = rusqlite::params_from_iter(params.iter());
    if fetch {
        let columns: Arc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();
        let mut rows = stmt.query(bound)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(Value::from(row.get_ref(i)?));
            }
            out.push(Row::new(Arc::clone(&columns), values));
        }
        Ok(Raw::Rows(columns, out))
    } else {
        let before = conn.last_insert_rowid();
        let changed = stmt.execute(bound)? as u64;
        let after = conn.last_insert_rowid();
        let last_insert_id = (changed > 0 && after != before).then_some(after);
        Ok(Raw::Affected(changed, last_insert_id))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::values;
    use assert_matches::assert_matches;

    fn memory_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.execute(
            "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT UNIQUE, flag INTEGER, ratio REAL)",
            &[],
            false,
        )
        .unwrap();
        db
    }

    #[test]
    fn mutation_reports_rows_and_id() {
        let db = memory_db();
        let out = db
            .execute("INSERT INTO t (name, flag) VALUES (?, ?)", &values!["a", true], false)
            .unwrap();
        assert_eq!(
            out,
            QueryOutput::Affected {
                rows: 1,
                last_insert_id: Some(1)
            }
        );
    }

    #[test]
    fn update_after_insert_reports_no_id() {
        let db = memory_db();
        let mut handle = db.acquire().unwrap();
        handle
            .execute("INSERT INTO t (name) VALUES (?)", &values!["a"], false)
            .unwrap();
        let out = handle
            .execute("UPDATE t SET flag = 1 WHERE name = ?", &values!["a"], false)
            .unwrap();
        assert_eq!(
            out,
            QueryOutput::Affected {
                rows: 1,
                last_insert_id: None
            }
        );
        let out = handle
            .execute("INSERT INTO t (name) VALUES (?)", &values!["b"], false)
            .unwrap();
        assert_eq!(out.last_insert_id(), Some(2));
    }

    #[test]
    fn fetch_returns_named_rows() {
        let db = memory_db();
        db.insert("t", &[("name", "a".into()), ("ratio", 0.5.into())])
            .unwrap();
        let rows = db.fetch_all("SELECT id, name, ratio FROM t", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].columns(), ["id", "name", "ratio"]);
        assert_eq!(rows[0].get_f64("ratio"), Some(0.5));
    }

    #[test]
    fn failed_statement_is_typed_error() {
        let db = memory_db();
        let err = db.execute("SELEC nonsense", &[], true).unwrap_err();
        assert_matches!(err, StoreError::Statement { ref sql, .. } if sql == "SELEC nonsense");
    }

    #[test]
    fn fetch_scalar_decodes_first_column() {
        let db = memory_db();
        let n: i64 = db.fetch_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
        assert_eq!(n, 0);
        let missing: Option<String> = db.fetch_scalar("SELECT MAX(name) FROM t", &[]).unwrap();
        assert_eq!(missing, None);
        assert_matches!(
            db.fetch_scalar::<i64>("SELECT id FROM t", &[]),
            Err(StoreError::Statement { .. })
        );
    }

    #[test]
    fn query_table_keeps_columns_when_empty() {
        let db = memory_db();
        let table = db.query_table("SELECT id, name FROM t", &[]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns, ["id", "name"]);
    }

    #[test]
    fn get_dataframe_is_lenient() {
        let db = memory_db();
        let table = db.get_dataframe("SELECT * FROM missing_table", &[]);
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn transaction_commits_on_ok() {
        let db = memory_db();
        let id = db
            .transaction(|tx| {
                let id = tx.insert("t", &[("name", "a".into())])?;
                tx.execute_update("UPDATE t SET flag = 1 WHERE id = ?", &values![id])?;
                Ok(id)
            })
            .unwrap();
        let flag: i64 = db
            .fetch_scalar("SELECT flag FROM t WHERE id = ?", &values![id])
            .unwrap();
        assert_eq!(flag, 1);
    }

    #[test]
    fn transaction_rolls_back_on_err() {
        let db = memory_db();
        let result: Result<()> = db.transaction(|tx| {
            tx.insert("t", &[("name", "a".into())])?;
            tx.insert("t", &[("name", "a".into())])?;
            Ok(())
        });
        assert_matches!(result, Err(StoreError::Statement { .. }));
        let n: i64 = db.fetch_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn savepoint_isolates_one_failure() {
        let db = memory_db();
        db.transaction(|tx| {
            for name in ["a", "a", "b"] {
                tx.savepoint("row")?;
                match tx.insert("t", &[("name", name.into())]) {
                    Ok(_) => tx.release_savepoint("row")?,
                    Err(_) => {
                        tx.rollback_to_savepoint("row")?;
                        tx.release_savepoint("row")?;
                    }
                }
            }
            Ok(())
        })
        .unwrap();
        let n: i64 = db.fetch_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
        assert_eq!(n, 2);
    }

    #[test]
    fn dropped_handle_rolls_back() {
        let db = memory_db();
        {
            let mut handle = db.acquire().unwrap();
            handle.begin().unwrap();
            handle.insert("t", &[("name", "a".into())]).unwrap();
            assert!(handle.in_transaction());
        }
        let n: i64 = db.fetch_scalar("SELECT COUNT(*) FROM t", &[]).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn ping_succeeds_on_sqlite() {
        let db = memory_db();
        db.ping().unwrap();
        assert!(db.test_connectivity());
    }

    #[test]
    fn connect_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = EffinovaSettings::default();
        settings.paths.base_dir = dir.path().to_string_lossy().into_owned();
        settings.database.sqlite.path = Some("data/effinova.db".to_string());

        let db = Database::connect(&settings).unwrap();
        assert!(db.test_connectivity());
        assert!(dir.path().join("data").is_dir());
        for sub in ["uploads", "logs", "exports"] {
            assert!(dir.path().join(sub).is_dir(), "{sub}");
        }
    }

    #[cfg(not(feature = "mysql"))]
    #[test]
    fn mysql_without_feature_is_connectivity_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = EffinovaSettings::default();
        settings.paths.base_dir = dir.path().to_string_lossy().into_owned();
        settings.database.backend = DatabaseBackend::Mysql;
        assert_matches!(Database::connect(&settings), Err(StoreError::Connectivity(_)));
    }
}
