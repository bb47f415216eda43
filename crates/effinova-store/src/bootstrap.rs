//! Schema bootstrap: connectivity check, table creation or migration, and
//! default seed rows. Safe to run on every start.

use serde::Serialize;
use tracing::{info, warn};

use crate::database::{Database, Handle};
use crate::dialect::Dialect;
use crate::errors::{Result, StoreError};
use crate::mysql::create_table_statements;
use crate::seed;
use crate::sqlite::{self, MigrationReport};

/// What one [`Database::initialize`] run changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReport {
    /// Migration versions applied by this run (`SQLite` only).
    pub migrations_applied: Vec<u32>,
    /// Best-effort migrations that failed and will be retried.
    pub migration_warnings: Vec<String>,
    /// Default employees inserted.
    pub employees_seeded: u64,
    /// Default users inserted.
    pub users_seeded: u64,
    /// Seed rows that failed to insert.
    pub seed_failures: u32,
}

impl BootstrapReport {
    /// Whether the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.migrations_applied.is_empty()
            && self.employees_seeded == 0
            && self.users_seeded == 0
    }
}

impl Database {
    /// Bring the store to the current schema and insert the default rows.
    ///
    /// Fails when the backend is unreachable or the core schema cannot be
    /// created. Optional migrations and individual seed rows only warn.
    pub fn initialize(&self) -> Result<BootstrapReport> {
        self.ping()?;

        let mut handle = self.acquire()?;
        let migrations = match self.dialect() {
            Dialect::Sqlite => migrate_sqlite(&handle)?,
            Dialect::MySql => {
                create_mysql_tables(&mut handle)?;
                MigrationReport::default()
            }
        };

        let seeded = seed::seed_defaults(&mut handle);

        if let Some(conn) = handle.sqlite_connection() {
            match sqlite::sync_legacy_mirror(conn) {
                Ok(0) => {}
                Ok(rows) => info!(rows, "legacy mirror columns synced"),
                Err(e) => warn!(error = %e, "legacy mirror sync failed"),
            }
        }

        let report = BootstrapReport {
            migrations_applied: migrations.applied,
            migration_warnings: migrations.warnings,
            employees_seeded: seeded.employees,
            users_seeded: seeded.users,
            seed_failures: seeded.failures,
        };
        info!(
            dialect = self.dialect().name(),
            migrations = report.migrations_applied.len(),
            warnings = report.migration_warnings.len(),
            employees = report.employees_seeded,
            users = report.users_seeded,
            seed_failures = report.seed_failures,
            "database initialized"
        );
        Ok(report)
    }

    /// Highest applied migration version. `MySQL` schemas are created
    /// complete and report 0.
    pub fn current_version(&self) -> Result<u32> {
        let handle = self.acquire()?;
        match handle.sqlite_connection() {
            Some(conn) => sqlite::current_version(conn),
            None => Ok(0),
        }
    }

    /// Tables present in the store, sorted by name.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let sql = match self.dialect() {
            Dialect::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
            Dialect::MySql => {
                "SELECT table_name AS name FROM information_schema.tables \
                 WHERE table_schema = DATABASE() ORDER BY table_name"
            }
        };
        Ok(self
            .fetch_all(sql, &[])?
            .iter()
            .filter_map(|row| row.get_string("name"))
            .collect())
    }
}

/// Latest migration version defined in code.
pub fn latest_version() -> u32 {
    sqlite::latest_version()
}

fn migrate_sqlite(handle: &Handle) -> Result<MigrationReport> {
    let conn = handle
        .sqlite_connection()
        .ok_or_else(|| StoreError::Migration {
            message: "sqlite dialect without a sqlite connection".to_string(),
        })?;
    sqlite::run_migrations(conn)
}

fn create_mysql_tables(handle: &mut Handle) -> Result<()> {
    for (table, sql) in create_table_statements() {
        info!(table, "creating table if absent");
        let _ = handle
            .execute(&sql, &[], false)
            .map_err(|e| StoreError::Migration {
                message: format!("failed to create {table}: {e}"),
            })?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
