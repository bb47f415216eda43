//! Schema migration runner for the `SQLite` backend.
//!
//! Migrations run in version order, each in its own transaction, and are
//! recorded in `schema_version` once applied. The core schema (v1) is
//! required. Later migrations are best-effort: a failure is rolled back,
//! reported as a warning, and attempted again on the next run because its
//! version is not recorded.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::errors::{Result, StoreError};

/// A column the legacy panels expect, added when missing.
struct ColumnAddition {
    table: &'static str,
    column: &'static str,
    definition: &'static str,
}

const LEGACY_COLUMNS: &[ColumnAddition] = &[
    ColumnAddition {
        table: "employees",
        column: "name",
        definition: "TEXT",
    },
    ColumnAddition {
        table: "employees",
        column: "department",
        definition: "TEXT",
    },
    ColumnAddition {
        table: "employees",
        column: "position",
        definition: "TEXT",
    },
    ColumnAddition {
        table: "employees",
        column: "email",
        definition: "TEXT",
    },
    ColumnAddition {
        table: "employees",
        column: "sicil_no",
        definition: "TEXT",
    },
    ColumnAddition {
        table: "employees",
        column: "start_date",
        definition: "TEXT",
    },
    ColumnAddition {
        table: "employees",
        column: "phone",
        definition: "TEXT",
    },
    ColumnAddition {
        table: "users",
        column: "employee_sicil_no",
        definition: "TEXT",
    },
    ColumnAddition {
        table: "users",
        column: "department",
        definition: "TEXT",
    },
];

const LEGACY_BACKFILL: &str = "UPDATE employees
    SET name = Ad_Soyad, department = Departman, position = Pozisyon
    WHERE name IS NULL OR department IS NULL OR position IS NULL";

enum Step {
    Sql(&'static str),
    Code(fn(&Connection) -> rusqlite::Result<()>),
}

struct Migration {
    version: u32,
    description: &'static str,
    required: bool,
    step: Step,
}

/// All migrations in version order.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "core schema",
        required: true,
        step: Step::Sql(include_str!("v001_schema.sql")),
    },
    Migration {
        version: 2,
        description: "legacy mirror columns",
        required: false,
        step: Step::Code(add_legacy_columns),
    },
    Migration {
        version: 3,
        description: "soft-delete defaults",
        required: false,
        step: Step::Sql(include_str!("v003_soft_delete_defaults.sql")),
    },
    Migration {
        version: 4,
        description: "legacy indexes",
        required: false,
        step: Step::Sql(include_str!("v004_legacy_indexes.sql")),
    },
];

/// Outcome of one migration run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions applied by this run.
    pub applied: Vec<u32>,
    /// Best-effort migrations that failed and will be retried.
    pub warnings: Vec<String>,
}

/// Run every migration not yet recorded in `schema_version`.
///
/// # Errors
///
/// Returns [`StoreError::Migration`] if the version table cannot be read or
/// a required migration fails.
pub fn run_migrations(conn: &Connection) -> Result<MigrationReport> {
    ensure_version_table(conn)?;
    let recorded = applied_versions(conn)?;
    let mut report = MigrationReport::default();

    for migration in MIGRATIONS {
        if recorded.contains(&migration.version) {
            debug!(
                version = migration.version,
                description = migration.description,
                "migration already applied, skipping"
            );
            continue;
        }

        info!(
            version = migration.version,
            description = migration.description,
            "applying migration"
        );

        match apply_migration(conn, migration) {
            Ok(()) => report.applied.push(migration.version),
            Err(e) if !migration.required => {
                warn!(
                    version = migration.version,
                    error = %e,
                    "migration failed, will retry on next start"
                );
                report.warnings.push(e.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    if !report.applied.is_empty() {
        info!(applied = report.applied.len(), "migrations complete");
    }

    Ok(report)
}

/// Return the highest applied migration version, or 0 if none.
pub fn current_version(conn: &Connection) -> Result<u32> {
    ensure_version_table(conn)?;
    let version: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::Migration {
            message: format!("failed to read schema_version: {e}"),
        })?;
    Ok(version)
}

/// Return the latest migration version defined in code.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Whether `table` has `column`. Identifiers compare case-insensitively,
/// matching `SQLite`'s own resolution.
pub fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name?.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Copy `Ad_Soyad`/`Departman`/`Pozisyon` into the legacy mirror columns
/// where they are still null. Returns the number of rows updated, or 0 when
/// the mirror columns do not exist.
pub fn sync_legacy_mirror(conn: &Connection) -> rusqlite::Result<usize> {
    if !has_column(conn, "employees", "name")? {
        return Ok(0);
    }
    conn.execute(LEGACY_BACKFILL, [])
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal
// ─────────────────────────────────────────────────────────────────────────────

fn add_legacy_columns(conn: &Connection) -> rusqlite::Result<()> {
    for addition in LEGACY_COLUMNS {
        if has_column(conn, addition.table, addition.column)? {
            debug!(
                table = addition.table,
                column = addition.column,
                "column already present"
            );
            continue;
        }
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            addition.table, addition.column, addition.definition
        ))?;
        info!(table = addition.table, column = addition.column, "column added");
    }
    let backfilled = sync_legacy_mirror(conn)?;
    if backfilled > 0 {
        info!(rows = backfilled, "legacy mirror columns backfilled");
    }
    Ok(())
}

fn ensure_version_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
           version     INTEGER PRIMARY KEY,
           applied_at  TEXT    NOT NULL,
           description TEXT
         );",
    )
    .map_err(|e| StoreError::Migration {
        message: format!("failed to create schema_version table: {e}"),
    })?;
    Ok(())
}

fn applied_versions(conn: &Connection) -> Result<Vec<u32>> {
    let read = || -> rusqlite::Result<Vec<u32>> {
        let mut stmt = conn.prepare("SELECT version FROM schema_version ORDER BY version")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    };
    read().map_err(|e| StoreError::Migration {
        message: format!("failed to read schema_version: {e}"),
    })
}

fn apply_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    let fail = |stage: &str, e: rusqlite::Error| StoreError::Migration {
        message: format!(
            "v{} ({}) {stage}: {e}",
            migration.version, migration.description
        ),
    };

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| fail("could not begin", e))?;

    let outcome = match migration.step {
        Step::Sql(sql) => tx.execute_batch(sql),
        Step::Code(apply) => apply(&tx),
    };
    outcome.map_err(|e| fail("failed", e))?;

    let _ = tx
        .execute(
            "INSERT INTO schema_version (version, applied_at, description) VALUES (?1, datetime('now'), ?2)",
            rusqlite::params![migration.version, migration.description],
        )
        .map_err(|e| fail("could not be recorded", e))?;

    tx.commit().map_err(|e| fail("could not commit", e))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
