//! `SQLite` backend.
//!
//! - **[`connection`]**: `r2d2` pool with foreign keys, busy timeout, and WAL
//!   (file databases) applied to every connection.
//! - **[`migrations`]**: version-tracked schema evolution, each version in
//!   its own transaction.

pub mod connection;
pub mod migrations;

pub use connection::{
    ConnectionConfig, ConnectionPool, PooledConnection, PragmaState, new_file, new_in_memory,
    verify_pragmas,
};
pub use migrations::{
    MigrationReport, current_version, has_column, latest_version, run_migrations,
    sync_legacy_mirror,
};
