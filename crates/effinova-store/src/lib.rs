//! # effinova-store
//!
//! Data access and schema bootstrap for the EFFINOVA panels.
//!
//! - **Database**: pooled connections to `SQLite` (default) or `MySQL`
//!   (`mysql` feature), with one query executor for both
//! - **Bootstrap**: connectivity check, versioned `SQLite` migrations or
//!   `MySQL` DDL, and idempotent default seed rows
//! - **Dialect**: the small set of SQL rewrites the backends disagree on
//! - **Repositories**: typed access to employees, processes, and scores
//! - **Audit**: the `logs` trail
//! - **Import**: employees and their logins from an `.xlsx` sheet
//!
//! All SQL uses `?` placeholders and the `SQLite` spelling; the executor
//! rewrites it for `MySQL`.

#![deny(unsafe_code)]

pub mod audit;
pub mod bootstrap;
pub mod database;
pub mod dialect;
pub mod errors;
pub mod import;
pub mod mysql;
pub mod repositories;
pub mod schema;
pub mod seed;
pub mod sqlite;
pub mod value;

pub use audit::LogEntry;
pub use bootstrap::{BootstrapReport, latest_version};
pub use database::{Database, Handle};
pub use dialect::Dialect;
pub use errors::{Result, StoreError};
pub use import::{ImportReport, RowError, SheetRow, import_employees, read_workbook};
pub use repositories::{
    Employee, EmployeeRepo, NewEmployee, NewProcessScore, ProcessRepo, ProcessScore,
    ProcessScoreRepo,
};
pub use schema::{
    ACTIVE_PREDICATE, ApprovalState, ENTITY_TABLES, IdeaStatus, ProjectStatus, Role,
};
pub use seed::hash_password;
pub use value::{FromValue, QueryOutput, Row, Table, Value};
