//! `MySQL` backend.
//!
//! The DDL in [`schema`] is always compiled so it can be inspected and
//! tested; the driver glue in `connection` needs the `mysql` feature.

#[cfg(feature = "mysql")]
pub(crate) mod connection;
pub mod schema;

pub use schema::create_table_statements;
