//! Repositories for the records the panels edit most.
//!
//! Each repository is a stateless struct whose methods take a `&Database`
//! and go through the query executor, so they work on either backend.

pub mod employee;
pub mod process;

pub use employee::{Employee, EmployeeRepo, NewEmployee};
pub use process::{NewProcessScore, ProcessRepo, ProcessScore, ProcessScoreRepo};
