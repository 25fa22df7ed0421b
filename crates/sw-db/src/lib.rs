//! sw-db - Database abstraction layer for Stepwise
//!
//! This crate provides the `Database` and `Transaction` traits consumed by
//! the migration core, and a DuckDB implementation of both.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::{DuckDbBackend, DuckDbTransaction};
pub use error::{DbError, DbResult};
pub use traits::{Database, Transaction};
