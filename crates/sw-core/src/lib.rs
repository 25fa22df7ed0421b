//! sw-core - Core library for Stepwise
//!
//! This crate loads and validates `stepwise.yml`, resolving the data folder,
//! migration directory and database location the rest of the workspace
//! consumes.

pub mod config;
pub mod error;

pub use config::{
    Config, DatabaseConfig, DuckDbConfig, FoldersConfig, MigrationsConfig, ServerConfig,
};
pub use error::{CoreError, CoreResult};
