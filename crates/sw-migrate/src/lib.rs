//! sw-migrate - Migration engine for Stepwise
//!
//! Brings a database schema to the latest version by discovering numbered
//! migration scripts in a directory, checking that they form a contiguous
//! sequence starting at 1, and applying every pending script in its own
//! transaction together with the version ledger update.
//!
//! The engine never terminates the process: configuration-level defects come
//! back as [`MigrationError`], and a failing script is recorded in the
//! [`MigrationReport`] so the caller decides what to do.

pub mod discovery;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod orchestrator;
pub mod unit;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use discovery::{collect_units, discover, parse_migration_version};
pub use error::{
    ExecutionError, MigrationError, MigrationResult, OrderingViolation, PersistenceError, Phase,
};
pub use executor::Executor;
pub use ledger::VersionLedger;
pub use orchestrator::{validate_ordering, MigrationPlan, MigrationReport, Migrator};
pub use unit::{MigrationUnit, ScriptSource};

use std::path::Path;
use sw_db::Database;

/// Subdirectory of the data folder holding migration scripts.
pub const MIGRATION_SUBDIR: &str = "migration";

/// Run all pending migrations found in `<data_dir>/migration` against `db`,
/// using the default `version` ledger table.
pub fn run_migrations(data_dir: &Path, db: &dyn Database) -> MigrationResult<MigrationReport> {
    Migrator::new(db, VersionLedger::default()).run(&data_dir.join(MIGRATION_SUBDIR))
}
