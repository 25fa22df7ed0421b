//! Error types for the migration engine.

use crate::unit::MigrationUnit;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use sw_db::DbError;
use thiserror::Error;

/// Errors that stop a migration run before any unit is attempted.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The migration directory could not be listed (MG001).
    #[error("[MG001] Failed to list migrations in {path}: {source}")]
    Discovery {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Discovered ordinals are not contiguous from 1 (MG002).
    #[error("[MG002] Migration ordering is not stable: {0}")]
    Ordering(#[from] OrderingViolation),

    /// The current schema version could not be read (MG003).
    #[error("[MG003] Failed to read schema version: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for [`MigrationError`].
pub type MigrationResult<T> = Result<T, MigrationError>;

/// A gap or duplicate in the discovered ordinals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderingViolation {
    /// An ordinal was skipped (or the sequence did not start at 1).
    #[error("expected migration {expected}, found {found} in '{name}'")]
    Gap {
        expected: u64,
        found: u64,
        name: String,
    },

    /// Two units share an ordinal.
    #[error("duplicate migration version {version} in '{name}'")]
    Duplicate { version: u64, name: String },
}

/// Version ledger read/write failures.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The version query failed for a reason other than a missing table.
    #[error("reading '{table}' failed: {source}")]
    Read {
        table: String,
        #[source]
        source: DbError,
    },

    /// The version update statement failed.
    #[error("updating '{table}' failed: {source}")]
    Write {
        table: String,
        #[source]
        source: DbError,
    },

    /// The update did not touch exactly one row.
    #[error("updating '{table}' affected {rows} rows, expected exactly 1")]
    RowCount { table: String, rows: usize },

    /// The ledger table name is not a plain SQL identifier.
    #[error("invalid ledger table name '{table}'")]
    InvalidTable { table: String },

    /// The stored version is negative or out of range.
    #[error("'{table}' holds invalid version {value}")]
    InvalidValue { table: String, value: i64 },
}

/// The step of [`crate::Executor::apply`] that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Reading the script file
    Read,
    /// Opening the transaction
    Begin,
    /// Running the script
    Script,
    /// Updating the version ledger
    Ledger,
    /// Committing the transaction
    Commit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Read => write!(f, "read"),
            Phase::Begin => write!(f, "begin"),
            Phase::Script => write!(f, "script"),
            Phase::Ledger => write!(f, "ledger"),
            Phase::Commit => write!(f, "commit"),
        }
    }
}

/// A single unit failed to apply (MG004).
///
/// For every phase except [`Phase::Commit`] the transaction was rolled back
/// and the ledger still holds the previous version. After a commit failure
/// the persisted state is unknown until the ledger is read again.
#[derive(Error, Debug)]
#[error("[MG004] Migration '{name}' (v{version}) failed during {phase}: {source}")]
pub struct ExecutionError {
    pub version: u64,
    pub name: String,
    pub phase: Phase,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl ExecutionError {
    pub(crate) fn new<E>(unit: &MigrationUnit, phase: Phase, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            version: unit.version(),
            name: unit.name().to_string(),
            phase,
            source: Box::new(source),
        }
    }
}

impl Serialize for ExecutionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExecutionError", 4)?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("phase", &self.phase)?;
        state.serialize_field("message", &self.source.to_string())?;
        state.end()
    }
}
