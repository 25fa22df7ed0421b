//! Version ledger.
//!
//! A single-row table with one integer column named `version` holding the
//! highest committed migration ordinal. The table is created by the first
//! migration; until then the schema is considered to be at version 0.

use crate::error::PersistenceError;
use sw_db::{Database, Transaction};

/// Default ledger table name.
pub const DEFAULT_TABLE: &str = "version";

/// Reads and writes the persisted schema version.
#[derive(Debug, Clone)]
pub struct VersionLedger {
    table: String,
}

impl Default for VersionLedger {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl VersionLedger {
    /// Ledger stored in `table`.
    ///
    /// The name is interpolated into SQL, so anything but a plain identifier
    /// (ASCII letters, digits and `_`, not starting with a digit) is rejected.
    pub fn new(table: impl Into<String>) -> Result<Self, PersistenceError> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(PersistenceError::InvalidTable { table });
        }
        Ok(Self { table })
    }

    /// Ledger table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Current persisted version; 0 when the table or its row is absent.
    pub fn read(&self, db: &dyn Database) -> Result<u64, PersistenceError> {
        let sql = format!("SELECT version FROM {}", self.table);
        let value = match db.query_scalar_i64(&sql) {
            Ok(value) => value.unwrap_or(0),
            Err(e) if e.is_table_not_found() => {
                log::debug!("Ledger table '{}' not found, assuming version 0", self.table);
                0
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    table: self.table.clone(),
                    source,
                })
            }
        };

        u64::try_from(value).map_err(|_| PersistenceError::InvalidValue {
            table: self.table.clone(),
            value,
        })
    }

    /// Set the version inside `tx`. Does not commit.
    pub fn write(
        &self,
        tx: &mut (dyn Transaction + '_),
        version: u64,
    ) -> Result<(), PersistenceError> {
        let sql = format!("UPDATE {} SET version = {version}", self.table);
        let rows = tx.execute(&sql).map_err(|source| PersistenceError::Write {
            table: self.table.clone(),
            source,
        })?;

        if rows != 1 {
            return Err(PersistenceError::RowCount {
                table: self.table.clone(),
                rows,
            });
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
