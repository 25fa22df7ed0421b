//! Applies one migration unit atomically.

use crate::error::{ExecutionError, Phase};
use crate::ledger::VersionLedger;
use crate::unit::MigrationUnit;
use sw_db::{Database, Transaction};

/// Runs a unit's script and the matching ledger update in one transaction.
pub struct Executor<'a> {
    db: &'a dyn Database,
    ledger: &'a VersionLedger,
}

impl<'a> Executor<'a> {
    pub fn new(db: &'a dyn Database, ledger: &'a VersionLedger) -> Self {
        Self { db, ledger }
    }

    /// Apply `unit` and record its version.
    ///
    /// Either both the script and the version bump are committed, or the
    /// transaction is rolled back and neither is. A [`Phase::Commit`] error
    /// leaves the outcome unknown; re-read the ledger to find out.
    ///
    /// The script runs inside the unit's transaction and must not contain
    /// transaction control statements (`BEGIN`, `COMMIT`, `ROLLBACK`). A
    /// `COMMIT` in the script ends the transaction early: everything before
    /// it is persisted, the rest of the script and the ledger update run in
    /// autocommit mode, and the final commit fails with [`Phase::Commit`]
    /// even though the ledger already holds the new version.
    pub fn apply(&self, unit: &MigrationUnit) -> Result<(), ExecutionError> {
        if let Some(path) = unit.path() {
            log::debug!("Reading migration script {}", path.display());
        }
        let script = unit
            .script()
            .map_err(|e| ExecutionError::new(unit, Phase::Read, e))?;

        let mut tx = self
            .db
            .begin()
            .map_err(|e| ExecutionError::new(unit, Phase::Begin, e))?;

        if let Err(e) = tx.execute_batch(&script) {
            rollback(tx, unit);
            return Err(ExecutionError::new(unit, Phase::Script, e));
        }

        if let Err(e) = self.ledger.write(tx.as_mut(), unit.version()) {
            rollback(tx, unit);
            return Err(ExecutionError::new(unit, Phase::Ledger, e));
        }

        tx.commit()
            .map_err(|e| ExecutionError::new(unit, Phase::Commit, e))?;
        log::debug!("Committed migration {unit}");
        Ok(())
    }
}

fn rollback(tx: Box<dyn Transaction + '_>, unit: &MigrationUnit) {
    if let Err(e) = tx.rollback() {
        log::warn!("Rollback after failed migration '{}' failed: {e}", unit.name());
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
