//! Migration orchestration.
//!
//! A run is: read the ledger, discover units, check that their versions are
//! contiguous from 1, then apply every unit above the ledger version in order,
//! stopping at the first failure. Each applied unit is committed before the
//! next one starts, so a later failure never undoes earlier progress and the
//! next run resumes from the ledger.

use crate::discovery::discover;
use crate::error::{ExecutionError, MigrationResult, OrderingViolation};
use crate::executor::Executor;
use crate::ledger::VersionLedger;
use crate::unit::MigrationUnit;
use serde::Serialize;
use std::path::Path;
use sw_db::Database;

/// Check that `units` (sorted by version) form the sequence 1, 2, 3, ...
///
/// Units with version 0 are ignored. Returns the highest version.
pub fn validate_ordering(units: &[MigrationUnit]) -> Result<u64, OrderingViolation> {
    let mut prev = 0u64;
    for unit in units {
        let version = unit.version();
        if version == 0 {
            continue;
        }
        if version == prev {
            return Err(OrderingViolation::Duplicate {
                version,
                name: unit.name().to_string(),
            });
        }
        let expected = prev.saturating_add(1);
        if version != expected {
            return Err(OrderingViolation::Gap {
                expected,
                found: version,
                name: unit.name().to_string(),
            });
        }
        prev = version;
    }
    Ok(prev)
}

/// Validated units plus the ledger version they are compared against.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    /// Ledger version at planning time
    pub current_version: u64,
    /// Highest discovered version (0 when there are no units)
    pub latest_version: u64,
    /// All discovered units, ascending
    pub units: Vec<MigrationUnit>,
}

impl MigrationPlan {
    /// Units above the ledger version, ascending
    pub fn pending(&self) -> impl Iterator<Item = &MigrationUnit> {
        self.units
            .iter()
            .filter(move |u| u.version() > self.current_version)
    }

    pub fn pending_versions(&self) -> Vec<u64> {
        self.pending().map(MigrationUnit::version).collect()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending().next().is_none()
    }

    /// The ledger is past every known migration (schema newer than code).
    pub fn schema_ahead(&self) -> bool {
        self.current_version > self.latest_version
    }
}

/// Outcome of one migration run.
#[derive(Debug, Serialize)]
pub struct MigrationReport {
    pub starting_version: u64,
    pub final_version: u64,
    pub latest_version: u64,
    pub applied: Vec<u64>,
    pub error: Option<ExecutionError>,
}

impl MigrationReport {
    fn new(plan: &MigrationPlan) -> Self {
        Self {
            starting_version: plan.current_version,
            final_version: plan.current_version,
            latest_version: plan.latest_version,
            applied: Vec::new(),
            error: None,
        }
    }

    /// No unit failed.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn schema_ahead(&self) -> bool {
        self.final_version > self.latest_version
    }
}

/// Drives discovery, validation, and execution against one database.
pub struct Migrator<'a> {
    db: &'a dyn Database,
    ledger: VersionLedger,
}

impl<'a> Migrator<'a> {
    pub fn new(db: &'a dyn Database, ledger: VersionLedger) -> Self {
        Self { db, ledger }
    }

    pub fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    /// Read the ledger and validate the units in `dir` without applying any.
    pub fn plan(&self, dir: &Path) -> MigrationResult<MigrationPlan> {
        let current = self.ledger.read(self.db)?;
        let units = discover(dir)?;
        self.build_plan(current, units)
    }

    /// Like [`Migrator::plan`] over an already discovered unit list.
    pub fn plan_units(&self, units: Vec<MigrationUnit>) -> MigrationResult<MigrationPlan> {
        let current = self.ledger.read(self.db)?;
        self.build_plan(current, units)
    }

    /// Bring the database up to the latest migration in `dir`.
    ///
    /// Returns `Err` only for defects that stop the run before any unit is
    /// attempted; a failing unit is reported in [`MigrationReport::error`].
    pub fn run(&self, dir: &Path) -> MigrationResult<MigrationReport> {
        let plan = self.plan(dir)?;
        Ok(self.apply(&plan))
    }

    /// Like [`Migrator::run`] over an already discovered unit list.
    pub fn run_units(&self, units: Vec<MigrationUnit>) -> MigrationResult<MigrationReport> {
        let plan = self.plan_units(units)?;
        Ok(self.apply(&plan))
    }

    /// Apply the pending units of `plan` in order, stopping at the first failure.
    pub fn apply(&self, plan: &MigrationPlan) -> MigrationReport {
        let executor = Executor::new(self.db, &self.ledger);
        let mut report = MigrationReport::new(plan);

        for unit in plan.pending() {
            log::info!("Applying migration: {}", unit.name());
            if let Err(e) = executor.apply(unit) {
                log::error!("Failed to apply migration '{}': {e}", unit.name());
                report.error = Some(e);
                break;
            }
            report.applied.push(unit.version());
            report.final_version = unit.version();
        }

        if report.final_version != report.starting_version {
            log::info!("Database is at version: {}", report.final_version);
        }
        report
    }

    fn build_plan(
        &self,
        current_version: u64,
        units: Vec<MigrationUnit>,
    ) -> MigrationResult<MigrationPlan> {
        log::info!("Database is at version: {current_version}");
        let latest_version = validate_ordering(&units)?;

        let plan = MigrationPlan {
            current_version,
            latest_version,
            units,
        };
        if plan.schema_ahead() {
            log::warn!(
                "Database version {current_version} is newer than the latest migration {latest_version}"
            );
        }
        Ok(plan)
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
