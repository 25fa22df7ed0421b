//! Shared test utilities for sw-migrate
//!
//! [`FakeDatabase`] is an in-memory stand-in for a transactional database
//! that understands just enough SQL to back a [`crate::VersionLedger`]:
//! `SELECT version FROM <table>` and `UPDATE <table> SET version = <n>`.
//! Any other script is recorded verbatim. Failures can be injected per phase.

use std::cell::RefCell;
use sw_db::{Database, DbError, DbResult, Transaction};

#[derive(Debug, Clone, Default)]
struct Snapshot {
    /// `None` = ledger table does not exist
    ledger: Option<Option<i64>>,
    executed: Vec<String>,
}

#[derive(Debug, Default)]
struct Faults {
    script_markers: Vec<String>,
    ledger_write_at: Option<i64>,
    commit_at: Option<i64>,
    begin: bool,
    read: bool,
}

#[derive(Debug, Default)]
struct State {
    committed: Snapshot,
    faults: Faults,
    commits: usize,
    rollbacks: usize,
}

/// Scriptable in-memory database.
#[derive(Debug, Default)]
pub struct FakeDatabase {
    state: RefCell<State>,
}

impl FakeDatabase {
    /// Database whose ledger table exists and holds version 0.
    pub fn new() -> Self {
        Self::with_version(0)
    }

    /// Database whose ledger table holds `version`.
    pub fn with_version(version: i64) -> Self {
        let db = Self::default();
        db.state.borrow_mut().committed.ledger = Some(Some(version));
        db
    }

    /// Database with no ledger table at all.
    pub fn without_ledger() -> Self {
        Self::default()
    }

    /// Database whose ledger table exists but has no row.
    pub fn with_empty_ledger() -> Self {
        let db = Self::default();
        db.state.borrow_mut().committed.ledger = Some(None);
        db
    }

    /// Fail any script containing `marker`.
    pub fn fail_script_containing(self, marker: &str) -> Self {
        self.state
            .borrow_mut()
            .faults
            .script_markers
            .push(marker.to_string());
        self
    }

    /// Fail the ledger update that would set `version`.
    pub fn fail_ledger_write_at(self, version: i64) -> Self {
        self.state.borrow_mut().faults.ledger_write_at = Some(version);
        self
    }

    /// Fail the commit of the transaction that set `version`.
    pub fn fail_commit_at(self, version: i64) -> Self {
        self.state.borrow_mut().faults.commit_at = Some(version);
        self
    }

    /// Fail every `begin`.
    pub fn fail_begin(self) -> Self {
        self.state.borrow_mut().faults.begin = true;
        self
    }

    /// Fail every scalar query with a non-catalog error.
    pub fn fail_reads(self) -> Self {
        self.state.borrow_mut().faults.read = true;
        self
    }

    /// Committed ledger value (`None` if the table or row is absent)
    pub fn version(&self) -> Option<i64> {
        self.state.borrow().committed.ledger.flatten()
    }

    /// Committed scripts, in execution order
    pub fn executed(&self) -> Vec<String> {
        self.state.borrow().committed.executed.clone()
    }

    /// Number of successful commits
    pub fn commits(&self) -> usize {
        self.state.borrow().commits
    }

    /// Number of rollbacks (explicit or on drop)
    pub fn rollbacks(&self) -> usize {
        self.state.borrow().rollbacks
    }
}

impl Database for FakeDatabase {
    fn begin(&self) -> DbResult<Box<dyn Transaction + '_>> {
        let state = self.state.borrow();
        if state.faults.begin {
            return Err(DbError::TransactionError("injected BEGIN failure".into()));
        }
        Ok(Box::new(FakeTransaction {
            db: self,
            working: state.committed.clone(),
            finished: false,
        }))
    }

    fn query_scalar_i64(&self, sql: &str) -> DbResult<Option<i64>> {
        let state = self.state.borrow();
        if state.faults.read {
            return Err(DbError::ExecutionError(format!("injected read failure: {sql}")));
        }
        match state.committed.ledger {
            Some(row) => Ok(row),
            None => Err(DbError::TableNotFound(sql.to_string())),
        }
    }

    fn ping(&self) -> DbResult<()> {
        Ok(())
    }

    fn db_type(&self) -> &'static str {
        "fake"
    }
}

/// Transaction over a private copy of the committed snapshot.
pub struct FakeTransaction<'a> {
    db: &'a FakeDatabase,
    working: Snapshot,
    finished: bool,
}

impl FakeTransaction<'_> {
    fn pending_version(&self) -> Option<i64> {
        self.working.ledger.flatten()
    }
}

impl Transaction for FakeTransaction<'_> {
    fn execute(&mut self, sql: &str) -> DbResult<usize> {
        let Some(value) = sql
            .strip_prefix("UPDATE ")
            .and_then(|rest| rest.rsplit(' ').next())
            .and_then(|n| n.parse::<i64>().ok())
        else {
            self.working.executed.push(sql.to_string());
            return Ok(0);
        };

        if self.db.state.borrow().faults.ledger_write_at == Some(value) {
            return Err(DbError::ExecutionError("injected ledger failure".into()));
        }
        match &mut self.working.ledger {
            None => Err(DbError::TableNotFound(sql.to_string())),
            Some(None) => Ok(0),
            Some(Some(current)) => {
                *current = value;
                Ok(1)
            }
        }
    }

    fn execute_batch(&mut self, sql: &str) -> DbResult<()> {
        let failing = self
            .db
            .state
            .borrow()
            .faults
            .script_markers
            .iter()
            .any(|m| sql.contains(m.as_str()));
        if failing {
            return Err(DbError::ExecutionError(format!("injected script failure: {sql}")));
        }
        self.working.executed.push(sql.to_string());
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> DbResult<()> {
        self.finished = true;
        let db = self.db;
        let pending = self.pending_version();
        let mut state = db.state.borrow_mut();
        if state.faults.commit_at.is_some() && state.faults.commit_at == pending {
            state.rollbacks += 1;
            return Err(DbError::TransactionError("injected COMMIT failure".into()));
        }
        state.committed = std::mem::take(&mut self.working);
        state.commits += 1;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> DbResult<()> {
        self.finished = true;
        self.db.state.borrow_mut().rollbacks += 1;
        Ok(())
    }
}

impl Drop for FakeTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.db.state.borrow_mut().rollbacks += 1;
        }
    }
}
