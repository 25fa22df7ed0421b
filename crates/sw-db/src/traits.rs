//! Database trait definitions

use crate::error::DbResult;

/// Transactional database handle consumed by the migration core.
///
/// Execution is synchronous: every call blocks until the database answers.
pub trait Database {
    /// Open a new atomic transaction.
    fn begin(&self) -> DbResult<Box<dyn Transaction + '_>>;

    /// Run a query and return the first column of the first row as an integer.
    ///
    /// Returns `Ok(None)` when the query yields no rows.
    fn query_scalar_i64(&self, sql: &str) -> DbResult<Option<i64>>;

    /// Check that the connection is live.
    fn ping(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// A single open transaction.
///
/// Implementations must roll back when dropped without `commit` or
/// `rollback` having been called.
pub trait Transaction {
    /// Execute one SQL statement, returning the number of affected rows
    fn execute(&mut self, sql: &str) -> DbResult<usize>;

    /// Execute a script of one or more SQL statements
    fn execute_batch(&mut self, sql: &str) -> DbResult<()>;

    /// Commit all work done in this transaction
    fn commit(self: Box<Self>) -> DbResult<()>;

    /// Discard all work done in this transaction
    fn rollback(self: Box<Self>) -> DbResult<()>;
}
