//! The blocking driver-handle contract the connection bridge is built on.

use crate::config::DriverOptions;
use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;

/// Primitive operations on one native database handle.
///
/// Every call blocks until the driver returns. Implementations must be safe to
/// share across threads, but the bridge never issues two calls at once.
pub trait NativeHandle: Send + Sync + 'static {
    /// Ask the driver to accept the statement text without executing it.
    ///
    /// This is a validation round trip only. Nothing prepared here is kept, and
    /// [`NativeHandle::execute`] sends the text again, so the server parses
    /// each statement twice.
    fn prepare(&self, sql: &str) -> OrmResult<()>;

    /// Execute `sql` with positional `params`.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
        options: &DriverOptions,
    ) -> OrmResult<StatementResult>;

    fn commit(&self) -> OrmResult<()>;

    fn rollback(&self) -> OrmResult<()>;

    fn set_autocommit(&self, enabled: bool) -> OrmResult<()>;

    fn autocommit(&self) -> bool;
}

/// What the driver returned for one executed statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementResult {
    rows: Vec<Row>,
    affected: u64,
}

impl StatementResult {
    /// A result carrying a row set.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows, affected: 0 }
    }

    /// A result carrying only an affected-row count.
    pub fn from_affected(affected: u64) -> Self {
        Self {
            rows: Vec::new(),
            affected,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn affected(&self) -> u64 {
        self.affected
    }
}
