//! Connection layer contracts
//!
//! A [`DatabaseAdapter`] owns a pool for one engine and hands out
//! [`DatabaseConnection`]s. The execution coordinator only talks to these
//! traits, so tests can drive it with an in-memory implementation.

use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::Result;
use crate::result_set::Row;
use async_trait::async_trait;

/// Outcome of a statement that modifies data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Number of rows affected by the query
    pub rows_affected: u64,
    /// Last inserted ID (if applicable)
    pub last_insert_id: Option<i64>,
}

/// Source of connections for one database
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Get the name of this database connection
    fn name(&self) -> &str;

    fn driver_type(&self) -> DriverType;

    /// Whether the underlying pool is open
    fn connected(&self) -> bool;

    /// Acquire one connection; it goes back to the pool when closed or dropped
    async fn connection(&self) -> Result<Box<dyn DatabaseConnection>>;

    /// Test database connectivity
    async fn ping(&self) -> Result<bool>;
}

/// One live connection, used sequentially by a single execution
#[async_trait]
pub trait DatabaseConnection: Send {
    /// Turning auto-commit off opens a transaction; turning it back on
    /// commits whatever is still open
    async fn set_auto_commit(&mut self, enabled: bool) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    async fn execute(&mut self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult>;

    /// Run one statement once per parameter row.
    ///
    /// Implementations prepare `sql` once; sqlx caches the prepared
    /// statement per connection, so repeating it reuses the same handle.
    async fn execute_batch(
        &mut self,
        sql: &str,
        rows: Vec<Vec<SqlValue>>,
    ) -> Result<Vec<QueryResult>> {
        let mut results = Vec::with_capacity(rows.len());
        for params in rows {
            results.push(self.execute(sql, params).await?);
        }
        Ok(results)
    }

    async fn fetch_all(&mut self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>>;

    /// Release the connection, rolling back a transaction left open
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Statement text for the prepared-statement path
pub(crate) fn prepared_sql(sql: &str) -> &str {
    sql.trim_end().trim_end_matches(';')
}

/// Auto-commit bookkeeping shared by the sqlx connections.
///
/// Each method returns the control statement the connection must send.
#[derive(Debug)]
pub(crate) struct TransactionState {
    auto_commit: bool,
    open: bool,
}

impl Default for TransactionState {
    fn default() -> Self {
        Self {
            auto_commit: true,
            open: false,
        }
    }
}

impl TransactionState {
    pub(crate) fn set_auto_commit(&mut self, enabled: bool) -> Option<&'static str> {
        self.auto_commit = enabled;
        match (enabled, self.open) {
            (false, false) => {
                self.open = true;
                Some("BEGIN")
            }
            (true, true) => {
                self.open = false;
                Some("COMMIT")
            }
            _ => None,
        }
    }

    /// Lazily reopen a transaction after commit/rollback in manual mode
    pub(crate) fn before_statement(&mut self) -> Option<&'static str> {
        if !self.auto_commit && !self.open {
            self.open = true;
            Some("BEGIN")
        } else {
            None
        }
    }

    pub(crate) fn end(&mut self, control: &'static str) -> Option<&'static str> {
        if self.open {
            self.open = false;
            Some(control)
        } else {
            None
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_state_flow() {
        let mut state = TransactionState::default();
        assert_eq!(state.before_statement(), None);
        assert_eq!(state.set_auto_commit(false), Some("BEGIN"));
        assert!(state.is_open());
        assert_eq!(state.end("COMMIT"), Some("COMMIT"));
        assert_eq!(state.end("ROLLBACK"), None);
        assert_eq!(state.before_statement(), Some("BEGIN"));
        assert_eq!(state.set_auto_commit(true), Some("COMMIT"));
        assert_eq!(state.set_auto_commit(true), None);
    }

    #[test]
    fn test_prepared_sql_strips_terminator() {
        assert_eq!(prepared_sql("SELECT 1;"), "SELECT 1");
        assert_eq!(prepared_sql("SELECT 1"), "SELECT 1");
    }
}
