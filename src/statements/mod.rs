//! Statement providers
//!
//! One builder per statement kind. Every builder implements [`QueryProvider`],
//! which turns the configured request into a [`CompiledStatement`] for the
//! driver carried by a [`RenderContext`]. Providers never touch a
//! connection; executing them is the job of [`crate::query::Query`].
//!
//! ```rust
//! use rustf_query::prelude::*;
//!
//! let select = Select::new()
//!     .table("users")
//!     .condition("age", Operator::GreaterThan, 18)
//!     .limit(10);
//!
//! let compiled = select
//!     .render(&RenderContext::new(DriverType::MySQL))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(compiled.sql, "SELECT * FROM users WHERE age > ? LIMIT 10;");
//! ```

use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, Result};
use crate::result_set::ResultSet;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

pub mod alter;
pub mod condition;
pub mod custom;
pub mod database;
pub mod delete;
pub mod dialects;
pub mod drop;
pub mod index;
pub mod insert;
pub mod modifiers;
pub mod schema;
pub mod select;
pub mod table;
pub mod update;
pub mod writer;

pub use alter::{
    AddAttribute, ColumnPosition, DropTarget, ForeignKeyAction, RenameTarget, TableAlterAddAttribute,
    TableAlterAddColumn, TableAlterDropColumn, TableAlterForeignKey, TableAlterModifyType,
    TableAlterRename,
};
pub use condition::{Condition, ConditionType, Conditions, Operator};
pub use custom::Custom;
pub use database::{DatabaseCreate, DatabaseDrop};
pub use delete::Delete;
pub use drop::{DropBehavior, IdentityBehavior, TableDrop, TableTruncate};
pub use index::{CreateIndex, CreateMethode, DropIndex, IndexMethod, IndexType};
pub use insert::{Insert, InsertMethode, QueryEntry};
pub use modifiers::{Group, Limit, Order, OrderDirection};
pub use select::{Select, SelectFunction};
pub use table::TableCreate;
pub use update::{Update, UpdatePriority};
pub use writer::SqlWriter;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)*$")
        .expect("statements: invalid identifier regex")
});

/// Check that `value` is a usable identifier for `field`.
///
/// Empty values are reported as missing; anything else must be a plain or
/// dotted identifier.
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::missing_field(field));
    }
    if !IDENTIFIER.is_match(value) {
        return Err(Error::invalid_identifier(field, value));
    }
    Ok(())
}

/// Validate a list of identifiers that must contain at least one entry
pub fn validate_identifiers(field: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(Error::missing_field(field));
    }
    values.iter().try_for_each(|v| validate_identifier(field, v))
}

/// What a statement does, used by the coordinator to pick an execution path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    DatabaseCreate,
    DatabaseDrop,
    TableCreate,
    TableAlter,
    TableDrop,
    TableTruncate,
    CreateIndex,
    DropIndex,
    Insert,
    Update,
    Delete,
    Select,
    Custom,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::DatabaseCreate => "CREATE DATABASE",
            StatementKind::DatabaseDrop => "DROP DATABASE",
            StatementKind::TableCreate => "CREATE TABLE",
            StatementKind::TableAlter => "ALTER TABLE",
            StatementKind::TableDrop => "DROP TABLE",
            StatementKind::TableTruncate => "TRUNCATE TABLE",
            StatementKind::CreateIndex => "CREATE INDEX",
            StatementKind::DropIndex => "DROP INDEX",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Select => "SELECT",
            StatementKind::Custom => "CUSTOM",
        };
        f.write_str(name)
    }
}

/// Rendering options handed to every provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderContext {
    driver: Option<DriverType>,
    quote_identifiers: bool,
}

impl RenderContext {
    pub fn new(driver: DriverType) -> Self {
        Self {
            driver: Some(driver),
            quote_identifiers: false,
        }
    }

    /// A context with no driver; dialect-dependent providers refuse to render
    pub fn without_driver() -> Self {
        Self::default()
    }

    /// Quote every identifier with the dialect's quote character
    pub fn quote_identifiers(mut self, enabled: bool) -> Self {
        self.quote_identifiers = enabled;
        self
    }

    pub fn driver(&self) -> Option<DriverType> {
        self.driver
    }

    pub fn quotes_identifiers(&self) -> bool {
        self.quote_identifiers
    }

    pub fn require_driver(&self, statement: impl fmt::Display) -> Result<DriverType> {
        self.driver
            .ok_or_else(|| Error::missing_driver(statement.to_string()))
    }
}

/// Immutable render output: SQL text plus parameters in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl CompiledStatement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Per-statement outcome reported to the `after_query` callback
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub success: bool,
    pub rows_affected: u64,
    pub error: Option<String>,
}

impl QueryOutcome {
    pub fn success(rows_affected: u64) -> Self {
        Self {
            success: true,
            rows_affected,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            rows_affected: 0,
            error: Some(error.into()),
        }
    }
}

type AfterQuery = Box<dyn FnMut(&QueryOutcome) + Send>;
type OnResult = Box<dyn FnMut(&mut ResultSet) + Send>;

/// Callbacks attached to a statement
#[derive(Default)]
pub struct QueryHooks {
    after_query: Option<AfterQuery>,
    on_result: Option<OnResult>,
}

impl QueryHooks {
    pub fn set_after_query<F>(&mut self, callback: F)
    where
        F: FnMut(&QueryOutcome) + Send + 'static,
    {
        self.after_query = Some(Box::new(callback));
    }

    pub fn set_on_result<F>(&mut self, callback: F)
    where
        F: FnMut(&mut ResultSet) + Send + 'static,
    {
        self.on_result = Some(Box::new(callback));
    }

    pub fn notify(&mut self, outcome: &QueryOutcome) {
        if let Some(callback) = self.after_query.as_mut() {
            callback(outcome);
        }
    }

    pub fn deliver(&mut self, result_set: &mut ResultSet) {
        if let Some(callback) = self.on_result.as_mut() {
            callback(result_set);
        }
    }
}

impl fmt::Debug for QueryHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryHooks")
            .field("after_query", &self.after_query.is_some())
            .field("on_result", &self.on_result.is_some())
            .finish()
    }
}

/// Common contract of every statement builder
pub trait QueryProvider: Send {
    fn kind(&self) -> StatementKind;

    /// Whether the configured statement can run on `driver` at all
    fn compatibility(&self, driver: DriverType) -> bool;

    /// Render SQL and parameters. `Ok(None)` means the statement is
    /// deliberately skipped.
    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>>;

    fn hooks(&mut self) -> &mut QueryHooks;

    /// Whether execution produces rows that go to `on_result`
    fn returns_rows(&self) -> bool {
        self.kind() == StatementKind::Select
    }

    /// Statements to run on the same connection once this one succeeded
    fn follow_ups(&self, _driver: DriverType) -> Result<Vec<Box<dyn QueryProvider>>> {
        Ok(Vec::new())
    }

    /// Whether the statement may run inside a transaction block
    fn transactional(&self, _driver: DriverType) -> bool {
        true
    }

    fn generate_sql_string(&self, ctx: &RenderContext) -> Result<Option<String>> {
        Ok(self.render(ctx)?.map(|compiled| compiled.sql))
    }

    fn parameters(&self, ctx: &RenderContext) -> Result<Vec<SqlValue>> {
        Ok(self
            .render(ctx)?
            .map(|compiled| compiled.params)
            .unwrap_or_default())
    }
}

/// Adds the fluent `after_query` setter to providers
macro_rules! after_query_setter {
    ($($provider:ty),+ $(,)?) => {
        $(
            impl $provider {
                /// Callback invoked with the statement's outcome after execution
                pub fn after_query<F>(mut self, callback: F) -> Self
                where
                    F: FnMut(&$crate::statements::QueryOutcome) + Send + 'static,
                {
                    self.hooks.set_after_query(callback);
                    self
                }
            }
        )+
    };
}

after_query_setter!(
    DatabaseCreate,
    DatabaseDrop,
    TableCreate,
    TableAlterAddColumn,
    TableAlterAddAttribute,
    TableAlterDropColumn,
    TableAlterModifyType,
    TableAlterRename,
    TableAlterForeignKey,
    TableDrop,
    TableTruncate,
    CreateIndex,
    DropIndex,
    Insert,
    Update,
    Delete,
    Select,
    Custom,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("table", "users").is_ok());
        assert!(validate_identifier("table", "app.users").is_ok());
        assert!(validate_identifier("column", "price$usd").is_ok());

        assert!(matches!(
            validate_identifier("table", ""),
            Err(Error::MissingField { .. })
        ));
        assert!(matches!(
            validate_identifier("table", "users; DROP TABLE x"),
            Err(Error::InvalidIdentifier { .. })
        ));
        assert!(validate_identifier("table", "1users").is_err());
        assert!(validate_identifier("table", "users.").is_err());
        assert!(validate_identifiers("columns", &[]).is_err());
    }

    #[test]
    fn test_require_driver() {
        let err = RenderContext::without_driver()
            .require_driver(StatementKind::Select)
            .unwrap_err();
        assert!(matches!(err, Error::MissingDriver(_)));
        assert!(err.to_string().contains("SELECT"));

        let ctx = RenderContext::new(DriverType::SQLite).quote_identifiers(true);
        assert_eq!(ctx.driver(), Some(DriverType::SQLite));
        assert!(ctx.quotes_identifiers());
    }

    #[test]
    fn test_hooks_fire() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut hooks = QueryHooks::default();
        hooks.notify(&QueryOutcome::success(1));
        hooks.set_after_query(move |outcome| sink.lock().unwrap().push(outcome.success));
        hooks.notify(&QueryOutcome::failure("boom"));

        assert_eq!(*seen.lock().unwrap(), vec![false]);
    }
}
