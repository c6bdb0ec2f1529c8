//! RustF Query - dialect-aware SQL statements with a batching executor
//!
//! RustF Query provides:
//! - Fluent builders for DDL and DML statements (tables, indexes, databases,
//!   SELECT / INSERT / UPDATE / DELETE and custom SQL)
//! - Rendering for MySQL, MariaDB, PostgreSQL and SQLite with bound parameters
//! - A [`Query`] coordinator that batches statements sharing the same SQL,
//!   wraps them in a transaction and reports per-statement outcomes
//! - sqlx-backed adapters and a [`ResultSet`] cursor for fetched rows

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod database;
pub mod driver;
pub mod error;
pub mod query;
pub mod result_set;
pub mod statements;

// Re-export main types for public API
pub use database::{
    connect, DatabaseAdapter, DatabaseConnection, DatabaseConnectionConfig, QueryConfig,
    QueryDefaults, QueryResult, SqlValue,
};
pub use driver::DriverType;
pub use error::{Error, ErrorContext, Result};
pub use query::{Query, QueryHandle};
pub use result_set::{CursorPosition, ResultSet, Row};
pub use statements::{
    CompiledStatement, QueryOutcome, QueryProvider, RenderContext, StatementKind,
};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::database::{connect, DatabaseAdapter, DatabaseConnection, SqlValue};
    pub use crate::driver::DriverType;
    pub use crate::error::{Error, ErrorContext, Result};
    pub use crate::query::{Query, QueryHandle};
    pub use crate::result_set::{ResultSet, Row};

    // Statement builders
    pub use crate::statements::schema::{
        Column, ColumnType, DataType, ForeignKey, ReferentialAction, TableConstraint,
    };
    pub use crate::statements::{
        Condition, ConditionType, Conditions, CreateIndex, Custom, DatabaseCreate, DatabaseDrop,
        Delete, DropIndex, Insert, InsertMethode, Operator, OrderDirection, QueryOutcome,
        QueryProvider, RenderContext, Select, SelectFunction, TableAlterAddAttribute,
        TableAlterAddColumn, TableAlterDropColumn, TableAlterForeignKey, TableAlterModifyType,
        TableAlterRename, TableCreate, TableDrop, TableTruncate, Update, UpdatePriority,
    };
}
