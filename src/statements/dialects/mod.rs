//! Database dialect implementations for the statement providers
//!
//! This module contains database-specific SQL generation logic, separated
//! by database type. Providers keep their own per-statement branching; the
//! dialects cover what every statement shares: identifier quoting,
//! placeholders, pagination and column type names.

use crate::driver::DriverType;
use crate::error::{Error, Result};
use crate::statements::schema::{DataType, DataTypeParameter};

/// Trait for database-specific SQL generation
pub trait SqlDialect: Send + Sync {
    /// The engine this dialect renders for
    fn driver(&self) -> DriverType;

    /// Quote an identifier (table name, column name) for this database
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Generate a parameter placeholder for the given position (1-based)
    fn placeholder(&self, position: usize) -> String;

    /// Generate LIMIT/OFFSET syntax for this database
    fn limit_syntax(&self, limit: Option<u64>, offset: Option<u64>) -> String;

    /// Generate the upsert tail of an INSERT statement.
    ///
    /// Both column lists arrive already formatted as identifiers.
    fn upsert_syntax(&self, conflict_columns: &[String], update_columns: &[String])
        -> Result<String>;

    /// Column type name for a data type and its optional parameter
    fn type_name(&self, data_type: DataType, parameter: Option<&DataTypeParameter>)
        -> Result<String>;

    /// Column type for an auto-incrementing key
    fn auto_increment_syntax(&self, data_type: DataType, type_name: &str) -> Result<String>;

    /// Get the boolean type name for this database
    fn boolean_type(&self) -> &'static str;

    /// Get the current timestamp expression for this database
    fn current_timestamp(&self) -> &'static str;
}

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySQLDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SQLiteDialect;

/// Factory function to create the appropriate dialect for a driver
pub fn create_dialect(driver: DriverType) -> Box<dyn SqlDialect> {
    match driver {
        DriverType::PostgreSQL => Box::new(PostgresDialect::new()),
        DriverType::MySQL | DriverType::MariaDB => Box::new(MySQLDialect::new(driver)),
        DriverType::SQLite => Box::new(SQLiteDialect::new()),
    }
}

/// Quote with `quote`, doubling embedded quote characters. Qualified names
/// (`table.column`) are left as-is.
pub(crate) fn quote_with(identifier: &str, quote: char) -> String {
    if identifier.contains('.') {
        identifier.to_string()
    } else {
        let doubled: String = [quote, quote].iter().collect();
        format!(
            "{q}{}{q}",
            identifier.replace(quote, &doubled),
            q = quote
        )
    }
}

/// Render `NAME(n)`, `NAME(p,s)` or `NAME`, falling back to `default_length`
pub(crate) fn sized_type(
    driver: DriverType,
    name: &str,
    data_type: DataType,
    parameter: Option<&DataTypeParameter>,
    default_length: Option<u32>,
) -> Result<String> {
    match (parameter, default_length) {
        (Some(DataTypeParameter::Length(length)), _) => Ok(format!("{}({})", name, length)),
        (Some(DataTypeParameter::Precision(precision, scale)), _) => {
            if scale > precision {
                return Err(Error::invalid_syntax(
                    driver,
                    format!("{:?} scale {} exceeds precision {}", data_type, scale, precision),
                ));
            }
            Ok(format!("{}({},{})", name, precision, scale))
        }
        (Some(DataTypeParameter::Values(_)), _) => Err(parameter_mismatch(driver, data_type)),
        (None, Some(length)) => Ok(format!("{}({})", name, length)),
        (None, None) => Ok(name.to_string()),
    }
}

/// A type that takes no parameter at all on this driver
pub(crate) fn bare_type(
    driver: DriverType,
    name: &str,
    data_type: DataType,
    parameter: Option<&DataTypeParameter>,
) -> Result<String> {
    match parameter {
        None => Ok(name.to_string()),
        Some(_) => Err(parameter_mismatch(driver, data_type)),
    }
}

pub(crate) fn parameter_mismatch(driver: DriverType, data_type: DataType) -> Error {
    Error::invalid_syntax(
        driver,
        format!("{:?} does not accept this type parameter", data_type),
    )
}

/// `ON CONFLICT (...) DO UPDATE SET c = EXCLUDED.c`, shared by PostgreSQL and SQLite
pub(crate) fn on_conflict_syntax(
    driver: DriverType,
    conflict_columns: &[String],
    update_columns: &[String],
) -> Result<String> {
    if conflict_columns.is_empty() {
        return Err(Error::invalid_syntax(
            driver,
            "upsert requires conflict columns",
        ));
    }
    if update_columns.is_empty() {
        return Ok(format!(
            " ON CONFLICT ({}) DO NOTHING",
            conflict_columns.join(", ")
        ));
    }
    Ok(format!(
        " ON CONFLICT ({}) DO UPDATE SET {}",
        conflict_columns.join(", "),
        update_columns
            .iter()
            .map(|col| format!("{} = EXCLUDED.{}", col, col))
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_per_driver() {
        assert_eq!(create_dialect(DriverType::MySQL).placeholder(3), "?");
        assert_eq!(create_dialect(DriverType::SQLite).placeholder(3), "?");
        assert_eq!(create_dialect(DriverType::PostgreSQL).placeholder(3), "$3");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(create_dialect(DriverType::MariaDB).quote_identifier("order"), "`order`");
        assert_eq!(
            create_dialect(DriverType::PostgreSQL).quote_identifier("we\"ird"),
            "\"we\"\"ird\""
        );
        assert_eq!(
            create_dialect(DriverType::SQLite).quote_identifier("users.id"),
            "users.id"
        );
    }

    #[test]
    fn test_offset_without_limit() {
        assert_eq!(
            create_dialect(DriverType::MySQL).limit_syntax(None, Some(5)),
            " LIMIT 18446744073709551615 OFFSET 5"
        );
        assert_eq!(
            create_dialect(DriverType::SQLite).limit_syntax(None, Some(5)),
            " LIMIT -1 OFFSET 5"
        );
        assert_eq!(
            create_dialect(DriverType::PostgreSQL).limit_syntax(None, Some(5)),
            " OFFSET 5"
        );
        assert_eq!(create_dialect(DriverType::PostgreSQL).limit_syntax(None, None), "");
    }

    #[test]
    fn test_on_conflict() {
        let sql = on_conflict_syntax(
            DriverType::PostgreSQL,
            &["id".to_string()],
            &["name".to_string()],
        )
        .unwrap();
        assert_eq!(sql, " ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name");

        let sql = on_conflict_syntax(DriverType::SQLite, &["id".to_string()], &[]).unwrap();
        assert_eq!(sql, " ON CONFLICT (id) DO NOTHING");

        assert!(on_conflict_syntax(DriverType::SQLite, &[], &["name".to_string()]).is_err());
    }
}
