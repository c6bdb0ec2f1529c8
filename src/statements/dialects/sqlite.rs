//! SQLite dialect implementation
//!
//! SQLite resolves declared types through affinity, so most type names are
//! kept readable (`VARCHAR(255)`, `DATETIME`) rather than collapsed to the
//! five storage classes.

use super::{bare_type, on_conflict_syntax, sized_type, SqlDialect};
use crate::driver::DriverType;
use crate::error::{Error, Result};
use crate::statements::schema::{DataType, DataTypeParameter};

/// SQLite dialect
pub struct SQLiteDialect;

impl SQLiteDialect {
    /// Create a new SQLite dialect
    pub fn new() -> Self {
        Self
    }
}

impl Default for SQLiteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for SQLiteDialect {
    fn driver(&self) -> DriverType {
        DriverType::SQLite
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        super::quote_with(identifier, '"')
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn limit_syntax(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {} OFFSET {}", limit, offset),
            (Some(limit), None) => format!(" LIMIT {}", limit),
            (None, Some(offset)) => format!(" LIMIT -1 OFFSET {}", offset),
            (None, None) => String::new(),
        }
    }

    fn upsert_syntax(
        &self,
        conflict_columns: &[String],
        update_columns: &[String],
    ) -> Result<String> {
        on_conflict_syntax(DriverType::SQLite, conflict_columns, update_columns)
    }

    fn type_name(
        &self,
        data_type: DataType,
        parameter: Option<&DataTypeParameter>,
    ) -> Result<String> {
        let driver = DriverType::SQLite;
        match data_type {
            DataType::TinyInt
            | DataType::SmallInt
            | DataType::MediumInt
            | DataType::Integer
            | DataType::BigInt => bare_type(driver, "INTEGER", data_type, parameter),
            DataType::Float | DataType::Double => bare_type(driver, "REAL", data_type, parameter),
            DataType::Decimal => sized_type(driver, "NUMERIC", data_type, parameter, None),
            DataType::Boolean => bare_type(driver, self.boolean_type(), data_type, parameter),
            DataType::Char => sized_type(driver, "CHAR", data_type, parameter, Some(1)),
            DataType::VarChar => sized_type(driver, "VARCHAR", data_type, parameter, Some(255)),
            DataType::TinyText
            | DataType::Text
            | DataType::MediumText
            | DataType::LongText
            | DataType::Json
            | DataType::Uuid => bare_type(driver, "TEXT", data_type, parameter),
            DataType::Blob => bare_type(driver, "BLOB", data_type, parameter),
            DataType::Date => bare_type(driver, "DATE", data_type, parameter),
            DataType::Time => bare_type(driver, "TIME", data_type, parameter),
            DataType::DateTime => bare_type(driver, "DATETIME", data_type, parameter),
            DataType::Timestamp => bare_type(driver, "TIMESTAMP", data_type, parameter),
            DataType::Enum => Err(Error::unsupported(driver, "ENUM column type")),
        }
    }

    fn auto_increment_syntax(&self, data_type: DataType, _type_name: &str) -> Result<String> {
        // AUTOINCREMENT is only legal on the INTEGER PRIMARY KEY rowid alias
        if !data_type.is_integer() {
            return Err(Error::invalid_syntax(
                DriverType::SQLite,
                format!("AUTOINCREMENT requires an integer column, got {:?}", data_type),
            ));
        }
        Ok("INTEGER PRIMARY KEY AUTOINCREMENT".to_string())
    }

    fn boolean_type(&self) -> &'static str {
        "INTEGER"
    }

    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }
}
