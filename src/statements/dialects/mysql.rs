//! MySQL/MariaDB dialect implementation
//!
//! MySQL and MariaDB share this dialect. The few grammar differences between
//! them (e.g. `DROP INDEX IF EXISTS`) are handled by the providers.

use super::{bare_type, parameter_mismatch, sized_type, SqlDialect};
use crate::driver::DriverType;
use crate::error::{Error, Result};
use crate::statements::schema::{DataType, DataTypeParameter};

/// Largest row count MySQL accepts, used for OFFSET without LIMIT
const MAX_ROWS: &str = "18446744073709551615";

/// MySQL/MariaDB dialect
pub struct MySQLDialect {
    driver: DriverType,
}

impl MySQLDialect {
    /// Create a new MySQL family dialect
    pub fn new(driver: DriverType) -> Self {
        Self { driver }
    }
}

impl Default for MySQLDialect {
    fn default() -> Self {
        Self::new(DriverType::MySQL)
    }
}

impl SqlDialect for MySQLDialect {
    fn driver(&self) -> DriverType {
        self.driver
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        super::quote_with(identifier, '`')
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn limit_syntax(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (Some(limit), Some(offset)) => format!(" LIMIT {} OFFSET {}", limit, offset),
            (Some(limit), None) => format!(" LIMIT {}", limit),
            (None, Some(offset)) => format!(" LIMIT {} OFFSET {}", MAX_ROWS, offset),
            (None, None) => String::new(),
        }
    }

    fn upsert_syntax(
        &self,
        _conflict_columns: &[String],
        update_columns: &[String],
    ) -> Result<String> {
        if update_columns.is_empty() {
            return Err(Error::invalid_syntax(
                self.driver,
                "ON DUPLICATE KEY UPDATE needs at least one column to update",
            ));
        }
        Ok(format!(
            " ON DUPLICATE KEY UPDATE {}",
            update_columns
                .iter()
                .map(|col| format!("{} = VALUES({})", col, col))
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn type_name(
        &self,
        data_type: DataType,
        parameter: Option<&DataTypeParameter>,
    ) -> Result<String> {
        let driver = self.driver;
        match data_type {
            DataType::TinyInt => sized_type(driver, "TINYINT", data_type, parameter, None),
            DataType::SmallInt => sized_type(driver, "SMALLINT", data_type, parameter, None),
            DataType::MediumInt => sized_type(driver, "MEDIUMINT", data_type, parameter, None),
            DataType::Integer => sized_type(driver, "INTEGER", data_type, parameter, None),
            DataType::BigInt => sized_type(driver, "BIGINT", data_type, parameter, None),
            DataType::Float => sized_type(driver, "FLOAT", data_type, parameter, None),
            DataType::Double => sized_type(driver, "DOUBLE", data_type, parameter, None),
            DataType::Decimal => sized_type(driver, "DECIMAL", data_type, parameter, None),
            DataType::Boolean => bare_type(driver, self.boolean_type(), data_type, parameter),
            DataType::Char => sized_type(driver, "CHAR", data_type, parameter, Some(1)),
            DataType::VarChar => sized_type(driver, "VARCHAR", data_type, parameter, Some(255)),
            DataType::TinyText => bare_type(driver, "TINYTEXT", data_type, parameter),
            DataType::Text => bare_type(driver, "TEXT", data_type, parameter),
            DataType::MediumText => bare_type(driver, "MEDIUMTEXT", data_type, parameter),
            DataType::LongText => bare_type(driver, "LONGTEXT", data_type, parameter),
            DataType::Blob => bare_type(driver, "BLOB", data_type, parameter),
            DataType::Date => bare_type(driver, "DATE", data_type, parameter),
            DataType::Time => bare_type(driver, "TIME", data_type, parameter),
            DataType::DateTime => bare_type(driver, "DATETIME", data_type, parameter),
            DataType::Timestamp => bare_type(driver, "TIMESTAMP", data_type, parameter),
            DataType::Json => bare_type(driver, "JSON", data_type, parameter),
            DataType::Uuid => bare_type(driver, "CHAR(36)", data_type, parameter),
            DataType::Enum => match parameter {
                Some(DataTypeParameter::Values(values)) if !values.is_empty() => Ok(format!(
                    "ENUM({})",
                    values
                        .iter()
                        .map(|v| format!("'{}'", v.replace('\'', "''")))
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
                _ => Err(parameter_mismatch(driver, data_type)),
            },
        }
    }

    fn auto_increment_syntax(&self, data_type: DataType, type_name: &str) -> Result<String> {
        if !data_type.is_integer() {
            return Err(Error::invalid_syntax(
                self.driver,
                format!("AUTO_INCREMENT requires an integer column, got {:?}", data_type),
            ));
        }
        Ok(format!("{} AUTO_INCREMENT", type_name))
    }

    fn boolean_type(&self) -> &'static str {
        "TINYINT(1)"
    }

    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }
}
