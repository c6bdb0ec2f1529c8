//! PostgreSQL dialect implementation
//!
//! Numbered placeholders (`$1`, `$2`, ...), SERIAL keys and the PostgreSQL
//! spelling of the column types.

use super::{bare_type, on_conflict_syntax, sized_type, SqlDialect};
use crate::driver::DriverType;
use crate::error::{Error, Result};
use crate::statements::schema::{DataType, DataTypeParameter};

/// PostgreSQL dialect
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect
    pub fn new() -> Self {
        Self
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlDialect for PostgresDialect {
    fn driver(&self) -> DriverType {
        DriverType::PostgreSQL
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        super::quote_with(identifier, '"')
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn limit_syntax(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let mut sql = String::new();
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }

    fn upsert_syntax(
        &self,
        conflict_columns: &[String],
        update_columns: &[String],
    ) -> Result<String> {
        on_conflict_syntax(DriverType::PostgreSQL, conflict_columns, update_columns)
    }

    fn type_name(
        &self,
        data_type: DataType,
        parameter: Option<&DataTypeParameter>,
    ) -> Result<String> {
        let driver = DriverType::PostgreSQL;
        match data_type {
            // No single-byte integer in PostgreSQL
            DataType::TinyInt | DataType::SmallInt => {
                bare_type(driver, "SMALLINT", data_type, parameter)
            }
            DataType::MediumInt | DataType::Integer => {
                bare_type(driver, "INTEGER", data_type, parameter)
            }
            DataType::BigInt => bare_type(driver, "BIGINT", data_type, parameter),
            DataType::Float => bare_type(driver, "REAL", data_type, parameter),
            DataType::Double => bare_type(driver, "DOUBLE PRECISION", data_type, parameter),
            DataType::Decimal => sized_type(driver, "NUMERIC", data_type, parameter, None),
            DataType::Boolean => bare_type(driver, self.boolean_type(), data_type, parameter),
            DataType::Char => sized_type(driver, "CHAR", data_type, parameter, Some(1)),
            DataType::VarChar => sized_type(driver, "VARCHAR", data_type, parameter, Some(255)),
            DataType::TinyText | DataType::Text | DataType::MediumText | DataType::LongText => {
                bare_type(driver, "TEXT", data_type, parameter)
            }
            DataType::Blob => bare_type(driver, "BYTEA", data_type, parameter),
            DataType::Date => bare_type(driver, "DATE", data_type, parameter),
            DataType::Time => bare_type(driver, "TIME", data_type, parameter),
            DataType::DateTime => bare_type(driver, "TIMESTAMP", data_type, parameter),
            DataType::Timestamp => bare_type(driver, "TIMESTAMPTZ", data_type, parameter),
            DataType::Json => bare_type(driver, "JSONB", data_type, parameter),
            DataType::Uuid => bare_type(driver, "UUID", data_type, parameter),
            DataType::Enum => Err(Error::unsupported(
                driver,
                "inline ENUM column type (create a named type instead)",
            )),
        }
    }

    fn auto_increment_syntax(&self, data_type: DataType, _type_name: &str) -> Result<String> {
        match data_type {
            DataType::TinyInt | DataType::SmallInt => Ok("SMALLSERIAL".to_string()),
            DataType::MediumInt | DataType::Integer => Ok("SERIAL".to_string()),
            DataType::BigInt => Ok("BIGSERIAL".to_string()),
            other => Err(Error::invalid_syntax(
                DriverType::PostgreSQL,
                format!("SERIAL requires an integer column, got {:?}", other),
            )),
        }
    }

    fn boolean_type(&self) -> &'static str {
        "BOOLEAN"
    }

    fn current_timestamp(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_types() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect.auto_increment_syntax(DataType::Integer, "INTEGER").unwrap(),
            "SERIAL"
        );
        assert_eq!(
            dialect.auto_increment_syntax(DataType::BigInt, "BIGINT").unwrap(),
            "BIGSERIAL"
        );
        assert!(dialect.auto_increment_syntax(DataType::Uuid, "UUID").is_err());
    }

    #[test]
    fn test_type_names() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.type_name(DataType::Blob, None).unwrap(), "BYTEA");
        assert_eq!(dialect.type_name(DataType::Json, None).unwrap(), "JSONB");
        assert_eq!(
            dialect.type_name(DataType::Double, None).unwrap(),
            "DOUBLE PRECISION"
        );
        assert!(dialect
            .type_name(DataType::Integer, Some(&DataTypeParameter::Length(11)))
            .is_err());
        assert!(matches!(
            dialect.type_name(DataType::Enum, None),
            Err(Error::UnsupportedFeature { .. })
        ));
    }
}
