//! MySQL / MariaDB value binding and row conversion

use super::value::SqlValue;
use crate::error::{Error, Result};
use crate::result_set::Row as ResultRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlColumn, MySqlRow};
use sqlx::{Column, MySql, Row, TypeInfo, ValueRef};

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

/// MySQL type converter, shared by MariaDB
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlTypeConverter;

impl MySqlTypeConverter {
    fn column_error(column: &MySqlColumn, what: &str, e: sqlx::Error) -> Error {
        Error::database_query(format!(
            "Failed to extract {} from column '{}' (MySQL type: '{}'): {}",
            what,
            column.name(),
            column.type_info().name(),
            e
        ))
    }

    /// TINYINT(1) is how MySQL spells BOOLEAN
    fn extract_boolean(row: &MySqlRow, index: usize) -> Result<SqlValue> {
        if let Ok(val) = row.try_get::<bool, _>(index) {
            return Ok(SqlValue::Bool(val));
        }
        if let Ok(val) = row.try_get::<i8, _>(index) {
            return Ok(SqlValue::Bool(val != 0));
        }
        log::warn!(
            "Could not extract BOOLEAN at index {}, defaulting to false",
            index
        );
        Ok(SqlValue::Bool(false))
    }

    fn extract_datetime(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        if let Ok(dt) = row.try_get::<NaiveDateTime, _>(index) {
            return Ok(SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        // TIMESTAMP columns decode as UTC datetimes
        if let Ok(dt) = row.try_get::<DateTime<chrono::Utc>, _>(index) {
            return Ok(SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string()));
        }
        row.try_get::<String, _>(index)
            .map(SqlValue::DateTime)
            .map_err(|e| Self::column_error(column, "datetime", e))
    }

    fn extract_decimal(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        #[cfg(feature = "decimal")]
        {
            row.try_get::<rust_decimal::Decimal, _>(index)
                .map(SqlValue::Decimal)
                .map_err(|e| Self::column_error(column, "decimal", e))
        }
        #[cfg(not(feature = "decimal"))]
        {
            row.try_get::<String, _>(index)
                .map(SqlValue::Decimal)
                .map_err(|e| Self::column_error(column, "decimal", e))
        }
    }

    fn extract(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        let type_name = column.type_info().name().to_uppercase();
        let get_err = |what: &'static str| move |e: sqlx::Error| Self::column_error(column, what, e);

        match type_name.as_str() {
            "BOOLEAN" | "BOOL" => Self::extract_boolean(row, index),
            "TINYINT" => row.try_get::<i8, _>(index).map(SqlValue::TinyInt).map_err(get_err("tinyint")),
            "SMALLINT" => row.try_get::<i16, _>(index).map(SqlValue::SmallInt).map_err(get_err("smallint")),
            "MEDIUMINT" | "INT" | "INTEGER" => {
                row.try_get::<i32, _>(index).map(SqlValue::Int).map_err(get_err("int"))
            }
            "BIGINT" => row.try_get::<i64, _>(index).map(SqlValue::BigInt).map_err(get_err("bigint")),
            "TINYINT UNSIGNED" => row
                .try_get::<u8, _>(index)
                .map(SqlValue::UnsignedTinyInt)
                .map_err(get_err("tinyint unsigned")),
            "SMALLINT UNSIGNED" => row
                .try_get::<u16, _>(index)
                .map(SqlValue::UnsignedSmallInt)
                .map_err(get_err("smallint unsigned")),
            "MEDIUMINT UNSIGNED" | "INT UNSIGNED" => row
                .try_get::<u32, _>(index)
                .map(SqlValue::UnsignedInt)
                .map_err(get_err("int unsigned")),
            "BIGINT UNSIGNED" => row
                .try_get::<u64, _>(index)
                .map(SqlValue::UnsignedBigInt)
                .map_err(get_err("bigint unsigned")),
            "FLOAT" => row.try_get::<f32, _>(index).map(SqlValue::Float).map_err(get_err("float")),
            "DOUBLE" | "REAL" => row.try_get::<f64, _>(index).map(SqlValue::Double).map_err(get_err("double")),
            "DECIMAL" | "NUMERIC" => Self::extract_decimal(row, index, column),
            "JSON" => row.try_get::<JsonValue, _>(index).map(SqlValue::Json).map_err(get_err("JSON")),
            "DATE" => match row.try_get::<NaiveDate, _>(index) {
                Ok(date) => Ok(SqlValue::Date(date.to_string())),
                Err(e) => Err(Self::column_error(column, "date", e)),
            },
            "TIME" => match row.try_get::<NaiveTime, _>(index) {
                Ok(time) => Ok(SqlValue::Time(time.to_string())),
                Err(_) => row.try_get::<String, _>(index).map(SqlValue::Time).map_err(get_err("time")),
            },
            "DATETIME" | "TIMESTAMP" => Self::extract_datetime(row, index, column),
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => {
                row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes).map_err(get_err("binary"))
            }
            _ => {
                // VARCHAR, CHAR, TEXT variants, ENUM, SET
                if let Ok(s) = row.try_get::<String, _>(index) {
                    return Ok(SqlValue::String(s));
                }
                log::debug!(
                    "Falling back to bytes for column '{}' of MySQL type '{}'",
                    column.name(),
                    type_name
                );
                row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes).map_err(get_err("value"))
            }
        }
    }

    /// Convert one fetched row into column -> value pairs
    pub fn row_to_values(row: &MySqlRow) -> Result<ResultRow> {
        let mut values = ResultRow::with_capacity(row.columns().len());
        for (index, column) in row.columns().iter().enumerate() {
            let null = row
                .try_get_raw(index)
                .map_err(|e| Self::column_error(column, "raw value", e))?
                .is_null();
            let value = if null {
                SqlValue::Null
            } else {
                Self::extract(row, index, column)?
            };
            log::trace!("MySQL column {} = {:?}", column.name(), value);
            values.insert(column.name().to_string(), value);
        }
        Ok(values)
    }

    /// Bind a SqlValue to a MySQL query
    pub fn bind_param(query: MySqlQuery<'_>, value: SqlValue) -> Result<MySqlQuery<'_>> {
        Ok(match value {
            // MySQL accepts NULL for any type
            SqlValue::Null => query.bind(None::<Vec<u8>>),
            SqlValue::Bool(b) => query.bind(b),

            SqlValue::TinyInt(i) => query.bind(i),
            SqlValue::SmallInt(i) => query.bind(i),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            SqlValue::UnsignedTinyInt(i) => query.bind(i),
            SqlValue::UnsignedSmallInt(i) => query.bind(i),
            SqlValue::UnsignedInt(i) => query.bind(i),
            SqlValue::UnsignedBigInt(i) => query.bind(i),

            SqlValue::Float(f) => query.bind(f),
            SqlValue::Double(f) => query.bind(f),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => query.bind(d),
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => query.bind(s),

            SqlValue::String(s) | SqlValue::Text(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),
            // UUIDs live in CHAR(36) columns
            SqlValue::Uuid(s) => query.bind(s),
            SqlValue::Json(j) => query.bind(j),
            SqlValue::Date(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                Ok(date) => query.bind(date),
                Err(_) => query.bind(s),
            },
            SqlValue::Time(s) => match NaiveTime::parse_from_str(&s, "%H:%M:%S%.f") {
                Ok(time) => query.bind(time),
                Err(_) => query.bind(s),
            },
            SqlValue::DateTime(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    query.bind(dt.naive_utc())
                } else if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f") {
                    query.bind(ndt)
                } else {
                    query.bind(s)
                }
            }
            SqlValue::Timestamp(ts) => match DateTime::from_timestamp(ts, 0) {
                Some(dt) => query.bind(dt.naive_utc()),
                None => query.bind(ts),
            },

            SqlValue::Default | SqlValue::Raw(_) | SqlValue::List(_) => {
                return Err(Error::internal(format!(
                    "{:?} is written into the SQL text and cannot be bound",
                    value
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_values_are_not_bindable() {
        let query = sqlx::query::<MySql>("SELECT ?");
        assert!(MySqlTypeConverter::bind_param(query, SqlValue::raw("NOW()")).is_err());
        let query = sqlx::query::<MySql>("SELECT ?");
        assert!(MySqlTypeConverter::bind_param(query, SqlValue::Int(1)).is_ok());
    }
}
