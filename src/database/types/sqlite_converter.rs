//! SQLite value binding and row conversion

use super::value::SqlValue;
use crate::error::{Error, Result};
use crate::result_set::Row as ResultRow;
use chrono::DateTime;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// SQLite type converter
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteTypeConverter;

/// SQLite type affinity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SqliteAffinity {
    Text,
    Numeric,
    Integer,
    Real,
    Blob,
}

impl SqliteTypeConverter {
    /// Determine the SQLite type affinity
    fn type_affinity(type_name: &str) -> SqliteAffinity {
        let upper = type_name.to_uppercase();

        // https://www.sqlite.org/datatype3.html, section 3.1
        if upper.contains("INT") {
            SqliteAffinity::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            SqliteAffinity::Text
        } else if upper.contains("BLOB") {
            SqliteAffinity::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            SqliteAffinity::Real
        } else {
            SqliteAffinity::Numeric
        }
    }

    fn integer(val: i64) -> SqlValue {
        i32::try_from(val)
            .map(SqlValue::Int)
            .unwrap_or(SqlValue::BigInt(val))
    }

    fn extract(row: &SqliteRow, index: usize, type_name: &str) -> Result<SqlValue> {
        let fail = |e: sqlx::Error| {
            Error::database_query(format!(
                "Failed to read SQLite column {} ({}): {}",
                index, type_name, e
            ))
        };

        match type_name.to_uppercase().as_str() {
            "BOOLEAN" | "BOOL" => return Ok(SqlValue::Bool(row.try_get::<bool, _>(index).map_err(fail)?)),
            "DATE" => return Ok(SqlValue::Date(row.try_get::<String, _>(index).map_err(fail)?)),
            "TIME" => return Ok(SqlValue::Time(row.try_get::<String, _>(index).map_err(fail)?)),
            "DATETIME" | "TIMESTAMP" => {
                return Ok(SqlValue::DateTime(row.try_get::<String, _>(index).map_err(fail)?))
            }
            _ => {}
        }

        match Self::type_affinity(type_name) {
            SqliteAffinity::Integer => Ok(Self::integer(row.try_get::<i64, _>(index).map_err(fail)?)),
            SqliteAffinity::Text => Ok(SqlValue::String(row.try_get::<String, _>(index).map_err(fail)?)),
            SqliteAffinity::Real => Ok(SqlValue::Double(row.try_get::<f64, _>(index).map_err(fail)?)),
            SqliteAffinity::Blob => Ok(SqlValue::Bytes(row.try_get::<Vec<u8>, _>(index).map_err(fail)?)),
            SqliteAffinity::Numeric => {
                // NUMERIC affinity can hold INTEGER, REAL or TEXT storage
                if let Ok(val) = row.try_get::<i64, _>(index) {
                    Ok(Self::integer(val))
                } else if let Ok(val) = row.try_get::<f64, _>(index) {
                    Ok(SqlValue::Double(val))
                } else if let Ok(val) = row.try_get::<String, _>(index) {
                    #[cfg(feature = "decimal")]
                    {
                        Ok(val
                            .parse::<rust_decimal::Decimal>()
                            .map(SqlValue::Decimal)
                            .unwrap_or(SqlValue::String(val)))
                    }
                    #[cfg(not(feature = "decimal"))]
                    Ok(SqlValue::Decimal(val))
                } else {
                    row.try_get::<Vec<u8>, _>(index)
                        .map(SqlValue::Bytes)
                        .map_err(fail)
                }
            }
        }
    }

    /// Convert one fetched row into column -> value pairs
    pub fn row_to_values(row: &SqliteRow) -> Result<ResultRow> {
        let mut values = ResultRow::with_capacity(row.columns().len());
        for (index, column) in row.columns().iter().enumerate() {
            let raw = row.try_get_raw(index).map_err(|e| {
                Error::database_query(format!("Failed to get raw value at column {}: {}", index, e))
            })?;
            let value = if raw.is_null() {
                SqlValue::Null
            } else {
                // Expression columns report the storage class of the value
                let type_name = raw.type_info().name().to_string();
                let declared = column.type_info().name();
                let type_name = if declared == "NULL" { type_name.as_str() } else { declared };
                Self::extract(row, index, type_name)?
            };
            log::trace!("SQLite column {} = {:?}", column.name(), value);
            values.insert(column.name().to_string(), value);
        }
        Ok(values)
    }

    /// Bind a SqlValue to a SQLite query
    pub fn bind_param(query: SqliteQuery<'_>, value: SqlValue) -> Result<SqliteQuery<'_>> {
        Ok(match value {
            SqlValue::Null => query.bind(None::<i32>),
            SqlValue::Bool(b) => query.bind(b),

            SqlValue::TinyInt(i) => query.bind(i as i32),
            SqlValue::SmallInt(i) => query.bind(i as i32),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            SqlValue::UnsignedTinyInt(i) => query.bind(i as i32),
            SqlValue::UnsignedSmallInt(i) => query.bind(i as i32),
            SqlValue::UnsignedInt(i) => query.bind(i as i64),
            // INTEGER is signed 64-bit; larger values are kept as text
            SqlValue::UnsignedBigInt(i) => match i64::try_from(i) {
                Ok(i) => query.bind(i),
                Err(_) => query.bind(i.to_string()),
            },

            SqlValue::Float(f) => query.bind(f as f64),
            SqlValue::Double(f) => query.bind(f),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => query.bind(d.to_string()),
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => query.bind(s),

            SqlValue::String(s) | SqlValue::Text(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),
            SqlValue::Uuid(s) => query.bind(s),
            SqlValue::Json(j) => query.bind(j.to_string()),
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::DateTime(s) => query.bind(s),
            SqlValue::Timestamp(ts) => match DateTime::from_timestamp(ts, 0) {
                Some(dt) => query.bind(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
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
