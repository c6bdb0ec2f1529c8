//! PostgreSQL value binding and row conversion

use super::value::SqlValue;
use crate::error::{Error, Result};
use crate::result_set::Row as ResultRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgColumn, PgRow};
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// PostgreSQL type converter
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresTypeConverter;

impl PostgresTypeConverter {
    fn column_error(column: &PgColumn, what: &str, e: sqlx::Error) -> Error {
        Error::database_query(format!(
            "Failed to extract {} from column '{}' (type: {}): {}",
            what,
            column.name(),
            column.type_info().name(),
            e
        ))
    }

    /// Extract a timestamp value from PostgreSQL
    fn extract_timestamp(row: &PgRow, index: usize, column: &PgColumn) -> Result<SqlValue> {
        // TIMESTAMPTZ
        if let Ok(dt) = row.try_get::<DateTime<Utc>, _>(index) {
            return Ok(SqlValue::DateTime(dt.to_rfc3339()));
        }
        // TIMESTAMP
        row.try_get::<NaiveDateTime, _>(index)
            .map(|ndt| SqlValue::DateTime(ndt.format("%Y-%m-%d %H:%M:%S%.f").to_string()))
            .map_err(|e| Self::column_error(column, "timestamp", e))
    }

    fn extract_numeric(row: &PgRow, index: usize, column: &PgColumn) -> Result<SqlValue> {
        #[cfg(feature = "decimal")]
        {
            row.try_get::<rust_decimal::Decimal, _>(index)
                .map(SqlValue::Decimal)
                .map_err(|e| Self::column_error(column, "numeric", e))
        }
        #[cfg(not(feature = "decimal"))]
        {
            // NUMERIC needs rust_decimal to decode; a float read is the best effort
            row.try_get::<f64, _>(index)
                .map(|f| SqlValue::Decimal(f.to_string()))
                .map_err(|e| Self::column_error(column, "numeric", e))
        }
    }

    fn extract(row: &PgRow, index: usize, column: &PgColumn) -> Result<SqlValue> {
        let type_info = column.type_info();
        let type_name = type_info.name();
        let get_err = |what: &'static str| move |e: sqlx::Error| Self::column_error(column, what, e);

        match type_name {
            "BOOL" => row.try_get::<bool, _>(index).map(SqlValue::Bool).map_err(get_err("bool")),
            "INT2" => row.try_get::<i16, _>(index).map(SqlValue::SmallInt).map_err(get_err("smallint")),
            "INT4" => row.try_get::<i32, _>(index).map(SqlValue::Int).map_err(get_err("int")),
            "INT8" => row.try_get::<i64, _>(index).map(SqlValue::BigInt).map_err(get_err("bigint")),
            "FLOAT4" => row.try_get::<f32, _>(index).map(SqlValue::Float).map_err(get_err("float")),
            "FLOAT8" => row.try_get::<f64, _>(index).map(SqlValue::Double).map_err(get_err("double")),
            "NUMERIC" => Self::extract_numeric(row, index, column),
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
                row.try_get::<String, _>(index).map(SqlValue::String).map_err(get_err("string"))
            }
            "JSON" | "JSONB" => row.try_get::<JsonValue, _>(index).map(SqlValue::Json).map_err(get_err("JSON")),
            "TIMESTAMP" | "TIMESTAMPTZ" => Self::extract_timestamp(row, index, column),
            "DATE" => row
                .try_get::<NaiveDate, _>(index)
                .map(|d| SqlValue::Date(d.to_string()))
                .map_err(get_err("date")),
            "TIME" => row
                .try_get::<NaiveTime, _>(index)
                .map(|t| SqlValue::Time(t.to_string()))
                .map_err(get_err("time")),
            "UUID" => row
                .try_get::<sqlx::types::Uuid, _>(index)
                .map(|u| SqlValue::Uuid(u.to_string()))
                .map_err(get_err("UUID")),
            "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes).map_err(get_err("binary")),
            _ => {
                // Enums, domains and other types with a text representation
                log::debug!(
                    "Reading PostgreSQL type '{}' of column '{}' as text",
                    type_name,
                    column.name()
                );
                row.try_get_unchecked::<String, _>(index)
                    .map(SqlValue::String)
                    .map_err(get_err("value"))
            }
        }
    }

    /// Convert one fetched row into column -> value pairs
    pub fn row_to_values(row: &PgRow) -> Result<ResultRow> {
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
            log::trace!("PostgreSQL column {} = {:?}", column.name(), value);
            values.insert(column.name().to_string(), value);
        }
        Ok(values)
    }

    /// Bind a SqlValue to a PostgreSQL query
    pub fn bind_param(query: PgQuery<'_>, value: SqlValue) -> Result<PgQuery<'_>> {
        Ok(match value {
            // NULL travels as a BYTEA-typed parameter
            SqlValue::Null => query.bind(None::<Vec<u8>>),
            SqlValue::Bool(b) => query.bind(b),

            // No TINYINT, widen to SMALLINT
            SqlValue::TinyInt(i) => query.bind(i as i16),
            SqlValue::SmallInt(i) => query.bind(i),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            // No unsigned types, widen to the next signed type
            SqlValue::UnsignedTinyInt(i) => query.bind(i as i16),
            SqlValue::UnsignedSmallInt(i) => query.bind(i as i32),
            SqlValue::UnsignedInt(i) => query.bind(i as i64),
            SqlValue::UnsignedBigInt(i) => match i64::try_from(i) {
                Ok(i) => query.bind(i),
                Err(_) => {
                    return Err(Error::database_query(format!(
                        "{} does not fit a PostgreSQL BIGINT",
                        i
                    )))
                }
            },

            SqlValue::Float(f) => query.bind(f),
            SqlValue::Double(f) => query.bind(f),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => query.bind(d),
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => match s.parse::<f64>() {
                Ok(parsed) => query.bind(parsed),
                Err(_) => query.bind(s),
            },

            SqlValue::String(s) | SqlValue::Text(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),
            SqlValue::Uuid(s) => match sqlx::types::Uuid::parse_str(&s) {
                Ok(uuid) => query.bind(uuid),
                Err(_) => query.bind(s),
            },
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
                    query.bind(dt.with_timezone(&Utc))
                } else if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f") {
                    query.bind(ndt)
                } else {
                    query.bind(s)
                }
            }
            SqlValue::Timestamp(ts) => match DateTime::from_timestamp(ts, 0) {
                Some(dt) => query.bind(dt),
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
