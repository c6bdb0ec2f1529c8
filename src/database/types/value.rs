//! Unified SQL value type for all database operations
//!
//! This module provides the single source of truth for SQL values across
//! the statement providers, the adapters and the result sets. Every variant
//! has an explicit literal form, so nothing is ever interpolated through its
//! `Display` output.

use crate::driver::DriverType;
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Format used for `DATE` values
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Format used for `TIME` values
pub const TIME_FORMAT: &str = "%H:%M:%S";
/// Format used for `DATETIME`/`TIMESTAMP` values
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Generic SQL value type for parameter binding and result extraction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    // Null
    Null,

    // Default - for INSERT/UPDATE statements to use the column's DEFAULT value
    Default,

    // Boolean
    Bool(bool),

    // Integer variants (for precise type mapping)
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),

    // Unsigned integers (important for MySQL)
    UnsignedTinyInt(u8),
    UnsignedSmallInt(u16),
    UnsignedInt(u32),
    UnsignedBigInt(u64),

    // Floating point
    Float(f32),
    Double(f64),
    #[cfg(feature = "decimal")]
    Decimal(rust_decimal::Decimal),
    #[cfg(not(feature = "decimal"))]
    Decimal(String),

    // Text types
    String(String), // VARCHAR/CHAR
    Text(String),   // TEXT/CLOB

    // Binary
    Bytes(Vec<u8>),

    // Semantic types
    Uuid(String),
    Json(JsonValue),
    Date(String),     // "2024-01-15"
    Time(String),     // "14:30:00"
    DateTime(String), // "2024-01-15 10:30:00"
    Timestamp(i64),   // Unix timestamp (seconds since epoch)

    /// Operand list for IN / NOT IN / BETWEEN, expanded into one placeholder per element
    List(Vec<SqlValue>),

    /// Caller-supplied SQL emitted verbatim, never bound
    Raw(String),
}

impl SqlValue {
    /// Mark a SQL fragment for verbatim emission
    pub fn raw(sql: impl Into<String>) -> Self {
        SqlValue::Raw(sql.into())
    }

    /// Build an operand list for IN / NOT IN / BETWEEN
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        SqlValue::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, SqlValue::Default)
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, SqlValue::Raw(_))
    }

    /// Values that must be written into the SQL text instead of a placeholder
    pub fn is_inline(&self) -> bool {
        matches!(self, SqlValue::Default | SqlValue::Raw(_))
    }

    /// Convert to a boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::TinyInt(i) => Some(*i != 0),
            SqlValue::SmallInt(i) => Some(*i != 0),
            SqlValue::Int(i) => Some(*i != 0),
            SqlValue::BigInt(i) => Some(*i != 0),
            SqlValue::UnsignedTinyInt(i) => Some(*i != 0),
            SqlValue::UnsignedSmallInt(i) => Some(*i != 0),
            SqlValue::UnsignedInt(i) => Some(*i != 0),
            SqlValue::UnsignedBigInt(i) => Some(*i != 0),
            SqlValue::String(s) | SqlValue::Text(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Convert to an i64 if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Bool(b) => Some(*b as i64),
            SqlValue::TinyInt(i) => Some(*i as i64),
            SqlValue::SmallInt(i) => Some(*i as i64),
            SqlValue::Int(i) => Some(*i as i64),
            SqlValue::BigInt(i) => Some(*i),
            SqlValue::UnsignedTinyInt(i) => Some(*i as i64),
            SqlValue::UnsignedSmallInt(i) => Some(*i as i64),
            SqlValue::UnsignedInt(i) => Some(*i as i64),
            SqlValue::UnsignedBigInt(i) => i64::try_from(*i).ok(),
            SqlValue::String(s) | SqlValue::Text(s) => s.parse().ok(),
            SqlValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Convert to an f64 if possible
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(f) => Some(*f as f64),
            SqlValue::Double(f) => Some(*f),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => d.to_string().parse().ok(),
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => s.parse().ok(),
            SqlValue::String(s) | SqlValue::Text(s) => s.parse().ok(),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Convert to a String
    pub fn as_string(&self) -> Option<String> {
        match self {
            SqlValue::String(s) | SqlValue::Text(s) | SqlValue::Uuid(s) => Some(s.clone()),
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::DateTime(s) => Some(s.clone()),
            SqlValue::Json(j) => Some(j.to_string()),
            SqlValue::Null | SqlValue::Default | SqlValue::Bytes(_) | SqlValue::List(_) => None,
            SqlValue::Raw(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Default => JsonValue::String("DEFAULT".to_string()),
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::TinyInt(i) => JsonValue::Number((*i).into()),
            SqlValue::SmallInt(i) => JsonValue::Number((*i).into()),
            SqlValue::Int(i) => JsonValue::Number((*i).into()),
            SqlValue::BigInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedTinyInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedSmallInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedBigInt(i) => JsonValue::Number((*i).into()),
            SqlValue::Float(f) => serde_json::Number::from_f64(*f as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => JsonValue::String(d.to_string()),
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => JsonValue::String(s.clone()),
            SqlValue::String(s) | SqlValue::Text(s) | SqlValue::Uuid(s) => {
                JsonValue::String(s.clone())
            }
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::DateTime(s) => {
                JsonValue::String(s.clone())
            }
            SqlValue::Json(j) => j.clone(),
            SqlValue::Timestamp(ts) => JsonValue::Number((*ts).into()),
            SqlValue::Bytes(bytes) => JsonValue::String(base64_encode(bytes)),
            SqlValue::List(values) => JsonValue::Array(values.iter().map(|v| v.to_json()).collect()),
            SqlValue::Raw(sql) => JsonValue::String(sql.clone()),
        }
    }

    /// Render this value as a SQL literal for the given driver.
    ///
    /// Used where a placeholder is not allowed (column defaults, partial index
    /// predicates). Strings are escaped for the target dialect.
    pub fn to_sql_literal(&self, driver: DriverType) -> Result<String> {
        let literal = match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Default => "DEFAULT".to_string(),
            SqlValue::Raw(sql) => sql.clone(),
            SqlValue::Bool(b) => match (driver, b) {
                (DriverType::PostgreSQL, true) => "TRUE".to_string(),
                (DriverType::PostgreSQL, false) => "FALSE".to_string(),
                (_, true) => "1".to_string(),
                (_, false) => "0".to_string(),
            },

            SqlValue::TinyInt(i) => i.to_string(),
            SqlValue::SmallInt(i) => i.to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::BigInt(i) => i.to_string(),
            SqlValue::UnsignedTinyInt(i) => i.to_string(),
            SqlValue::UnsignedSmallInt(i) => i.to_string(),
            SqlValue::UnsignedInt(i) => i.to_string(),
            SqlValue::UnsignedBigInt(i) => i.to_string(),

            SqlValue::Float(f) => float_literal(*f as f64, driver)?,
            SqlValue::Double(f) => float_literal(*f, driver)?,
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => d.to_string(),
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => {
                if s.parse::<f64>().is_err() {
                    return Err(Error::invalid_syntax(
                        driver,
                        format!("'{}' is not a decimal number", s),
                    ));
                }
                s.clone()
            }

            SqlValue::String(s) | SqlValue::Text(s) | SqlValue::Uuid(s) => {
                quote_string(s, driver)
            }
            SqlValue::Json(j) => quote_string(&j.to_string(), driver),
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::DateTime(s) => {
                quote_string(s, driver)
            }
            SqlValue::Timestamp(ts) => {
                let dt = DateTime::<Utc>::from_timestamp(*ts, 0).ok_or_else(|| {
                    Error::invalid_syntax(driver, format!("timestamp {} is out of range", ts))
                })?;
                quote_string(&format_datetime(&dt.naive_utc(), DATETIME_FORMAT), driver)
            }

            SqlValue::Bytes(bytes) => match driver {
                DriverType::PostgreSQL => format!("'\\x{}'::bytea", hex_encode(bytes)),
                _ => format!("X'{}'", hex_encode(bytes)),
            },

            SqlValue::List(values) => {
                let items = values
                    .iter()
                    .map(|v| v.to_sql_literal(driver))
                    .collect::<Result<Vec<_>>>()?;
                format!("({})", items.join(", "))
            }
        };
        Ok(literal)
    }
}

fn float_literal(value: f64, driver: DriverType) -> Result<String> {
    if value.is_finite() {
        return Ok(value.to_string());
    }
    match driver {
        DriverType::PostgreSQL if value.is_nan() => Ok("'NaN'::float8".to_string()),
        DriverType::PostgreSQL if value > 0.0 => Ok("'Infinity'::float8".to_string()),
        DriverType::PostgreSQL => Ok("'-Infinity'::float8".to_string()),
        _ => Err(Error::unsupported(driver, "non-finite floating point literal")),
    }
}

fn quote_string(value: &str, driver: DriverType) -> String {
    let escaped = value.replace('\'', "''");
    if driver.is_mysql_family() {
        // MySQL treats backslash as an escape character inside string literals
        format!("'{}'", escaped.replace('\\', "\\\\"))
    } else {
        format!("'{}'", escaped)
    }
}

/// Format a date with an explicit chrono format string
pub fn format_date(date: &NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}

/// Format a time with an explicit chrono format string
pub fn format_time(time: &NaiveTime, format: &str) -> String {
    time.format(format).to_string()
}

/// Format a date-time with an explicit chrono format string
pub fn format_datetime(datetime: &NaiveDateTime, format: &str) -> String {
    datetime.format(format).to_string()
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Default => write!(f, "DEFAULT"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::TinyInt(i) => write!(f, "{}", i),
            SqlValue::SmallInt(i) => write!(f, "{}", i),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::BigInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedTinyInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedSmallInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedBigInt(i) => write!(f, "{}", i),
            SqlValue::Float(fl) => write!(f, "{}", fl),
            SqlValue::Double(d) => write!(f, "{}", d),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => write!(f, "{}", d),
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => write!(f, "{}", s),
            SqlValue::String(s) | SqlValue::Text(s) | SqlValue::Uuid(s) => write!(f, "{}", s),
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::DateTime(s) => write!(f, "{}", s),
            SqlValue::Json(j) => write!(f, "{}", j),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts),
            SqlValue::Bytes(b) => write!(f, "<binary:{} bytes>", b.len()),
            SqlValue::Raw(sql) => write!(f, "{}", sql),
            SqlValue::List(values) => {
                write!(f, "[")?;
                for (i, val) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
        }
    }
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn hex_encode(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02X}", b)).collect()
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i8> for SqlValue {
    fn from(v: i8) -> Self {
        SqlValue::TinyInt(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::SmallInt(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<u8> for SqlValue {
    fn from(v: u8) -> Self {
        SqlValue::UnsignedTinyInt(v)
    }
}

impl From<u16> for SqlValue {
    fn from(v: u16) -> Self {
        SqlValue::UnsignedSmallInt(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::UnsignedInt(v)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::UnsignedBigInt(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::String(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::String(s.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(s: &String) -> Self {
        SqlValue::String(s.clone())
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(v: JsonValue) -> Self {
        SqlValue::Json(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => SqlValue::Null,
        }
    }
}

impl From<&i32> for SqlValue {
    fn from(i: &i32) -> Self {
        SqlValue::Int(*i)
    }
}

impl From<&i64> for SqlValue {
    fn from(i: &i64) -> Self {
        SqlValue::BigInt(*i)
    }
}

impl From<&bool> for SqlValue {
    fn from(b: &bool) -> Self {
        SqlValue::Bool(*b)
    }
}

impl From<&f64> for SqlValue {
    fn from(f: &f64) -> Self {
        SqlValue::Double(*f)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(dt: DateTime<Utc>) -> Self {
        SqlValue::DateTime(format_datetime(&dt.naive_utc(), DATETIME_FORMAT))
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(date: NaiveDate) -> Self {
        SqlValue::Date(format_date(&date, DATE_FORMAT))
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(time: NaiveTime) -> Self {
        SqlValue::Time(format_time(&time, TIME_FORMAT))
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(dt: NaiveDateTime) -> Self {
        SqlValue::DateTime(format_datetime(&dt, DATETIME_FORMAT))
    }
}

#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for SqlValue {
    fn from(uuid: uuid::Uuid) -> Self {
        SqlValue::Uuid(uuid.to_string())
    }
}

#[cfg(feature = "decimal")]
impl From<rust_decimal::Decimal> for SqlValue {
    fn from(d: rust_decimal::Decimal) -> Self {
        SqlValue::Decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal_escaping_per_dialect() {
        let value = SqlValue::from(r"O'Brien \ co");
        assert_eq!(
            value.to_sql_literal(DriverType::PostgreSQL).unwrap(),
            r"'O''Brien \ co'"
        );
        assert_eq!(
            value.to_sql_literal(DriverType::MySQL).unwrap(),
            r"'O''Brien \\ co'"
        );
    }

    #[test]
    fn test_bool_and_bytes_literals() {
        assert_eq!(SqlValue::Bool(true).to_sql_literal(DriverType::SQLite).unwrap(), "1");
        assert_eq!(SqlValue::Bool(true).to_sql_literal(DriverType::MariaDB).unwrap(), "1");
        assert_eq!(
            SqlValue::Bool(false).to_sql_literal(DriverType::PostgreSQL).unwrap(),
            "FALSE"
        );
        let bytes = SqlValue::Bytes(vec![0xde, 0xad]);
        assert_eq!(bytes.to_sql_literal(DriverType::MySQL).unwrap(), "X'DEAD'");
        assert_eq!(
            bytes.to_sql_literal(DriverType::PostgreSQL).unwrap(),
            "'\\xDEAD'::bytea"
        );
    }

    #[test]
    fn test_non_finite_float_literal() {
        assert!(SqlValue::Double(f64::NAN)
            .to_sql_literal(DriverType::MySQL)
            .is_err());
        assert_eq!(
            SqlValue::Double(f64::NAN)
                .to_sql_literal(DriverType::PostgreSQL)
                .unwrap(),
            "'NaN'::float8"
        );
    }

    #[test]
    fn test_dates_use_explicit_formats() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let dt = date.and_hms_opt(10, 30, 0).unwrap();

        assert_eq!(SqlValue::from(date), SqlValue::Date("2024-01-15".to_string()));
        assert_eq!(
            SqlValue::from(dt),
            SqlValue::DateTime("2024-01-15 10:30:00".to_string())
        );
        assert_eq!(format_date(&date, "%d/%m/%Y"), "15/01/2024");
        assert_eq!(
            SqlValue::Timestamp(0).to_sql_literal(DriverType::SQLite).unwrap(),
            "'1970-01-01 00:00:00'"
        );
    }

    #[test]
    fn test_raw_and_list() {
        assert_eq!(
            SqlValue::raw("CURRENT_TIMESTAMP")
                .to_sql_literal(DriverType::MySQL)
                .unwrap(),
            "CURRENT_TIMESTAMP"
        );
        assert_eq!(
            SqlValue::list(vec![1, 2, 3])
                .to_sql_literal(DriverType::PostgreSQL)
                .unwrap(),
            "(1, 2, 3)"
        );
        assert!(SqlValue::raw("x").is_inline());
        assert!(SqlValue::Default.is_inline());
        assert!(!SqlValue::Null.is_inline());
        assert!(!SqlValue::Int(1).is_inline());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(SqlValue::Int(42).as_i64(), Some(42));
        assert_eq!(SqlValue::from("yes").as_bool(), Some(true));
        assert_eq!(SqlValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(SqlValue::Null.as_string(), None);
        assert_eq!(SqlValue::Int(7).as_string(), Some("7".to_string()));
    }
}
