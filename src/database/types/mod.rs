//! Value model and per-engine conversions
//!
//! [`SqlValue`] is the single value type used for bound parameters, literal
//! rendering and fetched rows. Each converter binds values to sqlx queries
//! and turns sqlx rows back into [`crate::result_set::Row`]s.

pub mod mysql_converter;
pub mod postgres_converter;
pub mod sqlite_converter;
pub mod value;

pub use mysql_converter::MySqlTypeConverter;
pub use postgres_converter::PostgresTypeConverter;
pub use sqlite_converter::SqliteTypeConverter;
pub use value::{format_date, format_datetime, format_time, SqlValue};
