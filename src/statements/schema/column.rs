//! Column definitions

use crate::database::types::SqlValue;
use crate::error::{Error, Result};
use crate::statements::validate_identifier;
use crate::statements::writer::SqlWriter;
use serde::{Deserialize, Serialize};

/// Portable column types, mapped to a type name per dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    TinyInt,
    SmallInt,
    MediumInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Boolean,
    Char,
    VarChar,
    TinyText,
    Text,
    MediumText,
    LongText,
    Blob,
    Date,
    Time,
    DateTime,
    Timestamp,
    Json,
    Uuid,
    Enum,
}

impl DataType {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::TinyInt
                | DataType::SmallInt
                | DataType::MediumInt
                | DataType::Integer
                | DataType::BigInt
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, DataType::Float | DataType::Double | DataType::Decimal)
    }
}

/// Extra information some types need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataTypeParameter {
    /// `VARCHAR(n)`, `CHAR(n)`
    Length(u32),
    /// `DECIMAL(precision, scale)`
    Precision(u32, u32),
    /// `ENUM('a', 'b')`
    Values(Vec<String>),
}

/// Key role of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnType {
    #[default]
    Normal,
    PrimaryKey,
    PrimaryKeyAutoIncrement,
}

impl ColumnType {
    pub fn is_primary_key(&self) -> bool {
        !matches!(self, ColumnType::Normal)
    }
}

/// Where a primary key flag is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyPlacement {
    /// CREATE TABLE collects key columns into a table-level clause
    TableLevel,
    /// ALTER TABLE has no table-level clause, keys go on the column
    Inline,
}

/// A column definition, rendered into a DDL fragment per driver
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub data_type: DataType,
    pub parameter: Option<DataTypeParameter>,
    pub unsigned: bool,
    pub column_type: ColumnType,
    pub not_null: bool,
    pub default: Option<SqlValue>,
    pub unique: bool,
    pub on_update_current_timestamp: bool,
}

impl Column {
    pub fn new(key: impl Into<String>, data_type: DataType) -> Self {
        Self {
            key: key.into(),
            data_type,
            parameter: None,
            unsigned: false,
            column_type: ColumnType::Normal,
            not_null: false,
            default: None,
            unique: false,
            on_update_current_timestamp: false,
        }
    }

    pub fn column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    pub fn primary_key(self) -> Self {
        self.column_type(ColumnType::PrimaryKey)
    }

    pub fn auto_increment(self) -> Self {
        self.column_type(ColumnType::PrimaryKeyAutoIncrement)
    }

    pub fn parameter(mut self, parameter: DataTypeParameter) -> Self {
        self.parameter = Some(parameter);
        self
    }

    pub fn length(self, length: u32) -> Self {
        self.parameter(DataTypeParameter::Length(length))
    }

    pub fn precision(self, precision: u32, scale: u32) -> Self {
        self.parameter(DataTypeParameter::Precision(precision, scale))
    }

    pub fn values<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter(DataTypeParameter::Values(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<SqlValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// MySQL `ON UPDATE CURRENT_TIMESTAMP`
    pub fn on_update_current_timestamp(mut self) -> Self {
        self.on_update_current_timestamp = true;
        self
    }

    /// SQLite declares AUTOINCREMENT keys inline on the column
    pub(crate) fn is_inline_key(&self, w: &SqlWriter) -> bool {
        self.column_type == ColumnType::PrimaryKeyAutoIncrement
            && w.driver() == crate::driver::DriverType::SQLite
    }

    /// Column type without the column name
    pub(crate) fn type_sql(&self, w: &SqlWriter) -> Result<String> {
        let driver = w.driver();
        let mut type_name = w.dialect().type_name(self.data_type, self.parameter.as_ref())?;

        if self.unsigned {
            if !driver.is_mysql_family() {
                return Err(Error::unsupported(driver, "UNSIGNED columns"));
            }
            if !self.data_type.is_numeric() {
                return Err(Error::invalid_syntax(
                    driver,
                    format!("UNSIGNED on non-numeric column '{}'", self.key),
                ));
            }
            type_name.push_str(" UNSIGNED");
        }

        if self.column_type == ColumnType::PrimaryKeyAutoIncrement {
            type_name = w
                .dialect()
                .auto_increment_syntax(self.data_type, &type_name)?;
        }
        Ok(type_name)
    }

    pub(crate) fn write_definition(&self, w: &mut SqlWriter, placement: KeyPlacement) -> Result<()> {
        validate_identifier("column", &self.key)?;
        let driver = w.driver();
        let type_sql = self.type_sql(w)?;

        w.identifier(&self.key).push(" ").push(&type_sql);

        if self.not_null {
            w.push(" NOT NULL");
        }

        if let Some(default) = &self.default {
            if self.column_type == ColumnType::PrimaryKeyAutoIncrement {
                return Err(Error::invalid_syntax(
                    driver,
                    format!("auto-increment column '{}' cannot have a default", self.key),
                ));
            }
            if default.is_default() {
                return Err(Error::invalid_syntax(
                    driver,
                    format!("DEFAULT is not a value for column '{}'", self.key),
                ));
            }
            let literal = default.to_sql_literal(driver)?;
            w.push(" DEFAULT ").push(&literal);
        }

        if self.unique {
            w.push(" UNIQUE");
        }

        if placement == KeyPlacement::Inline
            && self.column_type.is_primary_key()
            && !self.is_inline_key(w)
        {
            w.push(" PRIMARY KEY");
        }

        if self.on_update_current_timestamp {
            if !driver.is_mysql_family() {
                return Err(Error::unsupported(driver, "ON UPDATE CURRENT_TIMESTAMP"));
            }
            let current = w.dialect().current_timestamp();
            w.push(" ON UPDATE ").push(current);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverType;

    fn definition(column: &Column, driver: DriverType) -> Result<String> {
        let mut w = SqlWriter::for_driver(driver, false);
        column.write_definition(&mut w, KeyPlacement::TableLevel)?;
        Ok(w.sql().to_string())
    }

    #[test]
    fn test_defaults_are_literals() {
        let column = Column::new("status", DataType::VarChar)
            .length(20)
            .not_null()
            .default_value("it's new");
        assert_eq!(
            definition(&column, DriverType::PostgreSQL).unwrap(),
            "status VARCHAR(20) NOT NULL DEFAULT 'it''s new'"
        );

        let column = Column::new("created_at", DataType::Timestamp)
            .default_value(SqlValue::raw("CURRENT_TIMESTAMP"))
            .on_update_current_timestamp();
        assert_eq!(
            definition(&column, DriverType::MariaDB).unwrap(),
            "created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP"
        );
        assert!(definition(&column, DriverType::SQLite).is_err());
    }

    #[test]
    fn test_unsigned_is_mysql_only() {
        let column = Column::new("hits", DataType::BigInt).unsigned();
        assert_eq!(
            definition(&column, DriverType::MySQL).unwrap(),
            "hits BIGINT UNSIGNED"
        );
        assert!(matches!(
            definition(&column, DriverType::PostgreSQL),
            Err(Error::UnsupportedFeature { .. })
        ));
    }

    #[test]
    fn test_auto_increment_per_driver() {
        let column = Column::new("id", DataType::Integer).auto_increment();
        assert_eq!(
            definition(&column, DriverType::MySQL).unwrap(),
            "id INTEGER AUTO_INCREMENT"
        );
        assert_eq!(definition(&column, DriverType::PostgreSQL).unwrap(), "id SERIAL");
        assert_eq!(
            definition(&column, DriverType::SQLite).unwrap(),
            "id INTEGER PRIMARY KEY AUTOINCREMENT"
        );
    }

    #[test]
    fn test_inline_primary_key() {
        let column = Column::new("code", DataType::Char).length(3).primary_key();
        let mut w = SqlWriter::for_driver(DriverType::PostgreSQL, false);
        column.write_definition(&mut w, KeyPlacement::Inline).unwrap();
        assert_eq!(w.sql(), "code CHAR(3) PRIMARY KEY");
    }

    #[test]
    fn test_invalid_column_name() {
        let column = Column::new("bad name", DataType::Text);
        assert!(matches!(
            definition(&column, DriverType::SQLite),
            Err(Error::InvalidIdentifier { .. })
        ));
    }
}
