//! SQL text assembly with placeholder tracking

use super::dialects::{create_dialect, SqlDialect};
use super::{CompiledStatement, RenderContext};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, Result};
use std::fmt;

/// Accumulates SQL text and the parameters bound to its placeholders.
///
/// Parameters are pushed in emission order, so the n-th placeholder always
/// refers to the n-th parameter. In literal mode values are written through
/// [`SqlValue::to_sql_literal`] instead of being bound.
pub struct SqlWriter {
    dialect: Box<dyn SqlDialect>,
    quote_identifiers: bool,
    literal: bool,
    sql: String,
    params: Vec<SqlValue>,
}

impl SqlWriter {
    /// Writer for the context's driver; fails when the context has none
    pub fn new(ctx: &RenderContext, statement: impl fmt::Display) -> Result<Self> {
        let driver = ctx.require_driver(statement)?;
        Ok(Self::for_driver(driver, ctx.quotes_identifiers()))
    }

    pub fn for_driver(driver: DriverType, quote_identifiers: bool) -> Self {
        Self {
            dialect: create_dialect(driver),
            quote_identifiers,
            literal: false,
            sql: String::with_capacity(128),
            params: Vec::new(),
        }
    }

    pub fn driver(&self) -> DriverType {
        self.dialect.driver()
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Identifier as it appears in the SQL text
    pub fn format_identifier(&self, name: &str) -> String {
        if self.quote_identifiers {
            self.dialect.quote_identifier(name)
        } else {
            name.to_string()
        }
    }

    pub fn identifier(&mut self, name: &str) -> &mut Self {
        let formatted = self.format_identifier(name);
        self.sql.push_str(&formatted);
        self
    }

    /// Comma separated identifiers
    pub fn identifier_list<S: AsRef<str>>(&mut self, names: &[S]) -> &mut Self {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.identifier(name.as_ref());
        }
        self
    }

    /// Write one scalar value: a placeholder, or inline for DEFAULT and raw SQL
    pub fn value(&mut self, value: &SqlValue) -> Result<()> {
        match value {
            SqlValue::Raw(sql) => {
                self.sql.push_str(sql);
            }
            SqlValue::Default => {
                self.sql.push_str("DEFAULT");
            }
            SqlValue::List(_) => {
                return Err(Error::invalid_syntax(
                    self.driver(),
                    "list values are only valid with IN, NOT IN and BETWEEN",
                ));
            }
            other if self.literal => {
                let literal = other.to_sql_literal(self.driver())?;
                self.sql.push_str(&literal);
            }
            other => {
                self.params.push(other.clone());
                let placeholder = self.dialect.placeholder(self.params.len());
                self.sql.push_str(&placeholder);
            }
        }
        Ok(())
    }

    /// Write values separated by `separator`
    pub fn values(&mut self, values: &[SqlValue], separator: &str) -> Result<()> {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(separator);
            }
            self.value(value)?;
        }
        Ok(())
    }

    /// Switch literal mode, returning the previous setting
    pub fn set_literal_mode(&mut self, literal: bool) -> bool {
        std::mem::replace(&mut self.literal, literal)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Terminate the statement with `;`
    pub fn finish(mut self) -> CompiledStatement {
        self.sql.push(';');
        CompiledStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

impl fmt::Debug for SqlWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlWriter")
            .field("driver", &self.driver())
            .field("sql", &self.sql)
            .field("params", &self.params.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_follow_param_order() {
        let mut w = SqlWriter::for_driver(DriverType::PostgreSQL, false);
        w.push("SELECT * FROM t WHERE a = ");
        w.value(&SqlValue::Int(1)).unwrap();
        w.push(" AND b = ");
        w.value(&SqlValue::raw("now()")).unwrap();
        w.push(" AND c = ");
        w.value(&SqlValue::from("x")).unwrap();

        let compiled = w.finish();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM t WHERE a = $1 AND b = now() AND c = $2;"
        );
        assert_eq!(compiled.params, vec![SqlValue::Int(1), SqlValue::from("x")]);
    }

    #[test]
    fn test_literal_mode() {
        let mut w = SqlWriter::for_driver(DriverType::SQLite, true);
        w.identifier("active").push(" = ");
        let previous = w.set_literal_mode(true);
        w.value(&SqlValue::Bool(true)).unwrap();
        w.set_literal_mode(previous);

        assert_eq!(w.sql(), "\"active\" = 1");
        assert_eq!(w.param_count(), 0);
    }

    #[test]
    fn test_list_outside_in_is_rejected() {
        let mut w = SqlWriter::for_driver(DriverType::MySQL, false);
        assert!(w.value(&SqlValue::list(vec![1, 2])).is_err());
    }
}
