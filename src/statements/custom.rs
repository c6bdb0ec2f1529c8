//! Verbatim SQL

use super::{CompiledStatement, QueryHooks, QueryProvider, RenderContext, StatementKind};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::Result;
use crate::result_set::ResultSet;

/// Caller-written SQL with optional bound parameters.
///
/// The text is sent as-is, so placeholders must already use the target
/// driver's syntax. A blank statement is skipped.
#[derive(Debug, Default)]
pub struct Custom {
    sql: String,
    params: Vec<SqlValue>,
    returns_rows: bool,
    pub(crate) hooks: QueryHooks,
}

impl Custom {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = sql.into();
        self
    }

    pub fn param(mut self, value: impl Into<SqlValue>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn params<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.params.extend(values.into_iter().map(Into::into));
        self
    }

    /// Route the statement through the fetch path and `on_result`
    pub fn returns_rows(mut self, returns_rows: bool) -> Self {
        self.returns_rows = returns_rows;
        self
    }

    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut ResultSet) + Send + 'static,
    {
        self.hooks.set_on_result(callback);
        self
    }
}

impl QueryProvider for Custom {
    fn kind(&self) -> StatementKind {
        StatementKind::Custom
    }

    fn compatibility(&self, _driver: DriverType) -> bool {
        true
    }

    fn render(&self, _ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        let sql = self.sql.trim();
        if sql.is_empty() {
            return Ok(None);
        }
        let sql = if sql.ends_with(';') {
            sql.to_string()
        } else {
            format!("{};", sql)
        };
        Ok(Some(CompiledStatement::new(sql, self.params.clone())))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }

    fn returns_rows(&self) -> bool {
        self.returns_rows
    }
}
