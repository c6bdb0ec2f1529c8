//! DELETE

use super::condition::{Condition, Conditions, Operator};
use super::modifiers::{check_row_window, Limit, Order, OrderDirection};
use super::writer::SqlWriter;
use super::{
    validate_identifier, CompiledStatement, QueryHooks, QueryProvider, RenderContext,
    StatementKind,
};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::Result;

/// `DELETE FROM t [WHERE ...] [ORDER BY ...] [LIMIT ...]`
#[derive(Debug, Default)]
pub struct Delete {
    table: String,
    conditions: Conditions,
    order: Order,
    limit: Limit,
    pub(crate) hooks: QueryHooks,
}

impl Delete {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn condition(
        mut self,
        key: impl Into<String>,
        operator: Operator,
        value: impl Into<SqlValue>,
    ) -> Self {
        self.conditions.push(Condition::new(key, operator, value));
        self
    }

    pub fn add_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.order.push(column, direction);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.limit.offset = Some(offset);
        self
    }
}

impl QueryProvider for Delete {
    fn kind(&self) -> StatementKind {
        StatementKind::Delete
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        !matches!(
            check_row_window(driver, "DELETE", &self.order, &self.limit),
            Err(ref e) if e.is_compatibility()
        )
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("table", &self.table)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        check_row_window(w.driver(), "DELETE", &self.order, &self.limit)?;

        w.push("DELETE FROM ").identifier(&self.table);
        self.conditions.write_clause("WHERE", &mut w)?;
        self.order.write_to(&mut w)?;
        self.limit.write_row_count(&mut w);
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}
