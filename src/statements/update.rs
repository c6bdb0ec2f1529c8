//! UPDATE

use super::condition::{Condition, Conditions, Operator};
use super::insert::{upsert_entry, QueryEntry};
use super::modifiers::{check_row_window, Limit, Order, OrderDirection};
use super::writer::SqlWriter;
use super::{
    validate_identifier, CompiledStatement, QueryHooks, QueryProvider, RenderContext,
    StatementKind,
};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UpdatePriority {
    #[default]
    Normal,
    /// MySQL family `LOW_PRIORITY`
    LowPriority,
}

/// `UPDATE [LOW_PRIORITY] [IGNORE] t SET ... [WHERE ...] [ORDER BY ...] [LIMIT ...]`
#[derive(Debug, Default)]
pub struct Update {
    table: String,
    entries: Vec<QueryEntry>,
    conditions: Conditions,
    order: Order,
    limit: Limit,
    priority: UpdatePriority,
    ignore: bool,
    pub(crate) hooks: QueryHooks,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        upsert_entry(&mut self.entries, QueryEntry::new(column, value));
        self
    }

    pub fn set_raw(mut self, column: impl Into<String>, sql: impl Into<String>) -> Self {
        upsert_entry(&mut self.entries, QueryEntry::raw(column, sql));
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

    pub fn priority(mut self, priority: UpdatePriority) -> Self {
        self.priority = priority;
        self
    }

    /// MySQL family `IGNORE`
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if !driver.is_mysql_family() {
            if self.priority == UpdatePriority::LowPriority {
                return Err(Error::unsupported(driver, "UPDATE LOW_PRIORITY"));
            }
            if self.ignore {
                return Err(Error::unsupported(driver, "UPDATE IGNORE"));
            }
        }
        check_row_window(driver, "UPDATE", &self.order, &self.limit)
    }
}

impl QueryProvider for Update {
    fn kind(&self) -> StatementKind {
        StatementKind::Update
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        !matches!(self.check_features(driver), Err(ref e) if e.is_compatibility())
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("table", &self.table)?;
        if self.entries.is_empty() {
            return Err(Error::missing_field("set"));
        }
        for entry in &self.entries {
            validate_identifier("column", &entry.column)?;
        }
        let mut w = SqlWriter::new(ctx, self.kind())?;
        self.check_features(w.driver())?;

        w.push("UPDATE ");
        if self.priority == UpdatePriority::LowPriority {
            w.push("LOW_PRIORITY ");
        }
        if self.ignore {
            w.push("IGNORE ");
        }
        w.identifier(&self.table).push(" SET ");
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.identifier(&entry.column).push(" = ");
            entry.write_value(&mut w)?;
        }
        self.conditions.write_clause("WHERE", &mut w)?;
        self.order.write_to(&mut w)?;
        self.limit.write_row_count(&mut w);
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_with_where() {
        let update = Update::new()
            .table("users")
            .set("name", "Grace")
            .set_raw("updated_at", "CURRENT_TIMESTAMP")
            .condition("id", Operator::Equals, 7);
        let compiled = update
            .render(&RenderContext::new(DriverType::PostgreSQL))
            .unwrap()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "UPDATE users SET name = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2;"
        );
        assert_eq!(compiled.params, vec![SqlValue::from("Grace"), SqlValue::Int(7)]);
    }

    #[test]
    fn test_mysql_modifiers() {
        let update = Update::new()
            .table("jobs")
            .set("state", "queued")
            .priority(UpdatePriority::LowPriority)
            .ignore()
            .condition("state", Operator::Equals, "failed")
            .order_by("id", OrderDirection::Asc)
            .limit(100);
        let sql = update
            .generate_sql_string(&RenderContext::new(DriverType::MySQL))
            .unwrap()
            .unwrap();
        assert_eq!(
            sql,
            "UPDATE LOW_PRIORITY IGNORE jobs SET state = ? WHERE state = ? ORDER BY id ASC LIMIT 100;"
        );
        assert!(!update.compatibility(DriverType::PostgreSQL));
        assert!(!update.compatibility(DriverType::SQLite));
    }

    #[test]
    fn test_offset_requires_order() {
        let update = Update::new().table("jobs").set("state", "x").limit(1).offset(5);
        assert!(update.compatibility(DriverType::MySQL));
        assert!(matches!(
            update.render(&RenderContext::new(DriverType::MySQL)),
            Err(Error::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn test_offset_is_rejected_with_order() {
        let update = Update::new()
            .table("jobs")
            .set("state", "x")
            .order_by("id", OrderDirection::Asc)
            .limit(10)
            .offset(5);
        assert!(!update.compatibility(DriverType::MySQL));
        let err = update
            .render(&RenderContext::new(DriverType::MySQL))
            .unwrap_err();
        assert!(err.is_compatibility(), "{}", err);

        let without_limit = Update::new()
            .table("jobs")
            .set("state", "x")
            .order_by("id", OrderDirection::Asc)
            .offset(5);
        assert!(without_limit
            .render(&RenderContext::new(DriverType::MariaDB))
            .is_err());
    }

    #[test]
    fn test_requires_set() {
        assert!(matches!(
            Update::new().table("t").render(&RenderContext::new(DriverType::SQLite)),
            Err(Error::MissingField { .. })
        ));
    }
}
