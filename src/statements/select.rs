//! SELECT

use super::condition::{Condition, Conditions, Operator};
use super::modifiers::{Group, Limit, Order, OrderDirection};
use super::writer::SqlWriter;
use super::{
    validate_identifier, CompiledStatement, QueryHooks, QueryProvider, RenderContext,
    StatementKind,
};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, Result};
use crate::result_set::ResultSet;

/// Aggregate applied to the single selected column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl SelectFunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SelectFunction::Count => "COUNT",
            SelectFunction::Sum => "SUM",
            SelectFunction::Avg => "AVG",
            SelectFunction::Min => "MIN",
            SelectFunction::Max => "MAX",
        }
    }
}

/// `SELECT [DISTINCT] cols FROM t [WHERE] [GROUP BY [HAVING]] [ORDER BY] [LIMIT] [OFFSET]`
#[derive(Debug, Default)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    distinct: bool,
    function: Option<SelectFunction>,
    conditions: Conditions,
    group: Group,
    order: Order,
    limit: Limit,
    pub(crate) hooks: QueryHooks,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self
    }

    pub fn columns<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        columns.into_iter().fold(self, |select, c| select.column(c))
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn function(mut self, function: SelectFunction) -> Self {
        self.function = Some(function);
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

    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group.column(column);
        self
    }

    pub fn having(mut self, condition: Condition) -> Self {
        self.group.having(condition);
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

    /// Callback receiving the fetched rows
    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut ResultSet) + Send + 'static,
    {
        self.hooks.set_on_result(callback);
        self
    }

    fn write_columns(&self, w: &mut SqlWriter) -> Result<()> {
        for column in &self.columns {
            if column != "*" {
                validate_identifier("column", column)?;
            }
        }

        match self.function {
            Some(function) => {
                let column = match self.columns.as_slice() {
                    [column] => column,
                    _ => {
                        return Err(Error::invalid_syntax(
                            w.driver(),
                            format!(
                                "{} applies to exactly one column, got {}",
                                function.as_sql(),
                                self.columns.len()
                            ),
                        ))
                    }
                };
                if column == "*" && function != SelectFunction::Count {
                    return Err(Error::invalid_syntax(
                        w.driver(),
                        format!("{}(*) is not valid SQL", function.as_sql()),
                    ));
                }
                w.push(function.as_sql()).push("(");
                if self.distinct {
                    w.push("DISTINCT ");
                }
                write_column(w, column);
                w.push(")");
            }
            None => {
                if self.distinct {
                    w.push("DISTINCT ");
                }
                if self.columns.is_empty() {
                    w.push("*");
                }
                for (i, column) in self.columns.iter().enumerate() {
                    if i > 0 {
                        w.push(", ");
                    }
                    write_column(w, column);
                }
            }
        }
        Ok(())
    }
}

fn write_column(w: &mut SqlWriter, column: &str) {
    if column == "*" {
        w.push("*");
    } else {
        w.identifier(column);
    }
}

impl QueryProvider for Select {
    fn kind(&self) -> StatementKind {
        StatementKind::Select
    }

    fn compatibility(&self, _driver: DriverType) -> bool {
        true
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("table", &self.table)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        if self.group.has_having() && self.group.is_empty() {
            return Err(Error::invalid_syntax(w.driver(), "HAVING requires GROUP BY"));
        }

        w.push("SELECT ");
        self.write_columns(&mut w)?;
        w.push(" FROM ").identifier(&self.table);
        self.conditions.write_clause("WHERE", &mut w)?;
        self.group.write_to(&mut w)?;
        self.order.write_to(&mut w)?;
        self.limit.write_to(&mut w);
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}
