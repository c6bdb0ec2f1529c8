//! LIMIT / ORDER BY / GROUP BY modifiers

use super::condition::{Condition, Conditions};
use super::validate_identifier;
use super::writer::SqlWriter;
use crate::driver::DriverType;
use crate::error::{Error, Result};
use indexmap::IndexMap;

/// Row window: `LIMIT n OFFSET m`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Limit {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }

    pub fn write_to(&self, w: &mut SqlWriter) {
        let sql = w.dialect().limit_syntax(self.limit, self.offset);
        w.push(&sql);
    }

    /// Single-table UPDATE/DELETE form: `LIMIT row_count` only
    pub(crate) fn write_row_count(&self, w: &mut SqlWriter) {
        if let Some(limit) = self.limit {
            w.push(&format!(" LIMIT {}", limit));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Ordered `column -> direction` mapping; re-adding a column keeps its
/// original position and updates the direction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Order(IndexMap<String, OrderDirection>);

impl Order {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, direction: OrderDirection) {
        self.0.insert(column.into(), direction);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn write_to(&self, w: &mut SqlWriter) -> Result<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        w.push(" ORDER BY ");
        for (i, (column, direction)) in self.0.iter().enumerate() {
            validate_identifier("order column", column)?;
            if i > 0 {
                w.push(", ");
            }
            w.identifier(column).push(" ").push(direction.as_sql());
        }
        Ok(())
    }
}

/// `GROUP BY` columns with optional `HAVING` predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    columns: Vec<String>,
    having: Conditions,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(&mut self, column: impl Into<String>) {
        let column = column.into();
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    pub fn having(&mut self, condition: Condition) {
        self.having.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has_having(&self) -> bool {
        !self.having.is_empty()
    }

    pub fn write_to(&self, w: &mut SqlWriter) -> Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }
        for column in &self.columns {
            validate_identifier("group column", column)?;
        }
        w.push(" GROUP BY ").identifier_list(&self.columns);
        self.having.write_clause("HAVING", w)
    }
}

/// Gate ORDER BY / LIMIT on UPDATE and DELETE, which only the MySQL family
/// accepts; an offset is only meaningful with a deterministic order.
pub(crate) fn check_row_window(
    driver: DriverType,
    statement: &str,
    order: &Order,
    limit: &Limit,
) -> Result<()> {
    if order.is_empty() && limit.is_empty() {
        return Ok(());
    }
    if !driver.is_mysql_family() {
        return Err(Error::unsupported(
            driver,
            format!("ORDER BY/LIMIT on {}", statement),
        ));
    }
    if limit.offset.is_some() && order.is_empty() {
        return Err(Error::invalid_syntax(
            driver,
            format!("{} with an offset requires ORDER BY", statement),
        ));
    }
    // MySQL only accepts `LIMIT row_count` on single-table UPDATE/DELETE
    if limit.offset.is_some() {
        return Err(Error::unsupported(driver, format!("OFFSET on {}", statement)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverType;
    use crate::statements::Operator;

    #[test]
    fn test_order_keeps_first_position() {
        let mut order = Order::new();
        order.push("name", OrderDirection::Asc);
        order.push("id", OrderDirection::Desc);
        order.push("name", OrderDirection::Desc);

        let mut w = SqlWriter::for_driver(DriverType::MySQL, true);
        order.write_to(&mut w).unwrap();
        assert_eq!(w.sql(), " ORDER BY `name` DESC, `id` DESC");
    }

    #[test]
    fn test_group_with_having() {
        let mut group = Group::new();
        group.column("country");
        group.having(Condition::new("total", Operator::GreaterThan, 10));

        let mut w = SqlWriter::for_driver(DriverType::PostgreSQL, false);
        group.write_to(&mut w).unwrap();
        assert_eq!(w.sql(), " GROUP BY country HAVING total > $1");
    }

    #[test]
    fn test_limit() {
        let mut w = SqlWriter::for_driver(DriverType::SQLite, false);
        Limit::new(10, 20).write_to(&mut w);
        assert_eq!(w.sql(), " LIMIT 10 OFFSET 20");
        assert!(Limit::default().is_empty());

        let mut w = SqlWriter::for_driver(DriverType::MySQL, false);
        Limit::new(10, 20).write_row_count(&mut w);
        assert_eq!(w.sql(), " LIMIT 10");
    }

    #[test]
    fn test_row_window_gate() {
        let mut order = Order::new();
        let limit = Limit {
            limit: Some(5),
            offset: Some(10),
        };
        assert!(check_row_window(DriverType::MySQL, "UPDATE", &order, &Limit::default()).is_ok());
        assert!(matches!(
            check_row_window(DriverType::MySQL, "UPDATE", &order, &limit),
            Err(Error::InvalidSyntax { .. })
        ));
        order.push("id", OrderDirection::Asc);
        assert!(matches!(
            check_row_window(DriverType::MariaDB, "DELETE", &order, &limit),
            Err(Error::UnsupportedFeature { .. })
        ));
        let row_count = Limit {
            limit: Some(5),
            offset: None,
        };
        assert!(check_row_window(DriverType::MariaDB, "DELETE", &order, &row_count).is_ok());
        assert!(matches!(
            check_row_window(DriverType::SQLite, "DELETE", &order, &limit),
            Err(Error::UnsupportedFeature { .. })
        ));
    }
}
