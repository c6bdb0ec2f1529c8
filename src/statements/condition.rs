//! WHERE / HAVING predicates

use super::writer::SqlWriter;
use super::validate_identifier;
use crate::database::types::SqlValue;
use crate::error::{Error, Result};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterEquals,
    LessThan,
    LessEquals,
    In,
    NotIn,
    Between,
    Like,
    IsNull,
    IsNotNull,
}

impl Operator {
    /// SQL spelling of a value-taking operator.
    ///
    /// Null checks carry their own syntax and never reach this table.
    pub fn as_sql(&self) -> Result<&'static str> {
        match self {
            Operator::Equals => Ok("="),
            Operator::NotEquals => Ok("<>"),
            Operator::GreaterThan => Ok(">"),
            Operator::GreaterEquals => Ok(">="),
            Operator::LessThan => Ok("<"),
            Operator::LessEquals => Ok("<="),
            Operator::In => Ok("IN"),
            Operator::NotIn => Ok("NOT IN"),
            Operator::Between => Ok("BETWEEN"),
            Operator::Like => Ok("LIKE"),
            Operator::IsNull | Operator::IsNotNull => Err(Error::internal(format!(
                "{:?} has no operand and cannot be rendered as a comparison",
                self
            ))),
        }
    }

    pub fn is_null_check(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

/// How a condition joins the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConditionType {
    #[default]
    And,
    Or,
}

impl ConditionType {
    fn as_sql(&self) -> &'static str {
        match self {
            ConditionType::And => "AND",
            ConditionType::Or => "OR",
        }
    }
}

/// A single predicate: `[NOT] key <operator> value`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub key: String,
    pub operator: Operator,
    pub value: SqlValue,
    pub not: bool,
    pub condition_type: ConditionType,
}

impl Condition {
    pub fn new(key: impl Into<String>, operator: Operator, value: impl Into<SqlValue>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
            not: false,
            condition_type: ConditionType::And,
        }
    }

    pub fn is_null(key: impl Into<String>) -> Self {
        Self::new(key, Operator::IsNull, SqlValue::Null)
    }

    pub fn is_not_null(key: impl Into<String>) -> Self {
        Self::new(key, Operator::IsNotNull, SqlValue::Null)
    }

    /// Negate the predicate
    pub fn not(mut self) -> Self {
        self.not = true;
        self
    }

    /// Join with OR instead of AND
    pub fn or(mut self) -> Self {
        self.condition_type = ConditionType::Or;
        self
    }

    pub fn condition_type(mut self, condition_type: ConditionType) -> Self {
        self.condition_type = condition_type;
        self
    }

    fn write_to(&self, w: &mut SqlWriter) -> Result<()> {
        validate_identifier("condition key", &self.key)?;

        if self.not {
            w.push("NOT ");
        }
        w.identifier(&self.key);

        match self.operator {
            Operator::IsNull => {
                w.push(" IS NULL");
                return Ok(());
            }
            Operator::IsNotNull => {
                w.push(" IS NOT NULL");
                return Ok(());
            }
            _ => {}
        }

        w.push(" ").push(self.operator.as_sql()?).push(" ");
        match (&self.value, self.operator) {
            (SqlValue::Raw(sql), _) => {
                w.push(sql);
            }
            (SqlValue::List(values), Operator::In | Operator::NotIn) => {
                if values.is_empty() {
                    return Err(Error::invalid_syntax(
                        w.driver(),
                        format!("{} needs at least one value for '{}'", self.operator.as_sql()?, self.key),
                    ));
                }
                w.push("(");
                w.values(values, ", ")?;
                w.push(")");
            }
            (SqlValue::List(values), Operator::Between) => {
                if values.len() != 2 {
                    return Err(Error::invalid_syntax(
                        w.driver(),
                        format!(
                            "BETWEEN needs exactly two values for '{}', got {}",
                            self.key,
                            values.len()
                        ),
                    ));
                }
                w.values(values, " AND ")?;
            }
            (value, Operator::In | Operator::NotIn) => {
                w.push("(");
                w.value(value)?;
                w.push(")");
            }
            (_, Operator::Between) => {
                return Err(Error::invalid_syntax(
                    w.driver(),
                    format!("BETWEEN on '{}' needs a two element list or raw SQL", self.key),
                ));
            }
            (value, _) => w.value(value)?,
        }
        Ok(())
    }
}

/// Insertion-ordered set of conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition; an identical condition already present is not repeated
    pub fn push(&mut self, condition: Condition) {
        if !self.0.contains(&condition) {
            self.0.push(condition);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    /// Write the predicates joined by each condition's own type
    pub fn write_to(&self, w: &mut SqlWriter) -> Result<()> {
        for (i, condition) in self.0.iter().enumerate() {
            if i > 0 {
                w.push(" ").push(condition.condition_type.as_sql()).push(" ");
            }
            condition.write_to(w)?;
        }
        Ok(())
    }

    /// Write ` <keyword> ...` when there is at least one condition
    pub fn write_clause(&self, keyword: &str, w: &mut SqlWriter) -> Result<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        w.push(" ").push(keyword).push(" ");
        self.write_to(w)
    }

    /// Write the predicates with inline literals instead of placeholders
    pub fn write_literal(&self, w: &mut SqlWriter) -> Result<()> {
        let previous = w.set_literal_mode(true);
        let result = self.write_to(w);
        w.set_literal_mode(previous);
        result
    }
}

impl From<Vec<Condition>> for Conditions {
    fn from(conditions: Vec<Condition>) -> Self {
        let mut set = Conditions::new();
        for condition in conditions {
            set.push(condition);
        }
        set
    }
}

impl<'a> IntoIterator for &'a Conditions {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverType;

    fn render(conditions: &Conditions, driver: DriverType) -> (String, Vec<SqlValue>) {
        let mut w = SqlWriter::for_driver(driver, false);
        conditions.write_to(&mut w).unwrap();
        let compiled = w.finish();
        (compiled.sql.trim_end_matches(';').to_string(), compiled.params)
    }

    #[test]
    fn test_single_condition_has_no_joiner() {
        let conditions = Conditions::from(vec![Condition::new("age", Operator::GreaterThan, 18).or()]);
        let (sql, params) = render(&conditions, DriverType::MySQL);
        assert_eq!(sql, "age > ?");
        assert_eq!(params, vec![SqlValue::Int(18)]);
    }

    #[test]
    fn test_joiners_come_from_the_joining_condition() {
        let conditions = Conditions::from(vec![
            Condition::new("a", Operator::Equals, 1).or(),
            Condition::new("b", Operator::Equals, 2).or(),
            Condition::new("c", Operator::Like, "x%"),
        ]);
        let (sql, params) = render(&conditions, DriverType::PostgreSQL);
        assert_eq!(sql, "a = $1 OR b = $2 AND c LIKE $3");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_null_checks_bind_nothing() {
        let conditions = Conditions::from(vec![
            Condition::is_null("deleted_at"),
            Condition::is_not_null("email").not(),
            Condition::new("id", Operator::NotEquals, 5),
        ]);
        let (sql, params) = render(&conditions, DriverType::SQLite);
        assert_eq!(sql, "deleted_at IS NULL AND NOT email IS NOT NULL AND id <> ?");
        assert_eq!(params, vec![SqlValue::Int(5)]);
    }

    #[test]
    fn test_in_and_between() {
        let conditions = Conditions::from(vec![
            Condition::new("id", Operator::In, SqlValue::list(vec![1, 2, 3])),
            Condition::new("age", Operator::Between, SqlValue::list(vec![18, 30])),
            Condition::new("role", Operator::NotIn, SqlValue::raw("(SELECT role FROM banned)")),
        ]);
        let (sql, params) = render(&conditions, DriverType::PostgreSQL);
        assert_eq!(
            sql,
            "id IN ($1, $2, $3) AND age BETWEEN $4 AND $5 AND role NOT IN (SELECT role FROM banned)"
        );
        assert_eq!(params.len(), 5);

        let bad = Conditions::from(vec![Condition::new("age", Operator::Between, 18)]);
        let mut w = SqlWriter::for_driver(DriverType::MySQL, false);
        assert!(bad.write_to(&mut w).is_err());
    }

    #[test]
    fn test_literal_rendering() {
        let conditions = Conditions::from(vec![
            Condition::new("status", Operator::Equals, "active"),
            Condition::new("archived", Operator::Equals, false),
        ]);
        let mut w = SqlWriter::for_driver(DriverType::PostgreSQL, false);
        conditions.write_literal(&mut w).unwrap();
        assert_eq!(w.sql(), "status = 'active' AND archived = FALSE");
        assert_eq!(w.param_count(), 0);
    }

    #[test]
    fn test_duplicates_are_kept_once() {
        let mut conditions = Conditions::new();
        conditions.push(Condition::new("a", Operator::Equals, 1));
        conditions.push(Condition::new("a", Operator::Equals, 1));
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn test_null_check_in_operator_table_is_internal_error() {
        assert!(matches!(Operator::IsNull.as_sql(), Err(Error::Internal(_))));
        assert_eq!(Operator::NotIn.as_sql().unwrap(), "NOT IN");
    }
}
