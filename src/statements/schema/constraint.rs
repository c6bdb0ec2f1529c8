//! Table-level constraints

use crate::error::{Error, Result};
use crate::statements::index::IndexType;
use crate::statements::writer::SqlWriter;
use crate::statements::{validate_identifier, validate_identifiers};
use serde::{Deserialize, Serialize};

/// What happens to referencing rows when the referenced row changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
    NoAction,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

/// `FOREIGN KEY (cols) REFERENCES table (cols)` with referential actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKey {
    pub fn new<C, R>(columns: C, referenced_table: impl Into<String>, referenced_columns: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            referenced_table: referenced_table.into(),
            referenced_columns: referenced_columns.into_iter().map(Into::into).collect(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> Result<()> {
        let driver = w.driver();
        validate_identifiers("foreign key columns", &self.columns)?;
        validate_identifier("referenced table", &self.referenced_table)?;
        validate_identifiers("referenced columns", &self.referenced_columns)?;
        if self.columns.len() != self.referenced_columns.len() {
            return Err(Error::invalid_syntax(
                driver,
                format!(
                    "foreign key has {} columns but references {}",
                    self.columns.len(),
                    self.referenced_columns.len()
                ),
            ));
        }

        w.push("FOREIGN KEY (")
            .identifier_list(&self.columns)
            .push(") REFERENCES ")
            .identifier(&self.referenced_table)
            .push(" (")
            .identifier_list(&self.referenced_columns)
            .push(")");

        for (clause, action) in [("ON DELETE", self.on_delete), ("ON UPDATE", self.on_update)] {
            if let Some(action) = action {
                // InnoDB parses SET DEFAULT but rejects the table
                if action == ReferentialAction::SetDefault && driver.is_mysql_family() {
                    return Err(Error::unsupported(driver, "ON DELETE/UPDATE SET DEFAULT"));
                }
                w.push(" ").push(clause).push(" ").push(action.as_sql());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    /// Caller-supplied boolean SQL expression, emitted verbatim
    Check(String),
    ForeignKey(ForeignKey),
    Index {
        index_type: IndexType,
        columns: Vec<String>,
    },
}

/// Constraint clause of a CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConstraint {
    pub name: Option<String>,
    pub kind: ConstraintKind,
}

impl TableConstraint {
    fn from_kind(kind: ConstraintKind) -> Self {
        Self { name: None, kind }
    }

    pub fn primary_key<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_kind(ConstraintKind::PrimaryKey(
            columns.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_kind(ConstraintKind::Unique(
            columns.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn check(expression: impl Into<String>) -> Self {
        Self::from_kind(ConstraintKind::Check(expression.into()))
    }

    pub fn foreign_key(foreign_key: ForeignKey) -> Self {
        Self::from_kind(ConstraintKind::ForeignKey(foreign_key))
    }

    pub fn index<I, S>(index_type: IndexType, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_kind(ConstraintKind::Index {
            index_type,
            columns: columns.into_iter().map(Into::into).collect(),
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn is_index(&self) -> bool {
        matches!(self.kind, ConstraintKind::Index { .. })
    }

    pub(crate) fn write_to(&self, w: &mut SqlWriter) -> Result<()> {
        if let Some(name) = &self.name {
            validate_identifier("constraint name", name)?;
        }

        if let ConstraintKind::Index {
            index_type,
            columns,
        } = &self.kind
        {
            // MySQL names inline indexes after the keyword, not with CONSTRAINT
            let driver = w.driver();
            if !driver.is_mysql_family() {
                return Err(Error::unsupported(driver, "inline INDEX in CREATE TABLE"));
            }
            validate_identifiers("index columns", columns)?;
            if let Some(prefix) = index_type.keyword() {
                w.push(prefix).push(" ");
            }
            w.push("INDEX ");
            if let Some(name) = &self.name {
                w.identifier(name).push(" ");
            }
            w.push("(").identifier_list(columns).push(")");
            return Ok(());
        }

        if let Some(name) = &self.name {
            w.push("CONSTRAINT ").identifier(name).push(" ");
        }
        match &self.kind {
            ConstraintKind::PrimaryKey(columns) => {
                validate_identifiers("primary key columns", columns)?;
                w.push("PRIMARY KEY (").identifier_list(columns).push(")");
            }
            ConstraintKind::Unique(columns) => {
                validate_identifiers("unique columns", columns)?;
                w.push("UNIQUE (").identifier_list(columns).push(")");
            }
            ConstraintKind::Check(expression) => {
                if expression.trim().is_empty() {
                    return Err(Error::missing_field("check expression"));
                }
                w.push("CHECK (").push(expression).push(")");
            }
            ConstraintKind::ForeignKey(foreign_key) => foreign_key.write_to(w)?,
            ConstraintKind::Index { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverType;

    fn render(constraint: &TableConstraint, driver: DriverType) -> Result<String> {
        let mut w = SqlWriter::for_driver(driver, false);
        constraint.write_to(&mut w)?;
        Ok(w.sql().to_string())
    }

    #[test]
    fn test_named_foreign_key() {
        let constraint = TableConstraint::foreign_key(
            ForeignKey::new(["user_id"], "users", ["id"])
                .on_delete(ReferentialAction::Cascade)
                .on_update(ReferentialAction::NoAction),
        )
        .named("fk_orders_user");

        assert_eq!(
            render(&constraint, DriverType::PostgreSQL).unwrap(),
            "CONSTRAINT fk_orders_user FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE ON UPDATE NO ACTION"
        );
    }

    #[test]
    fn test_set_default_rejected_on_mysql() {
        let constraint = TableConstraint::foreign_key(
            ForeignKey::new(["user_id"], "users", ["id"]).on_delete(ReferentialAction::SetDefault),
        );
        assert!(render(&constraint, DriverType::MySQL).is_err());
        assert!(render(&constraint, DriverType::SQLite).is_ok());
    }

    #[test]
    fn test_inline_index_is_mysql_only() {
        let constraint = TableConstraint::index(IndexType::FullText, ["body"]).named("ft_body");
        assert_eq!(
            render(&constraint, DriverType::MySQL).unwrap(),
            "FULLTEXT INDEX ft_body (body)"
        );
        assert!(render(&constraint, DriverType::PostgreSQL).is_err());
    }

    #[test]
    fn test_check_and_unique() {
        assert_eq!(
            render(&TableConstraint::check("price > 0"), DriverType::SQLite).unwrap(),
            "CHECK (price > 0)"
        );
        assert_eq!(
            render(
                &TableConstraint::unique(["email", "tenant_id"]).named("uq_email"),
                DriverType::MariaDB
            )
            .unwrap(),
            "CONSTRAINT uq_email UNIQUE (email, tenant_id)"
        );
        assert!(render(&TableConstraint::unique(Vec::<String>::new()), DriverType::MySQL).is_err());
    }
}
