//! DROP TABLE / TRUNCATE TABLE

use super::writer::SqlWriter;
use super::{
    validate_identifier, validate_identifiers, CompiledStatement, QueryHooks, QueryProvider,
    RenderContext, StatementKind,
};
use crate::driver::DriverType;
use crate::error::{Error, Result};

/// Dependent objects handling for DROP / TRUNCATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropBehavior {
    Cascade,
    Restrict,
}

impl DropBehavior {
    pub fn as_sql(&self) -> &'static str {
        match self {
            DropBehavior::Cascade => "CASCADE",
            DropBehavior::Restrict => "RESTRICT",
        }
    }
}

/// PostgreSQL sequence handling for TRUNCATE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityBehavior {
    Restart,
    Continue,
}

impl IdentityBehavior {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IdentityBehavior::Restart => "RESTART IDENTITY",
            IdentityBehavior::Continue => "CONTINUE IDENTITY",
        }
    }
}

/// `DROP [TEMPORARY] TABLE [IF EXISTS] t1, t2 [CASCADE|RESTRICT]`
#[derive(Debug, Default)]
pub struct TableDrop {
    tables: Vec<String>,
    temporary: bool,
    if_exists: bool,
    behavior: Option<DropBehavior>,
    pub(crate) hooks: QueryHooks,
}

impl TableDrop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.tables.push(table.into());
        self
    }

    pub fn tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.extend(tables.into_iter().map(Into::into));
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn behavior(mut self, behavior: DropBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if self.temporary && !driver.is_mysql_family() {
            return Err(Error::unsupported(driver, "DROP TEMPORARY TABLE"));
        }
        if driver == DriverType::SQLite {
            if self.tables.len() > 1 {
                return Err(Error::unsupported(driver, "dropping several tables in one statement"));
            }
            if self.behavior.is_some() {
                return Err(Error::unsupported(driver, "DROP TABLE CASCADE/RESTRICT"));
            }
        }
        Ok(())
    }
}

impl QueryProvider for TableDrop {
    fn kind(&self) -> StatementKind {
        StatementKind::TableDrop
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifiers("table", &self.tables)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        self.check_features(w.driver())?;

        w.push("DROP ");
        if self.temporary {
            w.push("TEMPORARY ");
        }
        w.push("TABLE ");
        if self.if_exists {
            w.push("IF EXISTS ");
        }
        w.identifier_list(&self.tables);
        if let Some(behavior) = self.behavior {
            w.push(" ").push(behavior.as_sql());
        }
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

/// `TRUNCATE TABLE t [RESTART|CONTINUE IDENTITY] [CASCADE|RESTRICT]`
#[derive(Debug, Default)]
pub struct TableTruncate {
    table: String,
    identity: Option<IdentityBehavior>,
    behavior: Option<DropBehavior>,
    pub(crate) hooks: QueryHooks,
}

impl TableTruncate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn identity(mut self, identity: IdentityBehavior) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn behavior(mut self, behavior: DropBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if driver == DriverType::SQLite {
            return Err(Error::incompatible(driver, "TRUNCATE TABLE"));
        }
        if driver != DriverType::PostgreSQL {
            if self.identity.is_some() {
                return Err(Error::unsupported(driver, "TRUNCATE RESTART/CONTINUE IDENTITY"));
            }
            if self.behavior.is_some() {
                return Err(Error::unsupported(driver, "TRUNCATE CASCADE/RESTRICT"));
            }
        }
        Ok(())
    }
}

impl QueryProvider for TableTruncate {
    fn kind(&self) -> StatementKind {
        StatementKind::TableTruncate
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("table", &self.table)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        self.check_features(w.driver())?;

        w.push("TRUNCATE TABLE ").identifier(&self.table);
        if let Some(identity) = self.identity {
            w.push(" ").push(identity.as_sql());
        }
        if let Some(behavior) = self.behavior {
            w.push(" ").push(behavior.as_sql());
        }
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
    fn test_drop_tables() {
        let drop = TableDrop::new()
            .tables(["sessions", "tokens"])
            .if_exists()
            .behavior(DropBehavior::Cascade);
        let sql = drop
            .generate_sql_string(&RenderContext::new(DriverType::PostgreSQL))
            .unwrap()
            .unwrap();
        assert_eq!(sql, "DROP TABLE IF EXISTS sessions, tokens CASCADE;");
        assert!(!drop.compatibility(DriverType::SQLite));

        let temp = TableDrop::new().table("scratch").temporary();
        let sql = temp
            .generate_sql_string(&RenderContext::new(DriverType::MySQL))
            .unwrap()
            .unwrap();
        assert_eq!(sql, "DROP TEMPORARY TABLE scratch;");
        assert!(!temp.compatibility(DriverType::PostgreSQL));
    }

    #[test]
    fn test_truncate_is_incompatible_with_sqlite() {
        let truncate = TableTruncate::new().table("logs");
        assert!(!truncate.compatibility(DriverType::SQLite));
        assert!(truncate
            .render(&RenderContext::new(DriverType::SQLite))
            .unwrap_err()
            .is_compatibility());
        assert!(truncate.compatibility(DriverType::MySQL));
    }

    #[test]
    fn test_truncate_postgres_options() {
        let truncate = TableTruncate::new()
            .table("logs")
            .identity(IdentityBehavior::Restart)
            .behavior(DropBehavior::Restrict);
        let sql = truncate
            .generate_sql_string(&RenderContext::new(DriverType::PostgreSQL))
            .unwrap()
            .unwrap();
        assert_eq!(sql, "TRUNCATE TABLE logs RESTART IDENTITY RESTRICT;");
        assert!(!truncate.compatibility(DriverType::MariaDB));
    }

    #[test]
    fn test_missing_table() {
        assert!(matches!(
            TableTruncate::new().render(&RenderContext::new(DriverType::MySQL)),
            Err(Error::MissingField { .. })
        ));
        assert!(matches!(
            TableDrop::new().render(&RenderContext::new(DriverType::MySQL)),
            Err(Error::MissingField { .. })
        ));
    }
}
