//! CREATE DATABASE / DROP DATABASE
//!
//! SQLite has one database per file, so both statements are incompatible
//! with it and fail instead of rendering nothing.

use super::writer::SqlWriter;
use super::{
    validate_identifier, CompiledStatement, QueryHooks, QueryProvider, RenderContext,
    StatementKind,
};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, Result};

/// `CREATE DATABASE`
#[derive(Debug, Default)]
pub struct DatabaseCreate {
    name: String,
    if_not_exists: bool,
    character_set: Option<String>,
    collate: Option<String>,
    encoding: Option<String>,
    lc_collate: Option<String>,
    lc_ctype: Option<String>,
    template: Option<String>,
    pub(crate) hooks: QueryHooks,
}

impl DatabaseCreate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// MySQL family only
    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// MySQL family `CHARACTER SET`
    pub fn character_set(mut self, charset: impl Into<String>) -> Self {
        self.character_set = Some(charset.into());
        self
    }

    /// MySQL family `COLLATE`
    pub fn collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    /// PostgreSQL `ENCODING`
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn lc_collate(mut self, lc_collate: impl Into<String>) -> Self {
        self.lc_collate = Some(lc_collate.into());
        self
    }

    pub fn lc_ctype(mut self, lc_ctype: impl Into<String>) -> Self {
        self.lc_ctype = Some(lc_ctype.into());
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        match driver {
            DriverType::SQLite => Err(Error::incompatible(driver, "CREATE DATABASE")),
            DriverType::PostgreSQL => {
                if self.if_not_exists {
                    return Err(Error::unsupported(driver, "CREATE DATABASE IF NOT EXISTS"));
                }
                if self.character_set.is_some() || self.collate.is_some() {
                    return Err(Error::unsupported(driver, "CHARACTER SET/COLLATE (use ENCODING/LC_COLLATE)"));
                }
                Ok(())
            }
            DriverType::MySQL | DriverType::MariaDB => {
                if self.encoding.is_some()
                    || self.lc_collate.is_some()
                    || self.lc_ctype.is_some()
                    || self.template.is_some()
                {
                    return Err(Error::unsupported(
                        driver,
                        "ENCODING/LC_COLLATE/LC_CTYPE/TEMPLATE (use CHARACTER SET/COLLATE)",
                    ));
                }
                Ok(())
            }
        }
    }
}

impl QueryProvider for DatabaseCreate {
    fn kind(&self) -> StatementKind {
        StatementKind::DatabaseCreate
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn transactional(&self, driver: DriverType) -> bool {
        driver != DriverType::PostgreSQL
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("database", &self.name)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        let driver = w.driver();
        self.check_features(driver)?;

        w.push("CREATE DATABASE ");
        if self.if_not_exists {
            w.push("IF NOT EXISTS ");
        }
        w.identifier(&self.name);

        if driver.is_mysql_family() {
            if let Some(charset) = &self.character_set {
                validate_identifier("character set", charset)?;
                w.push(" CHARACTER SET ").push(charset);
            }
            if let Some(collate) = &self.collate {
                validate_identifier("collate", collate)?;
                w.push(" COLLATE ").push(collate);
            }
        } else {
            if let Some(template) = &self.template {
                validate_identifier("template", template)?;
                w.push(" TEMPLATE ").identifier(template);
            }
            for (option, value) in [
                ("ENCODING", &self.encoding),
                ("LC_COLLATE", &self.lc_collate),
                ("LC_CTYPE", &self.lc_ctype),
            ] {
                if let Some(value) = value {
                    let literal = SqlValue::from(value).to_sql_literal(driver)?;
                    w.push(" ").push(option).push(" ").push(&literal);
                }
            }
        }

        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

/// `DROP DATABASE`
#[derive(Debug, Default)]
pub struct DatabaseDrop {
    name: String,
    if_exists: bool,
    force: bool,
    pub(crate) hooks: QueryHooks,
}

impl DatabaseDrop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// PostgreSQL 13+ `WITH (FORCE)`: terminate existing connections first
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if driver == DriverType::SQLite {
            return Err(Error::incompatible(driver, "DROP DATABASE"));
        }
        if self.force && driver != DriverType::PostgreSQL {
            return Err(Error::unsupported(driver, "DROP DATABASE WITH (FORCE)"));
        }
        Ok(())
    }
}

impl QueryProvider for DatabaseDrop {
    fn kind(&self) -> StatementKind {
        StatementKind::DatabaseDrop
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn transactional(&self, driver: DriverType) -> bool {
        driver != DriverType::PostgreSQL
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("database", &self.name)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        self.check_features(w.driver())?;

        w.push("DROP DATABASE ");
        if self.if_exists {
            w.push("IF EXISTS ");
        }
        w.identifier(&self.name);
        if self.force {
            w.push(" WITH (FORCE)");
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
    fn test_create_database_mysql() {
        let create = DatabaseCreate::new()
            .name("shop")
            .if_not_exists()
            .character_set("utf8mb4")
            .collate("utf8mb4_unicode_ci");
        let sql = create
            .generate_sql_string(&RenderContext::new(DriverType::MySQL))
            .unwrap()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE DATABASE IF NOT EXISTS shop CHARACTER SET utf8mb4 COLLATE utf8mb4_unicode_ci;"
        );
        assert!(!create.compatibility(DriverType::PostgreSQL));
    }

    #[test]
    fn test_create_database_postgres() {
        let create = DatabaseCreate::new()
            .name("shop")
            .template("template0")
            .encoding("UTF8")
            .lc_collate("en_US.UTF-8");
        let sql = create
            .generate_sql_string(&RenderContext::new(DriverType::PostgreSQL))
            .unwrap()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE DATABASE shop TEMPLATE template0 ENCODING 'UTF8' LC_COLLATE 'en_US.UTF-8';"
        );
        assert!(!create.transactional(DriverType::PostgreSQL));
        assert!(create.transactional(DriverType::MySQL));
    }

    #[test]
    fn test_sqlite_fails_loudly() {
        let create = DatabaseCreate::new().name("shop");
        let drop = DatabaseDrop::new().name("shop");
        assert!(!create.compatibility(DriverType::SQLite));
        assert!(!drop.compatibility(DriverType::SQLite));
        assert!(matches!(
            drop.render(&RenderContext::new(DriverType::SQLite)),
            Err(Error::Incompatible { .. })
        ));
    }

    #[test]
    fn test_drop_database_force() {
        let drop = DatabaseDrop::new().name("shop").if_exists().force();
        let sql = drop
            .generate_sql_string(&RenderContext::new(DriverType::PostgreSQL))
            .unwrap()
            .unwrap();
        assert_eq!(sql, "DROP DATABASE IF EXISTS shop WITH (FORCE);");
        assert!(!drop.compatibility(DriverType::MariaDB));
    }
}
