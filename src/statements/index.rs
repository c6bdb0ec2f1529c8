//! CREATE INDEX / DROP INDEX

use super::condition::{Condition, Conditions, Operator};
use super::drop::DropBehavior;
use super::writer::SqlWriter;
use super::{
    validate_identifier, validate_identifiers, CompiledStatement, QueryHooks, QueryProvider,
    RenderContext, StatementKind,
};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexType {
    #[default]
    Normal,
    Unique,
    FullText,
    Spatial,
}

impl IndexType {
    /// Keyword placed before `INDEX`
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            IndexType::Normal => None,
            IndexType::Unique => Some("UNIQUE"),
            IndexType::FullText => Some("FULLTEXT"),
            IndexType::Spatial => Some("SPATIAL"),
        }
    }
}

/// Index access method (`USING ...`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexMethod {
    BTree,
    Hash,
    Gin,
    Gist,
    Brin,
}

impl IndexMethod {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IndexMethod::BTree => "BTREE",
            IndexMethod::Hash => "HASH",
            IndexMethod::Gin => "GIN",
            IndexMethod::Gist => "GIST",
            IndexMethod::Brin => "BRIN",
        }
    }

    pub fn supported_by(&self, driver: DriverType) -> bool {
        match self {
            IndexMethod::BTree | IndexMethod::Hash => {
                driver.is_mysql_family() || driver == DriverType::PostgreSQL
            }
            IndexMethod::Gin | IndexMethod::Gist | IndexMethod::Brin => {
                driver == DriverType::PostgreSQL
            }
        }
    }
}

/// How the index is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CreateMethode {
    #[default]
    Default,
    /// PostgreSQL `CONCURRENTLY`: no write lock, not allowed in a transaction
    Concurrently,
}

/// `CREATE [UNIQUE|FULLTEXT|SPATIAL] INDEX ... ON table (columns)`
#[derive(Debug, Default)]
pub struct CreateIndex {
    name: String,
    table: String,
    columns: Vec<String>,
    index_type: IndexType,
    method: Option<IndexMethod>,
    create_methode: CreateMethode,
    if_not_exists: bool,
    include: Vec<String>,
    conditions: Conditions,
    pub(crate) hooks: QueryHooks,
}

impl CreateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn index_type(mut self, index_type: IndexType) -> Self {
        self.index_type = index_type;
        self
    }

    pub fn method(mut self, method: IndexMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn create_methode(mut self, create_methode: CreateMethode) -> Self {
        self.create_methode = create_methode;
        self
    }

    pub fn concurrently(self) -> Self {
        self.create_methode(CreateMethode::Concurrently)
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// PostgreSQL covering columns
    pub fn include<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Partial index predicate; rendered with literal values
    pub fn condition(mut self, key: impl Into<String>, operator: Operator, value: impl Into<SqlValue>) -> Self {
        self.conditions.push(Condition::new(key, operator, value));
        self
    }

    pub fn add_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if matches!(self.index_type, IndexType::FullText | IndexType::Spatial)
            && !driver.is_mysql_family()
        {
            return Err(Error::unsupported(driver, "FULLTEXT/SPATIAL indexes"));
        }
        if let Some(method) = self.method {
            if !method.supported_by(driver) {
                return Err(Error::unsupported(
                    driver,
                    format!("index method {}", method.as_sql()),
                ));
            }
        }
        if self.create_methode == CreateMethode::Concurrently && driver != DriverType::PostgreSQL {
            return Err(Error::unsupported(driver, "CREATE INDEX CONCURRENTLY"));
        }
        if !self.include.is_empty() && driver != DriverType::PostgreSQL {
            return Err(Error::unsupported(driver, "INCLUDE columns"));
        }
        if !self.conditions.is_empty() && driver.is_mysql_family() {
            return Err(Error::unsupported(driver, "partial indexes"));
        }
        if self.if_not_exists && driver == DriverType::MySQL {
            return Err(Error::unsupported(driver, "CREATE INDEX IF NOT EXISTS"));
        }
        Ok(())
    }
}

impl QueryProvider for CreateIndex {
    fn kind(&self) -> StatementKind {
        StatementKind::CreateIndex
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn transactional(&self, driver: DriverType) -> bool {
        !(driver == DriverType::PostgreSQL && self.create_methode == CreateMethode::Concurrently)
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("index name", &self.name)?;
        validate_identifier("table", &self.table)?;
        validate_identifiers("index columns", &self.columns)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        let driver = w.driver();
        self.check_features(driver)?;

        if driver.is_mysql_family() && self.method.is_some() && self.index_type != IndexType::Normal
            && self.index_type != IndexType::Unique
        {
            return Err(Error::invalid_syntax(
                driver,
                "FULLTEXT/SPATIAL indexes do not take an index method",
            ));
        }

        w.push("CREATE ");
        if let Some(keyword) = self.index_type.keyword() {
            w.push(keyword).push(" ");
        }
        w.push("INDEX ");
        if self.create_methode == CreateMethode::Concurrently {
            w.push("CONCURRENTLY ");
        }
        if self.if_not_exists {
            w.push("IF NOT EXISTS ");
        }
        w.identifier(&self.name).push(" ON ").identifier(&self.table);

        if driver == DriverType::PostgreSQL {
            if let Some(method) = self.method {
                w.push(" USING ").push(method.as_sql());
            }
        }
        w.push(" (").identifier_list(&self.columns).push(")");
        if driver.is_mysql_family() {
            if let Some(method) = self.method {
                w.push(" USING ").push(method.as_sql());
            }
        }

        if !self.include.is_empty() {
            validate_identifiers("include columns", &self.include)?;
            w.push(" INCLUDE (").identifier_list(&self.include).push(")");
        }

        if !self.conditions.is_empty() {
            w.push(" WHERE ");
            self.conditions.write_literal(&mut w)?;
        }

        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

/// `DROP INDEX`
#[derive(Debug, Default)]
pub struct DropIndex {
    names: Vec<String>,
    table: Option<String>,
    if_exists: bool,
    concurrently: bool,
    behavior: Option<DropBehavior>,
    pub(crate) hooks: QueryHooks,
}

impl DropIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Owning table, required by MySQL and MariaDB
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn concurrently(mut self) -> Self {
        self.concurrently = true;
        self
    }

    pub fn behavior(mut self, behavior: DropBehavior) -> Self {
        self.behavior = Some(behavior);
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if driver != DriverType::PostgreSQL {
            if self.names.len() > 1 {
                return Err(Error::unsupported(driver, "dropping several indexes in one statement"));
            }
            if self.concurrently {
                return Err(Error::unsupported(driver, "DROP INDEX CONCURRENTLY"));
            }
            if self.behavior.is_some() {
                return Err(Error::unsupported(driver, "DROP INDEX CASCADE/RESTRICT"));
            }
        }
        if self.if_exists && driver == DriverType::MySQL {
            return Err(Error::unsupported(driver, "DROP INDEX IF EXISTS"));
        }
        Ok(())
    }
}

impl QueryProvider for DropIndex {
    fn kind(&self) -> StatementKind {
        StatementKind::DropIndex
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn transactional(&self, driver: DriverType) -> bool {
        !(driver == DriverType::PostgreSQL && self.concurrently)
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifiers("index name", &self.names)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        let driver = w.driver();
        self.check_features(driver)?;

        if self.concurrently && (self.names.len() > 1 || self.behavior == Some(DropBehavior::Cascade)) {
            return Err(Error::invalid_syntax(
                driver,
                "DROP INDEX CONCURRENTLY takes a single index and no CASCADE",
            ));
        }

        w.push("DROP INDEX ");
        if self.concurrently {
            w.push("CONCURRENTLY ");
        }
        if self.if_exists {
            w.push("IF EXISTS ");
        }
        w.identifier_list(&self.names);

        if driver.is_mysql_family() {
            let table = self
                .table
                .as_deref()
                .ok_or_else(|| Error::missing_field("table"))?;
            validate_identifier("table", table)?;
            w.push(" ON ").identifier(table);
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

    fn sql(provider: &dyn QueryProvider, driver: DriverType) -> Result<String> {
        provider
            .generate_sql_string(&RenderContext::new(driver))
            .map(|sql| sql.unwrap_or_default())
    }

    #[test]
    fn test_concurrently_is_postgres_only() {
        let index = CreateIndex::new()
            .name("idx_users_email")
            .table("users")
            .column("email")
            .concurrently();

        assert_eq!(
            sql(&index, DriverType::PostgreSQL).unwrap(),
            "CREATE INDEX CONCURRENTLY idx_users_email ON users (email);"
        );
        assert!(!index.transactional(DriverType::PostgreSQL));
        for driver in [DriverType::MySQL, DriverType::MariaDB, DriverType::SQLite] {
            assert!(!index.compatibility(driver));
            assert!(matches!(
                sql(&index, driver),
                Err(Error::UnsupportedFeature { .. })
            ));
        }
    }

    #[test]
    fn test_method_placement() {
        let index = CreateIndex::new()
            .name("idx_t_a")
            .table("t")
            .column("a")
            .method(IndexMethod::Hash);
        assert_eq!(
            sql(&index, DriverType::MySQL).unwrap(),
            "CREATE INDEX idx_t_a ON t (a) USING HASH;"
        );
        assert_eq!(
            sql(&index, DriverType::PostgreSQL).unwrap(),
            "CREATE INDEX idx_t_a ON t USING HASH (a);"
        );
        assert!(!index.compatibility(DriverType::SQLite));

        let gin = CreateIndex::new()
            .name("idx_docs")
            .table("docs")
            .column("body")
            .method(IndexMethod::Gin);
        assert!(gin.compatibility(DriverType::PostgreSQL));
        assert!(!gin.compatibility(DriverType::MariaDB));
    }

    #[test]
    fn test_partial_covering_index() {
        let index = CreateIndex::new()
            .name("idx_active_users")
            .table("users")
            .column("email")
            .index_type(IndexType::Unique)
            .include(["name"])
            .if_not_exists()
            .condition("deleted", Operator::Equals, false);

        let compiled = index
            .render(&RenderContext::new(DriverType::PostgreSQL))
            .unwrap()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_active_users ON users (email) INCLUDE (name) WHERE deleted = FALSE;"
        );
        assert!(compiled.params.is_empty());
        assert!(!index.compatibility(DriverType::SQLite));
    }

    #[test]
    fn test_fulltext() {
        let index = CreateIndex::new()
            .name("ft_posts")
            .table("posts")
            .columns(["title", "body"])
            .index_type(IndexType::FullText);
        assert_eq!(
            sql(&index, DriverType::MariaDB).unwrap(),
            "CREATE FULLTEXT INDEX ft_posts ON posts (title, body);"
        );
        assert!(!index.compatibility(DriverType::PostgreSQL));
    }

    #[test]
    fn test_drop_index_per_driver() {
        let drop = DropIndex::new().name("idx_a").table("t");
        assert_eq!(sql(&drop, DriverType::MySQL).unwrap(), "DROP INDEX idx_a ON t;");
        assert_eq!(sql(&drop, DriverType::SQLite).unwrap(), "DROP INDEX idx_a;");

        let multi = DropIndex::new()
            .names(["idx_a", "idx_b"])
            .if_exists()
            .behavior(DropBehavior::Cascade);
        assert_eq!(
            sql(&multi, DriverType::PostgreSQL).unwrap(),
            "DROP INDEX IF EXISTS idx_a, idx_b CASCADE;"
        );
        assert!(!multi.compatibility(DriverType::SQLite));
        assert!(!multi.compatibility(DriverType::MariaDB));

        let missing_table = DropIndex::new().name("idx_a").if_exists();
        assert!(matches!(
            sql(&missing_table, DriverType::MariaDB),
            Err(Error::MissingField { .. })
        ));
        assert!(!missing_table.compatibility(DriverType::MySQL));
    }
}
