//! CREATE TABLE

use super::index::{CreateIndex, IndexType};
use super::schema::{
    Column, ConstraintKind, DataType, KeyPlacement, ReferentialAction, TableConstraint,
};
use super::writer::SqlWriter;
use super::{
    validate_identifier, CompiledStatement, QueryHooks, QueryProvider, RenderContext,
    StatementKind,
};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, Result};

/// `CREATE [TEMPORARY] TABLE [IF NOT EXISTS] name (columns, constraints) [options]`
///
/// Columns flagged as primary key are gathered into one table-level
/// `PRIMARY KEY (...)` clause. Index constraints are inlined on MySQL and
/// MariaDB; other drivers get them as `CREATE INDEX` follow-ups.
#[derive(Debug, Default)]
pub struct TableCreate {
    table: String,
    temporary: bool,
    if_not_exists: bool,
    columns: Vec<Column>,
    constraints: Vec<TableConstraint>,
    engine: Option<String>,
    charset: Option<String>,
    collate: Option<String>,
    comment: Option<String>,
    pub(crate) hooks: QueryHooks,
}

impl TableCreate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Shorthand for a plain column
    pub fn add_column(self, key: impl Into<String>, data_type: DataType) -> Self {
        self.column(Column::new(key, data_type))
    }

    pub fn constraint(mut self, constraint: TableConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// MySQL family `ENGINE=`
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// MySQL family `DEFAULT CHARSET=`
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// MySQL family `COLLATE=`
    pub fn collate(mut self, collate: impl Into<String>) -> Self {
        self.collate = Some(collate.into());
        self
    }

    /// MySQL family `COMMENT=`
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if driver.is_mysql_family() {
            for constraint in &self.constraints {
                if let ConstraintKind::ForeignKey(fk) = &constraint.kind {
                    if fk.on_delete == Some(ReferentialAction::SetDefault)
                        || fk.on_update == Some(ReferentialAction::SetDefault)
                    {
                        return Err(Error::unsupported(driver, "ON DELETE/UPDATE SET DEFAULT"));
                    }
                }
            }
            return Ok(());
        }

        if self.engine.is_some()
            || self.charset.is_some()
            || self.collate.is_some()
            || self.comment.is_some()
        {
            return Err(Error::unsupported(driver, "ENGINE/CHARSET/COLLATE/COMMENT table options"));
        }
        for column in &self.columns {
            if column.unsigned {
                return Err(Error::unsupported(driver, "UNSIGNED columns"));
            }
            if column.on_update_current_timestamp {
                return Err(Error::unsupported(driver, "ON UPDATE CURRENT_TIMESTAMP"));
            }
            if column.data_type == DataType::Enum {
                return Err(Error::unsupported(driver, "ENUM column type"));
            }
        }
        for constraint in &self.constraints {
            if let ConstraintKind::Index { index_type, .. } = &constraint.kind {
                if matches!(index_type, IndexType::FullText | IndexType::Spatial) {
                    return Err(Error::unsupported(driver, "FULLTEXT/SPATIAL indexes"));
                }
            }
        }
        Ok(())
    }

    fn deferred_index_name(&self, columns: &[String]) -> String {
        format!("idx_{}_{}", self.table, columns.join("_")).replace('.', "_")
    }
}

impl QueryProvider for TableCreate {
    fn kind(&self) -> StatementKind {
        StatementKind::TableCreate
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("table", &self.table)?;
        if self.columns.is_empty() {
            return Err(Error::missing_field("columns"));
        }
        let mut w = SqlWriter::new(ctx, self.kind())?;
        let driver = w.driver();
        self.check_features(driver)?;

        w.push("CREATE ");
        if self.temporary {
            w.push("TEMPORARY ");
        }
        w.push("TABLE ");
        if self.if_not_exists {
            w.push("IF NOT EXISTS ");
        }
        w.identifier(&self.table).push(" (");

        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            column.write_definition(&mut w, KeyPlacement::TableLevel)?;
        }

        let inline_keys = self.columns.iter().filter(|c| c.is_inline_key(&w)).count();
        let key_columns: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.column_type.is_primary_key() && !c.is_inline_key(&w))
            .map(|c| c.key.as_str())
            .collect();
        let has_key_constraint = self
            .constraints
            .iter()
            .any(|c| matches!(c.kind, ConstraintKind::PrimaryKey(_)));

        if inline_keys > 1 || (inline_keys == 1 && (!key_columns.is_empty() || has_key_constraint)) {
            return Err(Error::invalid_syntax(
                driver,
                "an AUTOINCREMENT key must be the only primary key column",
            ));
        }
        if !key_columns.is_empty() {
            if has_key_constraint {
                return Err(Error::invalid_syntax(
                    driver,
                    "primary key declared on columns and as a constraint",
                ));
            }
            w.push(", PRIMARY KEY (").identifier_list(&key_columns).push(")");
        }

        for constraint in &self.constraints {
            if constraint.is_index() && !driver.is_mysql_family() {
                continue;
            }
            w.push(", ");
            constraint.write_to(&mut w)?;
        }
        w.push(")");

        if let Some(engine) = &self.engine {
            validate_identifier("engine", engine)?;
            w.push(" ENGINE=").push(engine);
        }
        if let Some(charset) = &self.charset {
            validate_identifier("charset", charset)?;
            w.push(" DEFAULT CHARSET=").push(charset);
        }
        if let Some(collate) = &self.collate {
            validate_identifier("collate", collate)?;
            w.push(" COLLATE=").push(collate);
        }
        if let Some(comment) = &self.comment {
            let literal = SqlValue::from(comment).to_sql_literal(driver)?;
            w.push(" COMMENT=").push(&literal);
        }

        Ok(Some(w.finish()))
    }

    fn follow_ups(&self, driver: DriverType) -> Result<Vec<Box<dyn QueryProvider>>> {
        if driver.is_mysql_family() {
            return Ok(Vec::new());
        }
        let follow_ups = self
            .constraints
            .iter()
            .filter_map(|constraint| match &constraint.kind {
                ConstraintKind::Index {
                    index_type,
                    columns,
                } => {
                    let name = constraint
                        .name
                        .clone()
                        .unwrap_or_else(|| self.deferred_index_name(columns));
                    let mut index = CreateIndex::new()
                        .name(name)
                        .table(self.table.clone())
                        .columns(columns.iter().cloned())
                        .index_type(*index_type);
                    if self.if_not_exists {
                        index = index.if_not_exists();
                    }
                    Some(Box::new(index) as Box<dyn QueryProvider>)
                }
                _ => None,
            })
            .collect();
        Ok(follow_ups)
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}
