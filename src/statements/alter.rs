//! ALTER TABLE family
//!
//! Every provider here renders `ALTER TABLE <table> <action>;`. SQLite only
//! supports adding plain columns and renaming.

use super::schema::{Column, DataType, ForeignKey, KeyPlacement, ReferentialAction};
use super::writer::SqlWriter;
use super::{
    validate_identifier, validate_identifiers, CompiledStatement, QueryHooks, QueryProvider,
    RenderContext, StatementKind,
};
use crate::driver::DriverType;
use crate::error::{Error, Result};

fn alter_table(w: &mut SqlWriter, table: &str) -> Result<()> {
    validate_identifier("table", table)?;
    w.push("ALTER TABLE ").identifier(table).push(" ");
    Ok(())
}

/// Column features only MySQL and MariaDB understand
fn check_column_features(column: &Column, driver: DriverType) -> Result<()> {
    if driver.is_mysql_family() {
        return Ok(());
    }
    if column.unsigned {
        return Err(Error::unsupported(driver, "UNSIGNED columns"));
    }
    if column.on_update_current_timestamp {
        return Err(Error::unsupported(driver, "ON UPDATE CURRENT_TIMESTAMP"));
    }
    if column.data_type == DataType::Enum {
        return Err(Error::unsupported(driver, "ENUM column type"));
    }
    Ok(())
}

/// Where an added column goes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnPosition {
    #[default]
    Default,
    First,
    After(String),
}

/// `ALTER TABLE t ADD COLUMN <definition> [FIRST | AFTER c]`
#[derive(Debug, Default)]
pub struct TableAlterAddColumn {
    table: String,
    column: Option<Column>,
    position: ColumnPosition,
    pub(crate) hooks: QueryHooks,
}

impl TableAlterAddColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn column(mut self, column: Column) -> Self {
        self.column = Some(column);
        self
    }

    pub fn position(mut self, position: ColumnPosition) -> Self {
        self.position = position;
        self
    }

    pub fn first(self) -> Self {
        self.position(ColumnPosition::First)
    }

    pub fn after(self, column: impl Into<String>) -> Self {
        self.position(ColumnPosition::After(column.into()))
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if self.position != ColumnPosition::Default && !driver.is_mysql_family() {
            return Err(Error::unsupported(driver, "FIRST/AFTER column positioning"));
        }
        if let Some(column) = &self.column {
            check_column_features(column, driver)?;
            if driver == DriverType::SQLite && (column.column_type.is_primary_key() || column.unique) {
                return Err(Error::unsupported(driver, "adding a PRIMARY KEY or UNIQUE column"));
            }
        }
        Ok(())
    }
}

impl QueryProvider for TableAlterAddColumn {
    fn kind(&self) -> StatementKind {
        StatementKind::TableAlter
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        let column = self
            .column
            .as_ref()
            .ok_or_else(|| Error::missing_field("column"))?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        self.check_features(w.driver())?;

        alter_table(&mut w, &self.table)?;
        w.push("ADD COLUMN ");
        column.write_definition(&mut w, KeyPlacement::Inline)?;
        match &self.position {
            ColumnPosition::Default => {}
            ColumnPosition::First => {
                w.push(" FIRST");
            }
            ColumnPosition::After(after) => {
                validate_identifier("after column", after)?;
                w.push(" AFTER ").identifier(after);
            }
        }
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

/// Attribute added over existing columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddAttribute {
    #[default]
    Unique,
    PrimaryKey,
}

/// `ALTER TABLE t ADD [CONSTRAINT name] UNIQUE|PRIMARY KEY (cols)`
#[derive(Debug, Default)]
pub struct TableAlterAddAttribute {
    table: String,
    attribute: AddAttribute,
    columns: Vec<String>,
    name: Option<String>,
    pub(crate) hooks: QueryHooks,
}

impl TableAlterAddAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn attribute(mut self, attribute: AddAttribute) -> Self {
        self.attribute = attribute;
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

    /// Constraint name (PostgreSQL only)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if driver == DriverType::SQLite {
            return Err(Error::incompatible(driver, "ALTER TABLE ADD CONSTRAINT"));
        }
        if self.name.is_some() && driver != DriverType::PostgreSQL {
            return Err(Error::unsupported(driver, "named constraints in ALTER TABLE ADD"));
        }
        Ok(())
    }
}

impl QueryProvider for TableAlterAddAttribute {
    fn kind(&self) -> StatementKind {
        StatementKind::TableAlter
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifiers("columns", &self.columns)?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        self.check_features(w.driver())?;

        alter_table(&mut w, &self.table)?;
        w.push("ADD ");
        if let Some(name) = &self.name {
            validate_identifier("constraint name", name)?;
            w.push("CONSTRAINT ").identifier(name).push(" ");
        }
        w.push(match self.attribute {
            AddAttribute::Unique => "UNIQUE (",
            AddAttribute::PrimaryKey => "PRIMARY KEY (",
        });
        w.identifier_list(&self.columns).push(")");
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

/// What DROP removes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Column(String),
    PrimaryKey,
}

/// `ALTER TABLE t DROP COLUMN c` / drop the primary key
#[derive(Debug, Default)]
pub struct TableAlterDropColumn {
    table: String,
    target: Option<DropTarget>,
    constraint_name: Option<String>,
    cascade: bool,
    pub(crate) hooks: QueryHooks,
}

impl TableAlterDropColumn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.target = Some(DropTarget::Column(column.into()));
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.target = Some(DropTarget::PrimaryKey);
        self
    }

    /// Name of the primary key constraint on PostgreSQL, `<table>_pkey` by default
    pub fn constraint_name(mut self, name: impl Into<String>) -> Self {
        self.constraint_name = Some(name.into());
        self
    }

    /// PostgreSQL `CASCADE`
    pub fn cascade(mut self) -> Self {
        self.cascade = true;
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if driver == DriverType::SQLite {
            return Err(Error::incompatible(driver, "ALTER TABLE DROP"));
        }
        if self.cascade && driver != DriverType::PostgreSQL {
            return Err(Error::unsupported(driver, "ALTER TABLE DROP ... CASCADE"));
        }
        Ok(())
    }
}

impl QueryProvider for TableAlterDropColumn {
    fn kind(&self) -> StatementKind {
        StatementKind::TableAlter
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| Error::missing_field("column"))?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        let driver = w.driver();
        self.check_features(driver)?;

        alter_table(&mut w, &self.table)?;
        match target {
            DropTarget::Column(column) => {
                validate_identifier("column", column)?;
                w.push("DROP COLUMN ").identifier(column);
            }
            DropTarget::PrimaryKey if driver == DriverType::PostgreSQL => {
                let name = match &self.constraint_name {
                    Some(name) => name.clone(),
                    None => {
                        let table = self.table.rsplit('.').next().unwrap_or(&self.table);
                        format!("{}_pkey", table)
                    }
                };
                validate_identifier("constraint name", &name)?;
                w.push("DROP CONSTRAINT ").identifier(&name);
            }
            DropTarget::PrimaryKey => {
                w.push("DROP PRIMARY KEY");
            }
        }
        if self.cascade {
            w.push(" CASCADE");
        }
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

/// Change a column's type and nullability
#[derive(Debug, Default)]
pub struct TableAlterModifyType {
    table: String,
    column: Option<Column>,
    pub(crate) hooks: QueryHooks,
}

impl TableAlterModifyType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// The full new definition of the column
    pub fn column(mut self, column: Column) -> Self {
        self.column = Some(column);
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if driver == DriverType::SQLite {
            return Err(Error::incompatible(driver, "ALTER TABLE MODIFY COLUMN"));
        }
        match &self.column {
            Some(column) => check_column_features(column, driver),
            None => Ok(()),
        }
    }
}

impl QueryProvider for TableAlterModifyType {
    fn kind(&self) -> StatementKind {
        StatementKind::TableAlter
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        let column = self
            .column
            .as_ref()
            .ok_or_else(|| Error::missing_field("column"))?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        let driver = w.driver();
        self.check_features(driver)?;

        alter_table(&mut w, &self.table)?;
        if driver.is_mysql_family() {
            w.push("MODIFY COLUMN ");
            column.write_definition(&mut w, KeyPlacement::TableLevel)?;
            return Ok(Some(w.finish()));
        }

        validate_identifier("column", &column.key)?;
        if column.column_type.is_primary_key() || column.unique {
            return Err(Error::invalid_syntax(
                driver,
                "ALTER COLUMN TYPE cannot add keys, use TableAlterAddAttribute",
            ));
        }
        let type_sql = column.type_sql(&w)?;
        w.push("ALTER COLUMN ")
            .identifier(&column.key)
            .push(" TYPE ")
            .push(&type_sql)
            .push(", ALTER COLUMN ")
            .identifier(&column.key)
            .push(if column.not_null {
                " SET NOT NULL"
            } else {
                " DROP NOT NULL"
            });
        if let Some(default) = &column.default {
            let literal = default.to_sql_literal(driver)?;
            w.push(", ALTER COLUMN ")
                .identifier(&column.key)
                .push(" SET DEFAULT ")
                .push(&literal);
        }
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameTarget {
    Table(String),
    Column { from: String, to: String },
}

/// `ALTER TABLE t RENAME TO n` / `ALTER TABLE t RENAME COLUMN a TO b`
#[derive(Debug, Default)]
pub struct TableAlterRename {
    table: String,
    target: Option<RenameTarget>,
    pub(crate) hooks: QueryHooks,
}

impl TableAlterRename {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn rename_to(mut self, name: impl Into<String>) -> Self {
        self.target = Some(RenameTarget::Table(name.into()));
        self
    }

    pub fn rename_column(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.target = Some(RenameTarget::Column {
            from: from.into(),
            to: to.into(),
        });
        self
    }
}

impl QueryProvider for TableAlterRename {
    fn kind(&self) -> StatementKind {
        StatementKind::TableAlter
    }

    fn compatibility(&self, _driver: DriverType) -> bool {
        true
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| Error::missing_field("new name"))?;
        let mut w = SqlWriter::new(ctx, self.kind())?;

        alter_table(&mut w, &self.table)?;
        match target {
            RenameTarget::Table(name) => {
                validate_identifier("new name", name)?;
                w.push("RENAME TO ").identifier(name);
            }
            RenameTarget::Column { from, to } => {
                validate_identifier("column", from)?;
                validate_identifier("new name", to)?;
                w.push("RENAME COLUMN ")
                    .identifier(from)
                    .push(" TO ")
                    .identifier(to);
            }
        }
        Ok(Some(w.finish()))
    }

    fn hooks(&mut self) -> &mut QueryHooks {
        &mut self.hooks
    }
}

/// Add or drop a foreign key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyAction {
    Add {
        name: Option<String>,
        foreign_key: ForeignKey,
    },
    Drop {
        name: String,
    },
}

/// `ALTER TABLE t ADD [CONSTRAINT n] FOREIGN KEY ...` / drop it by name
#[derive(Debug, Default)]
pub struct TableAlterForeignKey {
    table: String,
    action: Option<ForeignKeyAction>,
    deferrable: Option<bool>,
    initially_deferred: Option<bool>,
    pub(crate) hooks: QueryHooks,
}

impl TableAlterForeignKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn add(mut self, foreign_key: ForeignKey) -> Self {
        self.action = Some(ForeignKeyAction::Add {
            name: None,
            foreign_key,
        });
        self
    }

    pub fn add_named(mut self, name: impl Into<String>, foreign_key: ForeignKey) -> Self {
        self.action = Some(ForeignKeyAction::Add {
            name: Some(name.into()),
            foreign_key,
        });
        self
    }

    pub fn drop(mut self, name: impl Into<String>) -> Self {
        self.action = Some(ForeignKeyAction::Drop { name: name.into() });
        self
    }

    /// PostgreSQL `DEFERRABLE` / `NOT DEFERRABLE`
    pub fn deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = Some(deferrable);
        self
    }

    /// PostgreSQL `INITIALLY DEFERRED` / `INITIALLY IMMEDIATE`
    pub fn initially_deferred(mut self, deferred: bool) -> Self {
        self.initially_deferred = Some(deferred);
        self
    }

    fn check_features(&self, driver: DriverType) -> Result<()> {
        if driver == DriverType::SQLite {
            return Err(Error::incompatible(driver, "ALTER TABLE FOREIGN KEY"));
        }
        if (self.deferrable.is_some() || self.initially_deferred.is_some())
            && driver != DriverType::PostgreSQL
        {
            return Err(Error::unsupported(driver, "DEFERRABLE/INITIALLY constraints"));
        }
        if let Some(ForeignKeyAction::Add { foreign_key, .. }) = &self.action {
            let set_default = [foreign_key.on_delete, foreign_key.on_update]
                .contains(&Some(ReferentialAction::SetDefault));
            if set_default && driver.is_mysql_family() {
                return Err(Error::unsupported(driver, "ON DELETE/UPDATE SET DEFAULT"));
            }
        }
        Ok(())
    }
}

impl QueryProvider for TableAlterForeignKey {
    fn kind(&self) -> StatementKind {
        StatementKind::TableAlter
    }

    fn compatibility(&self, driver: DriverType) -> bool {
        self.check_features(driver).is_ok()
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        let action = self
            .action
            .as_ref()
            .ok_or_else(|| Error::missing_field("foreign key action"))?;
        let mut w = SqlWriter::new(ctx, self.kind())?;
        let driver = w.driver();
        self.check_features(driver)?;

        alter_table(&mut w, &self.table)?;
        match action {
            ForeignKeyAction::Add { name, foreign_key } => {
                w.push("ADD ");
                if let Some(name) = name {
                    validate_identifier("constraint name", name)?;
                    w.push("CONSTRAINT ").identifier(name).push(" ");
                }
                foreign_key.write_to(&mut w)?;
                match self.deferrable {
                    Some(true) => {
                        w.push(" DEFERRABLE");
                    }
                    Some(false) => {
                        w.push(" NOT DEFERRABLE");
                    }
                    None => {}
                }
                match self.initially_deferred {
                    Some(true) => {
                        w.push(" INITIALLY DEFERRED");
                    }
                    Some(false) => {
                        w.push(" INITIALLY IMMEDIATE");
                    }
                    None => {}
                }
            }
            ForeignKeyAction::Drop { name } => {
                validate_identifier("constraint name", name)?;
                if self.deferrable.is_some() || self.initially_deferred.is_some() {
                    return Err(Error::invalid_syntax(
                        driver,
                        "DEFERRABLE options only apply when adding a foreign key",
                    ));
                }
                w.push(if driver.is_mysql_family() {
                    "DROP FOREIGN KEY "
                } else {
                    "DROP CONSTRAINT "
                });
                w.identifier(name);
            }
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
    fn test_add_column_positions() {
        let add = TableAlterAddColumn::new()
            .table("users")
            .column(Column::new("nickname", DataType::VarChar).length(50))
            .after("name");
        assert_eq!(
            sql(&add, DriverType::MySQL).unwrap(),
            "ALTER TABLE users ADD COLUMN nickname VARCHAR(50) AFTER name;"
        );
        assert!(!add.compatibility(DriverType::PostgreSQL));

        let first = TableAlterAddColumn::new()
            .table("users")
            .column(Column::new("id", DataType::Integer).primary_key())
            .first();
        assert_eq!(
            sql(&first, DriverType::MariaDB).unwrap(),
            "ALTER TABLE users ADD COLUMN id INTEGER PRIMARY KEY FIRST;"
        );
    }

    #[test]
    fn test_sqlite_cannot_add_key_columns() {
        let add = TableAlterAddColumn::new()
            .table("users")
            .column(Column::new("email", DataType::Text).unique());
        assert!(!add.compatibility(DriverType::SQLite));

        let plain = TableAlterAddColumn::new()
            .table("users")
            .column(Column::new("bio", DataType::Text).default_value(""));
        assert_eq!(
            sql(&plain, DriverType::SQLite).unwrap(),
            "ALTER TABLE users ADD COLUMN bio TEXT DEFAULT '';"
        );
    }

    #[test]
    fn test_add_attribute() {
        let unique = TableAlterAddAttribute::new()
            .table("users")
            .columns(["email"])
            .name("uq_users_email");
        assert_eq!(
            sql(&unique, DriverType::PostgreSQL).unwrap(),
            "ALTER TABLE users ADD CONSTRAINT uq_users_email UNIQUE (email);"
        );
        assert!(!unique.compatibility(DriverType::MySQL));

        let key = TableAlterAddAttribute::new()
            .table("users")
            .attribute(AddAttribute::PrimaryKey)
            .columns(["id"]);
        assert_eq!(
            sql(&key, DriverType::MySQL).unwrap(),
            "ALTER TABLE users ADD PRIMARY KEY (id);"
        );
        assert!(!key.compatibility(DriverType::SQLite));
    }

    #[test]
    fn test_drop_primary_key() {
        let drop = TableAlterDropColumn::new().table("app.users").primary_key();
        assert_eq!(
            sql(&drop, DriverType::PostgreSQL).unwrap(),
            "ALTER TABLE app.users DROP CONSTRAINT users_pkey;"
        );
        assert_eq!(
            sql(&drop, DriverType::MySQL).unwrap(),
            "ALTER TABLE app.users DROP PRIMARY KEY;"
        );

        let column = TableAlterDropColumn::new().table("users").column("age").cascade();
        assert_eq!(
            sql(&column, DriverType::PostgreSQL).unwrap(),
            "ALTER TABLE users DROP COLUMN age CASCADE;"
        );
        assert!(!column.compatibility(DriverType::MariaDB));
        assert!(!column.compatibility(DriverType::SQLite));
    }

    #[test]
    fn test_modify_type() {
        let modify = TableAlterModifyType::new()
            .table("users")
            .column(Column::new("age", DataType::SmallInt).not_null());
        assert_eq!(
            sql(&modify, DriverType::MySQL).unwrap(),
            "ALTER TABLE users MODIFY COLUMN age SMALLINT NOT NULL;"
        );
        assert_eq!(
            sql(&modify, DriverType::PostgreSQL).unwrap(),
            "ALTER TABLE users ALTER COLUMN age TYPE SMALLINT, ALTER COLUMN age SET NOT NULL;"
        );
        assert!(!modify.compatibility(DriverType::SQLite));
    }

    #[test]
    fn test_rename() {
        let table = TableAlterRename::new().table("users").rename_to("members");
        assert_eq!(
            sql(&table, DriverType::SQLite).unwrap(),
            "ALTER TABLE users RENAME TO members;"
        );
        let column = TableAlterRename::new()
            .table("users")
            .rename_column("mail", "email");
        assert_eq!(
            sql(&column, DriverType::PostgreSQL).unwrap(),
            "ALTER TABLE users RENAME COLUMN mail TO email;"
        );
    }

    #[test]
    fn test_foreign_keys() {
        let add = TableAlterForeignKey::new()
            .table("orders")
            .add_named(
                "fk_orders_user",
                ForeignKey::new(["user_id"], "users", ["id"]).on_delete(ReferentialAction::SetNull),
            )
            .deferrable(true)
            .initially_deferred(true);
        assert_eq!(
            sql(&add, DriverType::PostgreSQL).unwrap(),
            "ALTER TABLE orders ADD CONSTRAINT fk_orders_user FOREIGN KEY (user_id) \
             REFERENCES users (id) ON DELETE SET NULL DEFERRABLE INITIALLY DEFERRED;"
        );
        assert!(!add.compatibility(DriverType::MySQL));

        let drop = TableAlterForeignKey::new().table("orders").drop("fk_orders_user");
        assert_eq!(
            sql(&drop, DriverType::MySQL).unwrap(),
            "ALTER TABLE orders DROP FOREIGN KEY fk_orders_user;"
        );
        assert_eq!(
            sql(&drop, DriverType::PostgreSQL).unwrap(),
            "ALTER TABLE orders DROP CONSTRAINT fk_orders_user;"
        );
        assert!(!drop.compatibility(DriverType::SQLite));
    }
}
