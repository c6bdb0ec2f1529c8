//! INSERT, INSERT IGNORE and upsert

use super::writer::SqlWriter;
use super::{
    validate_identifier, CompiledStatement, QueryHooks, QueryProvider, RenderContext,
    StatementKind,
};
use crate::database::types::SqlValue;
use crate::driver::DriverType;
use crate::error::{Error, Result};

/// One `column = value` pair of an INSERT or UPDATE
#[derive(Debug, Clone, PartialEq)]
pub struct QueryEntry {
    pub column: String,
    pub value: SqlValue,
    /// Emit `value` verbatim instead of binding it
    pub raw: bool,
}

impl QueryEntry {
    pub fn new(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
            raw: false,
        }
    }

    /// Entry whose value is SQL text, e.g. `NOW()`
    pub fn raw(column: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: SqlValue::Raw(sql.into()),
            raw: true,
        }
    }

    pub(crate) fn write_value(&self, w: &mut SqlWriter) -> Result<()> {
        match (&self.value, self.raw) {
            (SqlValue::Raw(_), _) | (_, false) => w.value(&self.value),
            (value, true) => {
                w.push(&value.to_string());
                Ok(())
            }
        }
    }
}

/// Replace an entry for the same column in place, or append
pub(crate) fn upsert_entry(entries: &mut Vec<QueryEntry>, entry: QueryEntry) {
    match entries.iter_mut().find(|e| e.column == entry.column) {
        Some(existing) => *existing = entry,
        None => entries.push(entry),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InsertMethode {
    #[default]
    Insert,
    InsertIgnore,
    InsertOrUpdate,
}

/// `INSERT INTO t (cols) VALUES (...)`
#[derive(Debug, Default)]
pub struct Insert {
    table: String,
    entries: Vec<QueryEntry>,
    methode: InsertMethode,
    conflict_columns: Vec<String>,
    pub(crate) hooks: QueryHooks,
}

impl Insert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set a column value; setting the same column again replaces it
    pub fn entry(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        upsert_entry(&mut self.entries, QueryEntry::new(column, value));
        self
    }

    pub fn entry_raw(mut self, column: impl Into<String>, sql: impl Into<String>) -> Self {
        upsert_entry(&mut self.entries, QueryEntry::raw(column, sql));
        self
    }

    pub fn add_entry(mut self, entry: QueryEntry) -> Self {
        upsert_entry(&mut self.entries, entry);
        self
    }

    pub fn insert_methode(mut self, methode: InsertMethode) -> Self {
        self.methode = methode;
        self
    }

    /// Unique columns the upsert / ignore targets (`ON CONFLICT (cols)`)
    pub fn conflict_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflict_columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn entries(&self) -> &[QueryEntry] {
        &self.entries
    }

    fn write_conflict_target(&self, w: &mut SqlWriter) {
        if !self.conflict_columns.is_empty() {
            w.push(" (").identifier_list(&self.conflict_columns).push(")");
        }
    }

    fn write_upsert(&self, w: &mut SqlWriter) -> Result<()> {
        let driver = w.driver();
        let conflict: Vec<String> = self
            .conflict_columns
            .iter()
            .map(|c| w.format_identifier(c))
            .collect();
        let update: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !self.conflict_columns.contains(&e.column))
            .map(|e| w.format_identifier(&e.column))
            .collect();

        if driver.is_mysql_family() && update.is_empty() {
            return Err(Error::invalid_syntax(
                driver,
                "upsert has no column left to update outside the conflict columns",
            ));
        }
        let tail = w.dialect().upsert_syntax(&conflict, &update)?;
        w.push(&tail);
        Ok(())
    }
}

impl QueryProvider for Insert {
    fn kind(&self) -> StatementKind {
        StatementKind::Insert
    }

    fn compatibility(&self, _driver: DriverType) -> bool {
        true
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<CompiledStatement>> {
        validate_identifier("table", &self.table)?;
        if self.entries.is_empty() {
            return Err(Error::missing_field("entries"));
        }
        for entry in &self.entries {
            validate_identifier("column", &entry.column)?;
        }
        for column in &self.conflict_columns {
            validate_identifier("conflict column", column)?;
        }

        let mut w = SqlWriter::new(ctx, self.kind())?;
        let driver = w.driver();

        w.push(match (self.methode, driver) {
            (InsertMethode::InsertIgnore, DriverType::MySQL | DriverType::MariaDB) => {
                "INSERT IGNORE INTO "
            }
            (InsertMethode::InsertIgnore, DriverType::SQLite) => "INSERT OR IGNORE INTO ",
            _ => "INSERT INTO ",
        });
        w.identifier(&self.table).push(" (");
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.identifier(&entry.column);
        }
        w.push(") VALUES (");
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            entry.write_value(&mut w)?;
        }
        w.push(")");

        match (self.methode, driver) {
            (InsertMethode::InsertIgnore, DriverType::PostgreSQL) => {
                w.push(" ON CONFLICT");
                self.write_conflict_target(&mut w);
                w.push(" DO NOTHING");
            }
            (InsertMethode::InsertOrUpdate, _) => self.write_upsert(&mut w)?,
            _ => {}
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

    fn compile(insert: &Insert, driver: DriverType) -> CompiledStatement {
        insert.render(&RenderContext::new(driver)).unwrap().unwrap()
    }

    #[test]
    fn test_plain_insert() {
        let insert = Insert::new()
            .table("users")
            .entry("name", "Ada")
            .entry("age", 36)
            .entry_raw("created_at", "NOW()");

        let compiled = compile(&insert, DriverType::PostgreSQL);
        assert_eq!(
            compiled.sql,
            "INSERT INTO users (name, age, created_at) VALUES ($1, $2, NOW());"
        );
        assert_eq!(compiled.params, vec![SqlValue::from("Ada"), SqlValue::Int(36)]);
    }

    #[test]
    fn test_placeholder_count_matches_params() {
        let insert = Insert::new()
            .table("t")
            .entry("a", 1)
            .entry("b", SqlValue::Null)
            .entry("c", SqlValue::Default)
            .entry("a", 2);
        let compiled = compile(&insert, DriverType::MySQL);
        assert_eq!(compiled.sql, "INSERT INTO t (a, b, c) VALUES (?, ?, DEFAULT);");
        assert_eq!(compiled.sql.matches('?').count(), compiled.params.len());
        assert_eq!(compiled.params[0], SqlValue::Int(2));
    }

    #[test]
    fn test_insert_ignore_per_driver() {
        let insert = Insert::new()
            .table("tags")
            .entry("slug", "rust")
            .insert_methode(InsertMethode::InsertIgnore);
        assert_eq!(
            compile(&insert, DriverType::MariaDB).sql,
            "INSERT IGNORE INTO tags (slug) VALUES (?);"
        );
        assert_eq!(
            compile(&insert, DriverType::SQLite).sql,
            "INSERT OR IGNORE INTO tags (slug) VALUES (?);"
        );
        assert_eq!(
            compile(&insert, DriverType::PostgreSQL).sql,
            "INSERT INTO tags (slug) VALUES ($1) ON CONFLICT DO NOTHING;"
        );
    }

    #[test]
    fn test_upsert() {
        let insert = Insert::new()
            .table("counters")
            .entry("name", "hits")
            .entry("value", 1)
            .insert_methode(InsertMethode::InsertOrUpdate)
            .conflict_columns(["name"]);
        assert_eq!(
            compile(&insert, DriverType::MySQL).sql,
            "INSERT INTO counters (name, value) VALUES (?, ?) \
             ON DUPLICATE KEY UPDATE value = VALUES(value);"
        );
        assert_eq!(
            compile(&insert, DriverType::PostgreSQL).sql,
            "INSERT INTO counters (name, value) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value;"
        );

        let only_key = Insert::new()
            .table("tags")
            .entry("slug", "rust")
            .insert_methode(InsertMethode::InsertOrUpdate)
            .conflict_columns(["slug"]);
        assert_eq!(
            compile(&only_key, DriverType::SQLite).sql,
            "INSERT INTO tags (slug) VALUES (?) ON CONFLICT (slug) DO NOTHING;"
        );
        assert!(only_key.render(&RenderContext::new(DriverType::MySQL)).is_err());
    }

    #[test]
    fn test_upsert_requires_conflict_columns_off_mysql() {
        let insert = Insert::new()
            .table("counters")
            .entry("name", "hits")
            .insert_methode(InsertMethode::InsertOrUpdate);
        assert!(insert.render(&RenderContext::new(DriverType::PostgreSQL)).is_err());
        assert_eq!(
            compile(&insert, DriverType::MySQL).sql,
            "INSERT INTO counters (name) VALUES (?) ON DUPLICATE KEY UPDATE name = VALUES(name);"
        );
    }

    #[test]
    fn test_missing_entries() {
        assert!(matches!(
            Insert::new().table("t").render(&RenderContext::new(DriverType::MySQL)),
            Err(Error::MissingField { .. })
        ));
    }
}
