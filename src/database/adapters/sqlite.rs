//! SQLite database adapter implementation

use crate::database::adapter::{
    prepared_sql, DatabaseAdapter, DatabaseConnection, QueryResult, TransactionState,
};
use crate::database::config::DatabaseConnectionConfig;
use crate::database::types::{SqlValue, SqliteTypeConverter};
use crate::driver::DriverType;
use crate::error::{Error, Result};
use crate::result_set::Row;
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Executor, Sqlite, SqlitePool};
use std::sync::Arc;

/// SQLite database adapter
#[derive(Clone)]
pub struct SqliteAdapter {
    name: String,
    pool: Arc<SqlitePool>,
}

impl SqliteAdapter {
    /// Create a new SQLite adapter with sqlx's default pool settings
    pub async fn new(name: impl Into<String>, connection_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(connection_url).await.map_err(|e| {
            Error::database_connection(format!("Failed to connect to SQLite: {}", e))
        })?;
        Ok(Self::from_pool(name, pool))
    }

    /// Create a new SQLite adapter sized by `config`
    pub async fn connect(name: impl Into<String>, config: &DatabaseConnectionConfig) -> Result<Self> {
        let pool = config
            .pool_options::<Sqlite>()
            .connect(&config.url)
            .await
            .map_err(|e| {
                Error::database_connection(format!("Failed to connect to SQLite: {}", e))
            })?;
        Ok(Self::from_pool(name, pool))
    }

    /// Create adapter from existing pool
    pub fn from_pool(name: impl Into<String>, pool: SqlitePool) -> Self {
        Self {
            name: name.into(),
            pool: Arc::new(pool),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver_type(&self) -> DriverType {
        DriverType::SQLite
    }

    fn connected(&self) -> bool {
        !self.pool.is_closed()
    }

    async fn connection(&self) -> Result<Box<dyn DatabaseConnection>> {
        let conn = self.pool.acquire().await.map_err(|e| {
            Error::database_connection(format!("Failed to acquire SQLite connection: {}", e))
        })?;
        Ok(Box::new(SqlitePooledConnection {
            conn,
            transaction: TransactionState::default(),
        }))
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&*self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::database_connection(format!("SQLite ping failed: {}", e)))
    }
}

/// Connection checked out of a [`SqliteAdapter`] pool
pub struct SqlitePooledConnection {
    conn: PoolConnection<Sqlite>,
    transaction: TransactionState,
}

impl SqlitePooledConnection {
    async fn control(&mut self, sql: &'static str) -> Result<()> {
        log::debug!("SQLite {}", sql);
        Executor::execute(&mut *self.conn, sqlx::raw_sql(sql))
            .await
            .map_err(|e| Error::database_transaction(format!("SQLite {} failed: {}", sql, e)))?;
        Ok(())
    }

    async fn ensure_transaction(&mut self) -> Result<()> {
        if let Some(begin) = self.transaction.before_statement() {
            self.control(begin).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DatabaseConnection for SqlitePooledConnection {
    async fn set_auto_commit(&mut self, enabled: bool) -> Result<()> {
        match self.transaction.set_auto_commit(enabled) {
            Some(sql) => self.control(sql).await,
            None => Ok(()),
        }
    }

    async fn commit(&mut self) -> Result<()> {
        match self.transaction.end("COMMIT") {
            Some(sql) => self.control(sql).await,
            None => Ok(()),
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        match self.transaction.end("ROLLBACK") {
            Some(sql) => self.control(sql).await,
            None => Ok(()),
        }
    }

    async fn execute(&mut self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        self.ensure_transaction().await?;
        log::debug!("SQLite EXECUTE: {}", sql);
        log::debug!("  Parameters: {:?}", params);

        let result = if params.is_empty() {
            Executor::execute(&mut *self.conn, sqlx::raw_sql(sql)).await
        } else {
            let mut query = sqlx::query(prepared_sql(sql));
            for param in params {
                query = SqliteTypeConverter::bind_param(query, param)?;
            }
            Executor::execute(&mut *self.conn, query).await
        }
        .map_err(|e| Error::database_query(format!("SQLite execute failed: {}", e)))?;

        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn fetch_all(&mut self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>> {
        self.ensure_transaction().await?;
        log::debug!("SQLite FETCH_ALL: {}", sql);
        log::debug!("  Parameters: {:?}", params);

        let mut query = sqlx::query(prepared_sql(sql));
        for param in params {
            query = SqliteTypeConverter::bind_param(query, param)?;
        }
        let rows = Executor::fetch_all(&mut *self.conn, query)
            .await
            .map_err(|e| Error::database_query(format!("SQLite fetch_all failed: {}", e)))?;

        rows.iter().map(SqliteTypeConverter::row_to_values).collect()
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        if self.transaction.is_open() {
            log::warn!("SQLite connection released with an open transaction, rolling back");
            self.rollback().await?;
        }
        Ok(())
    }
}

impl Drop for SqlitePooledConnection {
    fn drop(&mut self) {
        // Dropped mid-transaction (e.g. an aborted task): never hand it back to the pool
        if self.transaction.is_open() {
            self.conn.close_on_drop();
        }
    }
}
