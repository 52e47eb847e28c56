use std::time::Duration;
use async_trait::async_trait;
use sqlx::{
    Sqlite, SqlitePool,
    pool::PoolConnection,
    query::QueryAs,
    sqlite::{SqliteArguments, SqlitePoolOptions},
};
use tracing::debug;

use sqldoc_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{RawPayload, RawRow},
    error::{DocumentStoreError, DocumentStoreResult},
    query::QueryRequest,
};

use crate::query::{BindValue, translate};

/// Pool size used when the builder is not told otherwise.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Collection storage on SQLite tables.
///
/// Each collection is a table `(id TEXT PRIMARY KEY, doc JSON NOT NULL, created_at, updated_at)`.
/// Every operation acquires its own pooled connection and returns it when the
/// connection guard drops.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn builder(dsn: &str) -> SqliteStoreBuilder {
        SqliteStoreBuilder::new(dsn)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn acquire(&self) -> DocumentStoreResult<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(backend_err)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.pool.close().await;

        Ok(())
    }
}

fn backend_err(err: sqlx::Error) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

type RowQuery<'q> = QueryAs<'q, Sqlite, (String, String), SqliteArguments<'q>>;

fn bind_params(mut query: RowQuery<'_>, params: Vec<BindValue>) -> RowQuery<'_> {
    for param in params {
        query = match param {
            BindValue::Text(value) => query.bind(value),
            BindValue::Integer(value) => query.bind(value),
            BindValue::Real(value) => query.bind(value),
            BindValue::Bool(value) => query.bind(value),
        };
    }

    query
}

fn to_raw_rows(rows: Vec<(String, String)>) -> Vec<RawRow> {
    rows.into_iter()
        .map(|(id, doc)| RawRow { id, doc: RawPayload::Text(doc) })
        .collect()
}

#[async_trait]
impl StoreBackend for SqliteStore {
    /// SQLite resolves table names without regard to ASCII case.
    fn table_key(&self, table: &str) -> String {
        table.to_ascii_lowercase()
    }

    async fn create_table(&self, table: &str) -> DocumentStoreResult<()> {
        let mut conn = self.acquire().await?;

        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (\
                id TEXT PRIMARY KEY, \
                doc JSON NOT NULL, \
                created_at TEXT DEFAULT CURRENT_TIMESTAMP, \
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP\
            )"
        ))
        .execute(&mut *conn)
        .await
        .map_err(backend_err)?;

        Ok(())
    }

    async fn drop_table(&self, table: &str) -> DocumentStoreResult<()> {
        let mut conn = self.acquire().await?;

        sqlx::query(&format!("DROP TABLE IF EXISTS \"{table}\""))
            .execute(&mut *conn)
            .await
            .map_err(backend_err)?;

        Ok(())
    }

    async fn table_exists(&self, table: &str) -> DocumentStoreResult<bool> {
        let mut conn = self.acquire().await?;

        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
        )
        .bind(table)
        .fetch_optional(&mut *conn)
        .await
        .map_err(backend_err)?
        .is_some())
    }

    async fn list_tables(&self) -> DocumentStoreResult<Vec<String>> {
        let mut conn = self.acquire().await?;

        sqlx::query_scalar::<_, String>(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(backend_err)
    }

    async fn upsert_row(&self, table: &str, id: &str, doc: String) -> DocumentStoreResult<()> {
        let mut conn = self.acquire().await?;

        sqlx::query(&format!(
            "INSERT INTO \"{table}\" (id, doc) VALUES (?, ?) \
             ON CONFLICT(id) DO UPDATE SET doc = excluded.doc, updated_at = CURRENT_TIMESTAMP"
        ))
        .bind(id)
        .bind(doc)
        .execute(&mut *conn)
        .await
        .map_err(backend_err)?;

        Ok(())
    }

    async fn fetch_row(&self, table: &str, id: &str) -> DocumentStoreResult<Option<RawPayload>> {
        let mut conn = self.acquire().await?;

        Ok(sqlx::query_scalar::<_, String>(&format!("SELECT doc FROM \"{table}\" WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(backend_err)?
            .map(RawPayload::Text))
    }

    async fn replace_row_if(
        &self,
        table: &str,
        id: &str,
        expected: &RawPayload,
        doc: String,
    ) -> DocumentStoreResult<bool> {
        let expected = match expected {
            RawPayload::Text(text) => text.clone(),
            RawPayload::Json(value) => value.to_string(),
        };
        let mut conn = self.acquire().await?;

        let result = sqlx::query(&format!(
            "UPDATE \"{table}\" SET doc = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND doc = ?"
        ))
        .bind(doc)
        .bind(id)
        .bind(expected)
        .execute(&mut *conn)
        .await
        .map_err(backend_err)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_row(&self, table: &str, id: &str) -> DocumentStoreResult<()> {
        let mut conn = self.acquire().await?;

        sqlx::query(&format!("DELETE FROM \"{table}\" WHERE id = ?"))
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(backend_err)?;

        Ok(())
    }

    async fn scan_rows(&self, table: &str, limit: u64) -> DocumentStoreResult<Vec<RawRow>> {
        let mut conn = self.acquire().await?;

        Ok(to_raw_rows(
            sqlx::query_as::<_, (String, String)>(&format!("SELECT id, doc FROM \"{table}\" LIMIT ?"))
                .bind(i64::try_from(limit).unwrap_or(i64::MAX))
                .fetch_all(&mut *conn)
                .await
                .map_err(backend_err)?,
        ))
    }

    async fn query_rows(&self, table: &str, query: &QueryRequest) -> DocumentStoreResult<Vec<RawRow>> {
        let statement = translate(table, query)?;
        debug!(table, sql = %statement.text, params = statement.params.len(), "running query");

        let mut conn = self.acquire().await?;

        let rows = bind_params(sqlx::query_as(&statement.text), statement.params)
            .fetch_all(&mut *conn)
            .await
            .map_err(backend_err)?;

        Ok(to_raw_rows(rows))
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

/// Builder for [`SqliteStore`] connection pools.
///
/// In-memory databases (`sqlite::memory:`) live only as long as their connection,
/// so they are pinned to a single connection that is never recycled.
pub struct SqliteStoreBuilder {
    dsn: String,
    max_connections: u32,
}

impl SqliteStoreBuilder {
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.dsn.contains(":memory:") || self.dsn.contains("mode=memory")
    }
}

#[async_trait]
impl StoreBackendBuilder for SqliteStoreBuilder {
    type Backend = SqliteStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let options = if self.is_in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(self.max_connections.max(1))
        };

        let pool = options
            .connect(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;
        debug!(dsn = %self.dsn, in_memory = self.is_in_memory(), "sqlite pool connected");

        Ok(SqliteStore::new(pool))
    }
}
