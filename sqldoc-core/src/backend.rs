//! Storage backend abstraction for the document store.
//!
//! This module defines the traits that abstract over the relational engine holding
//! collection tables, allowing the [`CollectionStore`](crate::store::CollectionStore)
//! to run against a SQL database or an in-memory map alike.
//!
//! # Overview
//!
//! A backend stores one table per collection. Each row is an `id` plus a JSON
//! payload column. Backends deal in raw rows ([`RawRow`]); name validation, id
//! generation, merging and rendering all happen in the store.
//!
//! Backends are expected to acquire whatever connection they need at the start of
//! each call and release it before returning, on success and on failure.
//!
//! # Examples
//!
//! ```ignore
//! use sqldoc::backend::StoreBackend;
//!
//! backend.create_table("users").await?;
//! backend.upsert_row("users", "ana", r#"{"name":"Ana"}"#.to_string()).await?;
//! let row = backend.fetch_row("users", "ana").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    document::{RawPayload, RawRow},
    error::DocumentStoreResult,
    query::QueryRequest,
};

/// Abstract interface for collection table storage.
///
/// Table names handed to a backend have already been validated against the
/// identifier grammar and may be embedded in statement text. Every other value
/// must be passed to the engine as a bound parameter.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from
/// multiple async tasks.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// The form under which the engine identifies `table`.
    ///
    /// Two names with the same key address the same table. The default is the
    /// name itself, for engines with case-sensitive table names.
    fn table_key(&self, table: &str) -> String {
        table.to_string()
    }

    /// Creates the table for a collection if it does not exist yet.
    async fn create_table(&self, table: &str) -> DocumentStoreResult<()>;

    /// Drops the table for a collection and every row in it. A missing table is not an error.
    async fn drop_table(&self, table: &str) -> DocumentStoreResult<()>;

    async fn table_exists(&self, table: &str) -> DocumentStoreResult<bool>;

    /// Lists the names of all collection tables.
    async fn list_tables(&self) -> DocumentStoreResult<Vec<String>>;

    /// Inserts a row, or replaces the payload of the row with the same id.
    ///
    /// The table must exist.
    async fn upsert_row(&self, table: &str, id: &str, doc: String) -> DocumentStoreResult<()>;

    /// Fetches the raw payload of a row, or `None` if the id is absent.
    async fn fetch_row(&self, table: &str, id: &str) -> DocumentStoreResult<Option<RawPayload>>;

    /// Replaces the payload of a row only if it still holds `expected`.
    ///
    /// Returns `false` when the row is gone or its payload changed since it was read.
    async fn replace_row_if(
        &self,
        table: &str,
        id: &str,
        expected: &RawPayload,
        doc: String,
    ) -> DocumentStoreResult<bool>;

    /// Deletes a row. A missing row is not an error.
    async fn delete_row(&self, table: &str, id: &str) -> DocumentStoreResult<()>;

    /// Returns up to `limit` rows in engine order.
    async fn scan_rows(&self, table: &str, limit: u64) -> DocumentStoreResult<Vec<RawRow>>;

    /// Returns the rows matching a query request.
    ///
    /// Field paths in the request have already been validated by the store.
    async fn query_rows(&self, table: &str, query: &QueryRequest) -> DocumentStoreResult<Vec<RawRow>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend + ?Sized,
{
    fn table_key(&self, table: &str) -> String {
        (**self).table_key(table)
    }

    async fn create_table(&self, table: &str) -> DocumentStoreResult<()> {
        (**self).create_table(table).await
    }

    async fn drop_table(&self, table: &str) -> DocumentStoreResult<()> {
        (**self).drop_table(table).await
    }

    async fn table_exists(&self, table: &str) -> DocumentStoreResult<bool> {
        (**self).table_exists(table).await
    }

    async fn list_tables(&self) -> DocumentStoreResult<Vec<String>> {
        (**self).list_tables().await
    }

    async fn upsert_row(&self, table: &str, id: &str, doc: String) -> DocumentStoreResult<()> {
        (**self).upsert_row(table, id, doc).await
    }

    async fn fetch_row(&self, table: &str, id: &str) -> DocumentStoreResult<Option<RawPayload>> {
        (**self).fetch_row(table, id).await
    }

    async fn replace_row_if(
        &self,
        table: &str,
        id: &str,
        expected: &RawPayload,
        doc: String,
    ) -> DocumentStoreResult<bool> {
        (**self)
            .replace_row_if(table, id, expected, doc)
            .await
    }

    async fn delete_row(&self, table: &str, id: &str) -> DocumentStoreResult<()> {
        (**self).delete_row(table, id).await
    }

    async fn scan_rows(&self, table: &str, limit: u64) -> DocumentStoreResult<Vec<RawRow>> {
        (**self).scan_rows(table, limit).await
    }

    async fn query_rows(&self, table: &str, query: &QueryRequest) -> DocumentStoreResult<Vec<RawRow>> {
        (**self).query_rows(table, query).await
    }
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
