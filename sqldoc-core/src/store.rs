//! The collection store: collection and document operations over a storage backend.
//!
//! [`CollectionStore`] is the entry point for every caller request. It validates
//! collection names and query fields before touching storage, tracks known tables
//! in the [`SchemaRegistry`], moves payloads through the document codec and
//! re-attaches document ids on the way out.
//!
//! # Example
//!
//! ```ignore
//! use sqldoc::{store::CollectionStore, memory::InMemoryStore};
//! use serde_json::json;
//!
//! let store = CollectionStore::new(InMemoryStore::new());
//! let outcome = store
//!     .upsert_document("users", None, json!({ "name": "Ana" }).as_object().cloned().unwrap())
//!     .await?;
//! let doc = store.read_document("users", &outcome.id).await?;
//! ```

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    backend::StoreBackend,
    document::{self, Payload, StoredDocument},
    error::{DocumentStoreError, DocumentStoreResult},
    name::validate_name,
    query::QueryRequest,
    registry::SchemaRegistry,
};

/// The result of writing a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// The effective document id.
    pub id: String,
    /// Whether the id was generated by the store.
    pub generated: bool,
}

/// A document store bound to a specific backend implementation.
///
/// The store holds no per-request state. Clones of its [`SchemaRegistry`] may be
/// shared with other stores over the same database.
#[derive(Debug)]
pub struct CollectionStore<B: StoreBackend> {
    backend: B,
    registry: SchemaRegistry,
}

impl<B: StoreBackend> CollectionStore<B> {
    /// Creates a new store with the given backend and an empty registry.
    pub fn new(backend: B) -> Self {
        Self::with_registry(backend, SchemaRegistry::new())
    }

    pub fn with_registry(backend: B, registry: SchemaRegistry) -> Self {
        Self { backend, registry }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Creates a collection. Creating an existing collection succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidName`] for unsafe names, or a backend error.
    pub async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        let table = validate_name(name)?;

        self.create_table(table).await?;
        debug!(collection = table, "collection created");

        Ok(())
    }

    /// Reads up to `limit` documents of a collection, with their ids attached.
    ///
    /// A missing collection reads as empty.
    pub async fn read_collection(&self, name: &str, limit: u64) -> DocumentStoreResult<Vec<Value>> {
        let table = validate_name(name)?;

        if !self.collection_exists(table).await? {
            return Ok(vec![]);
        }

        match self.backend.scan_rows(table, limit).await {
            Ok(rows) => render_rows(rows),
            Err(err) => self.absent_or(table, err, Vec::new).await,
        }
    }

    /// Drops a collection and all of its documents. Dropping a missing collection succeeds.
    pub async fn delete_collection(&self, name: &str) -> DocumentStoreResult<()> {
        let table = validate_name(name)?;

        self.registry
            .reconcile(&self.backend.table_key(table), async {
                self.backend.drop_table(table).await?;
                Ok::<_, DocumentStoreError>(false)
            })
            .await?;
        debug!(collection = table, "collection dropped");

        Ok(())
    }

    /// Lists the names of all collections.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_tables().await
    }

    /// Inserts or fully replaces a document, creating the collection if needed.
    ///
    /// When `id` is `None` a random UUID is generated.
    pub async fn upsert_document(
        &self,
        collection: &str,
        id: Option<String>,
        payload: Payload,
    ) -> DocumentStoreResult<UpsertOutcome> {
        let table = validate_name(collection)?;
        let doc = document::encode(&payload)?;

        self.ensure_collection(table).await?;

        let outcome = match id {
            Some(id) => UpsertOutcome { id, generated: false },
            None => UpsertOutcome {
                id: Uuid::new_v4().to_string(),
                generated: true,
            },
        };

        if let Err(err) = self.backend.upsert_row(table, &outcome.id, doc.clone()).await {
            self.absent_or(table, err, || ()).await?;
            warn!(collection = table, "collection table vanished, recreating it");
            self.create_table(table).await?;
            self.backend.upsert_row(table, &outcome.id, doc).await?;
        }
        debug!(collection = table, id = %outcome.id, generated = outcome.generated, "document written");

        Ok(outcome)
    }

    /// Reads a document payload. Returns `None` if the collection or the document is absent.
    pub async fn read_document(&self, collection: &str, id: &str) -> DocumentStoreResult<Option<Payload>> {
        let table = validate_name(collection)?;

        if !self.collection_exists(table).await? {
            return Ok(None);
        }

        let row = match self.backend.fetch_row(table, id).await {
            Ok(row) => row,
            Err(err) => self.absent_or(table, err, || None).await?,
        };

        row.map(document::decode).transpose()
    }

    /// Merges `patch` into the stored document, replacing top-level fields.
    ///
    /// The write only lands if the document is unchanged since it was read.
    ///
    /// # Errors
    ///
    /// - [`DocumentStoreError::DocumentNotFound`] if the collection or document is absent.
    /// - [`DocumentStoreError::Conflict`] if another write changed the document in between.
    pub async fn merge_update_document(
        &self,
        collection: &str,
        id: &str,
        patch: &Payload,
    ) -> DocumentStoreResult<()> {
        let table = validate_name(collection)?;
        let not_found = || DocumentStoreError::DocumentNotFound(id.to_string(), table.to_string());

        if !self.collection_exists(table).await? {
            return Err(not_found());
        }

        let current = match self.backend.fetch_row(table, id).await {
            Ok(row) => row,
            Err(err) => self.absent_or(table, err, || None).await?,
        }
        .ok_or_else(not_found)?;
        let merged = document::merge(&document::decode(current.clone())?, patch);

        let replaced = match self
            .backend
            .replace_row_if(table, id, &current, document::encode(&merged)?)
            .await
        {
            Ok(replaced) => replaced,
            Err(err) => {
                self.absent_or(table, err, || ()).await?;
                return Err(not_found());
            }
        };

        if !replaced {
            warn!(collection = table, id, "merge-update lost a concurrent write race");
            return Err(DocumentStoreError::Conflict(id.to_string(), table.to_string()));
        }
        debug!(collection = table, id, fields = patch.len(), "document merged");

        Ok(())
    }

    /// Deletes a document. Deleting a missing document succeeds.
    pub async fn delete_document(&self, collection: &str, id: &str) -> DocumentStoreResult<()> {
        let table = validate_name(collection)?;

        if self.collection_exists(table).await? {
            if let Err(err) = self.backend.delete_row(table, id).await {
                self.absent_or(table, err, || ()).await?;
            }
        }

        Ok(())
    }

    /// Runs a filter/sort/limit query, returning documents with their ids attached.
    ///
    /// A missing collection yields no documents. Field paths are validated before
    /// any storage call.
    pub async fn query_documents(
        &self,
        collection: &str,
        query: &QueryRequest,
    ) -> DocumentStoreResult<Vec<Value>> {
        let table = validate_name(collection)?;
        query.validate()?;

        if !self.collection_exists(table).await? {
            return Ok(vec![]);
        }

        match self.backend.query_rows(table, query).await {
            Ok(rows) => render_rows(rows),
            Err(err) => self.absent_or(table, err, Vec::new).await,
        }
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await
    }

    async fn collection_exists(&self, table: &str) -> DocumentStoreResult<bool> {
        if self.registry.contains(&self.backend.table_key(table)).await {
            return Ok(true);
        }

        self.check_collection(table).await
    }

    async fn ensure_collection(&self, table: &str) -> DocumentStoreResult<()> {
        if !self.registry.contains(&self.backend.table_key(table)).await {
            self.create_table(table).await?;
        }

        Ok(())
    }

    async fn create_table(&self, table: &str) -> DocumentStoreResult<()> {
        self.registry
            .reconcile(&self.backend.table_key(table), async {
                self.backend.create_table(table).await?;
                Ok::<_, DocumentStoreError>(true)
            })
            .await?;

        Ok(())
    }

    async fn check_collection(&self, table: &str) -> DocumentStoreResult<bool> {
        self.registry
            .reconcile(&self.backend.table_key(table), self.backend.table_exists(table))
            .await
    }

    /// Settles a failed storage call. If the table is gone, for instance dropped by
    /// another process, the call yields `absent`; otherwise `err` stands.
    async fn absent_or<T>(
        &self,
        table: &str,
        err: DocumentStoreError,
        absent: impl FnOnce() -> T + Send,
    ) -> DocumentStoreResult<T> {
        if self.check_collection(table).await? {
            return Err(err);
        }
        debug!(collection = table, error = %err, "collection table is gone");

        Ok(absent())
    }
}

fn render_rows(rows: Vec<document::RawRow>) -> DocumentStoreResult<Vec<Value>> {
    rows.into_iter()
        .map(|row| StoredDocument::from_row(row).map(StoredDocument::render))
        .collect()
}
