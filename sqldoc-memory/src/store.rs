//! In-memory storage implementation for collection tables.
//!
//! This module provides a simple backend that keeps every table as a map of rows
//! behind an async-safe read-write lock. Rows keep their payload as a parsed JSON
//! value, the way some drivers return JSON columns.

use std::{collections::{BTreeMap, HashMap}, sync::Arc};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mea::rwlock::RwLock;
use serde_json::Value;

use sqldoc_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{self, RawPayload, RawRow},
    error::DocumentStoreResult,
    query::{QueryRequest, SortDirection},
};

use crate::evaluator::{DocumentEvaluator, sort_key};

#[derive(Debug, Clone)]
struct MemoryRow {
    doc: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

type TableMap = BTreeMap<String, MemoryRow>;
type StoreMap = HashMap<String, TableMap>;


/// Thread-safe in-memory collection storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be shared across async tasks. Clones share the same underlying data.
///
/// # Performance
///
/// Queries scan every row of a table. Rows are kept ordered by id, which is the
/// order unsorted reads return them in.
///
/// # Example
///
/// ```ignore
/// use sqldoc_memory::InMemoryStore;
/// use sqldoc::backend::StoreBackend;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///     store.create_table("users").await?;
///     store.upsert_row("users", "ana", r#"{"name":"Ana"}"#.to_string()).await?;
///     assert!(store.fetch_row("users", "ana").await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// table name -> (document id -> row)
    tables: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new store with no tables.
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Returns the `(created_at, updated_at)` timestamps of a row, if it exists.
    pub async fn timestamps(&self, table: &str, id: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.tables
            .read()
            .await
            .get(table)?
            .get(id)
            .map(|row| (row.created_at, row.updated_at))
    }
}

fn parse_doc(doc: &str) -> DocumentStoreResult<Value> {
    Ok(Value::Object(document::decode(doc)?))
}

fn to_raw_row(id: &str, row: &MemoryRow) -> RawRow {
    RawRow {
        id: id.to_string(),
        doc: RawPayload::Json(row.doc.clone()),
    }
}

fn limit_to_usize(limit: u64) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn create_table(&self, table: &str) -> DocumentStoreResult<()> {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default();

        Ok(())
    }

    async fn drop_table(&self, table: &str) -> DocumentStoreResult<()> {
        self.tables.write().await.remove(table);

        Ok(())
    }

    async fn table_exists(&self, table: &str) -> DocumentStoreResult<bool> {
        Ok(self.tables.read().await.contains_key(table))
    }

    async fn list_tables(&self) -> DocumentStoreResult<Vec<String>> {
        let mut names = self
            .tables
            .read()
            .await
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        names.sort();

        Ok(names)
    }

    async fn upsert_row(&self, table: &str, id: &str, doc: String) -> DocumentStoreResult<()> {
        let doc = parse_doc(&doc)?;
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let rows = tables
            .entry(table.to_string())
            .or_default();

        rows.entry(id.to_string())
            .and_modify(|row| {
                row.doc = doc.clone();
                row.updated_at = now;
            })
            .or_insert_with(|| MemoryRow {
                doc: doc.clone(),
                created_at: now,
                updated_at: now,
            });

        Ok(())
    }

    async fn fetch_row(&self, table: &str, id: &str) -> DocumentStoreResult<Option<RawPayload>> {
        Ok(self
            .tables
            .read()
            .await
            .get(table)
            .and_then(|rows| rows.get(id))
            .map(|row| RawPayload::Json(row.doc.clone())))
    }

    async fn replace_row_if(
        &self,
        table: &str,
        id: &str,
        expected: &RawPayload,
        doc: String,
    ) -> DocumentStoreResult<bool> {
        let expected = Value::Object(document::decode(expected.clone())?);
        let doc = parse_doc(&doc)?;
        let mut tables = self.tables.write().await;

        match tables.get_mut(table).and_then(|rows| rows.get_mut(id)) {
            Some(row) if row.doc == expected => {
                row.doc = doc;
                row.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_row(&self, table: &str, id: &str) -> DocumentStoreResult<()> {
        if let Some(rows) = self.tables.write().await.get_mut(table) {
            rows.remove(id);
        }

        Ok(())
    }

    async fn scan_rows(&self, table: &str, limit: u64) -> DocumentStoreResult<Vec<RawRow>> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Ok(vec![]);
        };

        Ok(rows
            .iter()
            .take(limit_to_usize(limit))
            .map(|(id, row)| to_raw_row(id, row))
            .collect())
    }

    async fn query_rows(&self, table: &str, query: &QueryRequest) -> DocumentStoreResult<Vec<RawRow>> {
        let tables = self.tables.read().await;
        let Some(rows) = tables.get(table) else {
            return Ok(vec![]);
        };

        let mut matched = Vec::new();
        for (id, row) in rows {
            if DocumentEvaluator::new(&row.doc).evaluate(&query.filters)? {
                matched.push((id, row));
            }
        }

        if let Some(path) = query.sort_path()? {
            // Stable sort keeps id order among equal keys.
            matched.sort_by(|(_, a), (_, b)| {
                let ordering = sort_key(&a.doc, &path).sort_cmp(&sort_key(&b.doc, &path));
                match query.sort_direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(matched
            .into_iter()
            .take(limit_to_usize(query.limit))
            .map(|(id, row)| to_raw_row(id, row))
            .collect())
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
