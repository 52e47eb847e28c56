//! Process-wide registry of the collection tables known to exist.
//!
//! The registry is populated lazily, the first time a table is created or observed,
//! and lets the store skip existence checks for the common case. It is shared by
//! every request through an async read-write lock, so lookups only contend with the
//! rare create and drop.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use mea::rwlock::RwLock;

/// Metadata recorded for a collection table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

/// A cloneable handle to the shared collection table map.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: Arc<RwLock<HashMap<String, TableMeta>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<TableMeta> {
        self.tables.read().await.get(name).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.tables.read().await.contains_key(name)
    }

    /// Runs a catalog change for `name` while holding the registry's write lock,
    /// then records whether the table exists afterwards.
    ///
    /// `change` resolves to the table's existence once it completes. Creates, drops
    /// and existence checks all go through here, so they apply in lock order.
    /// Re-registering an existing table keeps its original metadata. If `change`
    /// fails the map is left untouched.
    pub async fn reconcile<F, E>(&self, name: &str, change: F) -> Result<bool, E>
    where
        F: Future<Output = Result<bool, E>>,
    {
        let mut tables = self.tables.write().await;
        let exists = change.await?;

        if exists {
            tables
                .entry(name.to_string())
                .or_insert_with(|| TableMeta {
                    name: name.to_string(),
                    registered_at: Utc::now(),
                });
        } else {
            tables.remove(name);
        }

        Ok(exists)
    }

    pub async fn len(&self) -> usize {
        self.tables.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(exists: bool) -> impl Future<Output = Result<bool, ()>> {
        async move { Ok(exists) }
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let registry = SchemaRegistry::new();

        registry.reconcile("users", settle(true)).await.unwrap();
        let first = registry.get("users").await;
        registry.reconcile("users", settle(true)).await.unwrap();

        assert_eq!(registry.get("users").await, first);
        assert_eq!(registry.len().await, 1);
        assert!(registry.contains("users").await);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let registry = SchemaRegistry::new();
        let handle = registry.clone();

        handle.reconcile("orders", settle(true)).await.unwrap();
        assert_eq!(registry.get("orders").await.map(|m| m.name), Some("orders".to_string()));

        assert!(!registry.reconcile("orders", settle(false)).await.unwrap());
        assert!(handle.is_empty().await);
    }

    #[tokio::test]
    async fn failed_changes_leave_the_map_alone() {
        let registry = SchemaRegistry::new();
        registry.reconcile("users", settle(true)).await.unwrap();

        let result = registry
            .reconcile("users", async { Err::<bool, _>("engine down") })
            .await;

        assert_eq!(result, Err("engine down"));
        assert!(registry.contains("users").await);
    }
}
