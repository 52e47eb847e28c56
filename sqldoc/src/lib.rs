//! Main sqldoc crate providing a unified interface for JSON document storage.
//!
//! This crate is the primary entry point for users of sqldoc. It re-exports the
//! core types from the sub-crates and gives access to the storage backends.
//!
//! # Features
//!
//! - **Schema-less documents** - Any JSON object can be stored under a string id
//! - **Multiple backends** - In-memory and SQLite storage behind one trait
//! - **Flat queries** - ANDed comparison filters, one sort field and a limit
//! - **Merge updates** - Partial edits that replace top-level fields only
//!
//! # Quick Start
//!
//! ```ignore
//! use sqldoc::{prelude::*, memory::InMemoryStore, json};
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let store = CollectionStore::new(InMemoryStore::builder().build().await?);
//!
//!     let outcome = store
//!         .upsert_document("users", None, json!({ "name": "Ana", "age": 30 }).as_object().cloned().unwrap_or_default())
//!         .await?;
//!
//!     store
//!         .merge_update_document("users", &outcome.id, json!({ "age": 31 }).as_object().unwrap())
//!         .await?;
//!
//!     let adults = store
//!         .query_documents(
//!             "users",
//!             &QueryRequest::builder()
//!                 .filter(Filter::gte("age", 18))
//!                 .sort("age", SortDirection::Desc)
//!                 .build(),
//!         )
//!         .await?;
//!     println!("{adults:?}");
//!
//!     store.shutdown().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! `StoreBackend` is implemented for `Arc<B>` with `B: ?Sized`, so a store can be
//! built over `Arc<dyn StoreBackend>` when the backend is picked at runtime.
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `sqlite` - Persistent SQLite backend (requires the `sqlite` feature)

pub mod prelude;

pub use sqldoc_core::{backend, document, error, name, query, registry, store};

// Re-export JSON types for convenience
pub use serde_json::{self, Value, json};

/// In-memory storage backend implementations.
pub mod memory {
    pub use sqldoc_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// SQLite storage backend implementations.
///
/// This module is only available when the `sqlite` feature is enabled.
#[cfg(feature = "sqlite")]
pub mod sqlite {
    pub use sqldoc_sqlite::{SqliteStore, SqliteStoreBuilder, query::{BindValue, SqlStatement, translate}};
}
