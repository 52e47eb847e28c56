//! In-memory collection storage backend for sqldoc.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Parsed payloads** - Rows hold JSON values rather than text
//! - **Full query support** - Filters, single-field sorting and limits, with the same
//!   operator whitelist as the SQL backend
//!
//! # Quick Start
//!
//! ```ignore
//! use sqldoc::{store::CollectionStore, memory::InMemoryStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = CollectionStore::new(InMemoryStore::builder().build().await?);
//!
//!     let payload = json!({ "name": "Ana", "age": 30 }).as_object().cloned().unwrap();
//!     let outcome = store.upsert_document("users", None, payload).await?;
//!
//!     println!("created {}", outcome.id);
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as sqldoc_memory;

pub mod store;
pub(crate) mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
