//! A schema-less JSON document store layered on relational tables.
//!
//! Every collection is a table with an `id` primary key and a JSON `doc` column.
//! This crate is the core of the sqldoc project and provides:
//!
//! - **Name validation** ([`name`]) - Safe identifiers for tables and JSON field paths
//! - **Document codec** ([`document`]) - Encoding, decoding, merging and rendering payloads
//! - **Query model** ([`query`]) - Flat filter/sort/limit requests and the backend visitor
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage engines
//! - **Schema registry** ([`registry`]) - Shared map of the collection tables known to exist
//! - **Collection store** ([`store`]) - Collection and document operations
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use sqldoc_core::{store::CollectionStore, query::{QueryRequest, Filter}};
//!
//! let store = CollectionStore::new(backend);
//! store.create_collection("users").await?;
//! let adults = store
//!     .query_documents("users", &QueryRequest::builder().filter(Filter::gte("age", 18)).build())
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as sqldoc_core;

pub mod backend;
pub mod document;
pub mod error;
pub mod name;
pub mod query;
pub mod registry;
pub mod store;
