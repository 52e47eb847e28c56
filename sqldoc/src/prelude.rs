//! Convenient re-exports of commonly used types from sqldoc.
//!
//! ```ignore
//! use sqldoc::prelude::*;
//! ```
//!
//! This provides access to:
//! - The collection store and its write outcome
//! - Store backends and builders
//! - Query requests, filters and the backend visitor
//! - Payload types and error types

pub use sqldoc_core::{
    store::{CollectionStore, UpsertOutcome},
    document::{Payload, RawPayload, RawRow, StoredDocument},
    backend::{StoreBackend, StoreBackendBuilder},
    query::{QueryRequest, QueryBuilder, QueryVisitor, Filter, FilterOp, FilterValue, SortDirection},
    name::FieldPath,
    registry::SchemaRegistry,
    error::{DocumentStoreError, DocumentStoreResult},
};
