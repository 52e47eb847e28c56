//! Error types and result types for document store operations.
//!
//! This module provides error handling for every collection and document operation.
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
///
/// Validation errors ([`InvalidName`](Self::InvalidName), [`InvalidField`](Self::InvalidField))
/// are always raised before the storage backend is touched.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// A collection name is not safe to use as a table identifier.
    #[error("Invalid name '{0}': use only letters, numbers and _")]
    InvalidName(String),
    /// A filter or sort field is not a valid field path.
    #[error("Invalid field '{0}': use dot-separated letters, numbers and _")]
    InvalidField(String),
    /// The requested document was not found in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The document changed between the read and the write of a merge-update.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} in collection {1} was modified concurrently")]
    Conflict(String, String),
    /// A payload could not be serialized to JSON text.
    #[error("Encoding error: {0}")]
    Encoding(String),
    /// A stored payload is not a valid JSON object.
    #[error("Decoding error: {0}")]
    Decoding(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An error occurred in the underlying storage engine.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    /// Returns `true` for errors caused by caller input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocumentStoreError::InvalidName(_) | DocumentStoreError::InvalidField(_)
        )
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Decoding(err.to_string())
    }
}
