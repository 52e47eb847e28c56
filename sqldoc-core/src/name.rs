//! Identifier validation for collection names and document field paths.
//!
//! Table names cannot be bound as statement parameters, so every collection
//! name passes through [`validate_name`] before it reaches a backend. Filter
//! and sort fields are embedded in JSON path literals and go through
//! [`FieldPath::parse`], which applies the same grammar to each segment.

use std::fmt;

use crate::error::{DocumentStoreError, DocumentStoreResult};

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Validates a collection name, returning it unchanged when it matches `^[A-Za-z0-9_]+$`.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidName`] for empty names or names containing
/// any other character.
pub fn validate_name(name: &str) -> DocumentStoreResult<&str> {
    if is_identifier(name) {
        Ok(name)
    } else {
        Err(DocumentStoreError::InvalidName(name.to_string()))
    }
}

/// A validated path to a (possibly nested) document field, such as `address.city`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a dot-separated field path.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidField`] if any segment is empty or
    /// contains characters outside `[A-Za-z0-9_]`.
    pub fn parse(field: &str) -> DocumentStoreResult<Self> {
        let segments = field
            .split('.')
            .map(|segment| {
                if is_identifier(segment) {
                    Ok(segment.to_string())
                } else {
                    Err(DocumentStoreError::InvalidField(field.to_string()))
                }
            })
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Renders the path as a JSON path expression rooted at the document (`$.a.b`).
    pub fn json_path(&self) -> String {
        format!("$.{}", self.segments.join("."))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
