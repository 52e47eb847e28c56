//! Conversion between structured document payloads and their stored JSON form.
//!
//! A document payload is a JSON object ([`Payload`]). Backends hand payloads back
//! either as JSON text or as an already-parsed value depending on the driver, so
//! [`decode`] accepts both through [`RawPayload`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// The field name under which a document's identifier is rendered.
pub const ID_FIELD: &str = "id";

/// An unordered mapping from field names to JSON values.
pub type Payload = Map<String, Value>;

/// A payload as returned by a storage backend, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// JSON text, as stored in a text or JSON column.
    Text(String),
    /// A value the driver has already parsed.
    Json(Value),
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        RawPayload::Text(text)
    }
}

impl From<&str> for RawPayload {
    fn from(text: &str) -> Self {
        RawPayload::Text(text.to_string())
    }
}

impl From<Value> for RawPayload {
    fn from(value: Value) -> Self {
        RawPayload::Json(value)
    }
}

impl From<Payload> for RawPayload {
    fn from(payload: Payload) -> Self {
        RawPayload::Json(Value::Object(payload))
    }
}

/// A stored row: the out-of-band identifier plus its raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub id: String,
    pub doc: RawPayload,
}

/// A decoded document with its identifier kept separate from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub payload: Payload,
}

impl StoredDocument {
    /// Decodes a raw row into a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Decoding`] if the payload is malformed.
    pub fn from_row(row: RawRow) -> DocumentStoreResult<Self> {
        Ok(Self {
            payload: decode(row.doc)?,
            id: row.id,
        })
    }

    /// Renders the document for callers with its `id` attached.
    pub fn render(self) -> Value {
        render(&self.id, self.payload)
    }
}

/// Serializes a payload to canonical JSON text.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Encoding`] if the payload cannot be represented as JSON.
pub fn encode(payload: &Payload) -> DocumentStoreResult<String> {
    serde_json::to_string(payload).map_err(|e| DocumentStoreError::Encoding(e.to_string()))
}

/// Normalizes a raw stored payload into a [`Payload`].
///
/// # Errors
///
/// Returns [`DocumentStoreError::Decoding`] if the text is not valid JSON or the
/// value is not a JSON object.
pub fn decode(raw: impl Into<RawPayload>) -> DocumentStoreResult<Payload> {
    let value = match raw.into() {
        RawPayload::Text(text) => serde_json::from_str::<Value>(&text)?,
        RawPayload::Json(value) => value,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(DocumentStoreError::Decoding(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

/// Returns a new payload holding every field of `base`, overwritten field by field with `patch`.
///
/// The merge is shallow: nested objects in `patch` replace their counterparts wholesale,
/// and a patch can never remove a field.
pub fn merge(base: &Payload, patch: &Payload) -> Payload {
    let mut merged = base.clone();

    for (key, value) in patch {
        merged.insert(key.clone(), value.clone());
    }

    merged
}

/// Attaches `id` to a payload for output. The store's id wins over a payload field named `id`.
pub fn render(id: &str, mut payload: Payload) -> Value {
    payload.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    Value::Object(payload)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
