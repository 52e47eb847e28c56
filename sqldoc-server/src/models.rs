use serde::{Deserialize, Serialize};
use sqldoc::query::DEFAULT_LIMIT;

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub message: String,
}

/// Response for collection-level operations.
#[derive(Debug, Serialize)]
pub struct CollectionStatus {
    pub status: &'static str,
    pub message: String,
}

/// Response for document-level operations.
#[derive(Debug, Serialize)]
pub struct DocumentStatus {
    pub status: &'static str,
    pub id: String,
}

impl DocumentStatus {
    pub fn new(status: &'static str, id: impl Into<String>) -> Self {
        Self {
            status,
            id: id.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReadCollectionQuery {
    pub limit: u64,
}

impl Default for ReadCollectionQuery {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_limit_defaults_like_queries() {
        let query = serde_json::from_str::<ReadCollectionQuery>("{}").unwrap();

        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(serde_json::from_str::<ReadCollectionQuery>(r#"{"limit":2}"#).unwrap().limit, 2);
    }
}
