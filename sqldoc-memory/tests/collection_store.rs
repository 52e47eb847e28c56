use async_trait::async_trait;
use serde_json::{Value, json};
use sqldoc_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{Payload, RawPayload, RawRow},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, QueryRequest, SortDirection},
    store::CollectionStore,
};
use sqldoc_memory::InMemoryStore;

fn payload(value: Value) -> Payload {
    value.as_object().cloned().expect("payload should be an object")
}

async fn store() -> CollectionStore<InMemoryStore> {
    CollectionStore::new(
        InMemoryStore::builder()
            .build()
            .await
            .expect("in-memory store should build"),
    )
}

#[tokio::test]
async fn document_lifecycle() {
    let store = store().await;

    store.create_collection("users").await.unwrap();
    let outcome = store
        .upsert_document("users", None, payload(json!({ "name": "Ana", "age": 30 })))
        .await
        .unwrap();
    assert!(outcome.generated);
    assert!(!outcome.id.is_empty());

    let fetched = store.read_document("users", &outcome.id).await.unwrap();
    assert_eq!(fetched, Some(payload(json!({ "name": "Ana", "age": 30 }))));

    store
        .merge_update_document("users", &outcome.id, &payload(json!({ "age": 31 })))
        .await
        .unwrap();
    let fetched = store.read_document("users", &outcome.id).await.unwrap();
    assert_eq!(fetched, Some(payload(json!({ "name": "Ana", "age": 31 }))));

    let results = store
        .query_documents(
            "users",
            &QueryRequest::builder().filter(Filter::gt("age", 20)).build(),
        )
        .await
        .unwrap();
    assert_eq!(results, vec![json!({ "name": "Ana", "age": 31, "id": outcome.id })]);

    store.delete_document("users", &outcome.id).await.unwrap();
    assert_eq!(store.read_document("users", &outcome.id).await.unwrap(), None);

    store.delete_collection("users").await.unwrap();
    assert!(store.read_collection("users", 100).await.unwrap().is_empty());
    assert!(store.registry().is_empty().await);
}

#[tokio::test]
async fn missing_collections_read_as_empty() {
    let store = store().await;

    assert!(store.read_collection("ghosts", 10).await.unwrap().is_empty());
    assert_eq!(store.read_document("ghosts", "x").await.unwrap(), None);
    assert!(store
        .query_documents("ghosts", &QueryRequest::default())
        .await
        .unwrap()
        .is_empty());
    store.delete_document("ghosts", "x").await.unwrap();
    store.delete_collection("ghosts").await.unwrap();
    assert!(store.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_collection_is_idempotent() {
    let store = store().await;

    store.create_collection("users").await.unwrap();
    store.upsert_document("users", Some("a".into()), payload(json!({ "n": 1 }))).await.unwrap();
    store.create_collection("users").await.unwrap();

    assert_eq!(store.read_collection("users", 100).await.unwrap().len(), 1);
    assert_eq!(store.list_collections().await.unwrap(), vec!["users".to_string()]);
}

#[tokio::test]
async fn upsert_with_explicit_id_replaces_whole_document() {
    let store = store().await;

    let first = store
        .upsert_document("users", Some("ana".into()), payload(json!({ "name": "Ana", "age": 30 })))
        .await
        .unwrap();
    assert_eq!(first.id, "ana");
    assert!(!first.generated);

    store
        .upsert_document("users", Some("ana".into()), payload(json!({ "name": "Ana B." })))
        .await
        .unwrap();

    assert_eq!(
        store.read_document("users", "ana").await.unwrap(),
        Some(payload(json!({ "name": "Ana B." })))
    );
    let (created_at, updated_at) = store.backend().timestamps("users", "ana").await.unwrap();
    assert!(updated_at >= created_at);
}

#[tokio::test]
async fn rendered_documents_carry_the_store_id() {
    let store = store().await;

    store
        .upsert_document("users", Some("real".into()), payload(json!({ "id": "fake", "name": "Ana" })))
        .await
        .unwrap();

    let listed = store.read_collection("users", 100).await.unwrap();
    assert_eq!(listed, vec![json!({ "id": "real", "name": "Ana" })]);
}

#[tokio::test]
async fn merge_of_missing_document_is_not_found() {
    let store = store().await;

    let missing_collection = store
        .merge_update_document("users", "nobody", &payload(json!({ "a": 1 })))
        .await;
    assert!(matches!(missing_collection, Err(DocumentStoreError::DocumentNotFound(..))));

    store.create_collection("users").await.unwrap();
    let missing_document = store
        .merge_update_document("users", "nobody", &payload(json!({ "a": 1 })))
        .await;
    assert!(matches!(missing_document, Err(DocumentStoreError::DocumentNotFound(..))));
}

#[tokio::test]
async fn invalid_names_are_rejected_before_storage() {
    let store = store().await;

    for name in ["users; DROP TABLE x", "", "a-b"] {
        assert!(matches!(
            store.create_collection(name).await,
            Err(DocumentStoreError::InvalidName(_))
        ));
        assert!(matches!(
            store.upsert_document(name, None, Payload::new()).await,
            Err(DocumentStoreError::InvalidName(_))
        ));
    }
    assert!(store.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_query_fields_are_rejected_even_for_missing_collections() {
    let store = store().await;
    let query = QueryRequest::builder()
        .filter(Filter::eq("name') OR 1=1 --", "x"))
        .build();

    assert!(matches!(
        store.query_documents("users", &query).await,
        Err(DocumentStoreError::InvalidField(_))
    ));
}

#[tokio::test]
async fn query_sorts_limits_and_drops_unknown_operators() {
    let store = store().await;

    for (id, name, age) in [("a", "Ana", 30), ("b", "Bob", 25), ("c", "Cid", 41), ("d", "Dee", 19)] {
        store
            .upsert_document("users", Some(id.into()), payload(json!({ "name": name, "age": age })))
            .await
            .unwrap();
    }

    let query = QueryRequest::builder()
        .filter(Filter::gte("age", 20))
        .filter(Filter::new("name", "LIKE", "%z%"))
        .sort("age", SortDirection::Desc)
        .limit(2)
        .build();
    let results = store.query_documents("users", &query).await.unwrap();

    let names = results
        .iter()
        .map(|doc| doc["name"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Cid", "Ana"]);
}

/// A backend that lets another writer slip in between a read and the following write.
#[derive(Debug)]
struct InterleavingBackend {
    inner: InMemoryStore,
}

#[async_trait]
impl StoreBackend for InterleavingBackend {
    async fn create_table(&self, table: &str) -> DocumentStoreResult<()> {
        self.inner.create_table(table).await
    }

    async fn drop_table(&self, table: &str) -> DocumentStoreResult<()> {
        self.inner.drop_table(table).await
    }

    async fn table_exists(&self, table: &str) -> DocumentStoreResult<bool> {
        self.inner.table_exists(table).await
    }

    async fn list_tables(&self) -> DocumentStoreResult<Vec<String>> {
        self.inner.list_tables().await
    }

    async fn upsert_row(&self, table: &str, id: &str, doc: String) -> DocumentStoreResult<()> {
        self.inner.upsert_row(table, id, doc).await
    }

    async fn fetch_row(&self, table: &str, id: &str) -> DocumentStoreResult<Option<RawPayload>> {
        let row = self.inner.fetch_row(table, id).await?;
        self.inner
            .upsert_row(table, id, r#"{"name":"concurrent"}"#.to_string())
            .await?;

        Ok(row)
    }

    async fn replace_row_if(
        &self,
        table: &str,
        id: &str,
        expected: &RawPayload,
        doc: String,
    ) -> DocumentStoreResult<bool> {
        self.inner.replace_row_if(table, id, expected, doc).await
    }

    async fn delete_row(&self, table: &str, id: &str) -> DocumentStoreResult<()> {
        self.inner.delete_row(table, id).await
    }

    async fn scan_rows(&self, table: &str, limit: u64) -> DocumentStoreResult<Vec<RawRow>> {
        self.inner.scan_rows(table, limit).await
    }

    async fn query_rows(&self, table: &str, query: &QueryRequest) -> DocumentStoreResult<Vec<RawRow>> {
        self.inner.query_rows(table, query).await
    }
}

#[tokio::test]
async fn merge_reports_conflict_instead_of_losing_a_write() {
    let inner = InMemoryStore::new();
    let store = CollectionStore::new(InterleavingBackend { inner: inner.clone() });

    store
        .upsert_document("users", Some("ana".into()), payload(json!({ "name": "Ana" })))
        .await
        .unwrap();

    let result = store
        .merge_update_document("users", "ana", &payload(json!({ "age": 31 })))
        .await;
    assert!(matches!(result, Err(DocumentStoreError::Conflict(..))));

    // The concurrent write survives.
    let fetched = inner.fetch_row("users", "ana").await.unwrap();
    assert_eq!(fetched, Some(RawPayload::Json(json!({ "name": "concurrent" }))));
}

#[tokio::test]
async fn concurrent_writes_to_different_documents_all_land() {
    let store = store().await;
    store.create_collection("events").await.unwrap();

    let writes = (0..16).map(|n| {
        let store = &store;
        async move {
            store
                .upsert_document("events", Some(format!("e{n:02}")), payload(json!({ "n": n })))
                .await
        }
    });
    for result in futures::future::join_all(writes).await {
        result.unwrap();
    }

    assert_eq!(store.read_collection("events", 100).await.unwrap().len(), 16);
    assert_eq!(store.read_collection("events", 5).await.unwrap().len(), 5);
}
