use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::Value;
use sqldoc::{document::Payload, query::QueryRequest};

use crate::{
    error::AppResult,
    models::{ApiMessage, CollectionStatus, DocumentStatus, ReadCollectionQuery},
    state::AppState,
};

pub async fn root() -> Json<ApiMessage> {
    Json(ApiMessage {
        message: "Welcome to the sqldoc API".to_string(),
    })
}

// Collections

pub async fn create_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<CollectionStatus>> {
    state.store.create_collection(&name).await?;

    Ok(Json(CollectionStatus {
        status: "success",
        message: format!("Collection '{name}' created."),
    }))
}

pub async fn read_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ReadCollectionQuery>,
) -> AppResult<Json<Vec<Value>>> {
    Ok(Json(state.store.read_collection(&name, query.limit).await?))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<CollectionStatus>> {
    state.store.delete_collection(&name).await?;

    Ok(Json(CollectionStatus {
        status: "success",
        message: format!("Collection '{name}' deleted."),
    }))
}

// Documents

pub async fn add_document_auto(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(payload): Json<Payload>,
) -> AppResult<Json<DocumentStatus>> {
    let outcome = state
        .store
        .upsert_document(&collection, None, payload)
        .await?;

    Ok(Json(DocumentStatus::new("created", outcome.id)))
}

pub async fn add_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(payload): Json<Payload>,
) -> AppResult<Json<DocumentStatus>> {
    let outcome = state
        .store
        .upsert_document(&collection, Some(id), payload)
        .await?;

    Ok(Json(DocumentStatus::new("success", outcome.id)))
}

pub async fn read_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> AppResult<Json<Option<Payload>>> {
    Ok(Json(state.store.read_document(&collection, &id).await?))
}

pub async fn edit_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(patch): Json<Payload>,
) -> AppResult<Json<DocumentStatus>> {
    state
        .store
        .merge_update_document(&collection, &id, &patch)
        .await?;

    Ok(Json(DocumentStatus::new("updated", id)))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> AppResult<Json<DocumentStatus>> {
    state.store.delete_document(&collection, &id).await?;

    Ok(Json(DocumentStatus::new("deleted", id)))
}

// Queries

pub async fn query_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(query): Json<QueryRequest>,
) -> AppResult<Json<Vec<Value>>> {
    Ok(Json(state.store.query_documents(&collection, &query).await?))
}
