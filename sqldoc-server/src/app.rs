use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        add_document, add_document_auto, create_collection, delete_collection, delete_document,
        edit_document, query_collection, read_collection, read_document, root,
    },
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route(
            "/collections/{name}",
            post(create_collection)
                .get(read_collection)
                .delete(delete_collection),
        )
        .route("/doc/{collection}", post(add_document_auto))
        .route(
            "/doc/{collection}/{id}",
            post(add_document)
                .get(read_document)
                .patch(edit_document)
                .delete(delete_document),
        )
        .route("/query/{collection}", post(query_collection))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
