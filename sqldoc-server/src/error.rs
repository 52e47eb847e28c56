use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use sqldoc::error::DocumentStoreError;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl From<DocumentStoreError> for AppError {
    fn from(err: DocumentStoreError) -> Self {
        let message = err.to_string();

        match err {
            _ if err.is_client_error() => Self::Validation(message),
            DocumentStoreError::DocumentNotFound(..) => Self::NotFound(message),
            DocumentStoreError::Conflict(..) => Self::Conflict(message),
            _ => Self::Storage(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Storage(msg) => {
                error!(error = %msg, "storage operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
