use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors surfaced by the recommendation core and its adapters.
#[derive(thiserror::Error, Debug)]
pub enum RecError {
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for RecError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RecError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            RecError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            RecError::Cache(_) | RecError::CacheUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            RecError::IndexBuild(_)
            | RecError::Storage(_)
            | RecError::Serialization(_)
            | RecError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type RecResult<T> = Result<T, RecError>;
