//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::chat::StoreError;

/// Request failures, mapped to an HTTP status and a JSON error body.
///
/// These only apply before streaming starts. Once the response headers
/// are out, a failure can't change the status anymore; it is logged
/// and the body ends early instead.
pub enum ApiError {
    /// Client input was unusable.
    BadRequest(&'static str),
    /// The document store could not be reached.
    ServiceUnavailable,
    /// The store was reachable but loading the conversation failed.
    ChatAccess(anyhow::Error),
    /// The inference endpoint was unreachable or returned non-success.
    Upstream(anyhow::Error),
    /// Anything unexpected.
    Internal(anyhow::Error),
}

impl ApiError {
    /// Maps a store failure hit while resolving the conversation.
    pub fn from_load(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(e) => {
                tracing::error!("Store unavailable: {}", e);
                ApiError::ServiceUnavailable
            }
            StoreError::Persistence(e) => ApiError::ChatAccess(e),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({"error": "Database connection failed"}),
            ),
            ApiError::ChatAccess(e) => {
                tracing::error!("Chat lookup failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Failed to create or retrieve chat"}),
                )
            }
            ApiError::Upstream(e) => {
                tracing::error!("Ollama request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": "Failed to connect to Ollama API",
                        "details": e.to_string(),
                    }),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Unhandled error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Internal Server Error",
                        "details": e.to_string(),
                    }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` by treating anything unmapped as an internal error.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}
