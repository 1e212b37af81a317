//! Error types for the cache service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the cache itself.
///
/// A miss is not an error. Factory failures are never wrapped in this type;
/// they reach the caller as the caller's own error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Empty key, empty prefix or otherwise unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CacheError {
    pub(crate) fn empty_key() -> Self {
        CacheError::InvalidArgument("Key cannot be empty".to_string())
    }

    pub(crate) fn empty_prefix() -> Self {
        CacheError::InvalidArgument("Prefix cannot be empty".to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
