//! Error types for the page cache
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
/// Unified error type for the cache engine and its HTTP adapter.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Page not present when the transaction read the key
    #[error("Page not found: {0}")]
    NotFound(String),

    /// Eviction could not free enough space to admit an entry
    #[error("Capacity exceeded: {requested} bytes requested, capacity is {capacity} bytes")]
    CapacityError { requested: u64, capacity: u64 },

    /// Backing store connection or command failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Optimistic transaction kept conflicting past the configured retry cap
    #[error("Gave up on {url} after {attempts} conflicting attempts")]
    ConflictRetryExhausted { url: String, attempts: u32 },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::StoreUnavailable(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::CapacityError { .. } => StatusCode::INSUFFICIENT_STORAGE,
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::ConflictRetryExhausted { .. } => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the page cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (CacheError::NotFound("a".to_string()), StatusCode::NOT_FOUND),
            (
                CacheError::CapacityError {
                    requested: 10,
                    capacity: 5,
                },
                StatusCode::INSUFFICIENT_STORAGE,
            ),
            (
                CacheError::StoreUnavailable("down".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CacheError::ConflictRetryExhausted {
                    url: "a".to_string(),
                    attempts: 3,
                },
                StatusCode::CONFLICT,
            ),
            (
                CacheError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected_status) in test_cases {
            assert_eq!(error.into_response().status(), expected_status);
        }
    }

    #[test]
    fn test_redis_error_maps_to_store_unavailable() {
        let err: CacheError =
            redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into();
        assert!(matches!(err, CacheError::StoreUnavailable(_)));
    }

    #[test]
    fn test_capacity_error_message() {
        let err = CacheError::CapacityError {
            requested: 120,
            capacity: 100,
        };
        assert!(err.to_string().contains("120"));
        assert!(err.to_string().contains("100"));
    }
}
