//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Backends speak
//! `StorageError`; the cache and HTTP layer speak `CacheError`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Storage Error Enum ==
/// Errors raised by a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A write statement failed
    #[error("Storage write failed: {0}")]
    Write(String),

    /// A read statement failed
    #[error("Storage read failed: {0}")]
    Read(String),

    /// An insert collided with an existing key
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// Table or column name is not a plain identifier
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Backend cannot be reached (poisoned lock, closed connection)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache and its HTTP API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache, or older than the maximum age
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key already present and the cache rejects duplicates
    #[error("Key already exists: {0}")]
    Conflict(String),

    /// Underlying storage write failed
    #[error("Storage write failure: {0}")]
    StorageWrite(String),

    /// Underlying storage read failed
    #[error("Storage read failure: {0}")]
    StorageRead(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Converts a backend error raised by a write or delete statement.
    pub fn from_write(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate(key) => CacheError::Conflict(key),
            StorageError::InvalidSchema(msg) => CacheError::Internal(msg),
            other => CacheError::StorageWrite(other.to_string()),
        }
    }

    /// Converts a backend error raised by a read statement.
    pub fn from_read(err: StorageError) -> Self {
        match err {
            StorageError::InvalidSchema(msg) => CacheError::Internal(msg),
            other => CacheError::StorageRead(other.to_string()),
        }
    }
}

// == Body Rejections ==
/// Malformed or incomplete JSON bodies are bad requests, whatever status
/// axum would pick for them.
impl From<JsonRejection> for CacheError {
    fn from(rejection: JsonRejection) -> Self {
        CacheError::InvalidRequest(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Conflict(_) => StatusCode::CONFLICT,
            CacheError::StorageWrite(_)
            | CacheError::StorageRead(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
