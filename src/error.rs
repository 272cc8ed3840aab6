//! Error types for the cache engine and its HTTP surface
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::CacheResultCode;

// == Store Error ==
/// Failure raised by a backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot serve requests right now
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O failure of a persistent store
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Cache Error ==
/// Failure contained by the engine and reported as a `FAIL` result.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The key convertor rejected the key
    #[error("key conversion failed: {0}")]
    KeyConversion(#[source] anyhow::Error),

    /// The backing store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The key convertor or the store panicked
    #[error("operation panicked: {0}")]
    Panicked(String),
}

impl CacheError {
    /// Category name used as the prefix of `FAIL` messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::KeyConversion(_) => "KeyConversionError",
            CacheError::Store(_) => "StoreError",
            CacheError::Panicked(_) => "Panic",
        }
    }

    /// `<Category>:<message>`
    pub fn describe(&self) -> String {
        format!("{}:{}", self.kind(), self)
    }
}

// == Operation Failure ==
/// A `FAIL` result lifted out of a `CacheGetResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cache operation failed: {message}")]
pub struct OperationFailure {
    pub message: String,
}

impl OperationFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// == API Error ==
/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not present, or its value was released
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key was present but its deadline had passed
    #[error("Key expired: {0}")]
    Expired(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The engine reported `FAIL`
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => CacheResultCode::NotExists.as_str(),
            ApiError::Expired(_) => CacheResultCode::Expired.as_str(),
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::Internal(_) => CacheResultCode::Fail.as_str(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) | ApiError::Expired(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for engine internals.
pub type Result<T> = std::result::Result<T, CacheError>;
