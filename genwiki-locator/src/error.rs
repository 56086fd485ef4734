//! Error types for genwiki-locator
//!
//! [`LocatorError`] is returned by every engine operation. Only integrity
//! violations and non-transient collaborator failures end up here; absence
//! of a location is an empty result, not an error.
//!
//! [`ApiError`] maps engine errors onto HTTP responses.

use crate::types::{GazetteerError, GeocoderError, QueryError, SearchError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Location store error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path would escape the store root or is empty
    #[error("Invalid location path: {0}")]
    InvalidPath(String),
}

/// Engine error
#[derive(Debug, Error)]
pub enum LocatorError {
    #[error(transparent)]
    Gazetteer(#[from] GazetteerError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Geocoder(#[from] GeocoderError),

    #[error("Location store error: {0}")]
    Store(#[from] StoreError),

    /// An exact-match lookup returned more than one item
    #[error("Knowledge base has {count} entries for {reference}: {items:?}")]
    ConflictingEvidence {
        reference: String,
        count: usize,
        items: Vec<String>,
    },

    /// Hierarchy level without a location kind
    #[error("No location kind for hierarchy level {0}")]
    InvalidLevel(u32),

    /// Path cannot be split into parent and name
    #[error("Invalid location path: {0}")]
    InvalidPath(String),

    /// HTTP client or configuration setup failed
    #[error("Setup error: {0}")]
    Setup(String),

    #[error(transparent)]
    Common(#[from] genwiki_common::Error),
}

/// Result type for engine operations
pub type LocatorResult<T> = Result<T, LocatorError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Engine failure
    #[error(transparent)]
    Locator(#[from] LocatorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Locator(LocatorError::ConflictingEvidence { .. }) => {
                (StatusCode::CONFLICT, "CONFLICTING_EVIDENCE")
            }
            ApiError::Locator(LocatorError::InvalidLevel(_))
            | ApiError::Locator(LocatorError::InvalidPath(_))
            | ApiError::Locator(LocatorError::Store(StoreError::InvalidPath(_))) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_HIERARCHY")
            }
            ApiError::Locator(
                LocatorError::Gazetteer(_)
                | LocatorError::Query(_)
                | LocatorError::Search(_)
                | LocatorError::Geocoder(_),
            ) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Locator(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
