//! Error types for lectio-offline
//!
//! `LookupError` is the failure taxonomy of the store / fetch / sync / resolve
//! core. `ApiError` maps it (and request validation failures) onto HTTP.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lectio_common::BibleVersion;
use serde_json::json;
use thiserror::Error;

/// Core lookup and sync errors
#[derive(Debug, Error)]
pub enum LookupError {
    /// Non-success HTTP status or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The caller abandoned the request; never shown to users
    #[error("Request cancelled")]
    Cancelled,

    /// Sync requested for an edition that cannot be mirrored
    #[error("Version {0} cannot be synchronized for offline use")]
    UnsupportedVersion(BibleVersion),

    /// Book descriptor missing while assembling a local chapter
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Remote payload did not match the expected structure
    #[error("Malformed remote payload: {0}")]
    Parse(String),

    /// Unexpected local store failure
    #[error("Unexpected local store failure: {0}")]
    Unknown(String),
}

impl LookupError {
    /// Message suitable for showing to a reader
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Network(_) => {
                "Could not reach the Bible service. Check your connection and try again.".to_string()
            }
            LookupError::Cancelled => String::new(),
            LookupError::UnsupportedVersion(version) => format!(
                "Only the {} edition can be downloaded for offline use ({} is not supported).",
                BibleVersion::PRIMARY_OFFLINE.label(),
                version.label()
            ),
            LookupError::BookNotFound(abbrev) => format!("Book '{}' was not found.", abbrev),
            LookupError::Parse(_) => {
                "The downloaded Bible text was not in the expected format.".to_string()
            }
            LookupError::Unknown(_) => "An unexpected error occurred. Please try again.".to_string(),
        }
    }

    /// Classify a reqwest failure
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Parse(err.to_string())
        } else if err.is_timeout() {
            LookupError::Network(format!("request timed out: {}", err))
        } else {
            LookupError::Network(err.to_string())
        }
    }
}

impl From<lectio_common::Error> for LookupError {
    fn from(err: lectio_common::Error) -> Self {
        LookupError::Unknown(err.to_string())
    }
}

impl From<sqlx::Error> for LookupError {
    fn from(err: sqlx::Error) -> Self {
        LookupError::Unknown(err.to_string())
    }
}

/// Result type for core operations
pub type LookupResult<T> = Result<T, LookupError>;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., sync already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Core lookup / sync failure
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// lectio-common error
    #[error("Common error: {0}")]
    Common(#[from] lectio_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Lookup(LookupError::Cancelled) => {
                return StatusCode::NO_CONTENT.into_response();
            }
            ApiError::Lookup(ref err) => {
                let (status, code) = match err {
                    LookupError::Network(_) => (StatusCode::BAD_GATEWAY, "NETWORK_ERROR"),
                    LookupError::UnsupportedVersion(_) => {
                        (StatusCode::BAD_REQUEST, "UNSUPPORTED_VERSION")
                    }
                    LookupError::BookNotFound(_) => (StatusCode::NOT_FOUND, "BOOK_NOT_FOUND"),
                    LookupError::Parse(_) => (StatusCode::BAD_GATEWAY, "PARSE_ERROR"),
                    LookupError::Unknown(_) | LookupError::Cancelled => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN_ERROR")
                    }
                };
                tracing::warn!(error = %err, code, "Request failed");
                (status, code, err.user_message())
            }
            ApiError::Common(lectio_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg)
            }
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
