//! Error types for the Firestore REST client.

use thiserror::Error;

/// Errors that can occur when talking to Firestore.
#[derive(Debug, Error)]
pub enum FirestoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Document does not exist (or an existence precondition failed).
    #[error("document not found: {0}")]
    NotFound(String),

    /// Credentials rejected.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Firestore returned another error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// Canonical status name, e.g. `FAILED_PRECONDITION`.
        status: String,
        /// Error message.
        message: String,
    },

    /// Response or document had an unexpected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Error envelope returned by Google APIs.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// HTTP status code.
    #[serde(default)]
    pub code: u16,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Canonical status name.
    #[serde(default)]
    pub status: String,
}
