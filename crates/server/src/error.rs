//! Unified error handling for the HTTP API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::directory::DirectoryError;
use crate::gemini::GeminiError;
use crate::links::LinkError;
use crate::storage::StorageError;
use crate::sync::SyncError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Order store operation failed.
    #[error("Order store error: {0}")]
    Sync(#[from] SyncError),

    /// Profile store operation failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Menu extraction failed.
    #[error("Extraction error: {0}")]
    Gemini(#[from] GeminiError),

    /// Sign-in or registration failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Feature not available in the current mode.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LinkError> for AppError {
    fn from(err: LinkError) -> Self {
        match err {
            LinkError::EmptySelection => Self::BadRequest(EMPTY_ORDER_MESSAGE.to_string()),
        }
    }
}

/// Shown when an order or link request has no items.
pub const EMPTY_ORDER_MESSAGE: &str = "O pedido está vazio! Selecione pelo menos um item.";

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Sync(SyncError::Storage(_))
            | Self::Directory(DirectoryError::Storage(_))
            | Self::Storage(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Sync(SyncError::Remote(_))
            | Self::Directory(DirectoryError::Remote(_))
            | Self::Gemini(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(AuthError::MissingCredentials | AuthError::InvalidEmail(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::Provider { .. }) => StatusCode::UNAUTHORIZED,
            Self::Auth(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Sync(_) | Self::Directory(_) | Self::Storage(_) | Self::Gemini(_) | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Sync(_) | Self::Directory(_) | Self::Storage(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Gemini(_) => "Não foi possível ler o cardápio da foto.".to_string(),
            Self::Auth(e) => e.user_message(),
            Self::NotFound(m) | Self::BadRequest(m) | Self::Unavailable(m) => m.clone(),
        };

        (self.status(), Json(ErrorResponse { error: message })).into_response()
    }
}
