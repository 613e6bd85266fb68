//! Backend status and credentials override handlers.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use serde::Serialize;

use crate::backend::{BackendStatus, RemoteCredentials, clear_credentials, save_credentials};
use crate::error::AppError;
use crate::state::AppState;

/// Build the status router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/backend", put(set_backend).delete(clear_backend))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(flatten)]
    pub backend: BackendStatus,
    pub extraction_enabled: bool,
    pub signed_in: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendChangeResponse {
    /// The new setting applies after a restart.
    pub restart_required: bool,
}

/// GET /api/status
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        backend: state.backend_status().clone(),
        extraction_enabled: state.gemini().is_some(),
        signed_in: state.auth().and_then(|a| a.session()).is_some(),
    })
}

/// PUT /api/backend
async fn set_backend(
    State(state): State<AppState>,
    Json(credentials): Json<RemoteCredentials>,
) -> Result<Json<BackendChangeResponse>, AppError> {
    if credentials.project_id.trim().is_empty() || credentials.api_key.trim().is_empty() {
        return Err(AppError::BadRequest(
            "projectId and apiKey are required".to_string(),
        ));
    }
    save_credentials(state.store().as_ref(), &credentials)?;
    tracing::info!(project_id = %credentials.project_id, "Remote credentials override saved");
    Ok(Json(BackendChangeResponse {
        restart_required: true,
    }))
}

/// DELETE /api/backend
async fn clear_backend(
    State(state): State<AppState>,
) -> Result<Json<BackendChangeResponse>, AppError> {
    clear_credentials(state.store().as_ref())?;
    tracing::info!("Remote credentials override cleared");
    Ok(Json(BackendChangeResponse {
        restart_required: true,
    }))
}
