//! Sign-in route handlers.
//!
//! Only meaningful with the remote backend; in local mode sign-in answers
//! 503 and the session is always empty.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::auth::{AuthService, AuthUser};
use crate::error::AppError;
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: String,
}

fn require_auth(state: &AppState) -> Result<&AuthService, AppError> {
    state
        .auth()
        .ok_or_else(|| AppError::Unavailable("Login indisponível no Modo Local.".to_string()))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthUser>, AppError> {
    let auth = require_auth(&state)?;
    let user = auth
        .sign_in_or_register(&request.email, &request.password)
        .await?;
    Ok(Json(user))
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth = require_auth(&state)?;
    let user = auth
        .register(&request.email, &request.password, &request.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>) -> StatusCode {
    if let Some(auth) = state.auth() {
        auth.sign_out();
    }
    StatusCode::NO_CONTENT
}

/// GET /api/auth/session
async fn session(State(state): State<AppState>) -> Json<Option<AuthUser>> {
    Json(state.auth().and_then(AuthService::session))
}
