//! User profile route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use comanda_core::{ProfileDraft, UserId, UserProfile, UserRole};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", get(get_user).put(upsert_user))
        .route("/api/users/{id}/role", patch(change_role))
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: UserRole,
}

/// Body returned when a role change could not be saved.
#[derive(Debug, Serialize)]
struct RoleChangeFailure {
    error: String,
    /// Authoritative roster after the failed change.
    users: Vec<UserProfile>,
}

/// GET /api/users
async fn list_users(
    State(state): State<AppState>,
    Query(search): Query<UserSearch>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let mut users = state.users().list_all().await?;
    if let Some(text) = search.q.as_deref().filter(|t| !t.trim().is_empty()) {
        users.retain(|u| u.matches(text.trim()));
    }
    Ok(Json(users))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    state
        .users()
        .get_profile(&UserId::new(id.clone()))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// PUT /api/users/{id}
async fn upsert_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(draft): Json<ProfileDraft>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state
        .users()
        .create_or_update_profile(&UserId::new(id), draft)
        .await?;
    Ok(Json(profile))
}

/// PATCH /api/users/{id}/role
///
/// Responds with the roster after the change. When the change cannot be
/// saved, responds 502 with the re-fetched roster alongside the error.
async fn change_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ChangeRoleRequest>,
) -> Result<Response, AppError> {
    let mut roster = state.users().list_all().await?;

    match state
        .users()
        .change_role(&mut roster, &UserId::new(id), request.role)
        .await
    {
        Ok(()) => Ok(Json(roster).into_response()),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "Role change failed");
            let body = RoleChangeFailure {
                error: "Não foi possível alterar a função do usuário.".to_string(),
                users: roster,
            };
            Ok((StatusCode::BAD_GATEWAY, Json(body)).into_response())
        }
    }
}
