//! Menu and dessert route handlers.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::{get, post, put},
};
use comanda_core::{DessertCategory, MenuData, digits_only};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Largest accepted menu photo.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Build the menu router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/menu", get(get_menu).put(replace_menu))
        .route(
            "/api/menu/extract",
            post(extract_menu).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route("/api/desserts", get(list_desserts))
        .route("/api/desserts/{index}", put(update_dessert))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractParams {
    /// Persist the merged menu instead of only previewing it.
    #[serde(default)]
    pub save: bool,
}

/// GET /api/menu
async fn get_menu(State(state): State<AppState>) -> Result<Json<MenuData>, AppError> {
    Ok(Json(state.menu().current()?))
}

/// PUT /api/menu
async fn replace_menu(
    State(state): State<AppState>,
    Json(mut menu): Json<MenuData>,
) -> Result<Json<MenuData>, AppError> {
    menu.phone = digits_only(&menu.phone);
    state.menu().replace(&menu)?;
    Ok(Json(menu))
}

/// POST /api/menu/extract
///
/// Reads the `image` field, asks the model for the menu and merges the
/// result into the current one.
async fn extract_menu(
    State(state): State<AppState>,
    Query(params): Query<ExtractParams>,
    mut multipart: Multipart,
) -> Result<Json<MenuData>, AppError> {
    let gemini = state
        .gemini()
        .ok_or_else(|| AppError::Unavailable("Menu extraction is not configured".to_string()))?;

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            image = Some(bytes);
        }
    }

    let image = image
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'image' field".to_string()))?;
    if image.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest("Image is too large".to_string()));
    }

    let extracted = gemini.extract_menu(&image).await?;
    let merged = state.menu().current()?.apply_extraction(extracted);
    if params.save {
        state.menu().replace(&merged)?;
    }
    Ok(Json(merged))
}

/// GET /api/desserts
async fn list_desserts(State(state): State<AppState>) -> Json<Vec<DessertCategory>> {
    Json(state.menu().categories())
}

/// PUT /api/desserts/{index}
async fn update_dessert(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(category): Json<DessertCategory>,
) -> Result<Json<Vec<DessertCategory>>, AppError> {
    if !state.menu().update_category(index, category) {
        return Err(AppError::NotFound(format!("dessert category {index}")));
    }
    Ok(Json(state.menu().categories()))
}
