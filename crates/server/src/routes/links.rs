//! Messaging link route handlers.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::links::{dessert_message, dessert_selection, order_message, share_text, whatsapp_link};
use crate::state::AppState;

/// Build the links router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/links/order", post(order_link))
        .route("/api/links/dessert", post(dessert_link))
        .route("/api/links/share", get(share))
}

#[derive(Debug, Deserialize)]
pub struct OrderLinkRequest {
    pub items: Vec<String>,
}

/// A selected dessert: category index and item index within it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DessertPick {
    pub category: usize,
    pub item: usize,
}

#[derive(Debug, Deserialize)]
pub struct DessertLinkRequest {
    pub picks: Vec<DessertPick>,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub message: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub text: String,
}

/// POST /api/links/order
async fn order_link(
    State(state): State<AppState>,
    Json(request): Json<OrderLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let menu = state.menu().current()?;
    let message = order_message(&menu, &request.items)?;
    let url = whatsapp_link(&menu.phone, &message);
    Ok(Json(LinkResponse { message, url }))
}

/// POST /api/links/dessert
async fn dessert_link(
    State(state): State<AppState>,
    Json(request): Json<DessertLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let picks: Vec<(usize, usize)> = request
        .picks
        .iter()
        .map(|p| (p.category, p.item))
        .collect();
    let lines = dessert_selection(&state.menu().categories(), &picks);
    let message = dessert_message(&lines)?;

    let phone = state.menu().current()?.phone;
    let url = whatsapp_link(&phone, &message);
    Ok(Json(LinkResponse { message, url }))
}

/// GET /api/links/share
async fn share(State(state): State<AppState>) -> Result<Json<ShareResponse>, AppError> {
    let menu = state.menu().current()?;
    Ok(Json(ShareResponse {
        text: share_text(&menu),
    }))
}
