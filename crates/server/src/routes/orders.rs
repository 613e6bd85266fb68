//! Order route handlers.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Sse},
    routing::{get, patch},
};
use comanda_core::{KitchenBoard, NewOrder, Order, OrderId, OrderQuery, OrderStatus, OrderSummary};
use futures::StreamExt;
use serde::Deserialize;

use crate::error::{AppError, EMPTY_ORDER_MESSAGE};
use crate::state::AppState;

/// Customer name used for waiter orders without a signed-in user.
pub const WAITER_CUSTOMER_NAME: &str = "Garçom";
/// Customer name used for anonymous orders.
pub const DEFAULT_CUSTOMER_NAME: &str = "Cliente";

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(place_order))
        .route("/api/orders/summary", get(order_summary))
        .route("/api/orders/board", get(kitchen_board))
        .route("/api/orders/stream", get(order_stream))
        .route("/api/orders/{id}/status", patch(update_status))
}

// =============================================================================
// Request Types
// =============================================================================

/// Request to place an order.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub items: Vec<String>,
    #[serde(default)]
    pub table_name: Option<String>,
    #[serde(default)]
    pub observation: Option<String>,
    /// Overrides the name derived from the session.
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Order taken by a waiter.
    #[serde(default)]
    pub waiter: bool,
}

/// Request to change an order's status.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Turn a request into a pending order stamped now.
///
/// Item names are trimmed and blanks dropped. The customer name is, in
/// order: the explicit name, the signed-in user's display name, the waiter
/// label for waiter orders, or the anonymous label.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if no item remains.
pub fn build_order(
    request: PlaceOrderRequest,
    session_name: Option<&str>,
) -> Result<NewOrder, AppError> {
    let items: Vec<String> = request
        .items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_owned)
        .collect();
    if items.is_empty() {
        return Err(AppError::BadRequest(EMPTY_ORDER_MESSAGE.to_string()));
    }

    let fallback = if request.waiter {
        WAITER_CUSTOMER_NAME
    } else {
        DEFAULT_CUSTOMER_NAME
    };
    let customer = request
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or(session_name.filter(|n| !n.trim().is_empty()))
        .unwrap_or(fallback);

    let mut order = NewOrder::new(customer, items);
    if let Some(table) = request.table_name {
        order = order.with_table(table);
    }
    if let Some(note) = request.observation {
        order = order.with_observation(note);
    }
    Ok(order)
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /api/orders
async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.orders().snapshot().await?;
    Ok(Json(query.apply(&orders)))
}

/// GET /api/orders/summary
async fn order_summary(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<OrderSummary>, AppError> {
    let orders = state.orders().snapshot().await?;
    Ok(Json(query.summary(&orders)))
}

/// GET /api/orders/board
async fn kitchen_board(State(state): State<AppState>) -> Result<Json<KitchenBoard>, AppError> {
    let orders = state.orders().snapshot().await?;
    Ok(Json(KitchenBoard::from_orders(&orders)))
}

/// GET /api/orders/stream
///
/// One `orders` event per snapshot; the first arrives right away.
async fn order_stream(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let events = state.orders().stream().map(|orders| {
        let json = serde_json::to_string(&orders).unwrap_or_else(|_| "[]".to_string());
        Ok(Event::default().event("orders").data(json))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// POST /api/orders
async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session_name = state
        .auth()
        .and_then(|auth| auth.session())
        .and_then(|user| user.display_name);

    let order = build_order(request, session_name.as_deref())?;
    let stored = state.orders().add(order).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// PATCH /api/orders/{id}/status
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<StatusCode, AppError> {
    state
        .orders()
        .update_status(&OrderId::new(id), request.status)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
