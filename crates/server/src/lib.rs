//! Comanda server library.
//!
//! The ordering service as a library so the binary, the CLI and the
//! integration tests share the same stores, clients and router.
//!
//! # Backends
//!
//! Orders and profiles live either in a remote Firestore project or in a
//! local JSON key-value store under the data directory. The choice is made
//! once at startup by [`backend::select`]; handlers only see
//! [`sync::OrderSync`] and [`directory::UserDirectory`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod backend;
pub mod config;
pub mod directory;
pub mod error;
pub mod firestore;
pub mod gemini;
pub mod links;
pub mod menu;
pub mod routes;
pub mod state;
pub mod storage;
pub mod sync;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use state::AppState;

/// Build the application router with health checks and all API routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 if the order store cannot produce a snapshot.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.orders().snapshot().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
