//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api/status                  Backend mode and offline banner
//! PUT    /api/backend                 Persist remote credentials override
//! DELETE /api/backend                 Clear the override
//!
//! GET    /api/orders?q=&status=       Filtered snapshot, newest first
//! GET    /api/orders/summary?q=&status=  Totals over the filtered orders
//! GET    /api/orders/board            Kitchen board (recent completed only)
//! GET    /api/orders/stream           SSE of full snapshots
//! POST   /api/orders                  Place an order
//! PATCH  /api/orders/{id}/status      Update status
//!
//! GET    /api/users?q=                List profiles
//! GET    /api/users/{id}              One profile
//! PUT    /api/users/{id}              Upsert a profile
//! PATCH  /api/users/{id}/role         Change role (roster restored on failure)
//!
//! GET    /api/menu                    Today's menu
//! PUT    /api/menu                    Replace today's menu
//! POST   /api/menu/extract            Photo (multipart `image`) to menu preview
//! GET    /api/desserts                Dessert categories
//! PUT    /api/desserts/{index}        Edit one category (not persisted)
//!
//! POST   /api/links/order             Messaging link for a menu order
//! POST   /api/links/dessert           Messaging link for a dessert order
//! GET    /api/links/share             Shareable menu text
//!
//! POST   /api/auth/login              Sign in (registers unknown accounts)
//! POST   /api/auth/register           Register
//! POST   /api/auth/logout             Sign out
//! GET    /api/auth/session            Current user
//! ```

use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod links;
pub mod menu;
pub mod orders;
pub mod status;
pub mod users;

/// Build the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(status::router())
        .merge(orders::router())
        .merge(users::router())
        .merge(menu::router())
        .merge(links::router())
        .merge(auth::router())
}
