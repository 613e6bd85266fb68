//! Firestore REST client.
//!
//! Covers the handful of document operations the sync and directory shims
//! need: create with a generated id, get, list, a single-collection
//! structured query, and masked patches with an optional existence
//! precondition.

mod client;
mod error;
mod value;

pub use client::{Direction, FirestoreClient};
pub use error::{ApiErrorResponse, FirestoreError};
pub use value::{ArrayValue, Document, Fields, MapValue, Value};

/// Collection holding orders.
pub const ORDERS_COLLECTION: &str = "orders";
/// Collection holding user profiles.
pub const USERS_COLLECTION: &str = "users";
