//! Core types for Comanda.
//!
//! This module provides type-safe wrappers for the restaurant domain.

pub mod email;
pub mod id;
pub mod menu;
pub mod order;
pub mod price;
pub mod status;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use menu::{DessertCategory, ExtractedMenu, MenuData, default_desserts, digits_only};
pub use order::{KitchenBoard, NewOrder, Order, OrderQuery, OrderSummary, RECENT_COMPLETED_LIMIT};
pub use price::Price;
pub use status::*;
pub use user::{DEFAULT_DISPLAY_NAME, ProfileDraft, UserProfile};
