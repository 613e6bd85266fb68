//! Gemini integration for turning a menu photo into structured data.
//!
//! One request per photo, no retry and no caching. The response schema
//! forces JSON with `restaurantName`, `items` and `price`; `title` and
//! `phone` are optional.

mod client;
mod error;
mod types;

pub use client::{GeminiClient, sniff_mime_type};
pub use error::GeminiError;
pub use types::{GenerateContentRequest, GenerateContentResponse, menu_schema};
