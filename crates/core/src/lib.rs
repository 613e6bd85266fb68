//! Comanda Core - Shared domain types.
//!
//! This crate provides the types shared by every Comanda component:
//! - `server` - HTTP API, sync layer and backend clients
//! - `cli` - Operator command-line tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no storage,
//! no HTTP clients. Orders, profiles and menus are serialized with camelCase
//! field names so the same JSON is used for persisted blobs, remote documents
//! and HTTP bodies.
//!
//! # Modules
//!
//! - [`types`] - Ids, statuses, roles, prices, orders, profiles and menus

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
