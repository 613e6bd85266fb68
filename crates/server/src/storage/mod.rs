//! Local persistent key-value store.
//!
//! Blobs are JSON text keyed by a short name. Two implementations:
//!
//! - [`FileStore`] - one `<key>.json` file per key under a data directory
//! - [`MemoryStore`] - process-local map, used by tests and ephemeral runs
//!
//! Callers go through [`load_json`] and [`save_json`]. A blob that fails to
//! parse is reported as [`Loaded::Corrupt`] so each caller can decide what
//! "absent" means for its collection.

mod file;
mod memory;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding today's menu.
pub const MENU_KEY: &str = "menu";
/// Key holding the local order collection.
pub const ORDERS_KEY: &str = "orders";
/// Key holding the local user directory.
pub const USERS_KEY: &str = "users";
/// Key holding the remote backend credentials override.
pub const BACKEND_KEY: &str = "backend";

/// Errors from the local store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the underlying medium failed.
    #[error("storage I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded as JSON.
    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters that cannot map to a file name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Synchronous text blob store.
///
/// Operations are expected to be fast (local disk or memory); async callers
/// use them directly without `spawn_blocking`.
pub trait KeyValueStore: Send + Sync {
    /// Read a blob. `Ok(None)` when the key was never written or was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a blob, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a blob. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a store.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Outcome of reading a JSON blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded<T> {
    /// Key not present.
    Missing,
    /// Present but not valid JSON for `T`.
    Corrupt,
    /// Decoded value.
    Value(T),
}

impl<T> Loaded<T> {
    /// The decoded value, treating missing and corrupt blobs alike.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing | Self::Corrupt => None,
        }
    }
}

/// Read and decode a JSON blob.
///
/// Malformed data is logged at `warn` and reported as [`Loaded::Corrupt`].
///
/// # Errors
///
/// Returns `StorageError` only when the store itself fails.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Loaded<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(Loaded::Missing);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Loaded::Value(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed stored data");
            Ok(Loaded::Corrupt)
        }
    }
}

/// Encode a value as JSON and write it.
///
/// # Errors
///
/// Returns `StorageError` if encoding or writing fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, &raw)
}
