//! Integration test helpers for Comanda.
//!
//! # Running Tests
//!
//! ```bash
//! # Local backend and HTTP API (no network)
//! cargo test -p comanda-integration-tests
//!
//! # Remote smoke tests against a real project
//! FIREBASE_PROJECT_ID=... FIREBASE_API_KEY=... \
//!     cargo test -p comanda-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `local_orders` - order sync over the local store
//! - `local_users` - user directory over the local store
//! - `api_routes` - HTTP handlers over an in-memory local backend
//! - `remote_backend` - Firestore-backed stores (ignored by default)

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use comanda_core::Order;
use comanda_server::storage::{KeyValueStore, MemoryStore, StorageError};

/// Memory store whose writes can be switched to fail.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl FailingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` and `remove` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                key: key.to_owned(),
                source: std::io::Error::other("disk full"),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check(key)?;
        self.inner.remove(key)
    }
}

/// Directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    #[must_use]
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("comanda-it-{}", uuid::Uuid::new_v4()));
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for TempDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Collects every snapshot delivered to a listener.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    snapshots: Arc<Mutex<Vec<Vec<Order>>>>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that appends to this recorder.
    pub fn listener(&self) -> impl Fn(Vec<Order>) + Send + Sync + 'static + use<> {
        let snapshots = Arc::clone(&self.snapshots);
        move |orders| {
            snapshots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(orders);
        }
    }

    /// Number of deliveries so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The most recent snapshot, if any.
    #[must_use]
    pub fn last(&self) -> Option<Vec<Order>> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}
