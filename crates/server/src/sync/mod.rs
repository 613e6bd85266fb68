//! Order synchronization.
//!
//! [`OrderSync`] is picked once at startup (see [`crate::backend`]) and
//! hides whether orders live in the remote document store or in the local
//! key-value store. Both variants share one contract:
//!
//! - `subscribe` delivers the full current collection immediately (local)
//!   or on the first query result (remote), then again after every change
//! - `add` assigns an id and returns the stored order
//! - `update_status` rewrites a single field in place
//!
//! Listeners always receive complete snapshots, never diffs.

mod local;
mod remote;

use std::sync::Arc;

use comanda_core::{NewOrder, Order, OrderId, OrderStatus};
use futures::Stream;
use thiserror::Error;

use crate::firestore::FirestoreError;
use crate::storage::StorageError;

pub use local::LocalOrders;
pub use remote::{RemoteOrders, order_fields, order_from_document};

/// Callback receiving full order snapshots.
pub type OrdersListener = Arc<dyn Fn(Vec<Order>) + Send + Sync>;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local persistence failed.
    #[error("local storage error: {0}")]
    Storage(#[from] StorageError),

    /// Remote store rejected or failed the operation.
    #[error("remote store error: {0}")]
    Remote(#[from] FirestoreError),
}

/// Handle for an active subscription.
///
/// Delivery stops when [`Subscription::unsubscribe`] is called or the
/// handle is dropped.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop receiving snapshots.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Order store selected at startup.
#[derive(Debug, Clone)]
pub enum OrderSync {
    Local(LocalOrders),
    Remote(RemoteOrders),
}

impl OrderSync {
    /// Register a listener for full order snapshots.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Vec<Order>) + Send + Sync + 'static,
    {
        let listener: OrdersListener = Arc::new(listener);
        match self {
            Self::Local(local) => local.subscribe(listener),
            Self::Remote(remote) => remote.subscribe(listener),
        }
    }

    /// Store a new order and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the order could not be persisted.
    pub async fn add(&self, order: NewOrder) -> Result<Order, SyncError> {
        match self {
            Self::Local(local) => local.add(order),
            Self::Remote(remote) => remote.add(order).await,
        }
    }

    /// Overwrite the status of one order.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` if the write fails. Locally an unknown id is not
    /// an error; remotely it is.
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), SyncError> {
        match self {
            Self::Local(local) => local.update_status(id, status),
            Self::Remote(remote) => remote.update_status(id, status).await,
        }
    }

    /// Current collection, read once.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the remote query fails.
    pub async fn snapshot(&self) -> Result<Vec<Order>, SyncError> {
        match self {
            Self::Local(local) => Ok(local.snapshot()),
            Self::Remote(remote) => remote.snapshot().await,
        }
    }

    /// Snapshots as an async stream. The subscription lives as long as the stream.
    pub fn stream(&self) -> impl Stream<Item = Vec<Order>> + Send + 'static + use<> {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let subscription = self.subscribe(move |orders| {
            // Receiver gone means the stream was dropped; nothing to do
            let _ = tx.send(orders);
        });

        async_stream::stream! {
            let _subscription = subscription;
            while let Some(orders) = rx.recv().await {
                yield orders;
            }
        }
    }

    /// Whether orders are served from the remote store.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}
