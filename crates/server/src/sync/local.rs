//! Order collection backed by the local key-value store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use comanda_core::{NewOrder, Order, OrderId, OrderStatus};
use tracing::instrument;

use super::{OrdersListener, Subscription, SyncError};
use crate::storage::{Loaded, ORDERS_KEY, SharedStore, load_json, save_json};

/// In-process order collection plus its listeners.
///
/// Every clone shares the same collection, so a mutation made through one
/// handle reaches listeners registered through any other.
#[derive(Clone)]
pub struct LocalOrders {
    inner: Arc<Inner>,
}

struct Inner {
    store: SharedStore,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    orders: Vec<Order>,
    listeners: Vec<(u64, OrdersListener)>,
    next_listener_id: u64,
    /// Last id handed out, in Unix milliseconds.
    last_id: i64,
}

impl std::fmt::Debug for LocalOrders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("LocalOrders")
            .field("orders", &state.orders.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pull the persisted collection into memory.
    ///
    /// A missing blob keeps what is in memory; a malformed one empties it.
    fn reload(&self, state: &mut State) {
        match load_json::<Vec<Order>>(self.store.as_ref(), ORDERS_KEY) {
            Ok(Loaded::Value(orders)) => state.orders = orders,
            Ok(Loaded::Corrupt) => state.orders.clear(),
            Ok(Loaded::Missing) => {}
            Err(e) => tracing::error!(error = %e, "Failed to read stored orders"),
        }
        state.last_id = state.last_id.max(max_numeric_id(&state.orders));
    }
}

fn max_numeric_id(orders: &[Order]) -> i64 {
    orders
        .iter()
        .filter_map(|o| o.id.as_str().parse::<i64>().ok())
        .max()
        .unwrap_or(0)
}

fn notify(listeners: &[OrdersListener], orders: &[Order]) {
    for listener in listeners {
        listener(orders.to_vec());
    }
}

fn listeners_of(state: &State) -> Vec<OrdersListener> {
    state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
}

impl LocalOrders {
    /// Open the collection persisted in `store`.
    #[must_use]
    pub fn new(store: SharedStore) -> Self {
        let inner = Arc::new(Inner {
            store,
            state: Mutex::new(State::default()),
        });
        {
            let mut state = inner.lock();
            inner.reload(&mut state);
        }
        Self { inner }
    }

    /// Register a listener and call it once with the current collection.
    pub fn subscribe(&self, listener: OrdersListener) -> Subscription {
        let (id, snapshot) = {
            let mut state = self.inner.lock();
            self.inner.reload(&mut state);

            let id = state.next_listener_id;
            state.next_listener_id += 1;
            state.listeners.push((id, Arc::clone(&listener)));
            (id, state.orders.clone())
        };

        listener(snapshot);

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }

    /// Prepend a new order, persist the collection, then notify.
    ///
    /// The id is the current Unix time in milliseconds, bumped when needed
    /// so ids from this collection are strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the collection cannot be written; the
    /// in-memory collection is left unchanged in that case.
    #[instrument(skip(self, order), fields(customer = %order.customer_name))]
    pub fn add(&self, order: NewOrder) -> Result<Order, SyncError> {
        let (stored, listeners, snapshot) = {
            let mut state = self.inner.lock();

            let id = Utc::now().timestamp_millis().max(state.last_id + 1);
            let stored = order.into_order(OrderId::new(id.to_string()));

            let mut next = Vec::with_capacity(state.orders.len() + 1);
            next.push(stored.clone());
            next.extend(state.orders.iter().cloned());
            save_json(self.inner.store.as_ref(), ORDERS_KEY, &next)?;

            state.last_id = id;
            state.orders = next;
            (stored, listeners_of(&state), state.orders.clone())
        };

        tracing::info!(order_id = %stored.id, "Order stored locally");
        notify(&listeners, &snapshot);
        Ok(stored)
    }

    /// Set the status of one order, persist, then notify.
    ///
    /// Unknown ids leave the collection untouched but listeners still fire.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the collection cannot be written.
    #[instrument(skip(self))]
    pub fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), SyncError> {
        let (listeners, snapshot) = {
            let mut state = self.inner.lock();

            let mut next = state.orders.clone();
            if let Some(order) = next.iter_mut().find(|o| &o.id == id) {
                order.status = status;
                save_json(self.inner.store.as_ref(), ORDERS_KEY, &next)?;
                state.orders = next;
            } else {
                tracing::debug!("Status update for unknown order ignored");
            }

            (listeners_of(&state), state.orders.clone())
        };

        notify(&listeners, &snapshot);
        Ok(())
    }

    /// Current collection after a reload from the store.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Order> {
        let mut state = self.inner.lock();
        self.inner.reload(&mut state);
        state.orders.clone()
    }
}
