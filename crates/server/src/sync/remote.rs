//! Order collection backed by the remote document store.
//!
//! Live updates are produced by re-running the ordered collection query on
//! a fixed interval and delivering a snapshot whenever the result differs
//! from the last one delivered.

use std::time::Duration;

use comanda_core::{NewOrder, Order, OrderId, OrderStatus};
use tokio::time::MissedTickBehavior;
use tracing::instrument;

use super::{OrdersListener, Subscription, SyncError};
use crate::firestore::{
    Direction, Document, Fields, FirestoreClient, FirestoreError, ORDERS_COLLECTION, Value,
};

/// Orders stored as documents in the `orders` collection.
#[derive(Debug, Clone)]
pub struct RemoteOrders {
    client: FirestoreClient,
    poll_interval: Duration,
}

impl RemoteOrders {
    #[must_use]
    pub const fn new(client: FirestoreClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Start a live query feeding `listener`.
    ///
    /// The first successful result is always delivered. A failed query is
    /// logged and ends the subscription; the listener keeps whatever it
    /// last received.
    pub fn subscribe(&self, listener: OrdersListener) -> Subscription {
        let client = self.client.clone();
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last: Option<Vec<Order>> = None;

            loop {
                ticker.tick().await;
                match fetch_orders(&client).await {
                    Ok(orders) => {
                        if last.as_ref() != Some(&orders) {
                            listener(orders.clone());
                            last = Some(orders);
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Order subscription failed");
                        break;
                    }
                }
            }
        });

        Subscription::new(move || handle.abort())
    }

    /// Create a document with a generated id.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the write is rejected.
    #[instrument(skip(self, order), fields(customer = %order.customer_name))]
    pub async fn add(&self, order: NewOrder) -> Result<Order, SyncError> {
        let doc = self
            .client
            .create_document(ORDERS_COLLECTION, order_fields(&order))
            .await?;
        let stored = order.into_order(OrderId::new(doc.id()));
        tracing::info!(order_id = %stored.id, "Order stored remotely");
        Ok(stored)
    }

    /// Patch only the `status` field of an existing document.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the document does not exist or the
    /// write is rejected.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), SyncError> {
        let mut fields = Fields::new();
        fields.insert("status".to_owned(), Value::string(status.as_str()));

        self.client
            .patch_document(ORDERS_COLLECTION, id.as_str(), fields, &["status"], true)
            .await?;
        Ok(())
    }

    /// Run the ordered query once.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the query fails.
    pub async fn snapshot(&self) -> Result<Vec<Order>, SyncError> {
        Ok(fetch_orders(&self.client).await?)
    }
}

async fn fetch_orders(client: &FirestoreClient) -> Result<Vec<Order>, FirestoreError> {
    let documents = client
        .run_query(ORDERS_COLLECTION, Some(("timestamp", Direction::Descending)))
        .await?;

    Ok(documents
        .iter()
        .filter_map(|doc| match order_from_document(doc) {
            Ok(order) => Some(order),
            Err(e) => {
                tracing::warn!(document = doc.id(), error = %e, "Skipping malformed order");
                None
            }
        })
        .collect())
}

/// Document fields for a new order.
#[must_use]
pub fn order_fields(order: &NewOrder) -> Fields {
    let mut fields = Fields::new();
    fields.insert("customerName".to_owned(), Value::string(&order.customer_name));
    if let Some(table) = &order.table_name {
        fields.insert("tableName".to_owned(), Value::string(table));
    }
    if let Some(note) = &order.observation {
        fields.insert("observation".to_owned(), Value::string(note));
    }
    fields.insert("items".to_owned(), Value::string_array(order.items.iter().cloned()));
    fields.insert("timestamp".to_owned(), Value::timestamp(order.timestamp));
    fields.insert("status".to_owned(), Value::string(order.status.as_str()));
    fields
}

/// Decode an order document. Unknown or missing statuses read as pending.
///
/// # Errors
///
/// Returns `FirestoreError::Parse` if the timestamp is missing or invalid.
pub fn order_from_document(doc: &Document) -> Result<Order, FirestoreError> {
    let status = doc
        .string("status")
        .and_then(|s| s.parse::<OrderStatus>().ok())
        .unwrap_or_default();

    Ok(Order {
        id: OrderId::new(doc.id()),
        customer_name: doc.string("customerName").unwrap_or_default().to_owned(),
        table_name: doc.string("tableName").map(str::to_owned),
        observation: doc.string("observation").map(str::to_owned),
        items: doc.string_array("items"),
        timestamp: doc.timestamp("timestamp")?,
        status,
    })
}
