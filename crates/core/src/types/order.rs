//! Orders and the read-side views built from order snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OrderId, OrderStatus};

/// A submitted order.
///
/// Items keep submission order and may repeat. Orders are only ever
/// mutated through status updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    pub items: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

/// An order that has not been stored yet (no id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    pub items: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl NewOrder {
    /// A pending order stamped with the current time.
    #[must_use]
    pub fn new(customer_name: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            table_name: None,
            observation: None,
            items,
            timestamp: Utc::now(),
            status: OrderStatus::Pending,
        }
    }

    /// Set the table label. Blank labels are dropped.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = non_blank(table.into());
        self
    }

    /// Set the free-text note. Blank notes are dropped.
    #[must_use]
    pub fn with_observation(mut self, note: impl Into<String>) -> Self {
        self.observation = non_blank(note.into());
        self
    }

    /// Attach the id assigned by the store.
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            customer_name: self.customer_name,
            table_name: self.table_name,
            observation: self.observation,
            items: self.items,
            timestamp: self.timestamp,
            status: self.status,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Filter used by the admin order table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuery {
    /// Matches customer name or id (case-insensitive) or table (substring).
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    /// Whether a single order passes the filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| s != order.status) {
            return false;
        }

        let Some(text) = self.q.as_deref().filter(|t| !t.is_empty()) else {
            return true;
        };
        let needle = text.to_lowercase();

        order.customer_name.to_lowercase().contains(&needle)
            || order.table_name.as_deref().is_some_and(|t| t.contains(text))
            || order.id.as_str().to_lowercase().contains(&needle)
    }

    /// Filter a snapshot and sort it newest first.
    #[must_use]
    pub fn apply(&self, orders: &[Order]) -> Vec<Order> {
        let mut matched: Vec<Order> = orders.iter().filter(|o| self.matches(o)).cloned().collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matched
    }

    /// Totals over the orders that pass the filter.
    #[must_use]
    pub fn summary(&self, orders: &[Order]) -> OrderSummary {
        orders
            .iter()
            .filter(|o| self.matches(o))
            .fold(OrderSummary::default(), |mut summary, order| {
                summary.total_orders += 1;
                if order.status == OrderStatus::Completed {
                    summary.completed_count += 1;
                }
                summary
            })
    }
}

/// Admin table totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_orders: usize,
    pub completed_count: usize,
}

/// Completed orders shown on the kitchen board.
pub const RECENT_COMPLETED_LIMIT: usize = 10;

/// Orders grouped the way the kitchen screen shows them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenBoard {
    /// Oldest first.
    pub pending: Vec<Order>,
    /// Oldest first.
    pub preparing: Vec<Order>,
    /// Newest first, at most [`RECENT_COMPLETED_LIMIT`].
    pub completed: Vec<Order>,
    pub active_count: usize,
}

impl KitchenBoard {
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut board = Self::default();
        for order in orders {
            match order.status {
                OrderStatus::Pending => board.pending.push(order.clone()),
                OrderStatus::Preparing => board.preparing.push(order.clone()),
                OrderStatus::Completed => board.completed.push(order.clone()),
            }
        }
        board.pending.sort_by_key(|o| o.timestamp);
        board.preparing.sort_by_key(|o| o.timestamp);
        board.completed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        board.completed.truncate(RECENT_COMPLETED_LIMIT);
        board.active_count = board.pending.len() + board.preparing.len();
        board
    }
}
