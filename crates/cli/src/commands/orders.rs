//! Order commands.

use comanda_core::{OrderId, OrderQuery, OrderStatus};
use comanda_server::routes::orders::{PlaceOrderRequest, build_order};
use comanda_server::state::AppState;
use futures::StreamExt;

use super::print_json;

/// Print the filtered collection, newest first.
pub async fn list(
    state: &AppState,
    q: Option<String>,
    status: Option<OrderStatus>,
) -> Result<(), Box<dyn std::error::Error>> {
    let orders = state.orders().snapshot().await?;
    let query = OrderQuery { q, status };
    print_json(&query.apply(&orders))?;
    Ok(())
}

/// Place an order with the same defaults as the HTTP API.
pub async fn add(
    state: &AppState,
    items: Vec<String>,
    table: Option<String>,
    note: Option<String>,
    customer: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = PlaceOrderRequest {
        items,
        table_name: table,
        observation: note,
        customer_name: customer,
        waiter: false,
    };
    let order = build_order(request, None)?;
    let order = state.orders().add(order).await?;

    tracing::info!(id = %order.id, "Order placed");
    print_json(&order)?;
    Ok(())
}

/// Change an order's status.
pub async fn set_status(
    state: &AppState,
    id: &str,
    status: OrderStatus,
) -> Result<(), Box<dyn std::error::Error>> {
    state
        .orders()
        .update_status(&OrderId::new(id), status)
        .await?;
    tracing::info!(%id, %status, "Status updated");
    Ok(())
}

/// Print one JSON line per snapshot until Ctrl+C.
pub async fn watch(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let mut snapshots = Box::pin(state.orders().stream());

    loop {
        tokio::select! {
            next = snapshots.next() => {
                let Some(orders) = next else {
                    tracing::warn!("Order stream ended");
                    break;
                };
                let active = orders.iter().filter(|o| o.status.is_active()).count();
                tracing::info!(total = orders.len(), active, "Snapshot");
                print_json(&orders)?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
