//! Order sync over the local store.
//!
//! Runs without network access: every test builds its own `LocalOrders`
//! over a fresh memory or temp-dir store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};

use comanda_core::{NewOrder, OrderId, OrderStatus};
use comanda_integration_tests::{FailingStore, Recorder, TempDir};
use comanda_server::routes::orders::{PlaceOrderRequest, build_order};
use comanda_server::storage::{FileStore, KeyValueStore, MemoryStore, ORDERS_KEY, SharedStore};
use comanda_server::sync::{LocalOrders, OrderSync, SyncError};

fn local(store: SharedStore) -> OrderSync {
    OrderSync::Local(LocalOrders::new(store))
}

fn new_order(items: &[&str]) -> NewOrder {
    NewOrder::new("Cliente", items.iter().map(|i| (*i).to_owned()).collect())
}

// ============================================================================
// Subscription
// ============================================================================

#[tokio::test]
async fn test_listener_sees_every_add() {
    let orders = local(Arc::new(MemoryStore::new()));
    let recorder = Recorder::new();
    let _sub = orders.subscribe(recorder.listener());

    for n in 0..5 {
        orders.add(new_order(&["Arroz"])).await.unwrap();
        assert_eq!(recorder.last().unwrap().len(), n + 1);
    }

    // Initial delivery plus one per add
    assert_eq!(recorder.count(), 6);
}

#[tokio::test]
async fn test_listeners_notified_in_registration_order() {
    let orders = local(Arc::new(MemoryStore::new()));
    let calls = Arc::new(Mutex::new(Vec::new()));

    let first = {
        let calls = Arc::clone(&calls);
        orders.subscribe(move |_| calls.lock().unwrap().push("first"))
    };
    let second = {
        let calls = Arc::clone(&calls);
        orders.subscribe(move |_| calls.lock().unwrap().push("second"))
    };
    calls.lock().unwrap().clear();

    orders.add(new_order(&["Feijão"])).await.unwrap();
    assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);

    drop(first);
    drop(second);
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let orders = local(Arc::new(MemoryStore::new()));
    let recorder = Recorder::new();
    let sub = orders.subscribe(recorder.listener());

    orders.add(new_order(&["Arroz"])).await.unwrap();
    assert_eq!(recorder.count(), 2);

    sub.unsubscribe();
    orders.add(new_order(&["Feijão"])).await.unwrap();
    assert_eq!(recorder.count(), 2);
}

// ============================================================================
// Status updates
// ============================================================================

#[tokio::test]
async fn test_status_update_visible_to_new_subscriber() {
    let orders = local(Arc::new(MemoryStore::new()));
    let order = orders.add(new_order(&["Arroz"])).await.unwrap();

    orders
        .update_status(&order.id, OrderStatus::Preparing)
        .await
        .unwrap();

    let recorder = Recorder::new();
    let _sub = orders.subscribe(recorder.listener());
    let snapshot = recorder.last().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].status, OrderStatus::Preparing);
}

#[tokio::test]
async fn test_status_update_unknown_id_leaves_collection() {
    let orders = local(Arc::new(MemoryStore::new()));
    orders.add(new_order(&["Arroz"])).await.unwrap();
    let before = orders.snapshot().await.unwrap();

    let recorder = Recorder::new();
    let _sub = orders.subscribe(recorder.listener());
    orders
        .update_status(&OrderId::new("does-not-exist"), OrderStatus::Completed)
        .await
        .unwrap();

    // Listeners still fire, with the unchanged collection
    assert_eq!(recorder.count(), 2);
    assert_eq!(recorder.last().unwrap(), before);
}

#[tokio::test]
async fn test_status_can_move_backwards() {
    let orders = local(Arc::new(MemoryStore::new()));
    let order = orders.add(new_order(&["Arroz"])).await.unwrap();

    for status in [
        OrderStatus::Preparing,
        OrderStatus::Completed,
        OrderStatus::Preparing,
    ] {
        orders.update_status(&order.id, status).await.unwrap();
        let snapshot = orders.snapshot().await.unwrap();
        assert_eq!(snapshot[0].status, status);
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_collection_survives_reload() {
    let dir = TempDir::new();
    let placed = {
        let orders = local(Arc::new(FileStore::new(dir.path())));
        let first = orders.add(new_order(&["Arroz"])).await.unwrap();
        let second = orders.add(new_order(&["Feijão", "Feijão"])).await.unwrap();
        vec![second, first]
    };

    // Fresh context over the same directory, as after a restart
    let orders = local(Arc::new(FileStore::new(dir.path())));
    let reloaded = orders.snapshot().await.unwrap();

    assert_eq!(reloaded, placed);
    assert_eq!(reloaded[0].timestamp, placed[0].timestamp);
    assert_eq!(reloaded[0].items, vec!["Feijão", "Feijão"]);
}

#[tokio::test]
async fn test_corrupt_blob_yields_empty_collection() {
    let store = Arc::new(MemoryStore::new());
    store.set(ORDERS_KEY, "{not json").unwrap();

    let orders = local(store);
    let recorder = Recorder::new();
    let _sub = orders.subscribe(recorder.listener());

    assert_eq!(recorder.last().unwrap(), Vec::new());
}

#[tokio::test]
async fn test_undecodable_file_yields_empty_collection() {
    let dir = TempDir::new();
    let orders = local(Arc::new(FileStore::new(dir.path())));
    orders.add(new_order(&["Arroz"])).await.unwrap();

    std::fs::write(dir.path().join("orders.json"), b"\xff\xfe\x00garbage").unwrap();

    assert!(orders.snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_write_is_reported_and_not_applied() {
    let store = Arc::new(FailingStore::new());
    let orders = local(store.clone());
    orders.add(new_order(&["Arroz"])).await.unwrap();

    store.fail_writes(true);
    let result = orders.add(new_order(&["Feijão"])).await;
    assert!(matches!(result, Err(SyncError::Storage(_))));
    assert_eq!(orders.snapshot().await.unwrap().len(), 1);
}

// ============================================================================
// Ids
// ============================================================================

#[tokio::test]
async fn test_ids_unique_within_same_millisecond() {
    let orders = local(Arc::new(MemoryStore::new()));
    let mut ids = Vec::new();
    for _ in 0..50 {
        ids.push(orders.add(new_order(&["Arroz"])).await.unwrap().id);
    }

    let numeric: Vec<i64> = ids.iter().map(|id| id.as_str().parse().unwrap()).collect();
    assert!(numeric.windows(2).all(|w| w[0] < w[1]));
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_place_order_for_table() {
    let orders = local(Arc::new(MemoryStore::new()));
    let request = PlaceOrderRequest {
        items: vec!["Arroz".into(), "Feijão".into()],
        table_name: Some("5".into()),
        ..PlaceOrderRequest::default()
    };

    let order = orders.add(build_order(request, None).unwrap()).await.unwrap();

    let snapshot = orders.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(!order.id.as_str().is_empty());
    assert_eq!(snapshot[0].status, OrderStatus::Pending);
    assert_eq!(snapshot[0].table_name.as_deref(), Some("5"));
    assert_eq!(snapshot[0].items, vec!["Arroz", "Feijão"]);
    assert_eq!(snapshot[0].customer_name, "Cliente");
}

#[tokio::test]
async fn test_stream_yields_snapshots() {
    use futures::StreamExt;

    let orders = local(Arc::new(MemoryStore::new()));
    let mut stream = Box::pin(orders.stream());

    assert_eq!(stream.next().await.unwrap().len(), 0);
    orders.add(new_order(&["Arroz"])).await.unwrap();
    assert_eq!(stream.next().await.unwrap().len(), 1);
}
