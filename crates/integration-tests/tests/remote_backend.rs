//! Smoke tests against a real Firestore project.
//!
//! These tests require:
//! - `FIREBASE_PROJECT_ID` and `FIREBASE_API_KEY` for a project whose
//!   security rules allow unauthenticated access to `orders`
//!
//! They write real documents and are ignored by default.
//! Run with: cargo test -p comanda-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use comanda_core::{NewOrder, OrderStatus};
use comanda_integration_tests::Recorder;
use comanda_server::backend::Backend;
use comanda_server::config::FirebaseConfig;
use secrecy::SecretString;

fn firebase_from_env() -> FirebaseConfig {
    FirebaseConfig {
        project_id: std::env::var("FIREBASE_PROJECT_ID").expect("FIREBASE_PROJECT_ID not set"),
        api_key: SecretString::from(
            std::env::var("FIREBASE_API_KEY").expect("FIREBASE_API_KEY not set"),
        ),
    }
}

async fn remote_backend() -> Backend {
    Backend::remote(&firebase_from_env(), Duration::from_millis(500), false)
        .await
        .expect("remote backend unreachable")
}

#[tokio::test]
#[ignore = "requires FIREBASE_PROJECT_ID and FIREBASE_API_KEY"]
async fn test_remote_add_and_update_status() {
    let backend = remote_backend().await;
    let marker = format!("it-{}", uuid::Uuid::new_v4());

    let order = backend
        .orders
        .add(NewOrder::new(marker.clone(), vec!["Arroz".into()]).with_table("99"))
        .await
        .unwrap();
    assert!(!order.id.as_str().is_empty());

    backend
        .orders
        .update_status(&order.id, OrderStatus::Completed)
        .await
        .unwrap();

    let snapshot = backend.orders.snapshot().await.unwrap();
    let stored = snapshot.iter().find(|o| o.id == order.id).unwrap();
    assert_eq!(stored.customer_name, marker);
    assert_eq!(stored.status, OrderStatus::Completed);
}

#[tokio::test]
#[ignore = "requires FIREBASE_PROJECT_ID and FIREBASE_API_KEY"]
async fn test_remote_subscription_delivers_new_order() {
    let backend = remote_backend().await;
    let recorder = Recorder::new();
    let _sub = backend.orders.subscribe(recorder.listener());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let initial = recorder.count();
    assert!(initial >= 1);

    let order = backend
        .orders
        .add(NewOrder::new("Cliente", vec!["Feijão".into()]))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let last = recorder.last().unwrap();
    assert!(last.iter().any(|o| o.id == order.id));
}

#[tokio::test]
#[ignore = "requires FIREBASE_PROJECT_ID and FIREBASE_API_KEY"]
async fn test_remote_unknown_order_status_is_error() {
    let backend = remote_backend().await;
    let result = backend
        .orders
        .update_status(
            &comanda_core::OrderId::new(format!("missing-{}", uuid::Uuid::new_v4())),
            OrderStatus::Preparing,
        )
        .await;
    assert!(result.is_err());
}
