//! Remote order subscriptions against a scripted local Firestore stand-in.
//!
//! Each test serves `:runQuery` from an axum listener on 127.0.0.1 and
//! points the client at it with `FirestoreClient::with_base_url`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use comanda_integration_tests::Recorder;
use comanda_server::config::FirebaseConfig;
use comanda_server::firestore::FirestoreClient;
use comanda_server::sync::{OrderSync, RemoteOrders};
use secrecy::SecretString;
use serde_json::{Value, json};

const POLL: Duration = Duration::from_millis(50);

/// Replies to every request with the next scripted result; the last entry
/// repeats. `None` answers 500.
struct ScriptedFirestore {
    script: Vec<Option<Value>>,
    hits: AtomicUsize,
    last_body: Mutex<Option<Value>>,
}

impl ScriptedFirestore {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn answer(State(fake): State<Arc<ScriptedFirestore>>, body: String) -> Response {
    let hit = fake.hits.fetch_add(1, Ordering::SeqCst);
    *fake.last_body.lock().unwrap() = serde_json::from_str(&body).ok();

    let step = fake.script.get(hit).or_else(|| fake.script.last()).cloned().flatten();
    match step {
        Some(rows) => axum::Json(rows).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({
                "error": {"code": 500, "message": "backend unavailable", "status": "INTERNAL"}
            })),
        )
            .into_response(),
    }
}

async fn serve(script: Vec<Option<Value>>) -> (Arc<ScriptedFirestore>, OrderSync) {
    let fake = Arc::new(ScriptedFirestore {
        script,
        hits: AtomicUsize::new(0),
        last_body: Mutex::new(None),
    });
    let app = Router::new().fallback(answer).with_state(Arc::clone(&fake));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = FirebaseConfig {
        project_id: "comanda-test".to_owned(),
        api_key: SecretString::from("test-key".to_owned()),
    };
    let client = FirestoreClient::with_base_url(&config, &format!("http://{addr}")).unwrap();
    (fake, OrderSync::Remote(RemoteOrders::new(client, POLL)))
}

fn order_row(id: &str, customer: &str, timestamp: &str) -> Value {
    json!({
        "document": {
            "name": format!("projects/comanda-test/databases/(default)/documents/orders/{id}"),
            "fields": {
                "customerName": {"stringValue": customer},
                "items": {"arrayValue": {"values": [{"stringValue": "Arroz"}]}},
                "timestamp": {"timestampValue": timestamp},
                "status": {"stringValue": "pending"}
            },
            "createTime": timestamp,
            "updateTime": timestamp
        },
        "readTime": timestamp
    })
}

async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_unchanged_results_delivered_once_and_error_stops_polling() {
    let rows = json!([order_row("a1", "Ana", "2024-05-01T12:00:00Z")]);
    let (fake, orders) = serve(vec![Some(rows.clone()), Some(rows.clone()), Some(rows), None]).await;

    let recorder = Recorder::new();
    let _sub = orders.subscribe(recorder.listener());

    wait_until(|| fake.hits() >= 4).await;
    tokio::time::sleep(POLL * 6).await;

    // Polling ended at the failed query
    assert_eq!(fake.hits(), 4);
    assert_eq!(recorder.count(), 1);
    let last = recorder.last().unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].id.as_str(), "a1");
    assert_eq!(last[0].customer_name, "Ana");

    let body = fake.last_body.lock().unwrap().clone().unwrap();
    let order_by = &body["structuredQuery"]["orderBy"][0];
    assert_eq!(order_by["field"]["fieldPath"], "timestamp");
    assert_eq!(order_by["direction"], "DESCENDING");
}

#[tokio::test]
async fn test_changed_results_delivered_again() {
    let first = json!([order_row("a1", "Ana", "2024-05-01T12:00:00Z")]);
    let second = json!([
        order_row("b2", "Bruno", "2024-05-01T12:05:00Z"),
        order_row("a1", "Ana", "2024-05-01T12:00:00Z")
    ]);
    let (fake, orders) = serve(vec![
        Some(first.clone()),
        Some(first),
        Some(second.clone()),
        Some(second),
        None,
    ])
    .await;

    let recorder = Recorder::new();
    let _sub = orders.subscribe(recorder.listener());

    wait_until(|| fake.hits() >= 5).await;

    assert_eq!(recorder.count(), 2);
    let last = recorder.last().unwrap();
    assert_eq!(last.len(), 2);
    assert_eq!(last[0].id.as_str(), "b2");
}

#[tokio::test]
async fn test_dropping_subscription_stops_polling() {
    let rows = json!([order_row("a1", "Ana", "2024-05-01T12:00:00Z")]);
    let (fake, orders) = serve(vec![Some(rows)]).await;

    let recorder = Recorder::new();
    let sub = orders.subscribe(recorder.listener());
    wait_until(|| fake.hits() >= 2).await;

    sub.unsubscribe();
    // Let any request already in flight land
    tokio::time::sleep(POLL * 2).await;
    let settled = fake.hits();
    tokio::time::sleep(POLL * 6).await;

    assert_eq!(fake.hits(), settled);
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn test_snapshot_skips_malformed_documents() {
    let mut broken = order_row("bad", "Zé", "2024-05-01T12:00:00Z");
    broken["document"]["fields"]
        .as_object_mut()
        .unwrap()
        .remove("timestamp");
    let rows = json!([order_row("a1", "Ana", "2024-05-01T12:00:00Z"), broken]);
    let (_fake, orders) = serve(vec![Some(rows)]).await;

    let snapshot = orders.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id.as_str(), "a1");
}
