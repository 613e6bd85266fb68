//! HTTP handlers over an in-memory local backend.
//!
//! Requests go straight into the router with `tower::ServiceExt::oneshot`;
//! no socket is opened.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use comanda_server::storage::MemoryStore;
use comanda_server::{app, state::AppState};
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_app() -> Router {
    app(AppState::local(Arc::new(MemoryStore::new())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

// ============================================================================
// Health and status
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = send(&app, Method::GET, "/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_status_reports_local_mode() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "local");
    assert!(body["banner"].as_str().unwrap().starts_with("Modo Offline"));
    assert_eq!(body["extractionEnabled"], false);
    assert_eq!(body["signedIn"], false);
}

#[tokio::test]
async fn test_backend_override_roundtrip() {
    let app = test_app();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/backend",
        Some(json!({"projectId": " ", "apiKey": "k"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/backend",
        Some(json!({"projectId": "comanda-prod", "apiKey": "AIzaTestKey"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restartRequired"], true);

    let (status, _) = send(&app, Method::DELETE, "/api/backend", None).await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_place_and_list_orders() {
    let app = test_app();

    let (status, order) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({"items": [" Arroz ", "", "Feijão"], "tableName": "5"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["items"], json!(["Arroz", "Feijão"]));
    assert_eq!(order["tableName"], "5");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["customerName"], "Cliente");

    let (status, list) = send(&app, Method::GET, "/api/orders?q=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], order["id"]);
}

#[tokio::test]
async fn test_waiter_order_default_name() {
    let app = test_app();
    let (_, order) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({"items": ["Pudim"], "waiter": true})),
    )
    .await;
    assert_eq!(order["customerName"], "Garçom");
}

#[tokio::test]
async fn test_empty_order_rejected() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({"items": ["  "]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "O pedido está vazio! Selecione pelo menos um item."
    );
}

#[tokio::test]
async fn test_status_update_moves_order_on_board() {
    let app = test_app();
    let (_, order) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({"items": ["Arroz"]})),
    )
    .await;
    let id = order["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/orders/{id}/status"),
        Some(json!({"status": "preparing"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, board) = send(&app, Method::GET, "/api/orders/board", None).await;
    assert_eq!(board["pending"].as_array().unwrap().len(), 0);
    assert_eq!(board["preparing"][0]["id"], id);
    assert_eq!(board["activeCount"], 1);

    let (_, preparing) = send(&app, Method::GET, "/api/orders?status=preparing", None).await;
    assert_eq!(preparing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_summary_and_board_limit() {
    let app = test_app();
    for n in 0..12 {
        let (_, order) = send(
            &app,
            Method::POST,
            "/api/orders",
            Some(json!({"items": ["Arroz"], "customerName": format!("Mesa {n}")})),
        )
        .await;
        let id = order["id"].as_str().unwrap();
        send(
            &app,
            Method::PATCH,
            &format!("/api/orders/{id}/status"),
            Some(json!({"status": "completed"})),
        )
        .await;
    }
    send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({"items": ["Feijão"], "customerName": "Ana"})),
    )
    .await;

    let (status, summary) = send(&app, Method::GET, "/api/orders/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary, json!({"totalOrders": 13, "completedCount": 12}));

    let (_, filtered) = send(&app, Method::GET, "/api/orders/summary?q=ana", None).await;
    assert_eq!(filtered, json!({"totalOrders": 1, "completedCount": 0}));

    let (_, board) = send(&app, Method::GET, "/api/orders/board", None).await;
    assert_eq!(board["completed"].as_array().unwrap().len(), 10);
    assert_eq!(board["activeCount"], 1);
}

#[tokio::test]
async fn test_order_stream_sends_current_snapshot() {
    use futures::StreamExt;

    let app = test_app();
    send(
        &app,
        Method::POST,
        "/api/orders",
        Some(json!({"items": ["Arroz"]})),
    )
    .await;

    let request = Request::builder()
        .uri("/api/orders/stream")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();
    let frame = body.next().await.unwrap().unwrap();
    let text = String::from_utf8_lossy(&frame);
    assert!(text.contains("event: orders"));
    assert!(text.contains("\"Arroz\""));
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_user_profile_routes() {
    let app = test_app();

    let (status, _) = send(&app, Method::GET, "/api/users/u1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, profile) = send(
        &app,
        Method::PUT,
        "/api/users/u1",
        Some(json!({"email": "ana@example.com", "displayName": "Ana"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["role"], "customer");

    let (status, roster) = send(
        &app,
        Method::PATCH,
        "/api/users/u1/role",
        Some(json!({"role": "kitchen"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roster[0]["role"], "kitchen");

    let (_, found) = send(&app, Method::GET, "/api/users?q=ANA", None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    let (_, none) = send(&app, Method::GET, "/api/users?q=bruno", None).await;
    assert_eq!(none.as_array().unwrap().len(), 0);
}

// ============================================================================
// Menu, desserts and links
// ============================================================================

#[tokio::test]
async fn test_menu_replace_normalizes_phone() {
    let app = test_app();
    let (_, mut menu) = send(&app, Method::GET, "/api/menu", None).await;
    menu["phone"] = json!("(62) 99999-0000");
    menu["items"] = json!(["Lasanha"]);

    let (status, saved) = send(&app, Method::PUT, "/api/menu", Some(menu)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["phone"], "62999990000");

    let (_, current) = send(&app, Method::GET, "/api/menu", None).await;
    assert_eq!(current["items"], json!(["Lasanha"]));
}

#[tokio::test]
async fn test_extract_unavailable_without_model() {
    let app = test_app();
    let boundary = "comanda-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"menu.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\u{ff}\u{d8}\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/menu/extract")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_dessert_edit_and_link() {
    let app = test_app();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/desserts/99",
        Some(json!({"title": "Tortas", "items": []})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, categories) = send(
        &app,
        Method::PUT,
        "/api/desserts/3",
        Some(json!({"title": "Pudim", "items": ["Leite condensado"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(categories[3]["items"], json!(["Leite condensado"]));

    let (status, link) = send(
        &app,
        Method::POST,
        "/api/links/dessert",
        Some(json!({"picks": [{"category": 3, "item": 0}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        link["message"]
            .as_str()
            .unwrap()
            .contains("Pudim: Leite condensado")
    );

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/links/dessert",
        Some(json!({"picks": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_order_and_share_links() {
    let app = test_app();

    let (status, link) = send(
        &app,
        Method::POST,
        "/api/links/order",
        Some(json!({"items": ["Arroz", "Feijão"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = link["url"].as_str().unwrap();
    assert!(url.starts_with("https://wa.me/5562981025023?text="));
    assert!(link["message"].as_str().unwrap().contains("✅ Arroz"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/links/order",
        Some(json!({"items": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, share) = send(&app, Method::GET, "/api/links/share", None).await;
    assert!(
        share["text"]
            .as_str()
            .unwrap()
            .starts_with("*Comanda Restaurante - Almoço de Hoje*")
    );
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_auth_in_local_mode() {
    let app = test_app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        Some(json!({"email": "ana@example.com", "password": "segredo"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, session) = send(&app, Method::GET, "/api/auth/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session, Value::Null);

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
