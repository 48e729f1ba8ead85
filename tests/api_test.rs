//! HTTP surface tests.
//!
//! Drives the axum router in-process against the in-memory store.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use transfer_ledger::{MemoryStore, handlers};

fn app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    (handlers::router(store.clone()), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn create(app: &Router, id: i64, currency: &str, balance: i64) {
    let (status, _) = send(
        app,
        post(
            "/api/v1/accounts",
            json!({ "id": id, "currency": currency, "balance": balance }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_reports_connected() {
    let (app, _) = app();

    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn create_and_fetch_account() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        post(
            "/api/v1/accounts",
            json!({ "id": 7, "currency": "EUR", "balance": 250 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["balance"], 250);

    let (status, body) = send(&app, get("/api/v1/accounts/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "EUR");
}

#[tokio::test]
async fn balance_defaults_to_zero() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        post("/api/v1/accounts", json!({ "id": 1, "currency": "USD" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 0);
}

#[tokio::test]
async fn account_creation_errors() {
    let (app, _) = app();
    create(&app, 1, "USD", 10).await;

    let (status, body) = send(
        &app,
        post("/api/v1/accounts", json!({ "id": 1, "currency": "USD" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "constraint_violation");

    let (status, _) = send(
        &app,
        post(
            "/api/v1/accounts",
            json!({ "id": 2, "currency": "USD", "balance": -5 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        post("/api/v1/accounts", json!({ "id": 3, "currency": "XYZ" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_request");

    let (status, _) = send(
        &app,
        post("/api/v1/accounts", json!({ "id": 0, "currency": "USD" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post("/api/v1/accounts", json!({ "currency": "USD" }))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn get_account_errors() {
    let (app, _) = app();

    let (status, body) = send(&app, get("/api/v1/accounts/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = send(&app, get("/api/v1/accounts/0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/v1/accounts/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_accounts_pages_in_id_order() {
    let (app, _) = app();
    for id in (1..=12).rev() {
        create(&app, id, "USD", 0).await;
    }

    let (status, body) = send(&app, get("/api/v1/accounts?page_id=2&page_size=5")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![6, 7, 8, 9, 10]);

    let (_, body) = send(&app, get("/api/v1/accounts?page_id=3&page_size=5")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, get("/api/v1/accounts?page_id=9&page_size=10")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn list_accounts_rejects_bad_pages() {
    let (app, _) = app();

    for uri in [
        "/api/v1/accounts?page_id=0&page_size=5",
        "/api/v1/accounts?page_id=1&page_size=4",
        "/api/v1/accounts?page_id=1&page_size=11",
        "/api/v1/accounts?page_id=1",
        "/api/v1/accounts?page_id=x&page_size=5",
    ] {
        let (status, _) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn transfer_moves_money() {
    let (app, store) = app();
    create(&app, 1, "USD", 1000).await;
    create(&app, 2, "USD", 500).await;

    let (status, body) = send(
        &app,
        post(
            "/api/v1/transfers",
            json!({ "from_account_id": 1, "to_account_id": 2, "amount": 10, "currency": "USD" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_account"]["balance"], 990);
    assert_eq!(body["to_account"]["balance"], 510);
    assert_eq!(body["transaction"]["amount"], 10);

    let id = body["transaction"]["id"].as_i64().unwrap();
    let (status, record) = send(&app, get(&format!("/api/v1/transactions/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["source_account_id"], 1);
    assert_eq!(record["destination_account_id"], 2);
    assert_eq!(store.committed_transactions().len(), 1);
}

#[tokio::test]
async fn transfer_errors_map_to_status_codes() {
    let (app, store) = app();
    create(&app, 1, "USD", 5).await;
    create(&app, 2, "USD", 0).await;
    create(&app, 3, "EUR", 100).await;

    let transfer = |from: i64, to: i64, amount: i64, currency: &str| {
        post(
            "/api/v1/transfers",
            json!({
                "from_account_id": from,
                "to_account_id": to,
                "amount": amount,
                "currency": currency,
            }),
        )
    };

    // Insufficient funds.
    let (status, body) = send(&app, transfer(1, 2, 10, "USD")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "balance cannot be negative");

    // Same account reaches the ledger and is rejected there.
    let (status, _) = send(&app, transfer(1, 1, 1, "USD")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, transfer(1, 2, 0, "USD")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, transfer(0, 2, 1, "USD")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, transfer(1, 3, 1, "USD")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, transfer(1, 2, 1, "XYZ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, transfer(1, 42, 1, "USD")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert!(store.committed_transactions().is_empty());
}

#[tokio::test]
async fn unavailable_store_is_503() {
    let (app, store) = app();
    create(&app, 1, "USD", 100).await;
    create(&app, 2, "USD", 0).await;

    // Reads run in a unit of work too, so a failed commit surfaces on them.
    store.fail_next_commit();
    let (status, _) = send(&app, get("/api/v1/accounts/1")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    store.fail_next_begin();
    let (status, body) = send(
        &app,
        post(
            "/api/v1/transfers",
            json!({ "from_account_id": 1, "to_account_id": 2, "amount": 10, "currency": "USD" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "service_unavailable");
    assert!(store.committed_transactions().is_empty());
}

#[tokio::test]
async fn unknown_transaction_is_404() {
    let (app, _) = app();

    let (status, _) = send(&app, get("/api/v1/transactions/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
