//! Boundary tests: HTTP -> router -> services -> store
//!
//! Exercises the real ingress surface (status codes, JSON shapes, error
//! contract) against the in-memory store and mock verifier.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gateway_verifier::{MockVerifier, PaymentIntent, VerifiedPayment};
use recon_rs::store::{InMemoryStore, LedgerStore};
use recon_rs::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    app: Router,
    store: InMemoryStore,
    verifier: MockVerifier,
}

fn test_app() -> TestApp {
    let store = InMemoryStore::new();
    let verifier = MockVerifier::new();

    let state = AppState {
        store: Arc::new(store.clone()),
        paystack: Arc::new(verifier.clone()),
        stripe: Arc::new(verifier.clone()),
    };

    TestApp {
        app: router(state),
        store,
        verifier,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let t = test_app();
    let (status, body) = get(&t.app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "recon");
}

#[tokio::test]
async fn test_reconcile_missing_reference() {
    let t = test_app();
    let (status, body) = get(&t.app, "/api/payments/reconcile").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_reference");
}

#[tokio::test]
async fn test_reconcile_wallet_top_up_then_replay() {
    let t = test_app();
    let user = Uuid::new_v4();
    t.store.create_wallet(user).await.unwrap();
    t.verifier.register(VerifiedPayment::succeeded(
        "ps-001",
        5000,
        PaymentIntent::WalletTopUp { user_id: user },
    ));

    let (status, body) = get(&t.app, "/api/payments/reconcile?reference=ps-001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "credited");
    assert_eq!(body["balance_minor"], 5000);

    let (status, body) = get(&t.app, "/api/payments/reconcile?reference=ps-001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already_processed");
    assert_eq!(body["balance_minor"], 5000);
}

#[tokio::test]
async fn test_confirm_settles_order_via_session() {
    let t = test_app();
    let user = Uuid::new_v4();
    t.store.create_wallet(user).await.unwrap();
    let order = t
        .store
        .create_order(user, Uuid::new_v4(), 15000)
        .await
        .unwrap();

    t.verifier.register_session("cs_test_1", "pi_abc");
    t.verifier.register(VerifiedPayment::succeeded(
        "pi_abc",
        15000,
        PaymentIntent::OrderSettlement {
            user_id: user,
            order_id: order.id,
        },
    ));

    let (status, body) = get(&t.app, "/api/payments/confirm?session_id=cs_test_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");
    assert_eq!(body["order_id"], json!(order.id));

    // Redirect and webhook both firing: second confirm is a safe no-op
    let (status, body) = get(&t.app, "/api/payments/confirm?session_id=cs_test_1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already_processed");
}

#[tokio::test]
async fn test_reconcile_failed_payment() {
    let t = test_app();
    t.verifier
        .register(VerifiedPayment::failed("ps-bad", 2000));

    let (status, body) = get(&t.app, "/api/payments/reconcile?reference=ps-bad").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "payment_not_successful");
}

#[tokio::test]
async fn test_reconcile_unknown_order() {
    let t = test_app();
    let user = Uuid::new_v4();
    t.store.create_wallet(user).await.unwrap();
    t.verifier.register(VerifiedPayment::succeeded(
        "ps-ghost",
        2000,
        PaymentIntent::OrderSettlement {
            user_id: user,
            order_id: Uuid::new_v4(),
        },
    ));

    let (status, body) = get(&t.app, "/api/payments/reconcile?reference=ps-ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "order_not_found");
}

#[tokio::test]
async fn test_wallet_provision_and_lookup() {
    let t = test_app();
    let owner = Uuid::new_v4();

    let (status, body) = post_json(&t.app, "/api/wallets", json!({"owner_id": owner})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["balance_minor"], 0);

    let (status, body) = get(&t.app, &format!("/api/wallets/{owner}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["owner_id"], json!(owner));

    let (status, body) = get(&t.app, &format!("/api/wallets/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "wallet_not_found");
}

#[tokio::test]
async fn test_transaction_lookup_by_reference() {
    let t = test_app();
    let owner = Uuid::new_v4();
    t.store.create_wallet(owner).await.unwrap();
    t.store
        .apply_credit(owner, 700, "ps-ref-1", "top-up")
        .await
        .unwrap();

    let (status, body) = get(
        &t.app,
        &format!("/api/wallets/{owner}/transactions/ps-ref-1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount_minor"], 700);
    assert_eq!(body["txn_type"], "credit");

    let (status, body) = get(
        &t.app,
        &format!("/api/wallets/{owner}/transactions/ps-missing"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "transaction_not_found");
}

#[tokio::test]
async fn test_order_create_conflict_and_purchase() {
    let t = test_app();
    let user = Uuid::new_v4();
    let cart = Uuid::new_v4();
    let payload = json!({"user_id": user, "cart_id": cart, "amount_minor": 12000});

    let (status, body) = post_json(&t.app, "/api/orders", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    let order_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = post_json(&t.app, "/api/orders", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "duplicate_order");

    let (status, body) = post_json(
        &t.app,
        &format!("/api/orders/{order_id}/purchase"),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "initiated");

    let (status, body) = post_json(
        &t.app,
        &format!("/api/orders/{order_id}/purchase"),
        Value::Null,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already_processed");
    assert_eq!(body["order"]["status"], "initiated");
}

#[tokio::test]
async fn test_order_create_rejects_bad_amount() {
    let t = test_app();
    let (status, body) = post_json(
        &t.app,
        "/api/orders",
        json!({"user_id": Uuid::new_v4(), "cart_id": Uuid::new_v4(), "amount_minor": -5}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_amount");
}
