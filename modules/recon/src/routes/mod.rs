//! HTTP surface: gateway callbacks, wallet and order endpoints

pub mod health;
pub mod orders;
pub mod reconcile;
pub mod wallets;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use gateway_verifier::GatewayVerifier;
use serde::Serialize;
use std::sync::Arc;

use crate::store::{LedgerError, LedgerStore};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub paystack: Arc<dyn GatewayVerifier>,
    pub stripe: Arc<dyn GatewayVerifier>,
}

/// Assemble the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/payments/reconcile", get(reconcile::reconcile_paystack))
        .route("/api/payments/confirm", get(reconcile::confirm_stripe))
        .route("/api/wallets", post(wallets::provision_wallet))
        .route("/api/wallets/{owner_id}", get(wallets::get_wallet))
        .route(
            "/api/wallets/{owner_id}/transactions/{reference}",
            get(wallets::get_transaction),
        )
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/{order_id}", get(orders::get_order))
        .route("/api/orders/{order_id}/purchase", post(orders::begin_purchase))
        .with_state(state)
}

/// JSON error body shared by all endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error wrapper for proper HTTP error handling
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.error.to_string(),
        });
        (self.status, body).into_response()
    }
}

/// Map store failures onto the response-code contract
pub(crate) fn ledger_error_response(err: LedgerError) -> ApiError {
    match err {
        LedgerError::InvalidAmount(_) => ApiError::new(StatusCode::BAD_REQUEST, "invalid_amount"),
        LedgerError::InsufficientFunds { .. } => {
            ApiError::new(StatusCode::BAD_REQUEST, "insufficient_funds")
        }
        LedgerError::WalletNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "wallet_not_found"),
        LedgerError::OrderNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "order_not_found"),
        LedgerError::DuplicateOrder { .. } => {
            ApiError::new(StatusCode::CONFLICT, "duplicate_order")
        }
        LedgerError::Database(e) => {
            tracing::error!(error = %e, "database error");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    }
}
