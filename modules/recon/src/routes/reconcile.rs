//! Gateway callback endpoints
//!
//! Two external triggers converge on identical reconciliation semantics:
//! - `GET /api/payments/reconcile?reference=<ref>` — Paystack-style
//!   callback carrying the transaction reference
//! - `GET /api/payments/confirm?session_id=<id>` — Stripe-style
//!   confirmation carrying an opaque session id, resolved internally to a
//!   payment reference

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use gateway_verifier::{GatewayVerifier, VerifyError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::routes::{ApiError, AppState};
use crate::services::reconciliation::{self, ReconcileError, ReconcileOutcome};
use crate::store::LedgerError;

#[derive(Debug, Deserialize)]
pub struct ReconcileQuery {
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmQuery {
    pub session_id: Option<String>,
}

/// Callback/redirect response
#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub status: &'static str,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_minor: Option<i64>,
}

/// Handler for GET /api/payments/reconcile (gateway A)
pub async fn reconcile_paystack(
    State(state): State<AppState>,
    Query(params): Query<ReconcileQuery>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let reference = params
        .reference
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "missing_reference"))?;

    run_reconcile(&state, state.paystack.clone(), &reference).await
}

/// Handler for GET /api/payments/confirm (gateway B)
pub async fn confirm_stripe(
    State(state): State<AppState>,
    Query(params): Query<ConfirmQuery>,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let session_id = params
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "missing_reference"))?;

    let reference = state
        .stripe
        .resolve_session(&session_id)
        .await
        .map_err(verify_error_response)?;

    run_reconcile(&state, state.stripe.clone(), &reference).await
}

async fn run_reconcile(
    state: &AppState,
    verifier: Arc<dyn GatewayVerifier>,
    reference: &str,
) -> Result<Json<ReconcileResponse>, ApiError> {
    let outcome = reconciliation::reconcile(state.store.as_ref(), verifier.as_ref(), reference)
        .await
        .map_err(reconcile_error_response)?;

    let response = match outcome {
        ReconcileOutcome::WalletCredited(wallet) => ReconcileResponse {
            status: "credited",
            reference: reference.to_string(),
            order_id: None,
            balance_minor: Some(wallet.balance_minor),
        },
        ReconcileOutcome::WalletAlreadyCredited(wallet) => ReconcileResponse {
            status: "already_processed",
            reference: reference.to_string(),
            order_id: None,
            balance_minor: Some(wallet.balance_minor),
        },
        ReconcileOutcome::OrderSettled(order) => ReconcileResponse {
            status: "paid",
            reference: reference.to_string(),
            order_id: Some(order.id),
            balance_minor: None,
        },
        ReconcileOutcome::OrderAlreadySettled(order) => ReconcileResponse {
            status: "already_processed",
            reference: reference.to_string(),
            order_id: Some(order.id),
            balance_minor: None,
        },
    };

    Ok(Json(response))
}

/// Map reconciliation failures onto the response-code contract.
///
/// Nothing is retried here: gateway redelivery plus the store's
/// idempotency guards make re-processing safe.
fn reconcile_error_response(err: ReconcileError) -> ApiError {
    match err {
        ReconcileError::PaymentNotSuccessful { reference, status } => {
            tracing::warn!(reference, ?status, "reconciliation rejected: payment not successful");
            ApiError::new(StatusCode::BAD_REQUEST, "payment_not_successful")
        }
        ReconcileError::UnresolvableUser { reference } => {
            tracing::error!(reference, "reconciliation rejected: unresolvable user");
            ApiError::new(StatusCode::BAD_REQUEST, "unresolvable_user")
        }
        ReconcileError::Gateway(e) => verify_error_response(e),
        ReconcileError::Ledger(LedgerError::OrderNotFound(order_id)) => {
            tracing::error!(%order_id, "reconciliation rejected: order not found");
            ApiError::new(StatusCode::NOT_FOUND, "order_not_found")
        }
        ReconcileError::Ledger(LedgerError::WalletNotFound(owner_id)) => {
            tracing::error!(%owner_id, "reconciliation rejected: wallet not found");
            ApiError::new(StatusCode::NOT_FOUND, "wallet_not_found")
        }
        ReconcileError::Ledger(e) => {
            tracing::error!(error = %e, "reconciliation failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    }
}

fn verify_error_response(err: VerifyError) -> ApiError {
    match err {
        // A reference the gateway never issued cannot attest a
        // successful payment
        VerifyError::UnknownReference(reference) => {
            tracing::warn!(reference, "gateway does not know this reference");
            ApiError::new(StatusCode::BAD_REQUEST, "payment_not_successful")
        }
        e => {
            tracing::error!(error = %e, "gateway verification error");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal")
        }
    }
}
