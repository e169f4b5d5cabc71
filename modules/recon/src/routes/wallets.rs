//! Wallet endpoints: provisioning, balance/history, reference lookup

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::models::{ProvisionWalletRequest, Transaction, Wallet};
use crate::routes::{ledger_error_response, ApiError, AppState};
use crate::services::wallet_service;

/// Handler for POST /api/wallets
///
/// Account-verification hook: provisions the user's wallet. Idempotent.
pub async fn provision_wallet(
    State(state): State<AppState>,
    Json(body): Json<ProvisionWalletRequest>,
) -> Result<(StatusCode, Json<Wallet>), ApiError> {
    let wallet = wallet_service::provision_wallet(state.store.as_ref(), body.owner_id)
        .await
        .map_err(ledger_error_response)?;

    Ok((StatusCode::CREATED, Json(wallet)))
}

/// Handler for GET /api/wallets/{owner_id}
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
) -> Result<Json<Wallet>, ApiError> {
    let wallet = wallet_service::get_wallet(state.store.as_ref(), owner_id)
        .await
        .map_err(ledger_error_response)?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "wallet_not_found"))?;

    Ok(Json(wallet))
}

/// Handler for GET /api/wallets/{owner_id}/transactions/{reference}
///
/// Support lookup: resolves an idempotency reference to the ledger entry
/// it produced.
pub async fn get_transaction(
    State(state): State<AppState>,
    Path((owner_id, reference)): Path<(Uuid, String)>,
) -> Result<Json<Transaction>, ApiError> {
    let txn =
        wallet_service::get_transaction_by_reference(state.store.as_ref(), owner_id, &reference)
            .await
            .map_err(ledger_error_response)?
            .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "transaction_not_found"))?;

    Ok(Json(txn))
}
