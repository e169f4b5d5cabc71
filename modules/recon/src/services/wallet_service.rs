//! Wallet ledger operations
//!
//! Thin orchestration over the store: the store enforces the guards, this
//! layer adds structured logging so every balance movement is traceable
//! by reference.

use uuid::Uuid;

use crate::store::{LedgerApply, LedgerResult, LedgerStore};
use crate::models::{Transaction, Wallet};

/// Provision a wallet for a newly verified account (idempotent)
pub async fn provision_wallet(store: &dyn LedgerStore, owner_id: Uuid) -> LedgerResult<Wallet> {
    let wallet = store.create_wallet(owner_id).await?;
    tracing::info!(owner_id = %owner_id, wallet_id = %wallet.id, "wallet provisioned");
    Ok(wallet)
}

/// Credit a wallet, guarded by reference uniqueness
pub async fn credit(
    store: &dyn LedgerStore,
    owner_id: Uuid,
    amount_minor: i64,
    reference: &str,
    description: &str,
) -> LedgerResult<LedgerApply> {
    let apply = store
        .apply_credit(owner_id, amount_minor, reference, description)
        .await?;

    if apply.outcome.is_duplicate() {
        tracing::info!(
            owner_id = %owner_id,
            reference,
            "credit skipped: reference already applied"
        );
    } else {
        tracing::info!(
            owner_id = %owner_id,
            reference,
            amount_minor,
            balance_minor = apply.wallet.balance_minor,
            "wallet credited"
        );
    }

    Ok(apply)
}

/// Debit a wallet, guarded by reference uniqueness and balance sufficiency
pub async fn debit(
    store: &dyn LedgerStore,
    owner_id: Uuid,
    amount_minor: i64,
    reference: &str,
    description: &str,
) -> LedgerResult<LedgerApply> {
    let apply = store
        .apply_debit(owner_id, amount_minor, reference, description)
        .await?;

    if apply.outcome.is_duplicate() {
        tracing::info!(
            owner_id = %owner_id,
            reference,
            "debit skipped: reference already applied"
        );
    } else {
        tracing::info!(
            owner_id = %owner_id,
            reference,
            amount_minor,
            balance_minor = apply.wallet.balance_minor,
            "wallet debited"
        );
    }

    Ok(apply)
}

/// Fetch a wallet with its transaction history
pub async fn get_wallet(store: &dyn LedgerStore, owner_id: Uuid) -> LedgerResult<Option<Wallet>> {
    store.find_wallet(owner_id).await
}

/// Look a ledger entry up by its idempotency reference
pub async fn get_transaction_by_reference(
    store: &dyn LedgerStore,
    owner_id: Uuid,
    reference: &str,
) -> LedgerResult<Option<Transaction>> {
    store.find_transaction(owner_id, reference).await
}
