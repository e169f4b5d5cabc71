//! Payment reconciliation: confirm an external payment and apply its
//! effect to internal state exactly once
//!
//! Two entry points (Paystack callback, Stripe confirm) converge on
//! `reconcile`. Every step is individually idempotent, so a reconcile
//! that was interrupted or redelivered retries to completion without
//! double-applying any leg. Failures are never retried from this layer;
//! correctness relies on the gateway redelivering and on the store's
//! idempotency guards.

use gateway_verifier::{GatewayVerifier, PaymentIntent, PaymentStatus, VerifyError};
use uuid::Uuid;

use crate::models::{Order, OrderStatus, Wallet};
use crate::services::{order_service, wallet_service};
use crate::store::{LedgerError, LedgerStore};

/// Errors surfaced by a reconciliation attempt
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The gateway reports the payment did not succeed; terminal — the
    /// client must re-initiate with a fresh reference
    #[error("payment {reference} was not successful (gateway status: {status:?})")]
    PaymentNotSuccessful {
        reference: String,
        status: PaymentStatus,
    },

    /// Verification metadata did not resolve to a user
    #[error("payment {reference} metadata does not resolve to a user")]
    UnresolvableUser { reference: String },

    #[error("gateway verification failed: {0}")]
    Gateway(#[from] VerifyError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Successful reconciliation result
///
/// `AlreadyCredited` / `AlreadySettled` mean an idempotency guard fired:
/// the event had been applied before and nothing changed on this call.
/// Callers (and tests asserting exactly-once behavior) can tell the two
/// apart from fresh applications.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    WalletCredited(Wallet),
    WalletAlreadyCredited(Wallet),
    OrderSettled(Order),
    OrderAlreadySettled(Order),
}

impl ReconcileOutcome {
    pub fn is_already_processed(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::WalletAlreadyCredited(_) | ReconcileOutcome::OrderAlreadySettled(_)
        )
    }
}

/// Reconcile one gateway event against the wallet ledger and order state.
///
/// 1. Verify the payment with the gateway; anything but `Success` is
///    terminal.
/// 2. Resolve the typed intent from verification metadata.
/// 3. Wallet top-up: a single reference-guarded credit.
/// 4. Order settlement: route the money through the wallet — credit the
///    verified amount, debit the order amount, then mark the order paid.
///    The credit and debit use derived references (`{ref}:credit`,
///    `{ref}:debit`) so a replay can never have one leg's idempotency
///    guard swallow the other.
pub async fn reconcile(
    store: &dyn LedgerStore,
    verifier: &dyn GatewayVerifier,
    reference: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let payment = verifier.verify(reference).await?;

    if !payment.status.is_success() {
        tracing::warn!(
            reference,
            gateway = verifier.gateway(),
            status = ?payment.status,
            "payment not successful; nothing applied"
        );
        return Err(ReconcileError::PaymentNotSuccessful {
            reference: payment.reference,
            status: payment.status,
        });
    }

    let intent = payment
        .intent
        .clone()
        .ok_or_else(|| ReconcileError::UnresolvableUser {
            reference: payment.reference.clone(),
        })?;

    match intent {
        PaymentIntent::WalletTopUp { user_id } => {
            reconcile_wallet_top_up(store, verifier, user_id, payment.amount_minor, &payment.reference)
                .await
        }
        PaymentIntent::OrderSettlement { user_id, order_id } => {
            reconcile_order_settlement(
                store,
                verifier,
                user_id,
                order_id,
                payment.amount_minor,
                &payment.reference,
            )
            .await
        }
    }
}

async fn reconcile_wallet_top_up(
    store: &dyn LedgerStore,
    verifier: &dyn GatewayVerifier,
    user_id: Uuid,
    amount_minor: i64,
    reference: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let description = format!("wallet top-up via {}", verifier.gateway());
    let apply = wallet_service::credit(store, user_id, amount_minor, reference, &description).await?;

    if apply.outcome.is_duplicate() {
        Ok(ReconcileOutcome::WalletAlreadyCredited(apply.wallet))
    } else {
        Ok(ReconcileOutcome::WalletCredited(apply.wallet))
    }
}

async fn reconcile_order_settlement(
    store: &dyn LedgerStore,
    verifier: &dyn GatewayVerifier,
    user_id: Uuid,
    order_id: Uuid,
    amount_minor: i64,
    reference: &str,
) -> Result<ReconcileOutcome, ReconcileError> {
    let order = order_service::get_order(store, order_id)
        .await?
        .ok_or(LedgerError::OrderNotFound(order_id))?;

    if order.status == OrderStatus::Paid {
        tracing::info!(reference, order_id = %order_id, "order already settled");
        return Ok(ReconcileOutcome::OrderAlreadySettled(order));
    }

    // Route the external payment through the wallet so it shows up in
    // transaction history exactly once: fund the wallet with the verified
    // amount, then settle the order against it.
    let gateway = verifier.gateway();
    wallet_service::credit(
        store,
        user_id,
        amount_minor,
        &format!("{reference}:credit"),
        &format!("order {order_id} payment received via {gateway}"),
    )
    .await?;

    wallet_service::debit(
        store,
        user_id,
        order.amount_minor,
        &format!("{reference}:debit"),
        &format!("order {order_id} settlement"),
    )
    .await?;

    let transition = order_service::mark_paid(store, order_id).await?;
    tracing::info!(
        reference,
        order_id = %order_id,
        gateway,
        newly_settled = transition.transitioned,
        "order settlement reconciled"
    );

    if transition.transitioned {
        Ok(ReconcileOutcome::OrderSettled(transition.order))
    } else {
        Ok(ReconcileOutcome::OrderAlreadySettled(transition.order))
    }
}
