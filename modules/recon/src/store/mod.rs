//! Storage layer for the wallet ledger and order state machine
//!
//! The core invariants (reference uniqueness, balance sufficiency, status
//! monotonicity) are enforced *inside* the store operations, not by
//! read-then-write callers: each operation is an atomic check-and-set so
//! that two concurrent duplicate requests can never both pass a guard.
//!
//! Two implementations exist, swapped by `STORE_TYPE`:
//! - **PgStore**: production, Postgres via sqlx (unique indexes and
//!   conditional updates carry the guards)
//! - **InMemoryStore**: dev/test, one async mutex over the aggregates
//!   (the single lock gives the same linearizable semantics)

mod memory;
mod pg;

pub use memory::InMemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::{Order, Transaction, Wallet};

/// Errors that can occur during ledger and order operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("insufficient funds: balance {balance_minor} cannot cover debit of {amount_minor}")]
    InsufficientFunds {
        balance_minor: i64,
        amount_minor: i64,
    },

    #[error("no wallet exists for owner {0}")]
    WalletNotFound(Uuid),

    #[error("order {0} not found")]
    OrderNotFound(Uuid),

    #[error("an order already exists for cart {cart_id}")]
    DuplicateOrder { cart_id: Uuid },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Whether a credit/debit actually appended a transaction or hit the
/// reference-uniqueness guard
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// A new transaction was appended and the balance moved
    Applied(Transaction),
    /// A transaction with this reference already existed; nothing changed
    Duplicate(Transaction),
}

impl ApplyOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ApplyOutcome::Duplicate(_))
    }

    pub fn transaction(&self) -> &Transaction {
        match self {
            ApplyOutcome::Applied(txn) | ApplyOutcome::Duplicate(txn) => txn,
        }
    }
}

/// Result of a credit/debit: the wallet as stored after the call, plus
/// whether the idempotency guard fired
#[derive(Debug, Clone)]
pub struct LedgerApply {
    pub wallet: Wallet,
    pub outcome: ApplyOutcome,
}

/// Result of an order status compare-and-set
///
/// `transitioned == false` means the guard fired and `order` is the row
/// as it already was — a successful no-op, not an error.
#[derive(Debug, Clone)]
pub struct OrderTransition {
    pub order: Order,
    pub transitioned: bool,
}

/// Atomic persistence operations for wallets and orders
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Provision a wallet for a user (account-verification hook).
    ///
    /// Idempotent: re-calling for an existing owner returns the stored
    /// wallet unchanged.
    async fn create_wallet(&self, owner_id: Uuid) -> LedgerResult<Wallet>;

    /// Load a wallet with its full transaction history
    async fn find_wallet(&self, owner_id: Uuid) -> LedgerResult<Option<Wallet>>;

    /// Look a transaction up by its idempotency reference
    async fn find_transaction(
        &self,
        owner_id: Uuid,
        reference: &str,
    ) -> LedgerResult<Option<Transaction>>;

    /// Append a success credit and increment the balance.
    ///
    /// If a transaction with `reference` already exists on this wallet the
    /// call is a no-op returning `ApplyOutcome::Duplicate`.
    async fn apply_credit(
        &self,
        owner_id: Uuid,
        amount_minor: i64,
        reference: &str,
        description: &str,
    ) -> LedgerResult<LedgerApply>;

    /// Append a success debit and decrement the balance.
    ///
    /// Same reference-uniqueness guard as `apply_credit`; fails with
    /// `InsufficientFunds` (leaving the wallet untouched) when the balance
    /// cannot cover the amount.
    async fn apply_debit(
        &self,
        owner_id: Uuid,
        amount_minor: i64,
        reference: &str,
        description: &str,
    ) -> LedgerResult<LedgerApply>;

    /// Create a pending order; rejects a second order for the same
    /// (user, cart) pair with `DuplicateOrder`
    async fn create_order(
        &self,
        user_id: Uuid,
        cart_id: Uuid,
        amount_minor: i64,
    ) -> LedgerResult<Order>;

    async fn find_order(&self, order_id: Uuid) -> LedgerResult<Option<Order>>;

    /// pending -> initiated compare-and-set
    async fn begin_purchase(&self, order_id: Uuid) -> LedgerResult<OrderTransition>;

    /// {pending, initiated} -> paid compare-and-set; a no-op on an
    /// already-paid order
    async fn mark_paid(&self, order_id: Uuid) -> LedgerResult<OrderTransition>;
}

impl fmt::Debug for dyn LedgerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerStore")
    }
}

/// Shared positive-amount precondition for credits, debits, and order amounts
pub(crate) fn ensure_positive(amount_minor: i64) -> LedgerResult<()> {
    if amount_minor <= 0 {
        return Err(LedgerError::InvalidAmount(amount_minor));
    }
    Ok(())
}
