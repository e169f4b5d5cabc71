use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "txn_type", rename_all = "lowercase")]
pub enum TxnType {
    Credit,
    Debit,
}

/// Outcome of a ledger transaction
///
/// Only `Success` transactions count towards the balance; the ledger is
/// append-only so the balance can always be recomputed from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "txn_status", rename_all = "lowercase")]
pub enum TxnStatus {
    Pending,
    Success,
    Failed,
}

/// Order lifecycle status: pending -> initiated -> paid (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Initiated,
    Paid,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid)
    }
}

/// A single ledger entry, embedded in a wallet's history
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub txn_type: TxnType,
    pub amount_minor: i64,
    /// Caller-supplied idempotency key, unique within the wallet
    pub reference: String,
    pub status: TxnStatus,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Wallet aggregate: the source of truth for a user's funds
///
/// Invariant: `balance_minor` equals the sum of successful credits minus
/// the sum of successful debits in `transactions`.
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub balance_minor: i64,
    pub created_at: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
}

/// A purchase commitment against a cart snapshot
///
/// `amount_minor` is computed from the cart at creation time and never
/// changes afterwards.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub cart_id: Uuid,
    pub amount_minor: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// REQUEST PAYLOADS
// ============================================================================

/// Body for POST /api/wallets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionWalletRequest {
    pub owner_id: Uuid,
}

/// Body for POST /api/orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub cart_id: Uuid,
    pub amount_minor: i64,
}
