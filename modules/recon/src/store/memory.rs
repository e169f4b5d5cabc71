//! In-memory implementation of the LedgerStore trait for testing and development

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{Order, OrderStatus, Transaction, TxnStatus, TxnType, Wallet};
use crate::store::{
    ensure_positive, ApplyOutcome, LedgerApply, LedgerError, LedgerResult, LedgerStore,
    OrderTransition,
};

#[derive(Default)]
struct MemState {
    /// Wallets keyed by owner id (1:1 with users)
    wallets: HashMap<Uuid, Wallet>,
    orders: HashMap<Uuid, Order>,
}

/// LedgerStore implementation backed by a single async mutex
///
/// This implementation is suitable for:
/// - Unit and integration tests (no external dependencies)
/// - Local development without Docker
///
/// Every operation takes the one lock, so all guards (reference
/// uniqueness, balance sufficiency, status compare-and-set) observe a
/// consistent snapshot — the same linearizable behavior the Postgres
/// implementation gets from unique indexes and conditional updates.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemState>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn build_transaction(
        wallet_id: Uuid,
        txn_type: TxnType,
        amount_minor: i64,
        reference: &str,
        description: &str,
    ) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            wallet_id,
            txn_type,
            amount_minor,
            reference: reference.to_string(),
            status: TxnStatus::Success,
            description: description.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn create_wallet(&self, owner_id: Uuid) -> LedgerResult<Wallet> {
        let mut state = self.state.lock().await;
        let wallet = state.wallets.entry(owner_id).or_insert_with(|| Wallet {
            id: Uuid::new_v4(),
            owner_id,
            balance_minor: 0,
            created_at: Utc::now(),
            transactions: Vec::new(),
        });
        Ok(wallet.clone())
    }

    async fn find_wallet(&self, owner_id: Uuid) -> LedgerResult<Option<Wallet>> {
        let state = self.state.lock().await;
        Ok(state.wallets.get(&owner_id).cloned())
    }

    async fn find_transaction(
        &self,
        owner_id: Uuid,
        reference: &str,
    ) -> LedgerResult<Option<Transaction>> {
        let state = self.state.lock().await;
        let wallet = state
            .wallets
            .get(&owner_id)
            .ok_or(LedgerError::WalletNotFound(owner_id))?;
        Ok(wallet
            .transactions
            .iter()
            .find(|t| t.reference == reference)
            .cloned())
    }

    async fn apply_credit(
        &self,
        owner_id: Uuid,
        amount_minor: i64,
        reference: &str,
        description: &str,
    ) -> LedgerResult<LedgerApply> {
        ensure_positive(amount_minor)?;

        let mut state = self.state.lock().await;
        let wallet = state
            .wallets
            .get_mut(&owner_id)
            .ok_or(LedgerError::WalletNotFound(owner_id))?;

        if let Some(existing) = wallet.transactions.iter().find(|t| t.reference == reference) {
            let outcome = ApplyOutcome::Duplicate(existing.clone());
            return Ok(LedgerApply {
                wallet: wallet.clone(),
                outcome,
            });
        }

        let txn = Self::build_transaction(
            wallet.id,
            TxnType::Credit,
            amount_minor,
            reference,
            description,
        );
        wallet.transactions.push(txn.clone());
        wallet.balance_minor += amount_minor;

        Ok(LedgerApply {
            wallet: wallet.clone(),
            outcome: ApplyOutcome::Applied(txn),
        })
    }

    async fn apply_debit(
        &self,
        owner_id: Uuid,
        amount_minor: i64,
        reference: &str,
        description: &str,
    ) -> LedgerResult<LedgerApply> {
        ensure_positive(amount_minor)?;

        let mut state = self.state.lock().await;
        let wallet = state
            .wallets
            .get_mut(&owner_id)
            .ok_or(LedgerError::WalletNotFound(owner_id))?;

        if let Some(existing) = wallet.transactions.iter().find(|t| t.reference == reference) {
            let outcome = ApplyOutcome::Duplicate(existing.clone());
            return Ok(LedgerApply {
                wallet: wallet.clone(),
                outcome,
            });
        }

        if wallet.balance_minor < amount_minor {
            return Err(LedgerError::InsufficientFunds {
                balance_minor: wallet.balance_minor,
                amount_minor,
            });
        }

        let txn = Self::build_transaction(
            wallet.id,
            TxnType::Debit,
            amount_minor,
            reference,
            description,
        );
        wallet.transactions.push(txn.clone());
        wallet.balance_minor -= amount_minor;

        Ok(LedgerApply {
            wallet: wallet.clone(),
            outcome: ApplyOutcome::Applied(txn),
        })
    }

    async fn create_order(
        &self,
        user_id: Uuid,
        cart_id: Uuid,
        amount_minor: i64,
    ) -> LedgerResult<Order> {
        ensure_positive(amount_minor)?;

        let mut state = self.state.lock().await;
        if state
            .orders
            .values()
            .any(|o| o.user_id == user_id && o.cart_id == cart_id)
        {
            return Err(LedgerError::DuplicateOrder { cart_id });
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            cart_id,
            amount_minor,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, order_id: Uuid) -> LedgerResult<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn begin_purchase(&self, order_id: Uuid) -> LedgerResult<OrderTransition> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        if order.status == OrderStatus::Pending {
            order.status = OrderStatus::Initiated;
            order.updated_at = Utc::now();
            Ok(OrderTransition {
                order: order.clone(),
                transitioned: true,
            })
        } else {
            Ok(OrderTransition {
                order: order.clone(),
                transitioned: false,
            })
        }
    }

    async fn mark_paid(&self, order_id: Uuid) -> LedgerResult<OrderTransition> {
        let mut state = self.state.lock().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound(order_id))?;

        if order.status == OrderStatus::Paid {
            Ok(OrderTransition {
                order: order.clone(),
                transitioned: false,
            })
        } else {
            order.status = OrderStatus::Paid;
            order.updated_at = Utc::now();
            Ok(OrderTransition {
                order: order.clone(),
                transitioned: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_wallet_is_idempotent() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();

        let first = store.create_wallet(owner).await.unwrap();
        let second = store.create_wallet(owner).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.balance_minor, 0);
    }

    #[tokio::test]
    async fn test_credit_requires_wallet() {
        let store = InMemoryStore::new();
        let err = store
            .apply_credit(Uuid::new_v4(), 100, "ref-1", "")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::WalletNotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_amount_rejected() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        store.create_wallet(owner).await.unwrap();

        let err = store.apply_credit(owner, 0, "ref-1", "").await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(0)));

        let err = store
            .apply_debit(owner, -5, "ref-2", "")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(-5)));
    }
}
