//! Postgres implementation of the LedgerStore trait
//!
//! All guards live in SQL:
//! - reference uniqueness: `UNIQUE (wallet_id, reference)` +
//!   `ON CONFLICT DO NOTHING` (zero rows returned means the guard fired)
//! - balance sufficiency: conditional `UPDATE ... AND balance_minor >= $n`
//! - status monotonicity: conditional `UPDATE ... WHERE status = ...`
//!
//! Credit/debit run wallet-row-locked inside a transaction so concurrent
//! writers to the same wallet serialize.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction as SqlxTx};
use uuid::Uuid;

use crate::models::{Order, OrderStatus, Transaction, TxnStatus, TxnType, Wallet};
use crate::store::{
    ensure_positive, ApplyOutcome, LedgerApply, LedgerError, LedgerResult, LedgerStore,
    OrderTransition,
};

/// Wallet row without its transaction history
#[derive(Debug, Clone, FromRow)]
struct WalletRow {
    id: Uuid,
    owner_id: Uuid,
    balance_minor: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

const TXN_COLUMNS: &str =
    "id, wallet_id, txn_type, amount_minor, reference, status, description, created_at";
const ORDER_COLUMNS: &str =
    "id, user_id, cart_id, amount_minor, status, created_at, updated_at";

/// LedgerStore implementation backed by Postgres
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the wallet row for the duration of the surrounding transaction
    async fn lock_wallet(
        tx: &mut SqlxTx<'_, Postgres>,
        owner_id: Uuid,
    ) -> LedgerResult<WalletRow> {
        let row: Option<WalletRow> = sqlx::query_as(
            r#"
            SELECT id, owner_id, balance_minor, created_at
            FROM wallets
            WHERE owner_id = $1
            FOR UPDATE
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.ok_or(LedgerError::WalletNotFound(owner_id))
    }

    /// Insert a transaction if its reference is new on this wallet.
    ///
    /// Returns `None` when the unique index swallowed the insert, i.e.
    /// the idempotency guard fired.
    async fn try_insert_transaction(
        tx: &mut SqlxTx<'_, Postgres>,
        wallet_id: Uuid,
        txn_type: TxnType,
        amount_minor: i64,
        reference: &str,
        description: &str,
    ) -> LedgerResult<Option<Transaction>> {
        let inserted: Option<Transaction> = sqlx::query_as(&format!(
            r#"
            INSERT INTO wallet_transactions
                (id, wallet_id, txn_type, amount_minor, reference, status, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (wallet_id, reference) DO NOTHING
            RETURNING {TXN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(wallet_id)
        .bind(txn_type)
        .bind(amount_minor)
        .bind(reference)
        .bind(TxnStatus::Success)
        .bind(description)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(inserted)
    }

    async fn existing_transaction(
        tx: &mut SqlxTx<'_, Postgres>,
        wallet_id: Uuid,
        reference: &str,
    ) -> LedgerResult<Transaction> {
        let txn: Transaction = sqlx::query_as(&format!(
            r#"
            SELECT {TXN_COLUMNS}
            FROM wallet_transactions
            WHERE wallet_id = $1 AND reference = $2
            "#
        ))
        .bind(wallet_id)
        .bind(reference)
        .fetch_one(&mut **tx)
        .await?;

        Ok(txn)
    }

    /// Load the full wallet aggregate from the pool
    async fn load_wallet(&self, owner_id: Uuid) -> LedgerResult<Wallet> {
        let row: Option<WalletRow> = sqlx::query_as(
            "SELECT id, owner_id, balance_minor, created_at FROM wallets WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(LedgerError::WalletNotFound(owner_id))?;

        let transactions: Vec<Transaction> = sqlx::query_as(&format!(
            r#"
            SELECT {TXN_COLUMNS}
            FROM wallet_transactions
            WHERE wallet_id = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Wallet {
            id: row.id,
            owner_id: row.owner_id,
            balance_minor: row.balance_minor,
            created_at: row.created_at,
            transactions,
        })
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn create_wallet(&self, owner_id: Uuid) -> LedgerResult<Wallet> {
        sqlx::query(
            r#"
            INSERT INTO wallets (id, owner_id, balance_minor)
            VALUES ($1, $2, 0)
            ON CONFLICT (owner_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        self.load_wallet(owner_id).await
    }

    async fn find_wallet(&self, owner_id: Uuid) -> LedgerResult<Option<Wallet>> {
        match self.load_wallet(owner_id).await {
            Ok(wallet) => Ok(Some(wallet)),
            Err(LedgerError::WalletNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_transaction(
        &self,
        owner_id: Uuid,
        reference: &str,
    ) -> LedgerResult<Option<Transaction>> {
        let txn: Option<Transaction> = sqlx::query_as(
            r#"
            SELECT t.id, t.wallet_id, t.txn_type, t.amount_minor,
                   t.reference, t.status, t.description, t.created_at
            FROM wallet_transactions t
            JOIN wallets w ON w.id = t.wallet_id
            WHERE w.owner_id = $1 AND t.reference = $2
            "#,
        )
        .bind(owner_id)
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        Ok(txn)
    }

    async fn apply_credit(
        &self,
        owner_id: Uuid,
        amount_minor: i64,
        reference: &str,
        description: &str,
    ) -> LedgerResult<LedgerApply> {
        ensure_positive(amount_minor)?;

        let mut tx = self.pool.begin().await?;
        let wallet_row = Self::lock_wallet(&mut tx, owner_id).await?;

        let inserted = Self::try_insert_transaction(
            &mut tx,
            wallet_row.id,
            TxnType::Credit,
            amount_minor,
            reference,
            description,
        )
        .await?;

        let outcome = match inserted {
            Some(txn) => {
                sqlx::query("UPDATE wallets SET balance_minor = balance_minor + $1 WHERE id = $2")
                    .bind(amount_minor)
                    .bind(wallet_row.id)
                    .execute(&mut *tx)
                    .await?;
                ApplyOutcome::Applied(txn)
            }
            None => {
                let existing =
                    Self::existing_transaction(&mut tx, wallet_row.id, reference).await?;
                ApplyOutcome::Duplicate(existing)
            }
        };

        tx.commit().await?;

        Ok(LedgerApply {
            wallet: self.load_wallet(owner_id).await?,
            outcome,
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

        let mut tx = self.pool.begin().await?;
        let wallet_row = Self::lock_wallet(&mut tx, owner_id).await?;

        let inserted = Self::try_insert_transaction(
            &mut tx,
            wallet_row.id,
            TxnType::Debit,
            amount_minor,
            reference,
            description,
        )
        .await?;

        let outcome = match inserted {
            Some(txn) => {
                let updated = sqlx::query(
                    r#"
                    UPDATE wallets
                    SET balance_minor = balance_minor - $1
                    WHERE id = $2 AND balance_minor >= $1
                    "#,
                )
                .bind(amount_minor)
                .bind(wallet_row.id)
                .execute(&mut *tx)
                .await?;

                if updated.rows_affected() == 0 {
                    // Roll the appended transaction back too: a failed
                    // debit must leave the ledger untouched.
                    tx.rollback().await?;
                    return Err(LedgerError::InsufficientFunds {
                        balance_minor: wallet_row.balance_minor,
                        amount_minor,
                    });
                }
                ApplyOutcome::Applied(txn)
            }
            None => {
                let existing =
                    Self::existing_transaction(&mut tx, wallet_row.id, reference).await?;
                ApplyOutcome::Duplicate(existing)
            }
        };

        tx.commit().await?;

        Ok(LedgerApply {
            wallet: self.load_wallet(owner_id).await?,
            outcome,
        })
    }

    async fn create_order(
        &self,
        user_id: Uuid,
        cart_id: Uuid,
        amount_minor: i64,
    ) -> LedgerResult<Order> {
        ensure_positive(amount_minor)?;

        let inserted: Option<Order> = sqlx::query_as(&format!(
            r#"
            INSERT INTO orders (id, user_id, cart_id, amount_minor, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, cart_id) DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(cart_id)
        .bind(amount_minor)
        .bind(OrderStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        inserted.ok_or(LedgerError::DuplicateOrder { cart_id })
    }

    async fn find_order(&self, order_id: Uuid) -> LedgerResult<Option<Order>> {
        let order: Option<Order> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn begin_purchase(&self, order_id: Uuid) -> LedgerResult<OrderTransition> {
        let updated: Option<Order> = sqlx::query_as(&format!(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = $3
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(OrderStatus::Initiated)
        .bind(OrderStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(order) => Ok(OrderTransition {
                order,
                transitioned: true,
            }),
            None => {
                let order = self
                    .find_order(order_id)
                    .await?
                    .ok_or(LedgerError::OrderNotFound(order_id))?;
                Ok(OrderTransition {
                    order,
                    transitioned: false,
                })
            }
        }
    }

    async fn mark_paid(&self, order_id: Uuid) -> LedgerResult<OrderTransition> {
        let updated: Option<Order> = sqlx::query_as(&format!(
            r#"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status <> $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order_id)
        .bind(OrderStatus::Paid)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(order) => Ok(OrderTransition {
                order,
                transitioned: true,
            }),
            None => {
                let order = self
                    .find_order(order_id)
                    .await?
                    .ok_or(LedgerError::OrderNotFound(order_id))?;
                Ok(OrderTransition {
                    order,
                    transitioned: false,
                })
            }
        }
    }
}
