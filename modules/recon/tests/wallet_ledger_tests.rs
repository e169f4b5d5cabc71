//! Wallet ledger invariants: reference idempotency, balance arithmetic,
//! insufficient-funds atomicity, concurrent duplicate safety

use recon_rs::models::{TxnStatus, TxnType, Wallet};
use recon_rs::store::{InMemoryStore, LedgerError, LedgerStore};
use uuid::Uuid;

/// Recompute the balance from history: successful credits minus
/// successful debits
fn recomputed_balance(wallet: &Wallet) -> i64 {
    wallet
        .transactions
        .iter()
        .filter(|t| t.status == TxnStatus::Success)
        .map(|t| match t.txn_type {
            TxnType::Credit => t.amount_minor,
            TxnType::Debit => -t.amount_minor,
        })
        .sum()
}

#[tokio::test]
async fn test_credit_is_idempotent_by_reference() {
    // Scenario A from the acceptance list
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    store.create_wallet(owner).await.unwrap();

    let first = store
        .apply_credit(owner, 5000, "ps-001", "wallet top-up")
        .await
        .unwrap();
    assert!(!first.outcome.is_duplicate());
    assert_eq!(first.wallet.balance_minor, 5000);
    assert_eq!(first.wallet.transactions.len(), 1);

    let second = store
        .apply_credit(owner, 5000, "ps-001", "wallet top-up")
        .await
        .unwrap();
    assert!(second.outcome.is_duplicate());
    assert_eq!(second.wallet.balance_minor, 5000);
    assert_eq!(second.wallet.transactions.len(), 1);
    assert_eq!(second.outcome.transaction().reference, "ps-001");
}

#[tokio::test]
async fn test_balance_matches_history_for_mixed_sequence() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    store.create_wallet(owner).await.unwrap();

    store.apply_credit(owner, 10000, "c-1", "").await.unwrap();
    store.apply_credit(owner, 2500, "c-2", "").await.unwrap();
    store.apply_debit(owner, 4000, "d-1", "").await.unwrap();
    store.apply_credit(owner, 100, "c-3", "").await.unwrap();
    let apply = store.apply_debit(owner, 600, "d-2", "").await.unwrap();

    assert_eq!(apply.wallet.balance_minor, 8000);
    assert_eq!(recomputed_balance(&apply.wallet), apply.wallet.balance_minor);

    let txn_types: Vec<TxnType> = apply
        .wallet
        .transactions
        .iter()
        .map(|t| t.txn_type)
        .collect();
    assert_eq!(
        txn_types,
        vec![
            TxnType::Credit,
            TxnType::Credit,
            TxnType::Debit,
            TxnType::Credit,
            TxnType::Debit
        ]
    );
}

#[tokio::test]
async fn test_insufficient_funds_leaves_ledger_untouched() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    store.create_wallet(owner).await.unwrap();
    store.apply_credit(owner, 1000, "c-1", "").await.unwrap();

    let err = store
        .apply_debit(owner, 1500, "d-1", "")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds {
            balance_minor: 1000,
            amount_minor: 1500
        }
    ));

    let wallet = store.find_wallet(owner).await.unwrap().unwrap();
    assert_eq!(wallet.balance_minor, 1000);
    assert_eq!(wallet.transactions.len(), 1);
    // The failed debit must not burn the reference either
    assert!(store
        .find_transaction(owner, "d-1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_concurrent_duplicate_credits_apply_once() {
    // Scenario C: racing callbacks for the same top-up event
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    store.create_wallet(owner).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.apply_credit(owner, 1000, "ps-xyz", "top-up").await
        }));
    }

    let mut fresh = 0;
    let mut duplicates = 0;
    for handle in handles {
        let apply = handle.await.unwrap().unwrap();
        if apply.outcome.is_duplicate() {
            duplicates += 1;
        } else {
            fresh += 1;
        }
    }

    assert_eq!(fresh, 1);
    assert_eq!(duplicates, 7);

    let wallet = store.find_wallet(owner).await.unwrap().unwrap();
    assert_eq!(wallet.balance_minor, 1000);
    assert_eq!(wallet.transactions.len(), 1);
}

#[tokio::test]
async fn test_concurrent_debits_cannot_overdraw() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    store.create_wallet(owner).await.unwrap();
    store.apply_credit(owner, 1000, "c-1", "").await.unwrap();

    // Two debits of 700 against a balance of 1000: at most one may pass
    let a = {
        let store = store.clone();
        tokio::spawn(async move { store.apply_debit(owner, 700, "d-a", "").await })
    };
    let b = {
        let store = store.clone();
        tokio::spawn(async move { store.apply_debit(owner, 700, "d-b", "").await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);

    let wallet = store.find_wallet(owner).await.unwrap().unwrap();
    assert_eq!(wallet.balance_minor, 300);
    assert_eq!(recomputed_balance(&wallet), 300);
}

#[tokio::test]
async fn test_transaction_lookup_by_reference() {
    let store = InMemoryStore::new();
    let owner = Uuid::new_v4();
    store.create_wallet(owner).await.unwrap();
    store
        .apply_credit(owner, 200, "ps-look", "top-up")
        .await
        .unwrap();

    let txn = store
        .find_transaction(owner, "ps-look")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(txn.amount_minor, 200);
    assert_eq!(txn.txn_type, TxnType::Credit);
    assert_eq!(txn.status, TxnStatus::Success);

    assert!(store
        .find_transaction(owner, "ps-other")
        .await
        .unwrap()
        .is_none());

    let err = store
        .find_transaction(Uuid::new_v4(), "ps-look")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::WalletNotFound(_)));
}
