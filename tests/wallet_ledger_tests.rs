// Copyright 2025 Cowboy AI, LLC.

//! Wallet ledger integration tests: non-negative balances under any
//! interleaving, and the credit/debit inverse law.

mod support;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rental_domain::wallet::{Wallet, WalletOwner};
use std::sync::Arc;
use support::Marketplace;

#[tokio::test]
async fn test_credit_then_debit_is_identity() {
    let market = Marketplace::new();
    let (customer, _) = market.customer_with_funds("ada@example.com", 0).await;
    let wallet = market
        .wallets
        .wallet_of(WalletOwner::Customer(customer.id()))
        .await
        .unwrap();

    market.wallets.credit(wallet.id(), 75).await.unwrap();
    market.wallets.debit(wallet.id(), 75).await.unwrap();
    assert_eq!(market.wallets.balance(wallet.id()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_overdraw_reports_both_amounts() {
    let market = Marketplace::new();
    let (customer, _) = market.customer_with_funds("ada@example.com", 30).await;
    let wallet = market
        .wallets
        .wallet_of(WalletOwner::Customer(customer.id()))
        .await
        .unwrap();

    let err = market.wallets.debit(wallet.id(), 31).await.unwrap_err();
    match err {
        rental_domain::errors::DomainError::InsufficientFunds {
            requested,
            available,
        } => {
            assert_eq!(requested, 31);
            assert_eq!(available, 30);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(market.wallets.balance(wallet.id()).await.unwrap(), 30);
}

#[tokio::test]
async fn test_unknown_wallet_is_not_found() {
    let market = Marketplace::new();
    let ghost = rental_domain::wallet::WalletId::new();
    assert!(market.wallets.balance(ghost).await.unwrap_err().is_not_found());
    assert!(market
        .wallets
        .credit(ghost, 10)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_concurrent_debits_never_overdraw() {
    let market = Marketplace::new();
    let (customer, _) = market.customer_with_funds("ada@example.com", 50).await;
    let wallet_id = market
        .wallets
        .wallet_of(WalletOwner::Customer(customer.id()))
        .await
        .unwrap()
        .id();

    // ten workers race to take 10 each from a balance of 50
    let mut handles = Vec::new();
    for _ in 0..10 {
        let wallets = Arc::clone(&market.wallets);
        handles.push(tokio::spawn(
            async move { wallets.debit(wallet_id, 10).await },
        ));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(err) => assert!(err.is_insufficient_funds()),
        }
    }
    assert_eq!(succeeded, 5);
    assert_eq!(market.wallets.balance(wallet_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_wallet_events_follow_mutations() {
    let market = Marketplace::new();
    let (customer, _) = market.customer_with_funds("ada@example.com", 0).await;
    let wallet_id = market
        .wallets
        .wallet_of(WalletOwner::Customer(customer.id()))
        .await
        .unwrap()
        .id();

    market.wallets.credit(wallet_id, 20).await.unwrap();
    market.wallets.debit(wallet_id, 5).await.unwrap();

    let published = market.events.published_event_types();
    assert!(published.contains(&"WalletCredited".to_string()));
    assert!(published.contains(&"WalletDebited".to_string()));
}

proptest! {
    /// No sequence of credits and debits drives a balance negative or
    /// makes it drift from the ledger arithmetic.
    #[test]
    fn prop_balance_matches_accepted_operations(
        ops in prop::collection::vec((any::<bool>(), 1u64..1_000), 0..64)
    ) {
        let mut wallet = Wallet::new(WalletOwner::Customer(
            rental_domain::accounts::CustomerId::new(),
        ));
        let mut expected: u64 = 0;
        for (is_credit, amount) in ops {
            if is_credit {
                if wallet.credit(amount).is_ok() {
                    expected += amount;
                }
            } else if wallet.debit(amount).is_ok() {
                expected -= amount;
            }
            prop_assert_eq!(wallet.balance(), expected);
        }
    }

    /// A rejected debit leaves the balance exactly as it was.
    #[test]
    fn prop_failed_debit_changes_nothing(balance in 0u64..1_000, over in 1u64..1_000) {
        let mut wallet = Wallet::new(WalletOwner::Customer(
            rental_domain::accounts::CustomerId::new(),
        ));
        if balance > 0 {
            wallet.credit(balance).unwrap();
        }
        let attempt = balance + over;
        prop_assert!(wallet.debit(attempt).is_err());
        prop_assert_eq!(wallet.balance(), balance);
    }
}
