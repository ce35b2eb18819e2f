// Copyright 2025 Cowboy AI, LLC.

//! Wallet aggregate and the wallet ledger service
//!
//! Every customer and vendor owns exactly one wallet holding a whole-credit
//! balance. Balances are unsigned: a debit that would overdraw fails with
//! [`DomainError::InsufficientFunds`] and leaves the balance untouched.
//! Money never appears or disappears inside this crate, it only moves
//! between wallets, always inside a single gateway transaction.

use crate::entity::{DomainEntity, EntityId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{EventPublisher, WalletCredited, WalletDebited};
use crate::gateway::{PersistenceGateway, StoreTx};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::accounts::{CustomerId, VendorId};

/// Marker type for wallet identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletMarker;

/// Strongly-typed wallet identifier
pub type WalletId = EntityId<WalletMarker>;

/// The single account a wallet belongs to
///
/// A wallet is owned by exactly one customer or exactly one vendor, never
/// both and never neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletOwner {
    /// Wallet of a customer account
    Customer(CustomerId),
    /// Wallet of a vendor account
    Vendor(VendorId),
}

impl fmt::Display for WalletOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletOwner::Customer(id) => write!(f, "customer {id}"),
            WalletOwner::Vendor(id) => write!(f, "vendor {id}"),
        }
    }
}

/// A credit balance held on behalf of one account
///
/// The balance field is private: the only way to change it is through
/// [`Wallet::credit`] and [`Wallet::debit`], which enforce the non-negative
/// invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    id: WalletId,
    owner: WalletOwner,
    credit: u64,
}

impl Wallet {
    /// Open a wallet for an account with a zero balance
    pub fn new(owner: WalletOwner) -> Self {
        Self {
            id: WalletId::new(),
            owner,
            credit: 0,
        }
    }

    /// The wallet's identifier
    pub fn id(&self) -> WalletId {
        self.id
    }

    /// The account this wallet belongs to
    pub fn owner(&self) -> &WalletOwner {
        &self.owner
    }

    /// Current balance in whole credits
    pub fn balance(&self) -> u64 {
        self.credit
    }

    /// Add credits, returning the new balance
    ///
    /// Rejects zero amounts and balances that would overflow.
    pub fn credit(&mut self, amount: u64) -> DomainResult<u64> {
        ensure_positive(amount)?;
        self.credit = self
            .credit
            .checked_add(amount)
            .ok_or_else(|| DomainError::validation("credit would overflow the balance"))?;
        Ok(self.credit)
    }

    /// Remove credits, returning the new balance
    ///
    /// Fails with [`DomainError::InsufficientFunds`] when the balance does
    /// not cover the amount; the balance is left unchanged.
    pub fn debit(&mut self, amount: u64) -> DomainResult<u64> {
        ensure_positive(amount)?;
        if amount > self.credit {
            return Err(DomainError::InsufficientFunds {
                requested: amount,
                available: self.credit,
            });
        }
        self.credit -= amount;
        Ok(self.credit)
    }
}

impl DomainEntity for Wallet {
    type IdType = WalletMarker;

    fn id(&self) -> EntityId<Self::IdType> {
        self.id
    }
}

fn ensure_positive(amount: u64) -> DomainResult<()> {
    if amount == 0 {
        return Err(DomainError::validation("amount must be positive"));
    }
    Ok(())
}

/// Open a wallet for an account as part of an enclosing transaction
///
/// Fails with `Conflict` when the account already has one.
pub(crate) fn open_wallet_in_tx(
    tx: &mut dyn StoreTx,
    owner: WalletOwner,
) -> DomainResult<Wallet> {
    if tx.wallet_for_owner(&owner).is_some() {
        return Err(DomainError::conflict("account already has a wallet"));
    }
    let wallet = Wallet::new(owner);
    tx.insert_wallet(wallet.clone());
    Ok(wallet)
}

/// Credit a wallet as part of an enclosing transaction
pub(crate) fn credit_in_tx(
    tx: &mut dyn StoreTx,
    wallet_id: WalletId,
    amount: u64,
) -> DomainResult<u64> {
    let mut wallet = tx
        .wallet(wallet_id)
        .ok_or_else(|| DomainError::not_found("Wallet", wallet_id))?;
    let balance = wallet.credit(amount)?;
    tx.update_wallet(wallet)?;
    Ok(balance)
}

/// Debit a wallet as part of an enclosing transaction
pub(crate) fn debit_in_tx(
    tx: &mut dyn StoreTx,
    wallet_id: WalletId,
    amount: u64,
) -> DomainResult<u64> {
    let mut wallet = tx
        .wallet(wallet_id)
        .ok_or_else(|| DomainError::not_found("Wallet", wallet_id))?;
    let balance = wallet.debit(amount)?;
    tx.update_wallet(wallet)?;
    Ok(balance)
}

/// Service for standalone wallet operations: top-ups, withdrawals and
/// balance queries
///
/// Transfers that belong to a booking go through the booking engine, which
/// reuses this module's transactional helpers so the debit and credit share
/// one transaction.
pub struct WalletLedger<G> {
    gateway: Arc<G>,
    events: Arc<dyn EventPublisher>,
}

impl<G: PersistenceGateway> WalletLedger<G> {
    /// Create a ledger backed by the given gateway
    pub fn new(gateway: Arc<G>, events: Arc<dyn EventPublisher>) -> Self {
        Self { gateway, events }
    }

    /// Open a wallet for an account
    ///
    /// Account registration opens wallets itself inside its own
    /// transaction; this entry point serves embeddings that manage
    /// accounts elsewhere.
    pub async fn open_wallet(&self, owner: WalletOwner) -> DomainResult<Wallet> {
        let wallet = self
            .gateway
            .transact(move |tx| open_wallet_in_tx(tx, owner))
            .await?;
        info!(wallet_id = %wallet.id(), %owner, "wallet opened");
        Ok(wallet)
    }

    /// Add credits to a wallet, returning the new balance
    pub async fn credit(&self, wallet_id: WalletId, amount: u64) -> DomainResult<u64> {
        let balance = self
            .gateway
            .transact(move |tx| credit_in_tx(tx, wallet_id, amount))
            .await?;
        info!(%wallet_id, amount, balance, "wallet credited");
        self.publish(Box::new(WalletCredited {
            wallet_id,
            amount,
            balance,
        }));
        Ok(balance)
    }

    /// Remove credits from a wallet, returning the new balance
    pub async fn debit(&self, wallet_id: WalletId, amount: u64) -> DomainResult<u64> {
        let balance = self
            .gateway
            .transact(move |tx| debit_in_tx(tx, wallet_id, amount))
            .await?;
        info!(%wallet_id, amount, balance, "wallet debited");
        self.publish(Box::new(WalletDebited {
            wallet_id,
            amount,
            balance,
        }));
        Ok(balance)
    }

    /// Current balance of a wallet
    pub async fn balance(&self, wallet_id: WalletId) -> DomainResult<u64> {
        self.gateway
            .read(move |tx| {
                tx.wallet(wallet_id)
                    .map(|w| w.balance())
                    .ok_or_else(|| DomainError::not_found("Wallet", wallet_id))
            })
            .await
    }

    /// The wallet belonging to an account
    pub async fn wallet_of(&self, owner: WalletOwner) -> DomainResult<Wallet> {
        self.gateway
            .read(move |tx| {
                tx.wallet_for_owner(&owner)
                    .ok_or_else(|| DomainError::not_found("Wallet", owner))
            })
            .await
    }

    fn publish(&self, event: Box<dyn crate::events::DomainEvent>) {
        if let Err(err) = self.events.publish(vec![event]) {
            warn!(error = %err, "failed to publish wallet event");
        }
    }
}
