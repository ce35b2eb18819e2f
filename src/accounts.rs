// Copyright 2025 Cowboy AI, LLC.

//! Customer and vendor aggregates and the account service
//!
//! Emails are unique across both account kinds so that a lookup by email
//! resolves to exactly one account. Registration opens the account's wallet
//! in the same transaction, which is why every later wallet lookup by owner
//! can treat absence as an internal error rather than a user mistake.

use crate::entity::{DomainEntity, Entity, EntityId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{AccountDeleted, AccountRegistered, EventPublisher};
use crate::gateway::{PersistenceGateway, StoreTx};
use crate::identity::{CallerIdentity, Role};
use crate::wallet::{open_wallet_in_tx, WalletOwner};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Marker type for customer identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerMarker;

/// Strongly-typed customer identifier
pub type CustomerId = EntityId<CustomerMarker>;

/// Marker type for vendor identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorMarker;

/// Strongly-typed vendor identifier
pub type VendorId = EntityId<VendorMarker>;

/// A customer account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    entity: Entity<CustomerMarker>,
    /// Login email, unique across all accounts
    pub email: String,
    /// Hash of the login password, produced by the caller
    pub password_hash: String,
    /// Contact phone number
    pub phone_no: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

/// A vendor account
///
/// Vendors are either individuals or businesses; a business must carry a
/// business name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    entity: Entity<VendorMarker>,
    /// Login email, unique across all accounts
    pub email: String,
    /// Hash of the login password, produced by the caller
    pub password_hash: String,
    /// Contact phone number
    pub phone_no: String,
    /// Given name, for individual vendors
    pub first_name: Option<String>,
    /// Family name, for individual vendors
    pub last_name: Option<String>,
    /// Trading name, required for business vendors
    pub business_name: Option<String>,
    /// Whether this vendor trades as a business
    pub is_business: bool,
}

/// Fields supplied when registering a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerDraft {
    /// Login email
    pub email: String,
    /// Hash of the login password
    pub password_hash: String,
    /// Contact phone number
    pub phone_no: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

/// Fields supplied when registering a vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDraft {
    /// Login email
    pub email: String,
    /// Hash of the login password
    pub password_hash: String,
    /// Contact phone number
    pub phone_no: String,
    /// Given name, for individual vendors
    pub first_name: Option<String>,
    /// Family name, for individual vendors
    pub last_name: Option<String>,
    /// Trading name, required when `is_business` is set
    pub business_name: Option<String>,
    /// Whether this vendor trades as a business
    pub is_business: bool,
}

/// Fields a customer may change on their own account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    /// New phone number
    pub phone_no: Option<String>,
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
}

/// Fields a vendor may change on their own account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorUpdate {
    /// New phone number
    pub phone_no: Option<String>,
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New trading name
    pub business_name: Option<String>,
}

impl Customer {
    /// Create a customer from a registration draft
    pub fn new(draft: CustomerDraft) -> DomainResult<Self> {
        validate_email(&draft.email)?;
        Ok(Self {
            entity: Entity::new(),
            email: draft.email,
            password_hash: draft.password_hash,
            phone_no: draft.phone_no,
            first_name: draft.first_name,
            last_name: draft.last_name,
        })
    }

    /// The customer's identifier
    pub fn id(&self) -> CustomerId {
        self.entity.id
    }

    /// When the account was registered
    pub fn created_at(&self) -> DateTime<Utc> {
        self.entity.created_at
    }

    /// Apply a partial update, bumping the modification time
    pub fn apply(&mut self, update: CustomerUpdate) {
        if let Some(phone) = update.phone_no {
            self.phone_no = phone;
        }
        if let Some(first) = update.first_name {
            self.first_name = first;
        }
        if let Some(last) = update.last_name {
            self.last_name = last;
        }
        self.entity.touch();
    }
}

impl DomainEntity for Customer {
    type IdType = CustomerMarker;

    fn id(&self) -> EntityId<Self::IdType> {
        self.entity.id
    }
}

impl Vendor {
    /// Create a vendor from a registration draft
    pub fn new(draft: VendorDraft) -> DomainResult<Self> {
        validate_email(&draft.email)?;
        if draft.is_business && draft.business_name.is_none() {
            return Err(DomainError::validation(
                "business vendors must provide a business name",
            ));
        }
        Ok(Self {
            entity: Entity::new(),
            email: draft.email,
            password_hash: draft.password_hash,
            phone_no: draft.phone_no,
            first_name: draft.first_name,
            last_name: draft.last_name,
            business_name: draft.business_name,
            is_business: draft.is_business,
        })
    }

    /// The vendor's identifier
    pub fn id(&self) -> VendorId {
        self.entity.id
    }

    /// When the account was registered
    pub fn created_at(&self) -> DateTime<Utc> {
        self.entity.created_at
    }

    /// Apply a partial update, bumping the modification time
    pub fn apply(&mut self, update: VendorUpdate) {
        if let Some(phone) = update.phone_no {
            self.phone_no = phone;
        }
        if let Some(first) = update.first_name {
            self.first_name = Some(first);
        }
        if let Some(last) = update.last_name {
            self.last_name = Some(last);
        }
        if let Some(business) = update.business_name {
            self.business_name = Some(business);
        }
        self.entity.touch();
    }
}

impl DomainEntity for Vendor {
    type IdType = VendorMarker;

    fn id(&self) -> EntityId<Self::IdType> {
        self.entity.id
    }
}

fn validate_email(email: &str) -> DomainResult<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(DomainError::validation("invalid email address"));
    }
    Ok(())
}

fn ensure_email_free(tx: &dyn StoreTx, email: &str) -> DomainResult<()> {
    if tx.customer_by_email(email).is_some() || tx.vendor_by_email(email).is_some() {
        return Err(DomainError::conflict("email is already registered"));
    }
    Ok(())
}

/// Service for registering, updating and deleting accounts
pub struct AccountService<G> {
    gateway: Arc<G>,
    events: Arc<dyn EventPublisher>,
}

impl<G: PersistenceGateway> AccountService<G> {
    /// Create an account service backed by the given gateway
    pub fn new(gateway: Arc<G>, events: Arc<dyn EventPublisher>) -> Self {
        Self { gateway, events }
    }

    /// Register a customer, opening their wallet in the same transaction
    pub async fn register_customer(&self, draft: CustomerDraft) -> DomainResult<Customer> {
        let customer = Customer::new(draft)?;
        let stored = customer.clone();
        self.gateway
            .transact(move |tx| {
                ensure_email_free(tx, &stored.email)?;
                let owner = WalletOwner::Customer(stored.id());
                tx.insert_customer(stored);
                open_wallet_in_tx(tx, owner)?;
                Ok(())
            })
            .await?;
        info!(customer_id = %customer.id(), "customer registered");
        self.publish(Box::new(AccountRegistered {
            account_id: customer.id().into(),
            role: Role::Customer,
        }));
        Ok(customer)
    }

    /// Register a vendor, opening their wallet in the same transaction
    pub async fn register_vendor(&self, draft: VendorDraft) -> DomainResult<Vendor> {
        let vendor = Vendor::new(draft)?;
        let stored = vendor.clone();
        self.gateway
            .transact(move |tx| {
                ensure_email_free(tx, &stored.email)?;
                let owner = WalletOwner::Vendor(stored.id());
                tx.insert_vendor(stored);
                open_wallet_in_tx(tx, owner)?;
                Ok(())
            })
            .await?;
        info!(vendor_id = %vendor.id(), "vendor registered");
        self.publish(Box::new(AccountRegistered {
            account_id: vendor.id().into(),
            role: Role::Vendor,
        }));
        Ok(vendor)
    }

    /// Fetch a customer by id
    pub async fn get_customer(&self, id: CustomerId) -> DomainResult<Customer> {
        self.gateway
            .read(move |tx| {
                tx.customer(id)
                    .ok_or_else(|| DomainError::not_found("Customer", id))
            })
            .await
    }

    /// Fetch a vendor by id
    pub async fn get_vendor(&self, id: VendorId) -> DomainResult<Vendor> {
        self.gateway
            .read(move |tx| {
                tx.vendor(id)
                    .ok_or_else(|| DomainError::not_found("Vendor", id))
            })
            .await
    }

    /// Look a customer up by their login email
    pub async fn customer_by_email(&self, email: &str) -> DomainResult<Customer> {
        let email = email.to_string();
        self.gateway
            .read(move |tx| {
                tx.customer_by_email(&email)
                    .ok_or_else(|| DomainError::not_found("Customer", email))
            })
            .await
    }

    /// Look a vendor up by their login email
    pub async fn vendor_by_email(&self, email: &str) -> DomainResult<Vendor> {
        let email = email.to_string();
        self.gateway
            .read(move |tx| {
                tx.vendor_by_email(&email)
                    .ok_or_else(|| DomainError::not_found("Vendor", email))
            })
            .await
    }

    /// All customers, newest first
    pub async fn all_customers(&self) -> DomainResult<Vec<Customer>> {
        self.gateway.read(|tx| Ok(tx.customers())).await
    }

    /// All vendors, newest first
    pub async fn all_vendors(&self) -> DomainResult<Vec<Vendor>> {
        self.gateway.read(|tx| Ok(tx.vendors())).await
    }

    /// Update a customer's profile; only the customer or an admin may
    pub async fn update_customer(
        &self,
        caller: &CallerIdentity,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> DomainResult<Customer> {
        if !caller.is_admin() && caller.customer_id() != Some(id) {
            return Err(DomainError::forbidden(
                "only the account holder or an admin may update this account",
            ));
        }
        self.gateway
            .transact(move |tx| {
                let mut customer = tx
                    .customer(id)
                    .ok_or_else(|| DomainError::not_found("Customer", id))?;
                customer.apply(update);
                tx.update_customer(customer.clone())?;
                Ok(customer)
            })
            .await
    }

    /// Update a vendor's profile; only the vendor or an admin may
    pub async fn update_vendor(
        &self,
        caller: &CallerIdentity,
        id: VendorId,
        update: VendorUpdate,
    ) -> DomainResult<Vendor> {
        if !caller.is_admin() && caller.vendor_id() != Some(id) {
            return Err(DomainError::forbidden(
                "only the account holder or an admin may update this account",
            ));
        }
        self.gateway
            .transact(move |tx| {
                let mut vendor = tx
                    .vendor(id)
                    .ok_or_else(|| DomainError::not_found("Vendor", id))?;
                vendor.apply(update);
                tx.update_vendor(vendor.clone())?;
                Ok(vendor)
            })
            .await
    }

    /// Delete the account registered under `email`, cascading to the
    /// account's cars, reviews and wallet
    ///
    /// Refused while the account still participates in a pending or active
    /// booking, because deleting either party would orphan money in flight.
    /// Historical bookings are kept for the other party's records. Only the
    /// account holder or an admin may delete.
    pub async fn delete_account(
        &self,
        caller: &CallerIdentity,
        email: &str,
    ) -> DomainResult<()> {
        let caller = *caller;
        let email = email.to_string();
        let (account_id, role) = self
            .gateway
            .transact(move |tx| {
                if let Some(customer) = tx.customer_by_email(&email) {
                    delete_customer(tx, &caller, customer)
                } else if let Some(vendor) = tx.vendor_by_email(&email) {
                    delete_vendor(tx, &caller, vendor)
                } else {
                    Err(DomainError::not_found("Account", email))
                }
            })
            .await?;
        info!(%account_id, ?role, "account deleted");
        self.publish(Box::new(AccountDeleted { account_id, role }));
        Ok(())
    }

    fn publish(&self, event: Box<dyn crate::events::DomainEvent>) {
        if let Err(err) = self.events.publish(vec![event]) {
            warn!(error = %err, "failed to publish account event");
        }
    }
}

fn delete_customer(
    tx: &mut dyn StoreTx,
    caller: &CallerIdentity,
    customer: Customer,
) -> DomainResult<(uuid::Uuid, Role)> {
    let id = customer.id();
    if !caller.is_admin() && caller.customer_id() != Some(id) {
        return Err(DomainError::forbidden(
            "only the account holder or an admin may delete this account",
        ));
    }
    let occupying = tx
        .bookings_for_customer(id)
        .into_iter()
        .any(|b| b.is_active());
    if occupying {
        return Err(DomainError::conflict(
            "account has a pending or active booking",
        ));
    }
    for review in tx.reviews_for_customer(id) {
        tx.remove_review(review.id());
    }
    if let Some(wallet) = tx.wallet_for_owner(&WalletOwner::Customer(id)) {
        tx.remove_wallet(wallet.id());
    }
    tx.remove_customer(id);
    Ok((id.into(), Role::Customer))
}

fn delete_vendor(
    tx: &mut dyn StoreTx,
    caller: &CallerIdentity,
    vendor: Vendor,
) -> DomainResult<(uuid::Uuid, Role)> {
    let id = vendor.id();
    if !caller.is_admin() && caller.vendor_id() != Some(id) {
        return Err(DomainError::forbidden(
            "only the account holder or an admin may delete this account",
        ));
    }
    let cars = tx.cars_for_vendor(id);
    for car in &cars {
        if !tx.occupying_bookings_for_car(car.id()).is_empty() {
            return Err(DomainError::conflict(
                "a listed car has a pending or active booking",
            ));
        }
    }
    for car in cars {
        for review in tx.reviews_for_car(car.id()) {
            tx.remove_review(review.id());
        }
        tx.remove_car(car.id());
    }
    if let Some(wallet) = tx.wallet_for_owner(&WalletOwner::Vendor(id)) {
        tx.remove_wallet(wallet.id());
    }
    tx.remove_vendor(id);
    Ok((id.into(), Role::Vendor))
}
