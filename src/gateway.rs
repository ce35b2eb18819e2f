// Copyright 2025 Cowboy AI, LLC.

//! Persistence gateway: transactional access to the entity collections
//!
//! The concrete database lives outside this crate. Services depend on
//! [`PersistenceGateway`], whose `transact` runs a closure against a
//! [`StoreTx`] view of all collections: either every mutation the closure
//! makes commits, or none of them do. Transactions against one gateway
//! serialize, so two concurrent bookings cannot both observe a car as free
//! and two concurrent debits cannot overdraw a wallet.
//!
//! [`InMemoryGateway`] is the bundled implementation, used by the services
//! in tests and by any embedding that does not bring its own store. It
//! commits by applying the closure to a clone of the state and swapping the
//! clone in on success.

use crate::accounts::{Customer, CustomerId, Vendor, VendorId};
use crate::booking::{Booking, BookingId};
use crate::catalog::{Car, CarId};
use crate::contact::ContactMessage;
use crate::errors::{DomainError, DomainResult};
use crate::review::{Review, ReviewId};
use crate::wallet::{Wallet, WalletId, WalletOwner};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Typed CRUD and query access to the entity collections inside one
/// transaction
///
/// Every cross-entity fetch is an explicit call on this trait; there is no
/// lazy relationship traversal. Getters clone the row out; mutations write a
/// whole row back.
pub trait StoreTx {
    // --- cars ---

    /// Fetch a car by id
    fn car(&self, id: CarId) -> Option<Car>;
    /// Insert a new car
    fn insert_car(&mut self, car: Car);
    /// Write back an existing car
    fn update_car(&mut self, car: Car) -> DomainResult<()>;
    /// Remove a car, returning it if present
    fn remove_car(&mut self, id: CarId) -> Option<Car>;
    /// All cars, newest first
    fn cars(&self) -> Vec<Car>;
    /// Cars owned by a vendor, newest first
    fn cars_for_vendor(&self, vendor_id: VendorId) -> Vec<Car>;

    // --- customers ---

    /// Fetch a customer by id
    fn customer(&self, id: CustomerId) -> Option<Customer>;
    /// Look a customer up by email
    fn customer_by_email(&self, email: &str) -> Option<Customer>;
    /// Insert a new customer
    fn insert_customer(&mut self, customer: Customer);
    /// Write back an existing customer
    fn update_customer(&mut self, customer: Customer) -> DomainResult<()>;
    /// Remove a customer, returning it if present
    fn remove_customer(&mut self, id: CustomerId) -> Option<Customer>;
    /// All customers, newest first
    fn customers(&self) -> Vec<Customer>;

    // --- vendors ---

    /// Fetch a vendor by id
    fn vendor(&self, id: VendorId) -> Option<Vendor>;
    /// Look a vendor up by email
    fn vendor_by_email(&self, email: &str) -> Option<Vendor>;
    /// Insert a new vendor
    fn insert_vendor(&mut self, vendor: Vendor);
    /// Write back an existing vendor
    fn update_vendor(&mut self, vendor: Vendor) -> DomainResult<()>;
    /// Remove a vendor, returning it if present
    fn remove_vendor(&mut self, id: VendorId) -> Option<Vendor>;
    /// All vendors, newest first
    fn vendors(&self) -> Vec<Vendor>;

    // --- reviews ---

    /// Fetch a review by id
    fn review(&self, id: ReviewId) -> Option<Review>;
    /// The unique review a customer wrote for a car, if any
    fn review_by_customer_and_car(
        &self,
        customer_id: CustomerId,
        car_id: CarId,
    ) -> Option<Review>;
    /// Insert a new review
    fn insert_review(&mut self, review: Review);
    /// Write back an existing review
    fn update_review(&mut self, review: Review) -> DomainResult<()>;
    /// Remove a review, returning it if present
    fn remove_review(&mut self, id: ReviewId) -> Option<Review>;
    /// Reviews written for a car, newest first
    fn reviews_for_car(&self, car_id: CarId) -> Vec<Review>;
    /// Reviews written by a customer, newest first
    fn reviews_for_customer(&self, customer_id: CustomerId) -> Vec<Review>;

    // --- bookings ---

    /// Fetch a booking by id
    fn booking(&self, id: BookingId) -> Option<Booking>;
    /// Insert a new booking
    fn insert_booking(&mut self, booking: Booking);
    /// Write back an existing booking
    fn update_booking(&mut self, booking: Booking) -> DomainResult<()>;
    /// Bookings made by a customer, oldest first
    fn bookings_for_customer(&self, customer_id: CustomerId) -> Vec<Booking>;
    /// Bookings referencing a car, oldest first
    fn bookings_for_car(&self, car_id: CarId) -> Vec<Booking>;
    /// Bookings still occupying a car (pending or active), oldest first
    fn occupying_bookings_for_car(&self, car_id: CarId) -> Vec<Booking>;

    // --- wallets ---

    /// Fetch a wallet by id
    fn wallet(&self, id: WalletId) -> Option<Wallet>;
    /// The wallet belonging to a customer or vendor
    fn wallet_for_owner(&self, owner: &WalletOwner) -> Option<Wallet>;
    /// Insert a new wallet
    fn insert_wallet(&mut self, wallet: Wallet);
    /// Write back an existing wallet
    fn update_wallet(&mut self, wallet: Wallet) -> DomainResult<()>;
    /// Remove a wallet, returning it if present
    fn remove_wallet(&mut self, id: WalletId) -> Option<Wallet>;

    // --- contact messages ---

    /// Append a support message
    fn insert_contact(&mut self, message: ContactMessage);
    /// All support messages, oldest first
    fn contacts(&self) -> Vec<ContactMessage>;
}

/// Transactional gateway over the entity collections
///
/// Implementations must guarantee that a closure returning `Err` leaves no
/// observable mutation, and that concurrent `transact` calls serialize.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Run `f` atomically: every mutation commits together, or none do
    async fn transact<T, F>(&self, f: F) -> DomainResult<T>
    where
        T: Send,
        F: FnOnce(&mut dyn StoreTx) -> DomainResult<T> + Send;

    /// Run a read-only closure against a consistent snapshot
    async fn read<T, F>(&self, f: F) -> DomainResult<T>
    where
        T: Send,
        F: FnOnce(&dyn StoreTx) -> DomainResult<T> + Send;
}

#[derive(Default, Clone)]
struct StoreState {
    cars: HashMap<uuid::Uuid, Car>,
    customers: HashMap<uuid::Uuid, Customer>,
    vendors: HashMap<uuid::Uuid, Vendor>,
    reviews: HashMap<uuid::Uuid, Review>,
    bookings: HashMap<uuid::Uuid, Booking>,
    wallets: HashMap<uuid::Uuid, Wallet>,
    contacts: Vec<ContactMessage>,
}

fn newest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    rows
}

fn oldest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(key);
    rows
}

impl StoreTx for StoreState {
    fn car(&self, id: CarId) -> Option<Car> {
        self.cars.get(id.as_uuid()).cloned()
    }

    fn insert_car(&mut self, car: Car) {
        self.cars.insert(car.id().into(), car);
    }

    fn update_car(&mut self, car: Car) -> DomainResult<()> {
        let uid: uuid::Uuid = car.id().into();
        if !self.cars.contains_key(&uid) {
            return Err(DomainError::not_found("Car", uid));
        }
        self.cars.insert(uid, car);
        Ok(())
    }

    fn remove_car(&mut self, id: CarId) -> Option<Car> {
        self.cars.remove(id.as_uuid())
    }

    fn cars(&self) -> Vec<Car> {
        newest_first(self.cars.values().cloned().collect(), |c| c.created_at())
    }

    fn cars_for_vendor(&self, vendor_id: VendorId) -> Vec<Car> {
        newest_first(
            self.cars
                .values()
                .filter(|c| c.vendor_id == vendor_id)
                .cloned()
                .collect(),
            |c| c.created_at(),
        )
    }

    fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.customers.get(id.as_uuid()).cloned()
    }

    fn customer_by_email(&self, email: &str) -> Option<Customer> {
        self.customers.values().find(|c| c.email == email).cloned()
    }

    fn insert_customer(&mut self, customer: Customer) {
        self.customers.insert(customer.id().into(), customer);
    }

    fn update_customer(&mut self, customer: Customer) -> DomainResult<()> {
        let uid: uuid::Uuid = customer.id().into();
        if !self.customers.contains_key(&uid) {
            return Err(DomainError::not_found("Customer", uid));
        }
        self.customers.insert(uid, customer);
        Ok(())
    }

    fn remove_customer(&mut self, id: CustomerId) -> Option<Customer> {
        self.customers.remove(id.as_uuid())
    }

    fn customers(&self) -> Vec<Customer> {
        newest_first(self.customers.values().cloned().collect(), |c| {
            c.created_at()
        })
    }

    fn vendor(&self, id: VendorId) -> Option<Vendor> {
        self.vendors.get(id.as_uuid()).cloned()
    }

    fn vendor_by_email(&self, email: &str) -> Option<Vendor> {
        self.vendors.values().find(|v| v.email == email).cloned()
    }

    fn insert_vendor(&mut self, vendor: Vendor) {
        self.vendors.insert(vendor.id().into(), vendor);
    }

    fn update_vendor(&mut self, vendor: Vendor) -> DomainResult<()> {
        let uid: uuid::Uuid = vendor.id().into();
        if !self.vendors.contains_key(&uid) {
            return Err(DomainError::not_found("Vendor", uid));
        }
        self.vendors.insert(uid, vendor);
        Ok(())
    }

    fn remove_vendor(&mut self, id: VendorId) -> Option<Vendor> {
        self.vendors.remove(id.as_uuid())
    }

    fn vendors(&self) -> Vec<Vendor> {
        newest_first(self.vendors.values().cloned().collect(), |v| v.created_at())
    }

    fn review(&self, id: ReviewId) -> Option<Review> {
        self.reviews.get(id.as_uuid()).cloned()
    }

    fn review_by_customer_and_car(
        &self,
        customer_id: CustomerId,
        car_id: CarId,
    ) -> Option<Review> {
        self.reviews
            .values()
            .find(|r| r.customer_id == customer_id && r.car_id == car_id)
            .cloned()
    }

    fn insert_review(&mut self, review: Review) {
        self.reviews.insert(review.id().into(), review);
    }

    fn update_review(&mut self, review: Review) -> DomainResult<()> {
        let uid: uuid::Uuid = review.id().into();
        if !self.reviews.contains_key(&uid) {
            return Err(DomainError::not_found("Review", uid));
        }
        self.reviews.insert(uid, review);
        Ok(())
    }

    fn remove_review(&mut self, id: ReviewId) -> Option<Review> {
        self.reviews.remove(id.as_uuid())
    }

    fn reviews_for_car(&self, car_id: CarId) -> Vec<Review> {
        newest_first(
            self.reviews
                .values()
                .filter(|r| r.car_id == car_id)
                .cloned()
                .collect(),
            |r| r.created_at(),
        )
    }

    fn reviews_for_customer(&self, customer_id: CustomerId) -> Vec<Review> {
        newest_first(
            self.reviews
                .values()
                .filter(|r| r.customer_id == customer_id)
                .cloned()
                .collect(),
            |r| r.created_at(),
        )
    }

    fn booking(&self, id: BookingId) -> Option<Booking> {
        self.bookings.get(id.as_uuid()).cloned()
    }

    fn insert_booking(&mut self, booking: Booking) {
        self.bookings.insert(booking.id().into(), booking);
    }

    fn update_booking(&mut self, booking: Booking) -> DomainResult<()> {
        let uid: uuid::Uuid = booking.id().into();
        if !self.bookings.contains_key(&uid) {
            return Err(DomainError::not_found("Booking", uid));
        }
        self.bookings.insert(uid, booking);
        Ok(())
    }

    fn bookings_for_customer(&self, customer_id: CustomerId) -> Vec<Booking> {
        oldest_first(
            self.bookings
                .values()
                .filter(|b| b.customer_id == customer_id)
                .cloned()
                .collect(),
            |b| b.created_at(),
        )
    }

    fn bookings_for_car(&self, car_id: CarId) -> Vec<Booking> {
        oldest_first(
            self.bookings
                .values()
                .filter(|b| b.car_id == car_id)
                .cloned()
                .collect(),
            |b| b.created_at(),
        )
    }

    fn occupying_bookings_for_car(&self, car_id: CarId) -> Vec<Booking> {
        oldest_first(
            self.bookings
                .values()
                .filter(|b| b.car_id == car_id && b.is_active())
                .cloned()
                .collect(),
            |b| b.created_at(),
        )
    }

    fn wallet(&self, id: WalletId) -> Option<Wallet> {
        self.wallets.get(id.as_uuid()).cloned()
    }

    fn wallet_for_owner(&self, owner: &WalletOwner) -> Option<Wallet> {
        self.wallets.values().find(|w| w.owner() == owner).cloned()
    }

    fn insert_wallet(&mut self, wallet: Wallet) {
        self.wallets.insert(wallet.id().into(), wallet);
    }

    fn update_wallet(&mut self, wallet: Wallet) -> DomainResult<()> {
        let uid: uuid::Uuid = wallet.id().into();
        if !self.wallets.contains_key(&uid) {
            return Err(DomainError::not_found("Wallet", uid));
        }
        self.wallets.insert(uid, wallet);
        Ok(())
    }

    fn remove_wallet(&mut self, id: WalletId) -> Option<Wallet> {
        self.wallets.remove(id.as_uuid())
    }

    fn insert_contact(&mut self, message: ContactMessage) {
        self.contacts.push(message);
    }

    fn contacts(&self) -> Vec<ContactMessage> {
        self.contacts.clone()
    }
}

/// In-memory gateway implementation
///
/// One `RwLock` guards the whole store. `transact` clones the state, lets
/// the closure mutate the clone, and swaps the clone in only when the
/// closure succeeds, which gives both commit-or-rollback semantics and
/// serialization of concurrent writers.
#[derive(Default, Clone)]
pub struct InMemoryGateway {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryGateway {
    /// Create an empty gateway
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn transact<T, F>(&self, f: F) -> DomainResult<T>
    where
        T: Send,
        F: FnOnce(&mut dyn StoreTx) -> DomainResult<T> + Send,
    {
        let mut guard = self.state.write().unwrap();
        let mut work = guard.clone();
        let out = f(&mut work)?;
        *guard = work;
        Ok(out)
    }

    async fn read<T, F>(&self, f: F) -> DomainResult<T>
    where
        T: Send,
        F: FnOnce(&dyn StoreTx) -> DomainResult<T> + Send,
    {
        let guard = self.state.read().unwrap();
        f(&*guard)
    }
}
