// Copyright 2025 Cowboy AI, LLC.

//! Booking aggregate, its state machine and the booking engine
//!
//! A booking moves through Pending, Active, Completed and Cancelled.
//! Pending and Active bookings occupy their car: they block overlapping
//! bookings and keep the car's `is_booked` flag raised. Completed and
//! Cancelled are terminal.
//!
//! Creating a booking is one transaction: admission check against the
//! car's occupying bookings, debit of the customer's wallet, credit of the
//! vendor's wallet, activation and insert. If any step fails nothing
//! commits, so money and availability can never disagree.

use crate::entity::{DomainEntity, Entity, EntityId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{BookingCancelled, BookingCompleted, BookingCreated, EventPublisher};
use crate::gateway::{PersistenceGateway, StoreTx};
use crate::identity::CallerIdentity;
use crate::state_machine::{State, StateTransition, StateTransitions};
use crate::wallet::{credit_in_tx, debit_in_tx, WalletOwner};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::accounts::{CustomerId, VendorId};
use crate::catalog::CarId;

/// Marker type for booking identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingMarker;

/// Strongly-typed booking identifier
pub type BookingId = EntityId<BookingMarker>;

/// Lifecycle state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingState {
    /// Created but not yet paid for
    Pending,
    /// Paid for; the rental is in progress or upcoming
    Active,
    /// The rental ran its course
    Completed,
    /// The booking was cancelled and the payment reversed
    Cancelled,
}

impl State for BookingState {
    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl StateTransitions for BookingState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            Self::Pending => vec![Self::Active, Self::Cancelled],
            Self::Active => vec![Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => vec![],
        }
    }
}

/// A rental of one car by one customer over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    entity: Entity<BookingMarker>,
    /// The renting customer
    pub customer_id: CustomerId,
    /// The vendor who owns the car
    pub vendor_id: VendorId,
    /// The rented car
    pub car_id: CarId,
    /// Start of the rental period
    pub start_date: DateTime<Utc>,
    /// End of the rental period, exclusive
    pub end_date: DateTime<Utc>,
    /// Price paid, in whole credits
    pub total_price: u64,
    state: BookingState,
    transitions: Vec<StateTransition<BookingState>>,
}

impl Booking {
    /// Create a pending booking
    pub fn new(
        customer_id: CustomerId,
        vendor_id: VendorId,
        car_id: CarId,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        total_price: u64,
    ) -> Self {
        Self {
            entity: Entity::new(),
            customer_id,
            vendor_id,
            car_id,
            start_date,
            end_date,
            total_price,
            state: BookingState::Pending,
            transitions: Vec::new(),
        }
    }

    /// Price for renting at `price_per_day` over the given range
    ///
    /// The range must be non-empty. A range shorter than a day is charged
    /// as one day.
    pub fn quote(
        price_per_day: u64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> DomainResult<u64> {
        if end_date <= start_date {
            return Err(DomainError::validation(
                "booking end date must be after the start date",
            ));
        }
        let days = (end_date - start_date).num_days().max(1) as u64;
        price_per_day
            .checked_mul(days)
            .ok_or_else(|| DomainError::validation("total price would overflow"))
    }

    /// The booking's identifier
    pub fn id(&self) -> BookingId {
        self.entity.id
    }

    /// When the booking was made
    pub fn created_at(&self) -> DateTime<Utc> {
        self.entity.created_at
    }

    /// The current lifecycle state
    pub fn state(&self) -> BookingState {
        self.state
    }

    /// Whether this booking still occupies its car (pending or active)
    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Whether this booking's period overlaps the given half-open range
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_date < end && start < self.end_date
    }

    /// The recorded state transitions, oldest first
    pub fn transitions(&self) -> &[StateTransition<BookingState>] {
        &self.transitions
    }

    /// Move to Active
    pub fn activate(&mut self) -> DomainResult<()> {
        self.apply_transition(BookingState::Active)
    }

    /// Move to Completed
    pub fn complete(&mut self) -> DomainResult<()> {
        self.apply_transition(BookingState::Completed)
    }

    /// Move to Cancelled
    pub fn cancel(&mut self) -> DomainResult<()> {
        self.apply_transition(BookingState::Cancelled)
    }

    fn apply_transition(&mut self, target: BookingState) -> DomainResult<()> {
        let record = self.state.transition_to(target)?;
        self.transitions.push(record);
        self.entity.touch();
        Ok(())
    }
}

impl DomainEntity for Booking {
    type IdType = BookingMarker;

    fn id(&self) -> EntityId<Self::IdType> {
        self.entity.id
    }
}

/// Service that admits, cancels and completes bookings
pub struct BookingEngine<G> {
    gateway: Arc<G>,
    events: Arc<dyn EventPublisher>,
}

impl<G: PersistenceGateway> BookingEngine<G> {
    /// Create a booking engine backed by the given gateway
    pub fn new(gateway: Arc<G>, events: Arc<dyn EventPublisher>) -> Self {
        Self { gateway, events }
    }

    /// Book a car for the calling customer over a date range
    ///
    /// Fails with `Conflict` when the range overlaps an occupying booking
    /// of the same car, and with `InsufficientFunds` when the customer's
    /// wallet does not cover the price. Either failure rolls the whole
    /// attempt back.
    pub async fn create_booking(
        &self,
        caller: &CallerIdentity,
        car_id: CarId,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let customer_id = caller
            .customer_id()
            .ok_or_else(|| DomainError::forbidden("only customers can book cars"))?;
        if end_date <= start_date {
            return Err(DomainError::validation(
                "booking end date must be after the start date",
            ));
        }

        let booking = self
            .gateway
            .transact(move |tx| {
                tx.customer(customer_id)
                    .ok_or_else(|| DomainError::not_found("Customer", customer_id))?;
                let mut car = tx
                    .car(car_id)
                    .ok_or_else(|| DomainError::not_found("Car", car_id))?;

                let taken = tx
                    .occupying_bookings_for_car(car_id)
                    .iter()
                    .any(|b| b.overlaps(start_date, end_date));
                if taken {
                    return Err(DomainError::conflict(
                        "car is already booked for an overlapping period",
                    ));
                }

                let total_price = Booking::quote(car.price_per_day, start_date, end_date)?;

                let customer_wallet = tx
                    .wallet_for_owner(&WalletOwner::Customer(customer_id))
                    .ok_or_else(|| DomainError::not_found("Wallet", customer_id))?;
                let vendor_wallet = tx
                    .wallet_for_owner(&WalletOwner::Vendor(car.vendor_id))
                    .ok_or_else(|| DomainError::not_found("Wallet", car.vendor_id))?;
                debit_in_tx(tx, customer_wallet.id(), total_price)?;
                credit_in_tx(tx, vendor_wallet.id(), total_price)?;

                let mut booking = Booking::new(
                    customer_id,
                    car.vendor_id,
                    car_id,
                    start_date,
                    end_date,
                    total_price,
                );
                booking.activate()?;
                tx.insert_booking(booking.clone());

                car.is_booked = true;
                car.touch();
                tx.update_car(car)?;

                Ok(booking)
            })
            .await?;

        info!(
            booking_id = %booking.id(),
            %car_id,
            %customer_id,
            total_price = booking.total_price,
            "booking created"
        );
        self.publish(Box::new(BookingCreated {
            booking_id: booking.id(),
            car_id,
            customer_id,
            vendor_id: booking.vendor_id,
            total_price: booking.total_price,
        }));
        Ok(booking)
    }

    /// Cancel a booking and reverse its payment
    ///
    /// The refund moves the full price back from the vendor's wallet to the
    /// customer's. A vendor wallet that no longer covers the refund blocks
    /// the cancellation with `InsufficientFunds`.
    pub async fn cancel_booking(
        &self,
        caller: &CallerIdentity,
        booking_id: BookingId,
    ) -> DomainResult<Booking> {
        let caller = *caller;
        let booking = self
            .gateway
            .transact(move |tx| {
                let mut booking = tx
                    .booking(booking_id)
                    .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
                authorize_party(&caller, &booking)?;

                let customer_wallet = tx
                    .wallet_for_owner(&WalletOwner::Customer(booking.customer_id))
                    .ok_or_else(|| DomainError::not_found("Wallet", booking.customer_id))?;
                let vendor_wallet = tx
                    .wallet_for_owner(&WalletOwner::Vendor(booking.vendor_id))
                    .ok_or_else(|| DomainError::not_found("Wallet", booking.vendor_id))?;

                booking.cancel()?;
                debit_in_tx(tx, vendor_wallet.id(), booking.total_price)?;
                credit_in_tx(tx, customer_wallet.id(), booking.total_price)?;
                tx.update_booking(booking.clone())?;
                sync_car_flag(tx, booking.car_id)?;
                Ok(booking)
            })
            .await?;

        info!(
            %booking_id,
            refund = booking.total_price,
            "booking cancelled"
        );
        self.publish(Box::new(BookingCancelled {
            booking_id,
            refund: booking.total_price,
        }));
        Ok(booking)
    }

    /// Mark an active booking as completed; the vendor keeps the payment
    pub async fn complete_booking(
        &self,
        caller: &CallerIdentity,
        booking_id: BookingId,
    ) -> DomainResult<Booking> {
        let caller = *caller;
        let booking = self
            .gateway
            .transact(move |tx| {
                let mut booking = tx
                    .booking(booking_id)
                    .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
                authorize_party(&caller, &booking)?;
                booking.complete()?;
                tx.update_booking(booking.clone())?;
                sync_car_flag(tx, booking.car_id)?;
                Ok(booking)
            })
            .await?;

        info!(%booking_id, "booking completed");
        self.publish(Box::new(BookingCompleted { booking_id }));
        Ok(booking)
    }

    /// Fetch a single booking
    pub async fn get_booking(&self, booking_id: BookingId) -> DomainResult<Booking> {
        self.gateway
            .read(move |tx| {
                tx.booking(booking_id)
                    .ok_or_else(|| DomainError::not_found("Booking", booking_id))
            })
            .await
    }

    /// A customer's bookings, oldest first
    pub async fn bookings_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> DomainResult<Vec<Booking>> {
        self.gateway
            .read(move |tx| Ok(tx.bookings_for_customer(customer_id)))
            .await
    }

    /// The bookings currently occupying a car, oldest first
    pub async fn occupying_bookings_for_car(&self, car_id: CarId) -> DomainResult<Vec<Booking>> {
        self.gateway
            .read(move |tx| Ok(tx.occupying_bookings_for_car(car_id)))
            .await
    }

    fn publish(&self, event: Box<dyn crate::events::DomainEvent>) {
        if let Err(err) = self.events.publish(vec![event]) {
            warn!(error = %err, "failed to publish booking event");
        }
    }
}

/// Recompute a car's `is_booked` flag from its occupying bookings
fn sync_car_flag(tx: &mut dyn StoreTx, car_id: CarId) -> DomainResult<()> {
    if let Some(mut car) = tx.car(car_id) {
        let occupied = !tx.occupying_bookings_for_car(car_id).is_empty();
        if car.is_booked != occupied {
            car.is_booked = occupied;
            car.touch();
            tx.update_car(car)?;
        }
    }
    Ok(())
}

fn authorize_party(caller: &CallerIdentity, booking: &Booking) -> DomainResult<()> {
    if caller.is_admin()
        || caller.customer_id() == Some(booking.customer_id)
        || caller.vendor_id() == Some(booking.vendor_id)
    {
        return Ok(());
    }
    Err(DomainError::forbidden(
        "only the booking's customer, the car's vendor or an admin may do this",
    ))
}
