// Copyright 2025 Cowboy AI, LLC.

//! Domain events for the rental marketplace
//!
//! Events represent facts that have occurred in the domain. Services publish
//! them after the owning transaction commits; a publish failure is logged,
//! never propagated, because the mutation has already happened.

use crate::accounts::{CustomerId, VendorId};
use crate::booking::BookingId;
use crate::catalog::CarId;
use crate::errors::DomainResult;
use crate::identity::Role;
use crate::review::ReviewId;
use crate::wallet::WalletId;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Get the aggregate ID this event relates to
    fn aggregate_id(&self) -> Uuid;

    /// Get the event type name
    fn event_type(&self) -> &'static str;

    /// Get the schema version
    fn version(&self) -> &'static str {
        "v1"
    }
}

/// Event publisher trait for services to emit events
pub trait EventPublisher: Send + Sync {
    /// Publish domain events
    fn publish(&self, events: Vec<Box<dyn DomainEvent>>) -> DomainResult<()>;
}

/// Mock event publisher for testing
///
/// Records only event type names to avoid cloning trait objects.
#[derive(Clone, Default)]
pub struct MockEventPublisher {
    published: Arc<RwLock<Vec<String>>>,
}

impl MockEventPublisher {
    /// Create a new mock event publisher for testing
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all published event type names for verification in tests
    pub fn published_event_types(&self) -> Vec<String> {
        self.published.read().unwrap().clone()
    }
}

impl EventPublisher for MockEventPublisher {
    fn publish(&self, events: Vec<Box<dyn DomainEvent>>) -> DomainResult<()> {
        let mut published = self.published.write().unwrap();
        for event in events {
            published.push(event.event_type().to_string());
        }
        Ok(())
    }
}

/// A booking was created and paid for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreated {
    /// The new booking
    pub booking_id: BookingId,
    /// The booked car
    pub car_id: CarId,
    /// The paying customer
    pub customer_id: CustomerId,
    /// The vendor who was credited
    pub vendor_id: VendorId,
    /// Price moved from customer to vendor
    pub total_price: u64,
}

impl DomainEvent for BookingCreated {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "BookingCreated"
    }
}

/// A booking was cancelled and the payment reversed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCancelled {
    /// The cancelled booking
    pub booking_id: BookingId,
    /// Amount refunded to the customer
    pub refund: u64,
}

impl DomainEvent for BookingCancelled {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "BookingCancelled"
    }
}

/// A booking ran its course; the payment stays with the vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCompleted {
    /// The completed booking
    pub booking_id: BookingId,
}

impl DomainEvent for BookingCompleted {
    fn aggregate_id(&self) -> Uuid {
        self.booking_id.into()
    }

    fn event_type(&self) -> &'static str {
        "BookingCompleted"
    }
}

/// A wallet was credited through the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCredited {
    /// The credited wallet
    pub wallet_id: WalletId,
    /// Amount added
    pub amount: u64,
    /// Balance after the credit
    pub balance: u64,
}

impl DomainEvent for WalletCredited {
    fn aggregate_id(&self) -> Uuid {
        self.wallet_id.into()
    }

    fn event_type(&self) -> &'static str {
        "WalletCredited"
    }
}

/// A wallet was debited through the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletDebited {
    /// The debited wallet
    pub wallet_id: WalletId,
    /// Amount removed
    pub amount: u64,
    /// Balance after the debit
    pub balance: u64,
}

impl DomainEvent for WalletDebited {
    fn aggregate_id(&self) -> Uuid {
        self.wallet_id.into()
    }

    fn event_type(&self) -> &'static str {
        "WalletDebited"
    }
}

/// A customer posted a review for a car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPosted {
    /// The new review
    pub review_id: ReviewId,
    /// The reviewed car
    pub car_id: CarId,
    /// The reviewing customer
    pub customer_id: CustomerId,
    /// The rating given
    pub rating: u8,
}

impl DomainEvent for ReviewPosted {
    fn aggregate_id(&self) -> Uuid {
        self.review_id.into()
    }

    fn event_type(&self) -> &'static str {
        "ReviewPosted"
    }
}

/// A review was removed, either by its author or by the admin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDeleted {
    /// The removed review
    pub review_id: ReviewId,
}

impl DomainEvent for ReviewDeleted {
    fn aggregate_id(&self) -> Uuid {
        self.review_id.into()
    }

    fn event_type(&self) -> &'static str {
        "ReviewDeleted"
    }
}

/// A vendor listed a car in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarListed {
    /// The listed car
    pub car_id: CarId,
    /// The owning vendor
    pub vendor_id: VendorId,
}

impl DomainEvent for CarListed {
    fn aggregate_id(&self) -> Uuid {
        self.car_id.into()
    }

    fn event_type(&self) -> &'static str {
        "CarListed"
    }
}

/// A car was removed from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarDelisted {
    /// The removed car
    pub car_id: CarId,
}

impl DomainEvent for CarDelisted {
    fn aggregate_id(&self) -> Uuid {
        self.car_id.into()
    }

    fn event_type(&self) -> &'static str {
        "CarDelisted"
    }
}

/// A customer or vendor account was registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRegistered {
    /// The new account's uid
    pub account_id: Uuid,
    /// Which kind of account was opened
    pub role: Role,
}

impl DomainEvent for AccountRegistered {
    fn aggregate_id(&self) -> Uuid {
        self.account_id
    }

    fn event_type(&self) -> &'static str {
        "AccountRegistered"
    }
}

/// A customer or vendor account was deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDeleted {
    /// The removed account's uid
    pub account_id: Uuid,
    /// Which kind of account it was
    pub role: Role,
}

impl DomainEvent for AccountDeleted {
    fn aggregate_id(&self) -> Uuid {
        self.account_id
    }

    fn event_type(&self) -> &'static str {
        "AccountDeleted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_publisher_records_event_types() {
        let publisher = MockEventPublisher::new();
        let events: Vec<Box<dyn DomainEvent>> = vec![
            Box::new(BookingCreated {
                booking_id: BookingId::new(),
                car_id: CarId::new(),
                customer_id: CustomerId::new(),
                vendor_id: VendorId::new(),
                total_price: 60,
            }),
            Box::new(BookingCancelled {
                booking_id: BookingId::new(),
                refund: 60,
            }),
        ];

        publisher.publish(events).unwrap();

        assert_eq!(
            publisher.published_event_types(),
            vec!["BookingCreated", "BookingCancelled"]
        );
    }

    #[test]
    fn test_event_carries_aggregate_id() {
        let booking_id = BookingId::new();
        let event = BookingCompleted { booking_id };

        assert_eq!(event.aggregate_id(), Uuid::from(booking_id));
        assert_eq!(event.event_type(), "BookingCompleted");
        assert_eq!(event.version(), "v1");
    }

    #[test]
    fn test_event_serializes() {
        let event = WalletDebited {
            wallet_id: WalletId::new(),
            amount: 30,
            balance: 70,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["amount"], 30);
        assert_eq!(json["balance"], 70);
    }
}
