// Copyright 2025 Cowboy AI, LLC.

//! Domain layer of a vehicle rental marketplace
//!
//! Customers book vendors' cars and pay from credit wallets; vendors list
//! cars and receive the payments; admins moderate. This crate holds the
//! aggregates, services and invariants. HTTP handlers, authentication and
//! the real database live outside it and talk to it through
//! [`gateway::PersistenceGateway`] and the service types.
//!
//! The load-bearing guarantees:
//!
//! - Wallet balances are unsigned and change only through fallible
//!   credit/debit operations, so no balance ever goes negative.
//! - A booking's payment, admission check and state change share one
//!   transaction, so money movement and car availability never disagree.
//! - A car never has two pending-or-active bookings over overlapping
//!   dates.
//! - A customer reviews a car at most once, and only after renting it.
//!
//! # Example
//!
//! ```
//! use rental_domain::accounts::{AccountService, CustomerDraft};
//! use rental_domain::events::MockEventPublisher;
//! use rental_domain::gateway::InMemoryGateway;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> rental_domain::errors::DomainResult<()> {
//! let gateway = Arc::new(InMemoryGateway::new());
//! let events = Arc::new(MockEventPublisher::new());
//! let accounts = AccountService::new(gateway.clone(), events);
//!
//! let customer = accounts
//!     .register_customer(CustomerDraft {
//!         email: "ada@example.com".to_string(),
//!         password_hash: "argon2-hash".to_string(),
//!         phone_no: "0300-1234567".to_string(),
//!         first_name: "Ada".to_string(),
//!         last_name: "Lovelace".to_string(),
//!     })
//!     .await?;
//! assert_eq!(customer.email, "ada@example.com");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod accounts;
pub mod admin;
pub mod booking;
pub mod catalog;
pub mod contact;
pub mod entity;
pub mod errors;
pub mod events;
pub mod gateway;
pub mod identity;
pub mod review;
pub mod state_machine;
pub mod wallet;

pub use accounts::{AccountService, Customer, CustomerId, Vendor, VendorId};
pub use admin::{AdminConfig, AdminService};
pub use booking::{Booking, BookingEngine, BookingId, BookingState};
pub use catalog::{Car, CarId, CatalogService};
pub use contact::{ContactMessage, ContactService};
pub use entity::{DomainEntity, Entity, EntityId};
pub use errors::{DomainError, DomainResult};
pub use events::{DomainEvent, EventPublisher};
pub use gateway::{InMemoryGateway, PersistenceGateway, StoreTx};
pub use identity::{CallerIdentity, Role};
pub use review::{Review, ReviewId, ReviewService};
pub use state_machine::{State, StateTransition, StateTransitions};
pub use wallet::{Wallet, WalletId, WalletLedger, WalletOwner};
