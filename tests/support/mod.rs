// Copyright 2025 Cowboy AI, LLC.

//! Shared fixture for the integration tests: a fully wired marketplace on
//! the in-memory gateway, plus builders for the recurring test data.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use rental_domain::accounts::{AccountService, Customer, CustomerDraft, Vendor, VendorDraft};
use rental_domain::booking::BookingEngine;
use rental_domain::catalog::{Car, CarDraft, CatalogService};
use rental_domain::contact::ContactService;
use rental_domain::events::MockEventPublisher;
use rental_domain::gateway::InMemoryGateway;
use rental_domain::identity::CallerIdentity;
use rental_domain::review::ReviewService;
use rental_domain::wallet::{WalletLedger, WalletOwner};
use std::sync::Arc;

pub struct Marketplace {
    pub gateway: Arc<InMemoryGateway>,
    pub events: Arc<MockEventPublisher>,
    pub accounts: AccountService<InMemoryGateway>,
    pub catalog: CatalogService<InMemoryGateway>,
    pub bookings: Arc<BookingEngine<InMemoryGateway>>,
    pub reviews: Arc<ReviewService<InMemoryGateway>>,
    pub wallets: Arc<WalletLedger<InMemoryGateway>>,
    pub contact: ContactService<InMemoryGateway>,
}

impl Marketplace {
    pub fn new() -> Self {
        let gateway = Arc::new(InMemoryGateway::new());
        let events = Arc::new(MockEventPublisher::new());
        let publisher: Arc<dyn rental_domain::events::EventPublisher> = events.clone();
        Self {
            accounts: AccountService::new(gateway.clone(), publisher.clone()),
            catalog: CatalogService::new(gateway.clone(), publisher.clone()),
            bookings: Arc::new(BookingEngine::new(gateway.clone(), publisher.clone())),
            reviews: Arc::new(ReviewService::new(gateway.clone(), publisher.clone())),
            wallets: Arc::new(WalletLedger::new(gateway.clone(), publisher)),
            contact: ContactService::new(gateway.clone()),
            gateway,
            events,
        }
    }

    /// Register a customer and top their wallet up to `credits`
    pub async fn customer_with_funds(&self, email: &str, credits: u64) -> (Customer, CallerIdentity) {
        let customer = self
            .accounts
            .register_customer(customer_draft(email))
            .await
            .expect("customer registration");
        if credits > 0 {
            let wallet = self
                .wallets
                .wallet_of(WalletOwner::Customer(customer.id()))
                .await
                .expect("customer wallet");
            self.wallets
                .credit(wallet.id(), credits)
                .await
                .expect("top-up");
        }
        let caller = CallerIdentity::customer(customer.id());
        (customer, caller)
    }

    /// Register a vendor and list one car at `price_per_day`
    pub async fn vendor_with_car(
        &self,
        email: &str,
        price_per_day: u64,
    ) -> (Vendor, CallerIdentity, Car) {
        let vendor = self
            .accounts
            .register_vendor(vendor_draft(email))
            .await
            .expect("vendor registration");
        let caller = CallerIdentity::vendor(vendor.id());
        let car = self
            .catalog
            .add_car(&caller, car_draft(price_per_day))
            .await
            .expect("car listing");
        (vendor, caller, car)
    }

    /// Balance of an account's wallet
    pub async fn balance_of(&self, owner: WalletOwner) -> u64 {
        self.wallets
            .wallet_of(owner)
            .await
            .expect("wallet lookup")
            .balance()
    }
}

pub fn customer_draft(email: &str) -> CustomerDraft {
    CustomerDraft {
        email: email.to_string(),
        password_hash: "argon2-hash".to_string(),
        phone_no: "0300-1234567".to_string(),
        first_name: "Test".to_string(),
        last_name: "Customer".to_string(),
    }
}

pub fn vendor_draft(email: &str) -> VendorDraft {
    VendorDraft {
        email: email.to_string(),
        password_hash: "argon2-hash".to_string(),
        phone_no: "0300-7654321".to_string(),
        first_name: Some("Test".to_string()),
        last_name: Some("Vendor".to_string()),
        business_name: None,
        is_business: false,
    }
}

pub fn car_draft(price_per_day: u64) -> CarDraft {
    CarDraft {
        car_name: "Corolla".to_string(),
        image_url: "https://img.example/corolla.png".to_string(),
        model_year: "2021".to_string(),
        brand: "Toyota".to_string(),
        car_category: "Sedan".to_string(),
        engine_size: "1.8L".to_string(),
        fuel_type: "Petrol".to_string(),
        seating_capacity: 5,
        price_per_day,
        registration_no: "LEB-1234".to_string(),
        transmission: "Automatic".to_string(),
    }
}

/// `days` from a fixed anchor, for readable date ranges
pub fn day(days: i64) -> DateTime<Utc> {
    static ANCHOR: std::sync::OnceLock<DateTime<Utc>> = std::sync::OnceLock::new();
    *ANCHOR.get_or_init(Utc::now) + Duration::days(days)
}
