// Copyright 2025 Cowboy AI, LLC.

//! Booking engine integration tests: atomic payment, overlap admission and
//! the cancellation/completion lifecycle.

mod support;

use pretty_assertions::assert_eq;
use rental_domain::booking::BookingState;
use rental_domain::identity::CallerIdentity;
use rental_domain::wallet::WalletOwner;
use std::sync::Arc;
use support::{day, Marketplace};

#[tokio::test]
async fn test_booking_moves_price_from_customer_to_vendor() {
    let market = Marketplace::new();
    let (customer, caller) = market.customer_with_funds("ada@example.com", 100).await;
    let (vendor, _, car) = market.vendor_with_car("cars@example.com", 30).await;

    let booking = market
        .bookings
        .create_booking(&caller, car.id(), day(0), day(2))
        .await
        .unwrap();

    assert_eq!(booking.total_price, 60);
    assert_eq!(booking.state(), BookingState::Active);
    assert_eq!(
        market.balance_of(WalletOwner::Customer(customer.id())).await,
        40
    );
    assert_eq!(
        market.balance_of(WalletOwner::Vendor(vendor.id())).await,
        60
    );

    let refreshed = market.catalog.get_car(car.id()).await.unwrap();
    assert!(refreshed.is_booked);
}

#[tokio::test]
async fn test_insufficient_funds_rolls_everything_back() {
    let market = Marketplace::new();
    let (customer, caller) = market.customer_with_funds("ada@example.com", 50).await;
    let (vendor, _, car) = market.vendor_with_car("cars@example.com", 30).await;

    let err = market
        .bookings
        .create_booking(&caller, car.id(), day(0), day(2))
        .await
        .unwrap_err();
    assert!(err.is_insufficient_funds());

    // no partial effects: balances untouched, no booking, car still free
    assert_eq!(
        market.balance_of(WalletOwner::Customer(customer.id())).await,
        50
    );
    assert_eq!(market.balance_of(WalletOwner::Vendor(vendor.id())).await, 0);
    assert!(market
        .bookings
        .occupying_bookings_for_car(car.id())
        .await
        .unwrap()
        .is_empty());
    assert!(!market.catalog.get_car(car.id()).await.unwrap().is_booked);
}

#[tokio::test]
async fn test_overlapping_booking_is_refused() {
    let market = Marketplace::new();
    let (_, first) = market.customer_with_funds("first@example.com", 200).await;
    let (_, second) = market.customer_with_funds("second@example.com", 200).await;
    let (_, _, car) = market.vendor_with_car("cars@example.com", 10).await;

    market
        .bookings
        .create_booking(&first, car.id(), day(0), day(3))
        .await
        .unwrap();

    let err = market
        .bookings
        .create_booking(&second, car.id(), day(2), day(5))
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // the refused customer was not charged
    let second_balance = market
        .balance_of(WalletOwner::Customer(second.customer_id().unwrap()))
        .await;
    assert_eq!(second_balance, 200);
}

#[tokio::test]
async fn test_back_to_back_bookings_are_admitted() {
    let market = Marketplace::new();
    let (_, first) = market.customer_with_funds("first@example.com", 200).await;
    let (_, second) = market.customer_with_funds("second@example.com", 200).await;
    let (_, _, car) = market.vendor_with_car("cars@example.com", 10).await;

    market
        .bookings
        .create_booking(&first, car.id(), day(0), day(3))
        .await
        .unwrap();
    // starts exactly when the first ends
    market
        .bookings
        .create_booking(&second, car.id(), day(3), day(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_bookings_admit_exactly_one() {
    let market = Marketplace::new();
    let (_, _, car) = market.vendor_with_car("cars@example.com", 10).await;
    let mut callers = Vec::new();
    for i in 0..8 {
        let (_, caller) = market
            .customer_with_funds(&format!("c{i}@example.com"), 100)
            .await;
        callers.push(caller);
    }

    let mut handles = Vec::new();
    for caller in callers {
        let bookings = Arc::clone(&market.bookings);
        let car_id = car.id();
        handles.push(tokio::spawn(async move {
            bookings.create_booking(&caller, car_id, day(0), day(2)).await
        }));
    }

    let mut admitted = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) if err.is_conflict() => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(admitted, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(
        market
            .bookings
            .occupying_bookings_for_car(car.id())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_cancellation_refunds_and_frees_the_car() {
    let market = Marketplace::new();
    let (customer, caller) = market.customer_with_funds("ada@example.com", 100).await;
    let (vendor, _, car) = market.vendor_with_car("cars@example.com", 25).await;

    let booking = market
        .bookings
        .create_booking(&caller, car.id(), day(0), day(2))
        .await
        .unwrap();
    let cancelled = market
        .bookings
        .cancel_booking(&caller, booking.id())
        .await
        .unwrap();

    assert_eq!(cancelled.state(), BookingState::Cancelled);
    assert_eq!(
        market.balance_of(WalletOwner::Customer(customer.id())).await,
        100
    );
    assert_eq!(market.balance_of(WalletOwner::Vendor(vendor.id())).await, 0);
    assert!(!market.catalog.get_car(car.id()).await.unwrap().is_booked);
}

#[tokio::test]
async fn test_cancellation_blocked_when_vendor_cannot_refund() {
    let market = Marketplace::new();
    let (_, caller) = market.customer_with_funds("ada@example.com", 100).await;
    let (vendor, vendor_caller, car) = market.vendor_with_car("cars@example.com", 25).await;

    let booking = market
        .bookings
        .create_booking(&caller, car.id(), day(0), day(2))
        .await
        .unwrap();

    // the vendor spends the payment before any cancellation
    let vendor_wallet = market
        .wallets
        .wallet_of(WalletOwner::Vendor(vendor.id()))
        .await
        .unwrap();
    market.wallets.debit(vendor_wallet.id(), 50).await.unwrap();

    let err = market
        .bookings
        .cancel_booking(&vendor_caller, booking.id())
        .await
        .unwrap_err();
    assert!(err.is_insufficient_funds());

    // the booking survives the failed cancellation
    let still = market.bookings.get_booking(booking.id()).await.unwrap();
    assert_eq!(still.state(), BookingState::Active);
}

#[tokio::test]
async fn test_completion_keeps_the_payment_with_the_vendor() {
    let market = Marketplace::new();
    let (customer, caller) = market.customer_with_funds("ada@example.com", 100).await;
    let (vendor, vendor_caller, car) = market.vendor_with_car("cars@example.com", 25).await;

    let booking = market
        .bookings
        .create_booking(&caller, car.id(), day(0), day(2))
        .await
        .unwrap();
    let completed = market
        .bookings
        .complete_booking(&vendor_caller, booking.id())
        .await
        .unwrap();

    assert_eq!(completed.state(), BookingState::Completed);
    assert_eq!(
        market.balance_of(WalletOwner::Customer(customer.id())).await,
        50
    );
    assert_eq!(market.balance_of(WalletOwner::Vendor(vendor.id())).await, 50);
    assert!(!market.catalog.get_car(car.id()).await.unwrap().is_booked);

    // completed bookings no longer block the dates
    let (_, other) = market.customer_with_funds("other@example.com", 100).await;
    market
        .bookings
        .create_booking(&other, car.id(), day(0), day(2))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cancelled_booking_cannot_be_cancelled_again() {
    let market = Marketplace::new();
    let (_, caller) = market.customer_with_funds("ada@example.com", 100).await;
    let (_, _, car) = market.vendor_with_car("cars@example.com", 25).await;

    let booking = market
        .bookings
        .create_booking(&caller, car.id(), day(0), day(2))
        .await
        .unwrap();
    market
        .bookings
        .cancel_booking(&caller, booking.id())
        .await
        .unwrap();

    let err = market
        .bookings
        .cancel_booking(&caller, booking.id())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        rental_domain::errors::DomainError::InvalidStateTransition { .. }
    ));
}

#[tokio::test]
async fn test_stranger_cannot_touch_a_booking() {
    let market = Marketplace::new();
    let (_, caller) = market.customer_with_funds("ada@example.com", 100).await;
    let (_, stranger) = market.customer_with_funds("eve@example.com", 0).await;
    let (_, _, car) = market.vendor_with_car("cars@example.com", 25).await;

    let booking = market
        .bookings
        .create_booking(&caller, car.id(), day(0), day(2))
        .await
        .unwrap();

    assert!(market
        .bookings
        .cancel_booking(&stranger, booking.id())
        .await
        .unwrap_err()
        .is_forbidden());
    assert!(market
        .bookings
        .complete_booking(&stranger, booking.id())
        .await
        .unwrap_err()
        .is_forbidden());
}

#[tokio::test]
async fn test_only_customers_can_book() {
    let market = Marketplace::new();
    let (_, vendor_caller, car) = market.vendor_with_car("cars@example.com", 25).await;

    let err = market
        .bookings
        .create_booking(&vendor_caller, car.id(), day(0), day(2))
        .await
        .unwrap_err();
    assert!(err.is_forbidden());
}

#[tokio::test]
async fn test_empty_date_range_is_rejected() {
    let market = Marketplace::new();
    let (_, caller) = market.customer_with_funds("ada@example.com", 100).await;
    let (_, _, car) = market.vendor_with_car("cars@example.com", 25).await;

    let err = market
        .bookings
        .create_booking(&caller, car.id(), day(2), day(2))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_booking_emits_created_event() {
    let market = Marketplace::new();
    let (_, caller) = market.customer_with_funds("ada@example.com", 100).await;
    let (_, _, car) = market.vendor_with_car("cars@example.com", 25).await;

    market
        .bookings
        .create_booking(&caller, car.id(), day(0), day(1))
        .await
        .unwrap();

    let published = market.events.published_event_types();
    assert!(published.contains(&"BookingCreated".to_string()));
}

#[tokio::test]
async fn test_unknown_customer_cannot_book() {
    let market = Marketplace::new();
    let (_, _, car) = market.vendor_with_car("cars@example.com", 25).await;
    let ghost = CallerIdentity::customer(rental_domain::accounts::CustomerId::new());

    let err = market
        .bookings
        .create_booking(&ghost, car.id(), day(0), day(1))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
