// Copyright 2025 Cowboy AI, LLC.

//! Car aggregate and the vehicle catalog service
//!
//! Vendors list cars for rent; customers browse them. The `is_booked` flag
//! on a car is a derived convenience for listings, recomputed from the
//! car's occupying bookings whenever those change. Admission of a new
//! booking never consults the flag, only the bookings themselves.

use crate::entity::{DomainEntity, Entity, EntityId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{CarDelisted, CarListed, EventPublisher};
use crate::gateway::PersistenceGateway;
use crate::identity::CallerIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::accounts::VendorId;

/// Marker type for car identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarMarker;

/// Strongly-typed car identifier
pub type CarId = EntityId<CarMarker>;

/// A vehicle listed for rent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    entity: Entity<CarMarker>,
    /// The vendor who listed this car
    pub vendor_id: VendorId,
    /// Display name of the vehicle
    pub car_name: String,
    /// URL of the listing photo
    pub image_url: String,
    /// Model year, as entered by the vendor
    pub model_year: String,
    /// Manufacturer brand
    pub brand: String,
    /// Listing category, e.g. Sedan or SUV
    pub car_category: String,
    /// Engine displacement description
    pub engine_size: String,
    /// Fuel type description
    pub fuel_type: String,
    /// Number of seats, at least one
    pub seating_capacity: u32,
    /// Rental price per day in whole credits
    pub price_per_day: u64,
    /// Licence plate or registration number
    pub registration_no: String,
    /// Transmission description
    pub transmission: String,
    /// Derived flag: true while any pending or active booking holds the car
    pub is_booked: bool,
}

/// Fields a vendor supplies when listing a car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarDraft {
    /// Display name of the vehicle
    pub car_name: String,
    /// URL of the listing photo
    pub image_url: String,
    /// Model year
    pub model_year: String,
    /// Manufacturer brand
    pub brand: String,
    /// Listing category
    pub car_category: String,
    /// Engine displacement description
    pub engine_size: String,
    /// Fuel type description
    pub fuel_type: String,
    /// Number of seats
    pub seating_capacity: u32,
    /// Rental price per day in whole credits
    pub price_per_day: u64,
    /// Licence plate or registration number
    pub registration_no: String,
    /// Transmission description
    pub transmission: String,
}

/// Fields a vendor may change on an existing listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CarUpdate {
    /// New display name
    pub car_name: Option<String>,
    /// New listing photo
    pub image_url: Option<String>,
    /// New daily price
    pub price_per_day: Option<u64>,
    /// New listing category
    pub car_category: Option<String>,
    /// New seat count
    pub seating_capacity: Option<u32>,
}

impl Car {
    /// Create a listing from a vendor's draft
    pub fn new(vendor_id: VendorId, draft: CarDraft) -> DomainResult<Self> {
        if draft.car_name.trim().is_empty() {
            return Err(DomainError::validation("car name must not be empty"));
        }
        if draft.seating_capacity == 0 {
            return Err(DomainError::validation(
                "seating capacity must be at least one",
            ));
        }
        Ok(Self {
            entity: Entity::new(),
            vendor_id,
            car_name: draft.car_name,
            image_url: draft.image_url,
            model_year: draft.model_year,
            brand: draft.brand,
            car_category: draft.car_category,
            engine_size: draft.engine_size,
            fuel_type: draft.fuel_type,
            seating_capacity: draft.seating_capacity,
            price_per_day: draft.price_per_day,
            registration_no: draft.registration_no,
            transmission: draft.transmission,
            is_booked: false,
        })
    }

    /// The car's identifier
    pub fn id(&self) -> CarId {
        self.entity.id
    }

    /// When the listing was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.entity.created_at
    }

    /// When the listing was last modified
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.entity.updated_at
    }

    /// Apply a partial update, bumping the modification time
    pub fn apply(&mut self, update: CarUpdate) -> DomainResult<()> {
        if let Some(name) = update.car_name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("car name must not be empty"));
            }
            self.car_name = name;
        }
        if let Some(url) = update.image_url {
            self.image_url = url;
        }
        if let Some(price) = update.price_per_day {
            self.price_per_day = price;
        }
        if let Some(category) = update.car_category {
            self.car_category = category;
        }
        if let Some(seats) = update.seating_capacity {
            if seats == 0 {
                return Err(DomainError::validation(
                    "seating capacity must be at least one",
                ));
            }
            self.seating_capacity = seats;
        }
        self.entity.touch();
        Ok(())
    }

    pub(crate) fn touch(&mut self) {
        self.entity.touch();
    }
}

impl DomainEntity for Car {
    type IdType = CarMarker;

    fn id(&self) -> EntityId<Self::IdType> {
        self.entity.id
    }
}

/// Service for listing, browsing and maintaining cars
pub struct CatalogService<G> {
    gateway: Arc<G>,
    events: Arc<dyn EventPublisher>,
}

impl<G: PersistenceGateway> CatalogService<G> {
    /// Create a catalog backed by the given gateway
    pub fn new(gateway: Arc<G>, events: Arc<dyn EventPublisher>) -> Self {
        Self { gateway, events }
    }

    /// List a new car on behalf of the calling vendor
    pub async fn add_car(
        &self,
        caller: &CallerIdentity,
        draft: CarDraft,
    ) -> DomainResult<Car> {
        let vendor_id = caller
            .vendor_id()
            .ok_or_else(|| DomainError::forbidden("only vendors can list cars"))?;
        let car = Car::new(vendor_id, draft)?;
        let stored = car.clone();
        self.gateway
            .transact(move |tx| {
                tx.vendor(vendor_id)
                    .ok_or_else(|| DomainError::not_found("Vendor", vendor_id))?;
                tx.insert_car(stored);
                Ok(())
            })
            .await?;
        info!(car_id = %car.id(), %vendor_id, "car listed");
        self.publish(Box::new(CarListed {
            car_id: car.id(),
            vendor_id,
        }));
        Ok(car)
    }

    /// Fetch a single listing
    pub async fn get_car(&self, car_id: CarId) -> DomainResult<Car> {
        self.gateway
            .read(move |tx| {
                tx.car(car_id)
                    .ok_or_else(|| DomainError::not_found("Car", car_id))
            })
            .await
    }

    /// All listings, newest first
    pub async fn all_cars(&self) -> DomainResult<Vec<Car>> {
        self.gateway.read(|tx| Ok(tx.cars())).await
    }

    /// Listings owned by one vendor, newest first
    pub async fn cars_for_vendor(&self, vendor_id: VendorId) -> DomainResult<Vec<Car>> {
        self.gateway
            .read(move |tx| Ok(tx.cars_for_vendor(vendor_id)))
            .await
    }

    /// Update a listing; only the owning vendor or an admin may
    pub async fn update_car(
        &self,
        caller: &CallerIdentity,
        car_id: CarId,
        update: CarUpdate,
    ) -> DomainResult<Car> {
        let caller = *caller;
        let car = self
            .gateway
            .transact(move |tx| {
                let mut car = tx
                    .car(car_id)
                    .ok_or_else(|| DomainError::not_found("Car", car_id))?;
                authorize_owner(&caller, car.vendor_id)?;
                car.apply(update)?;
                tx.update_car(car.clone())?;
                Ok(car)
            })
            .await?;
        info!(%car_id, "car updated");
        Ok(car)
    }

    /// Remove a listing; only the owning vendor or an admin may
    ///
    /// Refused while a pending or active booking holds the car. Reviews of
    /// the car are removed with it; historical bookings are kept.
    pub async fn remove_car(&self, caller: &CallerIdentity, car_id: CarId) -> DomainResult<()> {
        let caller = *caller;
        self.gateway
            .transact(move |tx| {
                let car = tx
                    .car(car_id)
                    .ok_or_else(|| DomainError::not_found("Car", car_id))?;
                authorize_owner(&caller, car.vendor_id)?;
                if !tx.occupying_bookings_for_car(car_id).is_empty() {
                    return Err(DomainError::conflict(
                        "car has a pending or active booking",
                    ));
                }
                for review in tx.reviews_for_car(car_id) {
                    tx.remove_review(review.id());
                }
                tx.remove_car(car_id);
                Ok(())
            })
            .await?;
        info!(%car_id, "car delisted");
        self.publish(Box::new(CarDelisted { car_id }));
        Ok(())
    }

    fn publish(&self, event: Box<dyn crate::events::DomainEvent>) {
        if let Err(err) = self.events.publish(vec![event]) {
            warn!(error = %err, "failed to publish catalog event");
        }
    }
}

fn authorize_owner(caller: &CallerIdentity, owner: VendorId) -> DomainResult<()> {
    if caller.is_admin() || caller.vendor_id() == Some(owner) {
        return Ok(());
    }
    Err(DomainError::forbidden(
        "only the owning vendor or an admin may modify this car",
    ))
}
