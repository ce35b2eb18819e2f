// Copyright 2025 Cowboy AI, LLC.

//! Admin panel service
//!
//! Admins are operators configured out of band, not accounts in the store.
//! The service is a composition over the other services: moderation calls
//! delegate with an admin identity rather than reimplementing the rules.

use crate::accounts::{AccountService, Customer, Vendor};
use crate::catalog::{Car, CatalogService};
use crate::contact::{ContactMessage, ContactService};
use crate::errors::{DomainError, DomainResult};
use crate::gateway::PersistenceGateway;
use crate::identity::CallerIdentity;
use crate::review::{ReviewId, ReviewService};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Credentials of the configured admin operator
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Display name of the operator
    pub admin_name: String,
    admin_password: String,
}

impl AdminConfig {
    /// Build a config from explicit values
    pub fn new(admin_name: impl Into<String>, admin_password: impl Into<String>) -> Self {
        Self {
            admin_name: admin_name.into(),
            admin_password: admin_password.into(),
        }
    }

    /// Read the config from `ADMIN_NAME` and `ADMIN_PANEL_PASSWORD`
    pub fn from_env() -> DomainResult<Self> {
        let admin_name = std::env::var("ADMIN_NAME")
            .map_err(|_| DomainError::Internal("ADMIN_NAME is not set".to_string()))?;
        let admin_password = std::env::var("ADMIN_PANEL_PASSWORD")
            .map_err(|_| DomainError::Internal("ADMIN_PANEL_PASSWORD is not set".to_string()))?;
        Ok(Self {
            admin_name,
            admin_password,
        })
    }
}

/// Moderation and oversight operations, composed from the other services
pub struct AdminService<G> {
    config: AdminConfig,
    identity: CallerIdentity,
    catalog: Arc<CatalogService<G>>,
    accounts: Arc<AccountService<G>>,
    reviews: Arc<ReviewService<G>>,
    contact: Arc<ContactService<G>>,
}

impl<G: PersistenceGateway> AdminService<G> {
    /// Compose an admin service over the marketplace services
    pub fn new(
        config: AdminConfig,
        catalog: Arc<CatalogService<G>>,
        accounts: Arc<AccountService<G>>,
        reviews: Arc<ReviewService<G>>,
        contact: Arc<ContactService<G>>,
    ) -> Self {
        Self {
            config,
            identity: CallerIdentity::admin(Uuid::new_v4()),
            catalog,
            accounts,
            reviews,
            contact,
        }
    }

    /// Check the panel password, returning an admin identity on success
    pub fn login(&self, password: &str) -> DomainResult<CallerIdentity> {
        if password != self.config.admin_password {
            return Err(DomainError::forbidden("wrong admin password"));
        }
        info!(admin = %self.config.admin_name, "admin logged in");
        Ok(self.identity)
    }

    /// All listed cars with their count, newest first
    pub async fn all_cars(&self) -> DomainResult<(Vec<Car>, usize)> {
        let cars = self.catalog.all_cars().await?;
        let count = cars.len();
        Ok((cars, count))
    }

    /// All registered customers with their count, newest first
    pub async fn all_customers(&self) -> DomainResult<(Vec<Customer>, usize)> {
        let customers = self.accounts.all_customers().await?;
        let count = customers.len();
        Ok((customers, count))
    }

    /// All registered vendors with their count, newest first
    pub async fn all_vendors(&self) -> DomainResult<(Vec<Vendor>, usize)> {
        let vendors = self.accounts.all_vendors().await?;
        let count = vendors.len();
        Ok((vendors, count))
    }

    /// Remove a review regardless of its author
    pub async fn delete_review(&self, review_id: ReviewId) -> DomainResult<()> {
        self.reviews.delete_review(&self.identity, review_id).await
    }

    /// Delete whichever account is registered under `email`
    ///
    /// Subject to the same booking guard as self-service deletion.
    pub async fn delete_account(&self, email: &str) -> DomainResult<()> {
        self.accounts.delete_account(&self.identity, email).await
    }

    /// The support inbox, oldest first
    pub async fn support_inbox(&self) -> DomainResult<Vec<ContactMessage>> {
        self.contact.messages().await
    }
}
