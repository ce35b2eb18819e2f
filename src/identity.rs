// Copyright 2025 Cowboy AI, LLC.

//! Caller identity resolved by the external identity provider
//!
//! Authentication (token issuance and verification) happens outside this
//! crate. Services receive an already-resolved [`CallerIdentity`] and only
//! decide whether that caller may perform the requested operation.

use crate::accounts::{CustomerId, VendorId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// A customer browsing and booking vehicles
    Customer,
    /// A vendor listing vehicles
    Vendor,
    /// The marketplace operator
    Admin,
}

/// An authenticated caller: who they are and what role they act in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// The caller's account id (customer or vendor uid; operator uid for Admin)
    pub user_id: Uuid,
    /// The role the identity provider resolved for this credential
    pub role: Role,
}

impl CallerIdentity {
    /// Identity of a customer
    pub fn customer(id: CustomerId) -> Self {
        Self {
            user_id: id.into(),
            role: Role::Customer,
        }
    }

    /// Identity of a vendor
    pub fn vendor(id: VendorId) -> Self {
        Self {
            user_id: id.into(),
            role: Role::Vendor,
        }
    }

    /// Identity of the admin operator
    pub fn admin(id: Uuid) -> Self {
        Self {
            user_id: id,
            role: Role::Admin,
        }
    }

    /// Whether this caller acts as admin
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The caller's customer id, when acting as a customer
    pub fn customer_id(&self) -> Option<CustomerId> {
        match self.role {
            Role::Customer => Some(CustomerId::from_uuid(self.user_id)),
            _ => None,
        }
    }

    /// The caller's vendor id, when acting as a vendor
    pub fn vendor_id(&self) -> Option<VendorId> {
        match self.role {
            Role::Vendor => Some(VendorId::from_uuid(self.user_id)),
            _ => None,
        }
    }
}
