// Copyright 2025 Cowboy AI, LLC.

//! Error types for domain operations

use thiserror::Error;

/// Errors that can occur in domain operations
///
/// Every service operation returns one specific failure kind so that callers
/// (and the router that maps them to outward statuses) can branch on it.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound {
        /// Type of entity that wasn't found
        entity_type: &'static str,
        /// ID that was searched for
        id: String,
    },

    /// Conflict with existing state (duplicate review, overlapping booking,
    /// email already registered)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation error (bad rating, bad date range, zero amount)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wallet debit exceeds the available balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount the debit asked for
        requested: u64,
        /// Credit the wallet actually holds
        available: u64,
    },

    /// Caller is not authorized for this mutation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid booking state transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl DomainError {
    /// Create an `EntityNotFound` error for the given entity type and id
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        DomainError::EntityNotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a `Conflict` error
    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }

    /// Create a `Validation` error
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    /// Create a `Forbidden` error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::EntityNotFound { .. })
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Conflict(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Validation(_))
    }

    /// Check if this is an authorization error
    pub fn is_forbidden(&self) -> bool {
        matches!(self, DomainError::Forbidden(_))
    }

    /// Check if this is an insufficient funds error
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, DomainError::InsufficientFunds { .. })
    }
}
