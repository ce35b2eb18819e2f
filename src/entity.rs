//! Entity types with identity and lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// A generic entity with a typed ID
///
/// Entities are domain objects with identity that persists across time.
/// They have a lifecycle with creation and update timestamps.
///
/// # Examples
///
/// ```rust
/// use rental_domain::{Entity, EntityId};
///
/// // Define a domain entity type
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// struct Car;
///
/// // Create a new car entity
/// let car = Entity::<Car>::new();
/// assert_eq!(car.created_at, car.updated_at);
///
/// // Create with a specific ID
/// let id = EntityId::<Car>::new();
/// let car = Entity::with_id(id);
/// assert_eq!(car.id, id);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity<T> {
    /// The unique identifier for this entity
    pub id: EntityId<T>,
    /// When this entity was created
    pub created_at: DateTime<Utc>,
    /// When this entity was last updated
    pub updated_at: DateTime<Utc>,
}

impl<T> Entity<T> {
    /// Create a new entity with a generated ID
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an entity with a specific ID
    pub fn with_id(id: EntityId<T>) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the entity's timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl<T> Default for Entity<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A typed entity ID using phantom types for type safety
///
/// These IDs are globally unique and persistent. The phantom type
/// parameter ensures that IDs for different entity types cannot be
/// mixed up at compile time.
///
/// # Examples
///
/// ```rust
/// use rental_domain::EntityId;
///
/// struct Customer;
/// struct Vendor;
///
/// let customer_id = EntityId::<Customer>::new();
/// let vendor_id = EntityId::<Vendor>::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: EntityId<Customer> = vendor_id; // ERROR!
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> From<&EntityId<T>> for Uuid {
    fn from(id: &EntityId<T>) -> Self {
        id.id
    }
}

/// Trait for domain entities with identity
pub trait DomainEntity: Sized + Send + Sync {
    /// The marker type for this entity
    type IdType;

    /// Get the entity's ID
    fn id(&self) -> EntityId<Self::IdType>;
}
