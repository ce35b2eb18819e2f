// Copyright 2025 Cowboy AI, LLC.

//! Review aggregate and the review service
//!
//! A customer may review a car only after booking it, and at most once per
//! car. Authorship comes from the authenticated caller, never from the
//! request body, so a customer cannot post or edit reviews as someone else.

use crate::entity::{DomainEntity, Entity, EntityId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{EventPublisher, ReviewDeleted, ReviewPosted};
use crate::gateway::PersistenceGateway;
use crate::identity::CallerIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::accounts::CustomerId;
use crate::booking::BookingState;
use crate::catalog::CarId;

/// Ratings run from one to five stars
pub const MIN_RATING: u8 = 1;
/// Ratings run from one to five stars
pub const MAX_RATING: u8 = 5;

/// Marker type for review identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewMarker;

/// Strongly-typed review identifier
pub type ReviewId = EntityId<ReviewMarker>;

/// A customer's rating of a car they rented
///
/// The rating field is private so that the one-to-five bound holds for
/// every reachable `Review` value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    entity: Entity<ReviewMarker>,
    /// The reviewing customer
    pub customer_id: CustomerId,
    /// The reviewed car
    pub car_id: CarId,
    rating: u8,
    /// Free-text body, optional
    pub review_text: Option<String>,
}

/// Fields supplied when posting a review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDraft {
    /// Star rating, one to five
    pub rating: u8,
    /// Free-text body, optional
    pub review_text: Option<String>,
}

/// Fields an author may change on their review
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewUpdate {
    /// New star rating
    pub rating: Option<u8>,
    /// New body text
    pub review_text: Option<String>,
}

fn validate_rating(rating: u8) -> DomainResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(DomainError::validation(format!(
            "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(())
}

impl Review {
    /// Create a review, enforcing the rating bounds
    pub fn new(customer_id: CustomerId, car_id: CarId, draft: ReviewDraft) -> DomainResult<Self> {
        validate_rating(draft.rating)?;
        Ok(Self {
            entity: Entity::new(),
            customer_id,
            car_id,
            rating: draft.rating,
            review_text: draft.review_text,
        })
    }

    /// The review's identifier
    pub fn id(&self) -> ReviewId {
        self.entity.id
    }

    /// When the review was posted
    pub fn created_at(&self) -> DateTime<Utc> {
        self.entity.created_at
    }

    /// The star rating
    pub fn rating(&self) -> u8 {
        self.rating
    }

    /// Apply a partial update, enforcing the rating bounds
    pub fn apply(&mut self, update: ReviewUpdate) -> DomainResult<()> {
        if let Some(rating) = update.rating {
            validate_rating(rating)?;
            self.rating = rating;
        }
        if let Some(text) = update.review_text {
            self.review_text = Some(text);
        }
        self.entity.touch();
        Ok(())
    }
}

impl DomainEntity for Review {
    type IdType = ReviewMarker;

    fn id(&self) -> EntityId<Self::IdType> {
        self.entity.id
    }
}

/// Service for posting, editing and moderating reviews
pub struct ReviewService<G> {
    gateway: Arc<G>,
    events: Arc<dyn EventPublisher>,
}

impl<G: PersistenceGateway> ReviewService<G> {
    /// Create a review service backed by the given gateway
    pub fn new(gateway: Arc<G>, events: Arc<dyn EventPublisher>) -> Self {
        Self { gateway, events }
    }

    /// Post a review of a car on behalf of the calling customer
    ///
    /// Requires that the caller has an active or completed booking of the
    /// car, and that they have not reviewed it before.
    pub async fn post_review(
        &self,
        caller: &CallerIdentity,
        car_id: CarId,
        draft: ReviewDraft,
    ) -> DomainResult<Review> {
        let customer_id = caller
            .customer_id()
            .ok_or_else(|| DomainError::forbidden("only customers can post reviews"))?;
        let review = Review::new(customer_id, car_id, draft)?;
        let stored = review.clone();
        self.gateway
            .transact(move |tx| {
                tx.car(car_id)
                    .ok_or_else(|| DomainError::not_found("Car", car_id))?;
                let has_rented = tx.bookings_for_customer(customer_id).iter().any(|b| {
                    b.car_id == car_id
                        && matches!(b.state(), BookingState::Active | BookingState::Completed)
                });
                if !has_rented {
                    return Err(DomainError::forbidden(
                        "reviews require a booking of this car",
                    ));
                }
                if tx
                    .review_by_customer_and_car(customer_id, car_id)
                    .is_some()
                {
                    return Err(DomainError::conflict(
                        "customer has already reviewed this car",
                    ));
                }
                tx.insert_review(stored);
                Ok(())
            })
            .await?;

        info!(review_id = %review.id(), %car_id, rating = review.rating(), "review posted");
        self.publish(Box::new(ReviewPosted {
            review_id: review.id(),
            car_id,
            customer_id,
            rating: review.rating(),
        }));
        Ok(review)
    }

    /// Edit a review; only its author may
    pub async fn edit_review(
        &self,
        caller: &CallerIdentity,
        review_id: ReviewId,
        update: ReviewUpdate,
    ) -> DomainResult<Review> {
        let caller = *caller;
        self.gateway
            .transact(move |tx| {
                let mut review = tx
                    .review(review_id)
                    .ok_or_else(|| DomainError::not_found("Review", review_id))?;
                if caller.customer_id() != Some(review.customer_id) {
                    return Err(DomainError::forbidden(
                        "only the author may edit this review",
                    ));
                }
                review.apply(update)?;
                tx.update_review(review.clone())?;
                Ok(review)
            })
            .await
    }

    /// Delete a review; only its author or an admin may
    pub async fn delete_review(
        &self,
        caller: &CallerIdentity,
        review_id: ReviewId,
    ) -> DomainResult<()> {
        let caller = *caller;
        self.gateway
            .transact(move |tx| {
                let review = tx
                    .review(review_id)
                    .ok_or_else(|| DomainError::not_found("Review", review_id))?;
                if !caller.is_admin() && caller.customer_id() != Some(review.customer_id) {
                    return Err(DomainError::forbidden(
                        "only the author or an admin may delete this review",
                    ));
                }
                tx.remove_review(review_id);
                Ok(())
            })
            .await?;

        info!(%review_id, "review deleted");
        self.publish(Box::new(ReviewDeleted { review_id }));
        Ok(())
    }

    /// Fetch a single review
    pub async fn get_review(&self, review_id: ReviewId) -> DomainResult<Review> {
        self.gateway
            .read(move |tx| {
                tx.review(review_id)
                    .ok_or_else(|| DomainError::not_found("Review", review_id))
            })
            .await
    }

    /// Reviews of a car, newest first
    pub async fn reviews_for_car(&self, car_id: CarId) -> DomainResult<Vec<Review>> {
        self.gateway
            .read(move |tx| Ok(tx.reviews_for_car(car_id)))
            .await
    }

    /// Reviews written by a customer, newest first
    pub async fn reviews_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> DomainResult<Vec<Review>> {
        self.gateway
            .read(move |tx| Ok(tx.reviews_for_customer(customer_id)))
            .await
    }

    fn publish(&self, event: Box<dyn crate::events::DomainEvent>) {
        if let Err(err) = self.events.publish(vec![event]) {
            warn!(error = %err, "failed to publish review event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn draft(rating: u8) -> ReviewDraft {
        ReviewDraft {
            rating,
            review_text: Some("smooth ride".to_string()),
        }
    }

    #[test_case(1)]
    #[test_case(3)]
    #[test_case(5)]
    fn test_in_range_ratings_accepted(rating: u8) {
        let review = Review::new(CustomerId::new(), CarId::new(), draft(rating)).unwrap();
        assert_eq!(review.rating(), rating);
    }

    #[test_case(0)]
    #[test_case(6)]
    #[test_case(255)]
    fn test_out_of_range_ratings_rejected(rating: u8) {
        let err = Review::new(CustomerId::new(), CarId::new(), draft(rating)).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_apply_validates_new_rating() {
        let mut review = Review::new(CustomerId::new(), CarId::new(), draft(4)).unwrap();
        assert!(review
            .apply(ReviewUpdate {
                rating: Some(0),
                ..Default::default()
            })
            .unwrap_err()
            .is_validation());
        assert_eq!(review.rating(), 4);

        review
            .apply(ReviewUpdate {
                rating: Some(2),
                review_text: Some("bumpy".to_string()),
            })
            .unwrap();
        assert_eq!(review.rating(), 2);
        assert_eq!(review.review_text.as_deref(), Some("bumpy"));
    }
}
