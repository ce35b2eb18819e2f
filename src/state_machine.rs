//! State machine kernel for aggregate lifecycles
//!
//! Aggregates with a lifecycle (the booking, primarily) declare their states
//! as an enum implementing [`State`] and [`StateTransitions`]. Transitions
//! outside the declared set are rejected with
//! [`DomainError::InvalidStateTransition`], and every applied transition is
//! recorded as a [`StateTransition`] so the aggregate keeps its own audit
//! trail.

use crate::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Declares which transitions are valid from each state
pub trait StateTransitions: State {
    /// Check if a transition to the target state is valid
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Get all valid target states from this state
    fn valid_transitions(&self) -> Vec<Self>;

    /// Apply a transition, producing a record of it
    ///
    /// Rejects the move when the current state is terminal or the target is
    /// not in the declared transition set.
    fn transition_to(&mut self, target: Self) -> DomainResult<StateTransition<Self>> {
        if self.is_terminal() || !self.can_transition_to(&target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.name().to_string(),
                to: target.name().to_string(),
            });
        }

        let record = StateTransition {
            from: self.clone(),
            to: target.clone(),
            transition_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        };

        *self = target;
        Ok(record)
    }
}

/// Record of a state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition<S> {
    /// The state before the transition
    pub from: S,
    /// The state after the transition
    pub to: S,
    /// Unique identifier for this transition instance
    pub transition_id: Uuid,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}
