// Copyright 2025 Cowboy AI, LLC.

//! Support messages from the public contact form

use crate::entity::{DomainEntity, EntityId};
use crate::errors::{DomainError, DomainResult};
use crate::gateway::PersistenceGateway;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Marker type for contact message identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactMarker;

/// Strongly-typed contact message identifier
pub type ContactId = EntityId<ContactMarker>;

/// A message left through the contact form
///
/// Senders need no account, so the message carries its own name and email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    id: ContactId,
    /// Name the sender gave
    pub name: String,
    /// Email address to reply to
    pub email: String,
    /// The message body
    pub message: String,
}

impl ContactMessage {
    /// Create a message, validating the sender's details
    pub fn new(name: String, email: String, message: String) -> DomainResult<Self> {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(DomainError::validation("invalid email address"));
        }
        if message.trim().is_empty() {
            return Err(DomainError::validation("message must not be empty"));
        }
        Ok(Self {
            id: ContactId::new(),
            name,
            email,
            message,
        })
    }

    /// The message's identifier
    pub fn id(&self) -> ContactId {
        self.id
    }
}

impl DomainEntity for ContactMessage {
    type IdType = ContactMarker;

    fn id(&self) -> EntityId<Self::IdType> {
        self.id
    }
}

/// Service that accepts and stores support messages
pub struct ContactService<G> {
    gateway: Arc<G>,
}

impl<G: PersistenceGateway> ContactService<G> {
    /// Create a contact service backed by the given gateway
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Accept a message from the contact form
    pub async fn submit(
        &self,
        name: String,
        email: String,
        message: String,
    ) -> DomainResult<ContactMessage> {
        let message = ContactMessage::new(name, email, message)?;
        let stored = message.clone();
        self.gateway
            .transact(move |tx| {
                tx.insert_contact(stored);
                Ok(())
            })
            .await?;
        info!(contact_id = %message.id(), "contact message received");
        Ok(message)
    }

    /// All stored messages, oldest first
    pub async fn messages(&self) -> DomainResult<Vec<ContactMessage>> {
        self.gateway.read(|tx| Ok(tx.contacts())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;

    #[test]
    fn test_message_requires_valid_email() {
        let err = ContactMessage::new(
            "Sam".to_string(),
            "no-at-sign".to_string(),
            "hello".to_string(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_message_requires_body() {
        let err = ContactMessage::new(
            "Sam".to_string(),
            "sam@example.com".to_string(),
            "   ".to_string(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_messages_kept_in_arrival_order() {
        let service = ContactService::new(Arc::new(InMemoryGateway::new()));
        service
            .submit(
                "First".to_string(),
                "first@example.com".to_string(),
                "earlier".to_string(),
            )
            .await
            .unwrap();
        service
            .submit(
                "Second".to_string(),
                "second@example.com".to_string(),
                "later".to_string(),
            )
            .await
            .unwrap();

        let inbox = service.messages().await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].name, "First");
        assert_eq!(inbox[1].name, "Second");
    }
}
