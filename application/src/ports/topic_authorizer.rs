//! Topic authorization port
//!
//! Before a session subscribes, its identity must be allowed to read the
//! relay topic. How that grant is expressed (broker policy, ACL entry) is up
//! to the transport.

use super::relay_transport::RelayError;
use async_trait::async_trait;
use chorus_domain::{Identity, Topic};

#[async_trait]
pub trait TopicAuthorizer: Send + Sync {
    /// Grant `identity` access to `topic`. Granting twice is not an error.
    async fn authorize(&self, identity: &Identity, topic: &Topic) -> Result<(), RelayError>;
}

/// Authorizer for transports without access control.
pub struct AllowAllTopics;

#[async_trait]
impl TopicAuthorizer for AllowAllTopics {
    async fn authorize(&self, _identity: &Identity, _topic: &Topic) -> Result<(), RelayError> {
        Ok(())
    }
}
