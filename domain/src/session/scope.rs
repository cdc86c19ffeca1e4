//! The identity/topic pair a chat session runs under.

use crate::core::identity::{Identity, Topic};

/// Who the session acts for and where its chunks are relayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionScope {
    pub identity: Identity,
    pub topic: Topic,
}

impl SessionScope {
    pub fn new(identity: Identity, topic: Topic) -> Self {
        Self { identity, topic }
    }

    /// Scope using the conventional identity-derived topic.
    pub fn for_identity(identity: Identity) -> Self {
        let topic = Topic::for_identity(&identity);
        Self { identity, topic }
    }
}
