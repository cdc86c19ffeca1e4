//! Opaque identifiers handed to the core by its caller.
//!
//! The core never authenticates anything: an [`Identity`] and its [`Topic`]
//! are taken as given and only used for ownership checks and relay scoping.

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// The identity a transcript and a relay topic belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyIdentity);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pub/sub channel name scoped to one identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::EmptyTopic);
        }
        Ok(Self(value))
    }

    /// Derive the conventional topic for an identity (`chat/<identity>`).
    pub fn for_identity(identity: &Identity) -> Self {
        Self(format!("chat/{}", identity.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store key of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranscriptId(String);

impl TranscriptId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TranscriptId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TranscriptId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for TranscriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_identity_rejected() {
        assert_eq!(Identity::new("  "), Err(DomainError::EmptyIdentity));
        assert!(Identity::new("alice@example.com").is_ok());
    }

    #[test]
    fn test_topic_for_identity() {
        let identity = Identity::new("alice@example.com").unwrap();
        assert_eq!(Topic::for_identity(&identity).as_str(), "chat/alice@example.com");
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        assert_ne!(TranscriptId::generate(), TranscriptId::generate());
    }
}
