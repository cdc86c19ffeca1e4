//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Role cannot be empty")]
    EmptyRole,

    #[error("Turn text is missing for role '{0}'")]
    MissingText(String),

    #[error("Identity cannot be empty")]
    EmptyIdentity,

    #[error("Topic cannot be empty")]
    EmptyTopic,

    #[error("Malformed relay payload: {0}")]
    MalformedPayload(String),
}
