//! Domain layer for chorus
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Transcript
//!
//! The canonical, persisted conversation. Roles strictly alternate between
//! the user and a non-user speaker; placeholder turns (`"skip"`) are inserted
//! where two turns of the same class would otherwise meet.
//!
//! ## Relay
//!
//! Every participating model streams its answer as sequence-numbered chunks
//! over a pub/sub topic scoped to the session identity. Chunks are stamped
//! with a [`TurnEpoch`] so answers to an abandoned question can be told apart
//! from answers to the current one.

pub mod core;
pub mod providers;
pub mod relay;
pub mod session;
pub mod transcript;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    identity::{Identity, Topic, TranscriptId},
    model::Model,
};
pub use providers::{
    AnthropicProviderConfig, BedrockProviderConfig, DEFAULT_SYSTEM_PROMPT, EchoProviderConfig,
    OpenAiProviderConfig, ProviderConfig,
};
pub use relay::{
    message::{RelayMessage, StreamChunk, TurnEpoch},
    pending::{MergeOutcome, PendingSnapshot, PendingTurn},
};
pub use session::{scope::SessionScope, stream::StreamEvent};
pub use transcript::{
    alternation::{append_alternating, is_alternating, normalize},
    entities::Transcript,
    history::{ChatRole, DEFAULT_GREETING, Message, upstream_history},
    turn::{PLACEHOLDER_TEXT, Role, RoleClass, Turn},
};
