//! Application layer for chorus
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{ConversationConfig, PublishPolicy};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    model_stream::{GatewayError, ModelStreamAdapter, StreamHandle},
    relay_transport::{DeliveryHint, RelayError, RelaySubscription, RelayTransport},
    topic_authorizer::{AllowAllTopics, TopicAuthorizer},
    transcript_store::{StoreError, TranscriptStore},
};
pub use use_cases::reconciler::{ReconcileError, ReconcilePhase, Resolution, TranscriptReconciler};
pub use use_cases::relay_publisher::{RelayOutcome, RelayPublisher};
pub use use_cases::session::{ChatSession, SessionError, SessionServices};
pub use use_cases::stream_aggregator::{ApplyOutcome, LiveAggregator, StreamAggregator};
