//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod conversation_logger;
pub mod model_stream;
pub mod relay_transport;
pub mod topic_authorizer;
pub mod transcript_store;
