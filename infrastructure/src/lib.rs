//! Infrastructure layer for chorus
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: model providers, the relay transport, transcript
//! stores, the conversation log, and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod relay;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig, StoreKind};
pub use logging::JsonlConversationLogger;
pub use providers::{ProviderAdapter, ProviderKind, default_providers, routing::ModelRouter};
pub use relay::MemoryRelay;
pub use store::{FileTranscriptStore, MemoryTranscriptStore};
