//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to domain/application types
//! at the edge.

mod conversation;
mod logging;
mod models;
mod providers;
mod relay;
mod store;

pub use conversation::FileConversationConfig;
pub use logging::FileLoggingConfig;
pub use models::FileModelsConfig;
pub use providers::{
    FileAnthropicConfig, FileBedrockConfig, FileEchoConfig, FileOpenAiConfig, FileProvidersConfig,
};
pub use relay::FileRelayConfig;
pub use store::{FileStoreConfig, StoreKind};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const KNOWN_PROVIDERS: [&str; 4] = ["anthropic", "openai", "bedrock", "echo"];

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("models.participants: at least one model is required")]
    NoParticipants,

    #[error("models.participants: model name cannot be empty")]
    EmptyModelName,

    #[error("models.participants: '{0}' is listed more than once")]
    DuplicateModel(String),

    #[error("relay.publish_attempts cannot be 0")]
    ZeroPublishAttempts,

    #[error("relay.channel_capacity cannot be 0")]
    ZeroChannelCapacity,

    #[error("store.kind: unknown value '{0}' (expected \"memory\" or \"file\")")]
    UnknownStoreKind(String),

    #[error("providers.default: unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("providers.routing: model '{model}' routed to unknown provider '{provider}'")]
    UnknownRoute { model: String, provider: String },

    #[error("providers.timeout_seconds cannot be 0")]
    InvalidTimeout,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Models asked every question
    pub models: FileModelsConfig,
    /// Provider credentials, endpoints and routing
    pub providers: FileProvidersConfig,
    /// Relay publish policy
    pub relay: FileRelayConfig,
    /// Transcript persistence
    pub store: FileStoreConfig,
    /// Conversation behavior
    pub conversation: FileConversationConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = self.models.parse_participants().1;

        if self.relay.publish_attempts == 0 {
            issues.push(ConfigValidationError::ZeroPublishAttempts);
        }
        if self.relay.channel_capacity == 0 {
            issues.push(ConfigValidationError::ZeroChannelCapacity);
        }
        if let Err(kind) = self.store.parse_kind() {
            issues.push(ConfigValidationError::UnknownStoreKind(kind));
        }
        if let Some(default) = &self.providers.default
            && !KNOWN_PROVIDERS.contains(&default.as_str())
        {
            issues.push(ConfigValidationError::UnknownProvider(default.clone()));
        }
        let mut routes: Vec<_> = self.providers.routing.iter().collect();
        routes.sort();
        for (model, provider) in routes {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                issues.push(ConfigValidationError::UnknownRoute {
                    model: model.clone(),
                    provider: provider.clone(),
                });
            }
        }
        if self.providers.timeout_seconds == Some(0) {
            issues.push(ConfigValidationError::InvalidTimeout);
        }

        issues
    }
}
