//! Provider configuration types (provider-neutral, serde-free).
//!
//! These types define the shape of provider settings without depending
//! on any serialization format (TOML, JSON, etc.).

use std::collections::HashMap;

/// System prompt asking for markdown-friendly answers.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant whose answers are rendered as \
markdown. Use headings, lists, code blocks and links where they help, and keep the syntax \
valid so it renders correctly.";

/// Top-level provider configuration.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Default provider name: "anthropic", "openai", "bedrock", "echo".
    pub default: Option<String>,
    /// Explicit model → provider routing overrides.
    pub routing: HashMap<String, String>,
    /// System prompt prepended to every request (None disables it).
    pub system_prompt: Option<String>,
    /// Connection/read timeout for HTTP providers, in seconds.
    pub timeout_seconds: Option<u64>,
    /// AWS Bedrock settings.
    pub bedrock: BedrockProviderConfig,
    /// Anthropic API settings.
    pub anthropic: AnthropicProviderConfig,
    /// OpenAI API settings.
    pub openai: OpenAiProviderConfig,
    /// Offline echo provider settings.
    pub echo: EchoProviderConfig,
}

/// AWS Bedrock provider configuration.
#[derive(Debug, Clone)]
pub struct BedrockProviderConfig {
    /// AWS region (default: "us-west-2").
    pub region: String,
    /// AWS profile name for credentials.
    pub profile: Option<String>,
    /// Max tokens per response (default: 4000).
    pub max_tokens: u32,
    /// Enable cross-region inference.
    pub cross_region: Option<bool>,
}

impl Default for BedrockProviderConfig {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            profile: None,
            max_tokens: 4000,
            cross_region: None,
        }
    }
}

/// Anthropic API provider configuration.
#[derive(Debug, Clone)]
pub struct AnthropicProviderConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, prefer the env var).
    pub api_key: Option<String>,
    /// Base URL for the Anthropic API.
    pub base_url: String,
    /// Max tokens per response (default: 4000).
    pub max_tokens: u32,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for AnthropicProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4000,
            api_version: "2023-06-01".to_string(),
        }
    }
}

/// OpenAI API provider configuration.
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, prefer the env var).
    pub api_key: Option<String>,
    /// Base URL for the OpenAI API.
    pub base_url: String,
    /// Max tokens per response (default: 4000).
    pub max_tokens: u32,
    /// Optional organization header.
    pub organization: Option<String>,
    /// Optional project header.
    pub project: Option<String>,
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4000,
            organization: None,
            project: None,
        }
    }
}

/// Offline echo provider configuration.
#[derive(Debug, Clone)]
pub struct EchoProviderConfig {
    /// Pause between streamed words, in milliseconds.
    pub delay_ms: u64,
}

impl Default for EchoProviderConfig {
    fn default() -> Self {
        Self { delay_ms: 40 }
    }
}
