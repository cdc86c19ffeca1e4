//! Provider configuration from TOML (`[providers]` section)

use chorus_domain::{
    AnthropicProviderConfig, BedrockProviderConfig, DEFAULT_SYSTEM_PROMPT, EchoProviderConfig,
    OpenAiProviderConfig, ProviderConfig,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBedrockConfig {
    /// AWS region for Bedrock models (default: "us-west-2")
    pub region: String,
    /// AWS profile name for credentials
    pub profile: Option<String>,
    /// Max Tokens per response (default: 4000)
    pub max_tokens: u32,
    /// Use a cross-region inference profile
    pub cross_region: Option<bool>,
}

impl Default for FileBedrockConfig {
    fn default() -> Self {
        let defaults = BedrockProviderConfig::default();
        Self {
            region: defaults.region,
            profile: defaults.profile,
            max_tokens: defaults.max_tokens,
            cross_region: defaults.cross_region,
        }
    }
}

/// Anthropic API provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnthropicConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, prefer the env var).
    pub api_key: Option<String>,
    /// Base URL for the Anthropic API.
    pub base_url: String,
    /// Default max tokens per response.
    pub max_tokens: u32,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for FileAnthropicConfig {
    fn default() -> Self {
        let defaults = AnthropicProviderConfig::default();
        Self {
            api_key_env: defaults.api_key_env,
            api_key: defaults.api_key,
            base_url: defaults.base_url,
            max_tokens: defaults.max_tokens,
            api_version: defaults.api_version,
        }
    }
}

/// OpenAI API provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended, prefer the env var).
    pub api_key: Option<String>,
    /// Base URL for the OpenAI API (any Chat Completions compatible server works).
    pub base_url: String,
    /// Default max tokens per response.
    pub max_tokens: u32,
    pub organization: Option<String>,
    pub project: Option<String>,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        let defaults = OpenAiProviderConfig::default();
        Self {
            api_key_env: defaults.api_key_env,
            api_key: defaults.api_key,
            base_url: defaults.base_url,
            max_tokens: defaults.max_tokens,
            organization: defaults.organization,
            project: defaults.project,
        }
    }
}

/// Offline echo provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEchoConfig {
    /// Pause between streamed words, in milliseconds.
    pub delay_ms: u64,
}

impl Default for FileEchoConfig {
    fn default() -> Self {
        Self {
            delay_ms: EchoProviderConfig::default().delay_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Default provider: "anthropic", "openai", "bedrock", "echo".
    pub default: Option<String>,
    /// System prompt sent with every request. An empty string disables it.
    pub system_prompt: Option<String>,
    /// Connect/read timeout for HTTP providers.
    pub timeout_seconds: Option<u64>,
    /// Anthropic API settings.
    pub anthropic: FileAnthropicConfig,
    /// OpenAI API settings.
    pub openai: FileOpenAiConfig,
    /// AWS Bedrock settings.
    pub bedrock: FileBedrockConfig,
    /// Echo provider settings.
    pub echo: FileEchoConfig,
    /// Explicit model → provider routing overrides.
    pub routing: HashMap<String, String>,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        Self {
            default: None,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            timeout_seconds: None,
            anthropic: FileAnthropicConfig::default(),
            openai: FileOpenAiConfig::default(),
            bedrock: FileBedrockConfig::default(),
            echo: FileEchoConfig::default(),
            routing: HashMap::new(),
        }
    }
}

impl FileProvidersConfig {
    /// Convert to the format-independent domain type.
    pub fn to_provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            default: self.default.clone(),
            routing: self.routing.clone(),
            system_prompt: self
                .system_prompt
                .clone()
                .filter(|prompt| !prompt.trim().is_empty()),
            timeout_seconds: self.timeout_seconds,
            bedrock: BedrockProviderConfig {
                region: self.bedrock.region.clone(),
                profile: self.bedrock.profile.clone(),
                max_tokens: self.bedrock.max_tokens,
                cross_region: self.bedrock.cross_region,
            },
            anthropic: AnthropicProviderConfig {
                api_key_env: self.anthropic.api_key_env.clone(),
                api_key: self.anthropic.api_key.clone(),
                base_url: self.anthropic.base_url.clone(),
                max_tokens: self.anthropic.max_tokens,
                api_version: self.anthropic.api_version.clone(),
            },
            openai: OpenAiProviderConfig {
                api_key_env: self.openai.api_key_env.clone(),
                api_key: self.openai.api_key.clone(),
                base_url: self.openai.base_url.clone(),
                max_tokens: self.openai.max_tokens,
                organization: self.openai.organization.clone(),
                project: self.openai.project.clone(),
            },
            echo: EchoProviderConfig {
                delay_ms: self.echo.delay_ms,
            },
        }
    }
}
