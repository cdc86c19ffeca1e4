//! Model stream adapters for the supported providers.
//!
//! Each provider implements [`ProviderAdapter`], a factory that hands out one
//! [`ModelStreamAdapter`] per model. [`routing::ModelRouter`] picks the
//! provider for every configured participant.

pub mod anthropic;
pub mod echo;
pub mod openai;
pub mod routing;
pub mod sse;

#[cfg(feature = "bedrock")]
pub mod bedrock;

use chorus_application::ports::model_stream::{GatewayError, ModelStreamAdapter};
use chorus_domain::{Model, ProviderConfig};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Anthropic,
    OpenAi,
    Bedrock,
    Echo,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Bedrock => "bedrock",
            ProviderKind::Echo => "echo",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "bedrock" => Ok(ProviderKind::Bedrock),
            "echo" => Ok(ProviderKind::Echo),
            other => Err(other.to_string()),
        }
    }
}

/// Factory for the stream adapters of one provider.
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;
    fn supports_model(&self, model: &Model) -> bool;
    fn stream_adapter(&self, model: &Model) -> Result<Arc<dyn ModelStreamAdapter>, GatewayError>;
}

/// Every provider compiled into this build, in routing fallback order.
pub async fn default_providers(config: &ProviderConfig) -> Vec<Arc<dyn ProviderAdapter>> {
    #[allow(unused_mut)]
    let mut providers: Vec<Arc<dyn ProviderAdapter>> = vec![
        Arc::new(anthropic::AnthropicProvider::new(config)),
        Arc::new(openai::OpenAiProvider::new(config)),
    ];

    #[cfg(feature = "bedrock")]
    providers.push(Arc::new(bedrock::BedrockProviderAdapter::new(config).await));

    providers.push(Arc::new(echo::EchoProvider::new(config)));
    providers
}

/// Shared HTTP client for the SSE providers.
pub(crate) fn http_client(connect_timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
        "chorus/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default HTTP client: {}", e);
        reqwest::Client::new()
    })
}

/// API key from the config, falling back to the named environment variable.
pub(crate) fn resolve_api_key(
    explicit: Option<&str>,
    env_var: &str,
) -> Result<String, GatewayError> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(key.to_string());
    }
    std::env::var(env_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| GatewayError::AuthenticationError(format!("{} is not set", env_var)))
}

/// Turn a non-success HTTP response into a connect error.
pub(crate) async fn error_from_response(
    provider: ProviderKind,
    response: reqwest::Response,
) -> GatewayError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    let message = format!("{} API error ({}): {}", provider, status, body.trim());
    match status.as_u16() {
        401 | 403 => GatewayError::AuthenticationError(message),
        404 => GatewayError::ModelNotAvailable(message),
        408 | 504 => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(message),
    }
}

/// Map a transport failure before any response arrived.
pub(crate) fn error_from_reqwest(provider: ProviderKind, error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::ConnectionError(format!("{}: {}", provider, error))
    }
}
