//! Bedrock provider adapter
//!
//! Implements `ProviderAdapter` to plug into the `ModelRouter`.
//! Handles AWS credential initialization and hands out stream adapters.

use super::model_map;
use super::stream::BedrockStreamAdapter;
use crate::providers::{ProviderAdapter, ProviderKind};
use aws_sdk_bedrockruntime::Client as BedrockClient;
use chorus_application::ports::model_stream::{GatewayError, ModelStreamAdapter};
use chorus_domain::{Model, ProviderConfig};
use std::sync::Arc;
use tracing::info;

pub struct BedrockProviderAdapter {
    client: Arc<BedrockClient>,
    region: String,
    max_tokens: i32,
    cross_region: bool,
    system_prompt: Option<String>,
}

impl BedrockProviderAdapter {
    /// Create a new Bedrock provider adapter.
    ///
    /// Loads AWS credentials from the default chain (or the configured
    /// profile) and creates a Bedrock Runtime client.
    pub async fn new(config: &ProviderConfig) -> Self {
        let bedrock = &config.bedrock;
        let mut aws_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(bedrock.region.clone()));

        if let Some(ref profile) = bedrock.profile {
            aws_config_loader = aws_config_loader.profile_name(profile);
        }

        let aws_config = aws_config_loader.load().await;
        let client = BedrockClient::new(&aws_config);
        info!(region = %bedrock.region, "Bedrock provider initialized");

        Self {
            client: Arc::new(client),
            region: bedrock.region.clone(),
            max_tokens: i32::try_from(bedrock.max_tokens).unwrap_or(i32::MAX),
            cross_region: bedrock.cross_region.unwrap_or(false),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

impl ProviderAdapter for BedrockProviderAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bedrock
    }

    fn supports_model(&self, model: &Model) -> bool {
        model_map::is_bedrock_supported(model)
    }

    fn stream_adapter(&self, model: &Model) -> Result<Arc<dyn ModelStreamAdapter>, GatewayError> {
        let bedrock_model_id =
            model_map::to_bedrock_model_id(model, self.cross_region, &self.region).ok_or_else(
                || {
                    GatewayError::ModelNotAvailable(format!(
                        "Model {} is not supported by Bedrock",
                        model
                    ))
                },
            )?;

        Ok(Arc::new(BedrockStreamAdapter::new(
            self.client.clone(),
            model.clone(),
            bedrock_model_id,
            self.system_prompt.clone(),
            self.max_tokens,
        )))
    }
}
