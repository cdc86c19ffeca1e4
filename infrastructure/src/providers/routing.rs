use super::{ProviderAdapter, ProviderKind};
use chorus_application::ports::model_stream::{GatewayError, ModelStreamAdapter};
use chorus_domain::{Model, ProviderConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Picks the provider that serves each participating model.
pub struct ModelRouter {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    /// Model name to index into `providers`, from the `[providers.routing]` table.
    explicit_model_routing: HashMap<String, usize>,
    default_kind: ProviderKind,
}

impl ModelRouter {
    pub fn new(providers: Vec<Arc<dyn ProviderAdapter>>, config: &ProviderConfig) -> Self {
        let mut explicit_model_routing = HashMap::new();

        for (model_name, provider_name) in &config.routing {
            let Ok(target_kind) = provider_name.parse::<ProviderKind>() else {
                warn!(
                    "Ignoring route {} -> {}: unknown provider",
                    model_name, provider_name
                );
                continue;
            };

            if let Some(idx) = providers.iter().position(|p| p.kind() == target_kind) {
                explicit_model_routing.insert(model_name.clone(), idx);
            }
        }

        Self {
            providers,
            explicit_model_routing,
            default_kind: config
                .default
                .as_deref()
                .and_then(|name| name.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Routing priority:
    ///  1. an explicit route for the model name
    ///  2. the provider of the model's family
    ///  3. the configured default provider
    ///  4. the first registered provider
    fn resolve_provider(&self, model: &Model) -> Result<&dyn ProviderAdapter, GatewayError> {
        if let Some(&idx) = self.explicit_model_routing.get(model.as_str()) {
            return Ok(self.providers[idx].as_ref());
        }

        let inferred_kind = if model.is_claude() {
            Some(ProviderKind::Anthropic)
        } else if model.is_gpt() {
            Some(ProviderKind::OpenAi)
        } else if *model == Model::Echo {
            Some(ProviderKind::Echo)
        } else {
            None
        };
        if let Some(ref kind) = inferred_kind
            && let Some(p) = self.providers.iter().find(|p| p.kind() == *kind)
        {
            return Ok(p.as_ref());
        }

        if let Some(p) = self
            .providers
            .iter()
            .find(|p| p.kind() == self.default_kind)
        {
            return Ok(p.as_ref());
        }

        self.providers
            .first()
            .map(|p| p.as_ref())
            .ok_or(GatewayError::ModelNotAvailable(
                "No providers available".to_string(),
            ))
    }

    /// Stream adapter for one model.
    pub fn adapter_for(&self, model: &Model) -> Result<Arc<dyn ModelStreamAdapter>, GatewayError> {
        let provider = self.resolve_provider(model)?;
        if !provider.supports_model(model) {
            return Err(GatewayError::ModelNotAvailable(format!(
                "{} does not serve {}",
                provider.kind(),
                model
            )));
        }
        debug!("Routing {} to {}", model, provider.kind());
        provider.stream_adapter(model)
    }

    /// Stream adapters for every participant, in order.
    pub fn adapters_for(
        &self,
        models: &[Model],
    ) -> Result<Vec<Arc<dyn ModelStreamAdapter>>, GatewayError> {
        models.iter().map(|m| self.adapter_for(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chorus_application::ports::model_stream::StreamHandle;
    use chorus_domain::Message;

    // -- Mock ProviderAdapter --------------------------------------------------

    struct MockProvider {
        kind: ProviderKind,
        supports: bool,
    }

    impl MockProvider {
        fn new(kind: ProviderKind) -> Arc<dyn ProviderAdapter> {
            Arc::new(Self {
                kind,
                supports: true,
            })
        }

        fn refusing(kind: ProviderKind) -> Arc<dyn ProviderAdapter> {
            Arc::new(Self {
                kind,
                supports: false,
            })
        }
    }

    struct MockAdapter {
        model: Model,
    }

    #[async_trait]
    impl ModelStreamAdapter for MockAdapter {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn open_stream(&self, _history: &[Message]) -> Result<StreamHandle, GatewayError> {
            Ok(StreamHandle::from_events(Vec::new()))
        }
    }

    impl ProviderAdapter for MockProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn supports_model(&self, _model: &Model) -> bool {
            self.supports
        }

        fn stream_adapter(
            &self,
            model: &Model,
        ) -> Result<Arc<dyn ModelStreamAdapter>, GatewayError> {
            Ok(Arc::new(MockAdapter {
                model: model.clone(),
            }))
        }
    }

    // -- Helpers ---------------------------------------------------------------

    fn default_config() -> ProviderConfig {
        ProviderConfig::default()
    }

    fn config_with_default(default: &str) -> ProviderConfig {
        ProviderConfig {
            default: Some(default.to_string()),
            ..Default::default()
        }
    }

    // -- resolve_provider routing priority tests -------------------------------

    #[test]
    fn explicit_routing_takes_highest_priority() {
        // claude-sonnet-4.5 would infer to Anthropic; the explicit route wins.
        let providers = vec![
            MockProvider::new(ProviderKind::Bedrock),
            MockProvider::new(ProviderKind::Anthropic),
        ];
        let mut routing = HashMap::new();
        routing.insert("claude-sonnet-4.5".to_string(), "bedrock".to_string());
        let config = ProviderConfig {
            routing,
            ..Default::default()
        };
        let router = ModelRouter::new(providers, &config);

        let provider = router.resolve_provider(&Model::ClaudeSonnet45).unwrap();
        assert_eq!(provider.kind(), ProviderKind::Bedrock);
    }

    #[test]
    fn claude_model_auto_infers_to_anthropic() {
        let providers = vec![
            MockProvider::new(ProviderKind::OpenAi),
            MockProvider::new(ProviderKind::Anthropic),
        ];
        let router = ModelRouter::new(providers, &default_config());

        let provider = router.resolve_provider(&Model::ClaudeHaiku45).unwrap();
        assert_eq!(provider.kind(), ProviderKind::Anthropic);
    }

    #[test]
    fn gpt_model_auto_infers_to_openai() {
        let providers = vec![
            MockProvider::new(ProviderKind::Anthropic),
            MockProvider::new(ProviderKind::OpenAi),
        ];
        let router = ModelRouter::new(providers, &default_config());

        let provider = router.resolve_provider(&Model::Gpt4oMini).unwrap();
        assert_eq!(provider.kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn echo_model_goes_to_echo_provider() {
        let providers = vec![
            MockProvider::new(ProviderKind::Anthropic),
            MockProvider::new(ProviderKind::Echo),
        ];
        let router = ModelRouter::new(providers, &default_config());

        let provider = router.resolve_provider(&Model::Echo).unwrap();
        assert_eq!(provider.kind(), ProviderKind::Echo);
    }

    #[test]
    fn falls_back_to_default_kind_when_no_family_match() {
        let providers = vec![
            MockProvider::new(ProviderKind::Anthropic),
            MockProvider::new(ProviderKind::OpenAi),
        ];
        let router = ModelRouter::new(providers, &config_with_default("openai"));

        let provider = router
            .resolve_provider(&Model::Custom("mistral-large".to_string()))
            .unwrap();
        assert_eq!(provider.kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn falls_back_to_first_provider_when_default_kind_unavailable() {
        let providers = vec![MockProvider::new(ProviderKind::Echo)];
        let router = ModelRouter::new(providers, &config_with_default("anthropic"));

        let provider = router
            .resolve_provider(&Model::Custom("mistral-large".to_string()))
            .unwrap();
        assert_eq!(provider.kind(), ProviderKind::Echo);
    }

    #[test]
    fn empty_providers_returns_model_not_available() {
        let router = ModelRouter::new(vec![], &default_config());

        let result = router.resolve_provider(&Model::ClaudeSonnet45);
        assert!(matches!(result, Err(GatewayError::ModelNotAvailable(_))));
    }

    #[test]
    fn unknown_routing_provider_name_is_ignored() {
        let providers = vec![MockProvider::new(ProviderKind::Anthropic)];
        let mut routing = HashMap::new();
        routing.insert(
            "claude-sonnet-4.5".to_string(),
            "nonexistent-provider".to_string(),
        );
        let config = ProviderConfig {
            routing,
            ..Default::default()
        };
        let router = ModelRouter::new(providers, &config);

        assert!(router.explicit_model_routing.is_empty());
    }

    // -- adapters_for ------------------------------------------------------------

    #[test]
    fn adapters_follow_participant_order() {
        let providers = vec![
            MockProvider::new(ProviderKind::Anthropic),
            MockProvider::new(ProviderKind::OpenAi),
        ];
        let router = ModelRouter::new(providers, &default_config());

        let adapters = router
            .adapters_for(&[Model::Gpt4o, Model::ClaudeSonnet45])
            .unwrap();
        let models: Vec<_> = adapters.iter().map(|a| a.model().clone()).collect();
        assert_eq!(models, vec![Model::Gpt4o, Model::ClaudeSonnet45]);
    }

    #[test]
    fn unsupported_model_is_rejected() {
        let router = ModelRouter::new(
            vec![MockProvider::refusing(ProviderKind::OpenAi)],
            &default_config(),
        );

        let result = router.adapters_for(&[Model::Gpt4o]);
        assert!(matches!(result, Err(GatewayError::ModelNotAvailable(_))));
    }
}
