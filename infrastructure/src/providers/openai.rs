//! OpenAI Chat Completions streaming.
//!
//! Any server speaking the Chat Completions SSE dialect works; point
//! `base_url` at it.

use super::sse::{self, SseEvent, SseStep};
use super::{
    ProviderAdapter, ProviderKind, error_from_reqwest, error_from_response, http_client,
    resolve_api_key,
};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use chorus_application::ports::model_stream::{GatewayError, ModelStreamAdapter, StreamHandle};
use chorus_domain::{Message, Model, OpenAiProviderConfig, ProviderConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct OpenAiProvider {
    client: reqwest::Client,
    config: Arc<OpenAiProviderConfig>,
    system_prompt: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: http_client(config.timeout_seconds.map(Duration::from_secs)),
            config: Arc::new(config.openai.clone()),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

impl ProviderAdapter for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn supports_model(&self, model: &Model) -> bool {
        model.is_gpt() || matches!(model, Model::Custom(_))
    }

    fn stream_adapter(&self, model: &Model) -> Result<Arc<dyn ModelStreamAdapter>, GatewayError> {
        Ok(Arc::new(OpenAiStreamAdapter {
            model: model.clone(),
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            system_prompt: self.system_prompt.clone(),
        }))
    }
}

pub struct OpenAiStreamAdapter {
    model: Model,
    client: reqwest::Client,
    config: Arc<OpenAiProviderConfig>,
    system_prompt: Option<String>,
}

impl OpenAiStreamAdapter {
    fn request_body(&self, history: &[Message]) -> Value {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(json!(Message::system(prompt.clone())));
        }
        messages.extend(history.iter().map(|m| json!(m)));

        json!({
            "model": self.model.as_str(),
            "stream": true,
            "max_tokens": self.config.max_tokens,
            "messages": messages,
        })
    }
}

#[async_trait]
impl ModelStreamAdapter for OpenAiStreamAdapter {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn open_stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        let api_key = resolve_api_key(self.config.api_key.as_deref(), &self.config.api_key_env)?;
        let url = format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut request = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&self.request_body(history));
        if let Some(org) = &self.config.organization {
            request = request.header("OpenAI-Organization", org);
        }
        if let Some(project) = &self.config.project {
            request = request.header("OpenAI-Project", project);
        }

        debug!(model = %self.model, messages = history.len(), "Calling OpenAI");
        let response = request
            .send()
            .await
            .map_err(|e| error_from_reqwest(ProviderKind::OpenAi, e))?;
        if !response.status().is_success() {
            return Err(error_from_response(ProviderKind::OpenAi, response).await);
        }
        info!("OpenAI stream opened for {}", self.model);

        let (tx, rx) = mpsc::channel(64);
        let model = self.model.clone();
        tokio::spawn(async move {
            sse::pump(model, response.bytes_stream().eventsource(), tx, decode_event).await;
        });
        Ok(StreamHandle::new(rx))
    }
}

#[derive(Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Decode one Chat Completions event.
pub fn decode_event(event: &SseEvent) -> Result<SseStep, String> {
    let data = event.data.trim();
    if data.is_empty() {
        return Ok(SseStep::Skip);
    }
    if data == "[DONE]" {
        return Ok(SseStep::Done);
    }

    let payload: ChunkPayload = serde_json::from_str(data).map_err(|e| e.to_string())?;
    if let Some(error) = payload.error {
        return Ok(SseStep::Fail(error.message));
    }

    let text: String = payload
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();
    if text.is_empty() {
        Ok(SseStep::Skip)
    } else {
        Ok(SseStep::Delta(text))
    }
}
