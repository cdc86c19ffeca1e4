//! Anthropic Messages API streaming.

use super::sse::{self, SseEvent, SseStep};
use super::{
    ProviderAdapter, ProviderKind, error_from_reqwest, error_from_response, http_client,
    resolve_api_key,
};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use chorus_application::ports::model_stream::{GatewayError, ModelStreamAdapter, StreamHandle};
use chorus_domain::{AnthropicProviderConfig, ChatRole, Message, Model, ProviderConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// API model id for a domain model.
pub fn api_model_id(model: &Model) -> &str {
    match model {
        Model::ClaudeSonnet45 => "claude-sonnet-4-5",
        Model::ClaudeHaiku45 => "claude-haiku-4-5",
        Model::ClaudeSonnet4 => "claude-sonnet-4-0",
        Model::Claude3Sonnet => "claude-3-sonnet-20240229",
        other => other.as_str(),
    }
}

pub struct AnthropicProvider {
    client: reqwest::Client,
    config: Arc<AnthropicProviderConfig>,
    system_prompt: Option<String>,
}

impl AnthropicProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: http_client(config.timeout_seconds.map(Duration::from_secs)),
            config: Arc::new(config.anthropic.clone()),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

impl ProviderAdapter for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn supports_model(&self, model: &Model) -> bool {
        model.is_claude() || matches!(model, Model::Custom(_))
    }

    fn stream_adapter(&self, model: &Model) -> Result<Arc<dyn ModelStreamAdapter>, GatewayError> {
        Ok(Arc::new(AnthropicStreamAdapter {
            model: model.clone(),
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            system_prompt: self.system_prompt.clone(),
        }))
    }
}

pub struct AnthropicStreamAdapter {
    model: Model,
    client: reqwest::Client,
    config: Arc<AnthropicProviderConfig>,
    system_prompt: Option<String>,
}

impl AnthropicStreamAdapter {
    fn request_body(&self, history: &[Message]) -> Value {
        // System text travels in its own field, not as a message.
        let messages: Vec<Value> = history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut body = json!({
            "model": api_model_id(&self.model),
            "max_tokens": self.config.max_tokens,
            "stream": true,
            "messages": messages,
        });
        if let Some(prompt) = &self.system_prompt {
            body["system"] = json!(prompt);
        }
        body
    }
}

#[async_trait]
impl ModelStreamAdapter for AnthropicStreamAdapter {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn open_stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        let api_key = resolve_api_key(self.config.api_key.as_deref(), &self.config.api_key_env)?;
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));

        debug!(model = %self.model, messages = history.len(), "Calling Anthropic");
        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.config.api_version)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&self.request_body(history))
            .send()
            .await
            .map_err(|e| error_from_reqwest(ProviderKind::Anthropic, e))?;
        if !response.status().is_success() {
            return Err(error_from_response(ProviderKind::Anthropic, response).await);
        }
        info!("Anthropic stream opened for {}", self.model);

        let (tx, rx) = mpsc::channel(64);
        let model = self.model.clone();
        tokio::spawn(async move {
            sse::pump(model, response.bytes_stream().eventsource(), tx, decode_event).await;
        });
        Ok(StreamHandle::new(rx))
    }
}

#[derive(Deserialize)]
struct EventPayload {
    #[serde(rename = "type")]
    kind: String,
    delta: Option<DeltaBody>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct DeltaBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Decode one Messages API event.
pub fn decode_event(event: &SseEvent) -> Result<SseStep, String> {
    if event.data.trim().is_empty() {
        return Ok(SseStep::Skip);
    }
    let payload: EventPayload = serde_json::from_str(&event.data).map_err(|e| e.to_string())?;

    match payload.kind.as_str() {
        "content_block_delta" => {
            let delta = payload
                .delta
                .ok_or_else(|| "content_block_delta without delta".to_string())?;
            match (delta.kind.as_deref(), delta.text) {
                (Some("text_delta") | None, Some(text)) => Ok(SseStep::Delta(text)),
                _ => Ok(SseStep::Skip),
            }
        }
        "message_stop" => Ok(SseStep::Done),
        "error" => Ok(SseStep::Fail(
            payload
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "unknown error".to_string()),
        )),
        _ => Ok(SseStep::Skip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, data: &str) -> SseEvent {
        SseEvent {
            event: Some(name.to_string()),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_decode_text_delta() {
        let step = decode_event(&event(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#,
        ))
        .unwrap();
        assert_eq!(step, SseStep::Delta("Hi".to_string()));
    }

    #[test]
    fn test_metadata_events_are_skipped() {
        for (name, data) in [
            ("message_start", r#"{"type":"message_start","message":{}}"#),
            ("ping", r#"{"type":"ping"}"#),
            ("message_delta", r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"}}"#),
        ] {
            assert_eq!(decode_event(&event(name, data)).unwrap(), SseStep::Skip);
        }
    }

    #[test]
    fn test_message_stop_and_error() {
        assert_eq!(
            decode_event(&event("message_stop", r#"{"type":"message_stop"}"#)).unwrap(),
            SseStep::Done
        );
        assert_eq!(
            decode_event(&event(
                "error",
                r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#
            ))
            .unwrap(),
            SseStep::Fail("Overloaded".to_string())
        );
    }

    #[test]
    fn test_request_body_moves_system_prompt() {
        let provider = AnthropicProvider::new(&ProviderConfig {
            system_prompt: Some("Use markdown.".to_string()),
            ..Default::default()
        });
        let adapter = AnthropicStreamAdapter {
            model: Model::Claude3Sonnet,
            client: provider.client.clone(),
            config: provider.config.clone(),
            system_prompt: provider.system_prompt.clone(),
        };

        let body = adapter.request_body(&[
            Message::system("ignored"),
            Message::user("hi"),
            Message::assistant("skip"),
            Message::user("again"),
        ]);
        assert_eq!(body["model"], "claude-3-sonnet-20240229");
        assert_eq!(body["system"], "Use markdown.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
        assert_eq!(body["messages"][1]["role"], "assistant");
    }
}
