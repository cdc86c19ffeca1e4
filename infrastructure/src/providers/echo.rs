//! Offline provider that streams the last user message back.
//!
//! Useful for trying the relay without API keys, and as a deterministic
//! participant in end-to-end tests.

use super::{ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use chorus_application::ports::model_stream::{GatewayError, ModelStreamAdapter, StreamHandle};
use chorus_domain::{ChatRole, Message, Model, ProviderConfig, StreamEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct EchoProvider {
    delay: Duration,
}

impl EchoProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.echo.delay_ms),
        }
    }
}

impl ProviderAdapter for EchoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Echo
    }

    fn supports_model(&self, _model: &Model) -> bool {
        true
    }

    fn stream_adapter(&self, model: &Model) -> Result<Arc<dyn ModelStreamAdapter>, GatewayError> {
        Ok(Arc::new(EchoStreamAdapter {
            model: model.clone(),
            delay: self.delay,
        }))
    }
}

pub struct EchoStreamAdapter {
    model: Model,
    delay: Duration,
}

impl EchoStreamAdapter {
    pub fn new(model: Model, delay: Duration) -> Self {
        Self { model, delay }
    }
}

/// Split `text` into deltas that concatenate back to it exactly.
fn word_pieces(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if c.is_whitespace() {
            pieces.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[async_trait]
impl ModelStreamAdapter for EchoStreamAdapter {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn open_stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        let last_user = history
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let pieces = word_pieces(&format!("[{}] {}", self.model, last_user));

        let (tx, rx) = mpsc::channel(pieces.len() + 1);
        let delay = self.delay;
        tokio::spawn(async move {
            for piece in pieces {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if tx.send(StreamEvent::Delta(piece)).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(StreamEvent::Completed).await;
        });
        Ok(StreamHandle::new(rx))
    }
}
