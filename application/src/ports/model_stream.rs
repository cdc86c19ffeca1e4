//! Model stream port
//!
//! Defines the interface for streaming a completion from one LLM provider.

use async_trait::async_trait;
use chorus_domain::{Message, Model, StreamEvent};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while talking to a model provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Handle for receiving streaming events from one provider call.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. The sender side is owned by the
/// adapter's reader task; a closed channel without a terminal event is
/// treated as a normal end.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Build a handle that replays a fixed list of events.
    pub fn from_events(events: Vec<StreamEvent>) -> Self {
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            // Capacity covers every event, so this never fails.
            let _ = tx.try_send(event);
        }
        Self::new(rx)
    }

    /// Next event, or `None` once the adapter is done.
    pub async fn next(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed => return Ok(full_text),
                StreamEvent::Error(e) => return Err(GatewayError::RequestFailed(e)),
            }
        }
        Ok(full_text)
    }
}

/// Streams completions from one model.
///
/// `open_stream` resolving to `Err` is a fatal failure to establish the call.
/// Once a handle is returned, individual undecodable deltas are logged and
/// skipped by the adapter; a breakdown mid-stream arrives as a single
/// [`StreamEvent::Error`].
#[async_trait]
pub trait ModelStreamAdapter: Send + Sync {
    /// The model this adapter speaks for
    fn model(&self) -> &Model;

    /// Start a streaming completion over a strictly alternating history
    async fn open_stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError>;
}
