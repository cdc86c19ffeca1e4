//! Relay Publisher use case.
//!
//! Drives one model stream adapter to completion and pushes everything it
//! yields onto the session topic. Each non-empty delta becomes a
//! [`StreamChunk`] numbered from 1; the stream is closed with an end marker,
//! or a failure marker when the adapter could not be reached or broke down.
//!
//! Publishing is at-least-once with a bounded retry budget. A chunk that
//! still cannot be published is logged and dropped; its sequence number is
//! not reused, so the aggregator sees a gap rather than a renumbered stream.

use crate::config::PublishPolicy;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger, STREAM_FAILED,
};
use crate::ports::model_stream::ModelStreamAdapter;
use crate::ports::relay_transport::{DeliveryHint, RelayError, RelayTransport};
use chorus_domain::{Message, Model, RelayMessage, StreamChunk, StreamEvent, Topic, TurnEpoch};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What happened to one relayed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub model: Model,
    pub epoch: TurnEpoch,
    /// Highest sequence number assigned.
    pub last_sequence: u64,
    /// Chunks given up on after exhausting the retry budget.
    pub dropped: u64,
    /// Set when the stream ended with a failure marker.
    pub failure: Option<String>,
}

impl RelayOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Publishes adapter output onto a relay topic.
#[derive(Clone)]
pub struct RelayPublisher {
    transport: Arc<dyn RelayTransport>,
    policy: PublishPolicy,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RelayPublisher {
    pub fn new(transport: Arc<dyn RelayTransport>, policy: PublishPolicy) -> Self {
        Self {
            transport,
            policy,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn policy(&self) -> &PublishPolicy {
        &self.policy
    }

    /// Run `adapter` on a detached task. Nobody has to await the handle;
    /// results reach the session through the relay.
    pub fn spawn(
        &self,
        adapter: Arc<dyn ModelStreamAdapter>,
        history: Arc<[Message]>,
        topic: Topic,
        epoch: TurnEpoch,
    ) -> JoinHandle<RelayOutcome> {
        let publisher = self.clone();
        tokio::spawn(async move {
            publisher
                .relay(adapter.as_ref(), &history, &topic, epoch)
                .await
        })
    }

    /// Stream one answer from `adapter` onto `topic`.
    pub async fn relay(
        &self,
        adapter: &dyn ModelStreamAdapter,
        history: &[Message],
        topic: &Topic,
        epoch: TurnEpoch,
    ) -> RelayOutcome {
        let model = adapter.model().clone();
        let mut outcome = RelayOutcome {
            model: model.clone(),
            epoch,
            last_sequence: 0,
            dropped: 0,
            failure: None,
        };

        info!("Relaying {} for question {} on {}", model, epoch, topic);

        let mut handle = match adapter.open_stream(history).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Model {} could not be reached: {}", model, e);
                self.finish_failed(topic, &mut outcome, e.to_string()).await;
                return outcome;
            }
        };

        while let Some(event) = handle.next().await {
            match event {
                StreamEvent::Delta(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    outcome.last_sequence += 1;
                    let message = RelayMessage::Chunk(StreamChunk {
                        session_topic: topic.clone(),
                        model: model.clone(),
                        epoch,
                        sequence: outcome.last_sequence,
                        text,
                    });
                    if let Err(e) = self.publish_with_retry(topic, &message).await {
                        warn!(
                            "Dropping chunk {} of {}: {}",
                            outcome.last_sequence, model, e
                        );
                        outcome.dropped += 1;
                    } else {
                        debug!("Published chunk {} of {}", outcome.last_sequence, model);
                    }
                }
                StreamEvent::Completed => break,
                StreamEvent::Error(e) => {
                    warn!("Stream from {} broke down: {}", model, e);
                    self.finish_failed(topic, &mut outcome, e).await;
                    return outcome;
                }
            }
        }

        let end = RelayMessage::End {
            model: model.clone(),
            epoch,
            last_sequence: outcome.last_sequence,
        };
        if let Err(e) = self.publish_with_retry(topic, &end).await {
            warn!("Dropping end marker of {}: {}", model, e);
        }

        info!(
            "Relay of {} finished after {} chunks ({} dropped)",
            model, outcome.last_sequence, outcome.dropped
        );
        outcome
    }

    async fn finish_failed(&self, topic: &Topic, outcome: &mut RelayOutcome, message: String) {
        self.conversation_logger.log(ConversationEvent::new(
            STREAM_FAILED,
            json!({
                "model": outcome.model.to_string(),
                "epoch": outcome.epoch.value(),
                "error": message,
            }),
        ));

        let failed = RelayMessage::Failed {
            model: outcome.model.clone(),
            epoch: outcome.epoch,
            message: message.clone(),
        };
        if let Err(e) = self.publish_with_retry(topic, &failed).await {
            warn!("Dropping failure marker of {}: {}", outcome.model, e);
        }
        outcome.failure = Some(message);
    }

    /// Publish with at-least-once semantics and the configured retry budget.
    async fn publish_with_retry(
        &self,
        topic: &Topic,
        message: &RelayMessage,
    ) -> Result<(), RelayError> {
        let payload = message.encode();
        let mut attempt = 1;
        loop {
            match self
                .transport
                .publish(topic, payload.clone(), DeliveryHint::AtLeastOnce)
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.policy.max_attempts => {
                    debug!(
                        "Publish attempt {}/{} failed: {}",
                        attempt, self.policy.max_attempts, e
                    );
                    tokio::time::sleep(self.policy.delay_for(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
