//! Relay transport port
//!
//! The pub/sub channel that carries model chunks from the publishers to the
//! session's aggregator. Connection management and authorization live behind
//! this interface.

use async_trait::async_trait;
use chorus_domain::Topic;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

/// Delivery guarantee requested for a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryHint {
    /// Fire once; may be lost.
    AtMostOnce,
    /// Redeliver until acknowledged; may duplicate.
    #[default]
    AtLeastOnce,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Publish to '{topic}' failed: {reason}")]
    PublishFailed { topic: String, reason: String },

    #[error("Not authorized for topic '{0}'")]
    Unauthorized(String),

    #[error("Subscribe to '{topic}' failed: {reason}")]
    SubscribeFailed { topic: String, reason: String },
}

/// Lazy sequence of raw payloads received on a topic.
pub struct RelaySubscription {
    inner: BoxStream<'static, String>,
}

impl RelaySubscription {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = String> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Next payload, or `None` when the transport closed the subscription.
    pub async fn next_payload(&mut self) -> Option<String> {
        self.inner.next().await
    }
}

impl Stream for RelaySubscription {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Pub/sub transport
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn publish(
        &self,
        topic: &Topic,
        payload: String,
        hint: DeliveryHint,
    ) -> Result<(), RelayError>;

    async fn subscribe(&self, topic: &Topic) -> Result<RelaySubscription, RelayError>;
}
