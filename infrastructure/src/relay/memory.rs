//! In-process pub/sub relay backed by tokio broadcast channels.

use async_trait::async_trait;
use chorus_application::ports::relay_transport::{
    DeliveryHint, RelayError, RelaySubscription, RelayTransport,
};
use chorus_application::ports::topic_authorizer::TopicAuthorizer;
use chorus_domain::{Identity, Topic};
use futures::stream;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// One broadcast channel per topic. Subscribing requires a prior grant
/// through [`TopicAuthorizer::authorize`].
pub struct MemoryRelay {
    capacity: usize,
    channels: Mutex<HashMap<Topic, broadcast::Sender<String>>>,
    grants: Mutex<HashSet<Topic>>,
}

impl MemoryRelay {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
            grants: Mutex::new(HashSet::new()),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<Topic, broadcast::Sender<String>>> {
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sender(&self, topic: &Topic) -> broadcast::Sender<String> {
        self.channels()
            .entry(topic.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    fn is_granted(&self, topic: &Topic) -> bool {
        self.grants
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(topic)
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl RelayTransport for MemoryRelay {
    async fn publish(
        &self,
        topic: &Topic,
        payload: String,
        _hint: DeliveryHint,
    ) -> Result<(), RelayError> {
        // Publishing with nobody listening is not an error; the message is gone.
        match self.sender(topic).send(payload) {
            Ok(receivers) => debug!("Published on {} to {} subscriber(s)", topic, receivers),
            Err(_) => debug!("Published on {} with no subscribers", topic),
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &Topic) -> Result<RelaySubscription, RelayError> {
        if !self.is_granted(topic) {
            return Err(RelayError::Unauthorized(topic.to_string()));
        }

        let receiver = self.sender(topic).subscribe();
        let topic = topic.clone();
        Ok(RelaySubscription::new(stream::unfold(
            receiver,
            move |mut receiver| {
                let topic = topic.clone();
                async move {
                    loop {
                        match receiver.recv().await {
                            Ok(payload) => return Some((payload, receiver)),
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                warn!("Subscriber on {} lagged, {} message(s) lost", topic, skipped);
                            }
                            Err(broadcast::error::RecvError::Closed) => return None,
                        }
                    }
                }
            },
        )))
    }
}

#[async_trait]
impl TopicAuthorizer for MemoryRelay {
    async fn authorize(&self, identity: &Identity, topic: &Topic) -> Result<(), RelayError> {
        let newly_granted = self
            .grants
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(topic.clone());
        if newly_granted {
            info!("Granted {} access to {}", identity, topic);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str) -> Topic {
        Topic::new(name).unwrap()
    }

    #[tokio::test]
    async fn test_subscribe_requires_grant() {
        let relay = MemoryRelay::new(16);
        let result = relay.subscribe(&topic("chat/alice")).await;
        assert!(matches!(result, Err(RelayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_granting_twice_is_fine() {
        let relay = MemoryRelay::new(16);
        let alice = Identity::new("alice").unwrap();
        relay.authorize(&alice, &topic("chat/alice")).await.unwrap();
        relay.authorize(&alice, &topic("chat/alice")).await.unwrap();
        assert!(relay.subscribe(&topic("chat/alice")).await.is_ok());
    }

    #[tokio::test]
    async fn test_delivers_in_publish_order_per_topic() {
        let relay = MemoryRelay::new(16);
        let alice = Identity::new("alice").unwrap();
        relay.authorize(&alice, &topic("chat/alice")).await.unwrap();
        let mut subscription = relay.subscribe(&topic("chat/alice")).await.unwrap();

        for payload in ["one", "two"] {
            relay
                .publish(&topic("chat/alice"), payload.to_string(), DeliveryHint::AtLeastOnce)
                .await
                .unwrap();
        }
        relay
            .publish(&topic("chat/bob"), "other".to_string(), DeliveryHint::AtMostOnce)
            .await
            .unwrap();

        assert_eq!(subscription.next_payload().await.as_deref(), Some("one"));
        assert_eq!(subscription.next_payload().await.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_succeeds() {
        let relay = MemoryRelay::new(16);
        let result = relay
            .publish(&topic("chat/nobody"), "x".to_string(), DeliveryHint::AtLeastOnce)
            .await;
        assert!(result.is_ok());
    }
}
