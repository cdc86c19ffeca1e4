//! Hand-written port doubles shared by the use case tests.

use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::model_stream::{GatewayError, ModelStreamAdapter, StreamHandle};
use crate::ports::relay_transport::{DeliveryHint, RelayError, RelaySubscription, RelayTransport};
use crate::ports::transcript_store::{StoreError, TranscriptStore};
use async_trait::async_trait;
use chorus_domain::{Identity, Message, Model, StreamEvent, Topic, Transcript, TranscriptId, Turn};
use futures::stream;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::broadcast;

/// Adapter that replays the same script for every call.
pub struct ScriptedAdapter {
    model: Model,
    script: Result<Vec<StreamEvent>, GatewayError>,
    histories: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedAdapter {
    pub fn new(model: Model, events: Vec<StreamEvent>) -> Self {
        Self {
            model,
            script: Ok(events),
            histories: Mutex::new(Vec::new()),
        }
    }

    /// Deltas followed by a normal completion.
    pub fn streaming(model: Model, pieces: &[&str]) -> Self {
        let mut events: Vec<StreamEvent> = pieces
            .iter()
            .map(|p| StreamEvent::Delta(p.to_string()))
            .collect();
        events.push(StreamEvent::Completed);
        Self::new(model, events)
    }

    pub fn unreachable(model: Model, reason: &str) -> Self {
        Self {
            model,
            script: Err(GatewayError::ConnectionError(reason.to_string())),
            histories: Mutex::new(Vec::new()),
        }
    }

    /// Histories this adapter was invoked with, oldest first.
    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.histories.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelStreamAdapter for ScriptedAdapter {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn open_stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        self.histories.lock().unwrap().push(history.to_vec());
        match &self.script {
            Ok(events) => Ok(StreamHandle::from_events(events.clone())),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Conversation logger that keeps every event in memory.
#[derive(Default)]
pub struct RecordingConversationLogger {
    events: Mutex<Vec<(&'static str, serde_json::Value)>>,
}

impl RecordingConversationLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(&'static str, serde_json::Value)> {
        self.events.lock().unwrap().clone()
    }
}

impl ConversationLogger for RecordingConversationLogger {
    fn log(&self, event: ConversationEvent) {
        self.events.lock().unwrap().push((event.event_type, event.payload));
    }
}

/// Relay that only records what was published.
#[derive(Default)]
pub struct RecordingRelay {
    payloads: Mutex<Vec<String>>,
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayTransport for RecordingRelay {
    async fn publish(
        &self,
        _topic: &Topic,
        payload: String,
        _hint: DeliveryHint,
    ) -> Result<(), RelayError> {
        self.payloads.lock().unwrap().push(payload);
        Ok(())
    }

    async fn subscribe(&self, _topic: &Topic) -> Result<RelaySubscription, RelayError> {
        Ok(RelaySubscription::new(stream::empty()))
    }
}

/// Relay whose first `n` publish calls fail.
pub struct FlakyRelay {
    failures_left: AtomicU32,
    delivered: Mutex<Vec<String>>,
}

impl FlakyRelay {
    pub fn failing_first(n: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(n),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayTransport for FlakyRelay {
    async fn publish(
        &self,
        topic: &Topic,
        payload: String,
        _hint: DeliveryHint,
    ) -> Result<(), RelayError> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(RelayError::PublishFailed {
                topic: topic.to_string(),
                reason: "broker unavailable".to_string(),
            });
        }
        self.delivered.lock().unwrap().push(payload);
        Ok(())
    }

    async fn subscribe(&self, _topic: &Topic) -> Result<RelaySubscription, RelayError> {
        Ok(RelaySubscription::new(stream::empty()))
    }
}

/// Relay that delivers every publish to every subscriber, topic ignored.
pub struct LoopbackRelay {
    sender: broadcast::Sender<String>,
}

impl LoopbackRelay {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }
}

#[async_trait]
impl RelayTransport for LoopbackRelay {
    async fn publish(
        &self,
        _topic: &Topic,
        payload: String,
        _hint: DeliveryHint,
    ) -> Result<(), RelayError> {
        let _ = self.sender.send(payload);
        Ok(())
    }

    async fn subscribe(&self, _topic: &Topic) -> Result<RelaySubscription, RelayError> {
        let receiver = self.sender.subscribe();
        Ok(RelaySubscription::new(stream::unfold(
            receiver,
            |mut receiver| async move {
                loop {
                    match receiver.recv().await {
                        Ok(payload) => return Some((payload, receiver)),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            },
        )))
    }
}

/// In-memory store with switchable failures.
#[derive(Default)]
pub struct FakeStore {
    documents: Mutex<HashMap<TranscriptId, Transcript>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicU32,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, transcript: Transcript) {
        self.documents
            .lock()
            .unwrap()
            .insert(transcript.id().clone(), transcript);
    }

    pub fn stored(&self, id: &TranscriptId) -> Option<Transcript> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    /// Simulate someone else deleting the document.
    pub fn remove(&self, id: &TranscriptId) {
        self.documents.lock().unwrap().remove(id);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Successful create/update calls so far.
    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write("disk full".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for FakeStore {
    async fn get(&self, id: &TranscriptId) -> Result<Transcript, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read("connection refused".to_string()));
        }
        self.stored(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn create(
        &self,
        id: &TranscriptId,
        owner: &Identity,
        turns: Vec<Turn>,
    ) -> Result<Transcript, StoreError> {
        self.check_write()?;
        let transcript = Transcript::with_turns(id.clone(), owner.clone(), turns);
        self.insert(transcript.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(transcript)
    }

    async fn update(&self, id: &TranscriptId, turns: Vec<Turn>) -> Result<Transcript, StoreError> {
        self.check_write()?;
        let mut documents = self.documents.lock().unwrap();
        let existing = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let owner = existing.owner().clone();
        *existing = Transcript::with_turns(id.clone(), owner, turns);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(existing.clone())
    }

    async fn delete(&self, id: &TranscriptId) -> Result<(), StoreError> {
        self.documents
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
