//! Stream Aggregator use case.
//!
//! Demultiplexes the relay topic of one session by model and reassembles a
//! live partial answer per model for the current question.
//!
//! [`StreamAggregator`] holds the pure state. [`LiveAggregator`] shares it
//! between the subscription task (writer) and the reconciler and UI
//! (readers), and lets readers wait for changes.

use crate::ports::relay_transport::RelaySubscription;
use chorus_domain::{
    MergeOutcome, Model, PendingSnapshot, PendingTurn, RelayMessage, Topic, TurnEpoch,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What the aggregator did with one relay message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Merged(MergeOutcome),
    Completed,
    Failed,
    /// The message answers an abandoned question, or no question is open.
    Stale,
}

/// Pending turns for the question currently awaiting answers.
#[derive(Debug)]
pub struct StreamAggregator {
    epoch: TurnEpoch,
    active: bool,
    pending: HashMap<Model, PendingTurn>,
    order: Vec<Model>,
}

impl Default for StreamAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self {
            epoch: TurnEpoch::new(0),
            active: false,
            pending: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn epoch(&self) -> TurnEpoch {
        self.epoch
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Abandon whatever was pending and open the next question.
    ///
    /// Chunks still in flight for the previous epoch are dropped on arrival.
    pub fn begin_question(&mut self, participants: &[Model]) -> TurnEpoch {
        self.epoch = self.epoch.next();
        self.active = true;
        self.pending.clear();
        self.order.clear();
        for model in participants {
            self.track(model);
        }
        self.epoch
    }

    /// Destroy all pending turns; later messages for this epoch are stale.
    pub fn clear(&mut self) {
        self.active = false;
        self.pending.clear();
        self.order.clear();
    }

    pub fn apply(&mut self, message: RelayMessage) -> ApplyOutcome {
        if !self.active || message.epoch() != self.epoch {
            return ApplyOutcome::Stale;
        }
        let model = message.model().clone();
        let pending = self.track(&model);

        match message {
            RelayMessage::Chunk(chunk) => {
                ApplyOutcome::Merged(pending.merge(chunk.sequence, &chunk.text))
            }
            RelayMessage::End { .. } => {
                pending.mark_complete();
                ApplyOutcome::Completed
            }
            RelayMessage::Failed { message, .. } => {
                pending.mark_failed(message);
                ApplyOutcome::Failed
            }
        }
    }

    pub fn snapshot(&self, model: &Model) -> Option<PendingSnapshot> {
        self.pending.get(model).map(PendingTurn::snapshot)
    }

    /// Snapshots in participant order, followed by models that showed up
    /// uninvited on the topic.
    pub fn snapshots(&self) -> Vec<PendingSnapshot> {
        self.order
            .iter()
            .filter_map(|model| self.snapshot(model))
            .collect()
    }

    /// True when every tracked model has finished or failed.
    pub fn all_settled(&self) -> bool {
        self.pending.values().all(PendingTurn::is_settled)
    }

    fn track(&mut self, model: &Model) -> &mut PendingTurn {
        if !self.pending.contains_key(model) {
            self.order.push(model.clone());
        }
        self.pending
            .entry(model.clone())
            .or_insert_with(|| PendingTurn::new(model.clone()))
    }
}

/// Shared, observable [`StreamAggregator`].
#[derive(Clone)]
pub struct LiveAggregator {
    state: Arc<Mutex<StreamAggregator>>,
    changes: Arc<watch::Sender<u64>>,
}

impl Default for LiveAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveAggregator {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(StreamAggregator::new())),
            changes: Arc::new(changes),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StreamAggregator> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    pub fn begin_question(&self, participants: &[Model]) -> TurnEpoch {
        let epoch = self.lock().begin_question(participants);
        self.notify();
        epoch
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.notify();
    }

    pub fn apply(&self, message: RelayMessage) -> ApplyOutcome {
        let outcome = self.lock().apply(message);
        if outcome != ApplyOutcome::Stale {
            self.notify();
        }
        outcome
    }

    pub fn epoch(&self) -> TurnEpoch {
        self.lock().epoch()
    }

    pub fn snapshot(&self, model: &Model) -> Option<PendingSnapshot> {
        self.lock().snapshot(model)
    }

    pub fn snapshots(&self) -> Vec<PendingSnapshot> {
        self.lock().snapshots()
    }

    /// Receiver that ticks whenever a snapshot may have changed.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Wait until every tracked model of the current question has settled.
    pub async fn wait_settled(&self) -> Vec<PendingSnapshot> {
        let mut changes = self.changes.subscribe();
        loop {
            {
                let state = self.lock();
                if state.all_settled() {
                    return state.snapshots();
                }
            }
            if changes.changed().await.is_err() {
                return self.snapshots();
            }
        }
    }

    /// Consume `subscription` on a background task until the transport
    /// closes it.
    pub fn spawn_listener(&self, topic: Topic, subscription: RelaySubscription) -> JoinHandle<()> {
        let live = self.clone();
        tokio::spawn(async move { live.listen(&topic, subscription).await })
    }

    async fn listen(&self, topic: &Topic, mut subscription: RelaySubscription) {
        info!("Aggregating relay messages on {}", topic);
        while let Some(payload) = subscription.next_payload().await {
            let message = match RelayMessage::decode(topic, &payload) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Ignoring relay payload on {}: {}", topic, e);
                    continue;
                }
            };
            let model = message.model().clone();
            let epoch = message.epoch();
            match self.apply(message) {
                ApplyOutcome::Merged(MergeOutcome::GapAccepted { skipped }) => {
                    warn!("{} skipped {} chunk(s) in question {}", model, skipped, epoch);
                }
                ApplyOutcome::Stale => {
                    debug!("Dropping stale message from {} for question {}", model, epoch);
                }
                outcome => debug!("{} {}: {:?}", model, epoch, outcome),
            }
        }
        info!("Relay subscription on {} closed", topic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_domain::StreamChunk;
    use futures::stream;
    use std::time::Duration;

    fn topic() -> Topic {
        Topic::new("chat/alice").unwrap()
    }

    fn chunk(model: Model, epoch: TurnEpoch, sequence: u64, text: &str) -> RelayMessage {
        RelayMessage::Chunk(StreamChunk {
            session_topic: topic(),
            model,
            epoch,
            sequence,
            text: text.to_string(),
        })
    }

    fn end(model: Model, epoch: TurnEpoch, last_sequence: u64) -> RelayMessage {
        RelayMessage::End {
            model,
            epoch,
            last_sequence,
        }
    }

    #[test]
    fn test_two_models_assemble_independently() {
        let mut aggregator = StreamAggregator::new();
        let epoch = aggregator.begin_question(&[Model::ClaudeSonnet45, Model::Gpt4oMini]);

        aggregator.apply(chunk(Model::ClaudeSonnet45, epoch, 1, "hi"));
        aggregator.apply(chunk(Model::Gpt4oMini, epoch, 1, "hey"));
        aggregator.apply(chunk(Model::ClaudeSonnet45, epoch, 2, "!"));

        let a = aggregator.snapshot(&Model::ClaudeSonnet45).unwrap();
        let b = aggregator.snapshot(&Model::Gpt4oMini).unwrap();
        assert_eq!(a.text, "hi!");
        assert_eq!(b.text, "hey");
        assert!(!aggregator.all_settled());
    }

    #[test]
    fn test_duplicate_chunk_is_discarded() {
        let mut aggregator = StreamAggregator::new();
        let epoch = aggregator.begin_question(&[Model::Gpt4o]);

        aggregator.apply(chunk(Model::Gpt4o, epoch, 1, "a"));
        let outcome = aggregator.apply(chunk(Model::Gpt4o, epoch, 1, "a"));

        assert_eq!(outcome, ApplyOutcome::Merged(MergeOutcome::Duplicate));
        assert_eq!(aggregator.snapshot(&Model::Gpt4o).unwrap().text, "a");
    }

    #[test]
    fn test_out_of_order_appends_on_arrival() {
        let mut aggregator = StreamAggregator::new();
        let epoch = aggregator.begin_question(&[Model::Gpt4o]);

        aggregator.apply(chunk(Model::Gpt4o, epoch, 1, "a"));
        let gap = aggregator.apply(chunk(Model::Gpt4o, epoch, 3, "c"));
        let late = aggregator.apply(chunk(Model::Gpt4o, epoch, 2, "b"));

        assert_eq!(
            gap,
            ApplyOutcome::Merged(MergeOutcome::GapAccepted { skipped: 1 })
        );
        assert_eq!(late, ApplyOutcome::Merged(MergeOutcome::Duplicate));
        assert_eq!(aggregator.snapshot(&Model::Gpt4o).unwrap().text, "ac");
    }

    #[test]
    fn test_chunks_after_end_are_ignored() {
        let mut aggregator = StreamAggregator::new();
        let epoch = aggregator.begin_question(&[Model::Gpt4o]);

        aggregator.apply(chunk(Model::Gpt4o, epoch, 1, "done"));
        assert_eq!(
            aggregator.apply(end(Model::Gpt4o, epoch, 1)),
            ApplyOutcome::Completed
        );
        let late = aggregator.apply(chunk(Model::Gpt4o, epoch, 2, " more"));

        assert_eq!(late, ApplyOutcome::Merged(MergeOutcome::AfterCompletion));
        let snapshot = aggregator.snapshot(&Model::Gpt4o).unwrap();
        assert_eq!(snapshot.text, "done");
        assert!(snapshot.complete);
        assert!(aggregator.all_settled());
    }

    #[test]
    fn test_previous_question_chunks_are_stale() {
        let mut aggregator = StreamAggregator::new();
        let first = aggregator.begin_question(&[Model::Gpt4o]);
        aggregator.apply(chunk(Model::Gpt4o, first, 1, "old"));

        let second = aggregator.begin_question(&[Model::Gpt4o]);
        let outcome = aggregator.apply(chunk(Model::Gpt4o, first, 2, " answer"));

        assert_eq!(outcome, ApplyOutcome::Stale);
        assert!(second > first);
        assert_eq!(aggregator.snapshot(&Model::Gpt4o).unwrap().text, "");
    }

    #[test]
    fn test_cleared_aggregator_ignores_everything() {
        let mut aggregator = StreamAggregator::new();
        let epoch = aggregator.begin_question(&[Model::Gpt4o]);
        aggregator.clear();

        assert_eq!(
            aggregator.apply(chunk(Model::Gpt4o, epoch, 1, "x")),
            ApplyOutcome::Stale
        );
        assert!(aggregator.snapshots().is_empty());
    }

    #[test]
    fn test_failure_marker_settles_model() {
        let mut aggregator = StreamAggregator::new();
        let epoch = aggregator.begin_question(&[Model::ClaudeSonnet45]);

        let outcome = aggregator.apply(RelayMessage::Failed {
            model: Model::ClaudeSonnet45,
            epoch,
            message: "throttled".to_string(),
        });

        assert_eq!(outcome, ApplyOutcome::Failed);
        let snapshot = aggregator.snapshot(&Model::ClaudeSonnet45).unwrap();
        assert_eq!(snapshot.failure.as_deref(), Some("throttled"));
        assert!(!snapshot.complete);
        assert!(aggregator.all_settled());
    }

    #[test]
    fn test_snapshots_keep_participant_order() {
        let mut aggregator = StreamAggregator::new();
        let epoch = aggregator.begin_question(&[Model::Gpt4o, Model::ClaudeSonnet45]);
        aggregator.apply(chunk(Model::Echo, epoch, 1, "uninvited"));

        let models: Vec<Model> = aggregator.snapshots().into_iter().map(|s| s.model).collect();
        assert_eq!(
            models,
            vec![Model::Gpt4o, Model::ClaudeSonnet45, Model::Echo]
        );
    }

    #[tokio::test]
    async fn test_listener_skips_malformed_payloads() {
        let live = LiveAggregator::new();
        let epoch = live.begin_question(&[Model::Gpt4o]);

        let payloads = vec![
            "not json".to_string(),
            chunk(Model::Gpt4o, epoch, 1, "hel").encode(),
            r#"{"kind":"delta","role":"gpt-4o","message":"x","sequence":0,"epoch":1}"#.to_string(),
            chunk(Model::Gpt4o, epoch, 2, "lo").encode(),
            end(Model::Gpt4o, epoch, 2).encode(),
        ];
        let subscription = RelaySubscription::new(stream::iter(payloads));

        live.spawn_listener(topic(), subscription).await.unwrap();

        let snapshot = live.snapshot(&Model::Gpt4o).unwrap();
        assert_eq!(snapshot.text, "hello");
        assert!(snapshot.complete);
    }

    #[tokio::test]
    async fn test_wait_settled_returns_once_all_models_finish() {
        let live = LiveAggregator::new();
        let epoch = live.begin_question(&[Model::Gpt4o, Model::ClaudeSonnet45]);

        let waiter = {
            let live = live.clone();
            tokio::spawn(async move { live.wait_settled().await })
        };

        live.apply(chunk(Model::Gpt4o, epoch, 1, "a"));
        live.apply(end(Model::Gpt4o, epoch, 1));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        live.apply(RelayMessage::Failed {
            model: Model::ClaudeSonnet45,
            epoch,
            message: "down".to_string(),
        });

        let snapshots = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(PendingSnapshot::is_settled));
    }
}
