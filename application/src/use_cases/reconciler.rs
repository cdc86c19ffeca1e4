//! Transcript Reconciler use case.
//!
//! Owns the canonical turn list of one conversation. A question moves
//! through `Idle → AwaitingModels → (resolved) → Idle`:
//!
//! 1. [`submit`](TranscriptReconciler::submit) appends the user turn to the
//!    local view, fans the question out to every adapter on detached tasks,
//!    and persists the user turn with a read-modify-write.
//! 2. While awaiting, answers accumulate in the [`LiveAggregator`] only.
//! 3. [`select`](TranscriptReconciler::select) commits exactly one completed
//!    answer and discards the rest.
//!
//! Read-modify-write is not transactional; the last writer wins. A failed
//! write leaves the optimistic local append in place.

use crate::config::ConversationConfig;
use crate::ports::conversation_logger::{
    ANSWER_COMMITTED, ConversationEvent, ConversationLogger, NoConversationLogger,
    QUESTION_SUBMITTED,
};
use crate::ports::model_stream::ModelStreamAdapter;
use crate::ports::transcript_store::{StoreError, TranscriptStore};
use crate::use_cases::relay_publisher::RelayPublisher;
use crate::use_cases::stream_aggregator::LiveAggregator;
use chorus_domain::{
    Message, Model, PendingSnapshot, SessionScope, Transcript, TranscriptId, Turn, TurnEpoch,
    upstream_history,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Where the reconciler is in the question lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Idle,
    AwaitingModels { epoch: TurnEpoch },
}

/// Errors surfaced to the reconciler's caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Question is empty")]
    EmptyInput,

    #[error("No models are configured")]
    NoParticipants,

    #[error("No question is awaiting answers")]
    NotAwaiting,

    #[error("Model {0} is not answering the current question")]
    UnknownModel(Model),

    #[error("Model {0} has not finished its answer")]
    Incomplete(Model),

    #[error("Model {model} failed: {message}")]
    ModelFailed { model: Model, message: String },

    #[error("Transcript not found: {0}")]
    NotFound(TranscriptId),

    #[error("Transcript {0} belongs to another identity")]
    NotOwner(TranscriptId),

    #[error("Store read failed: {0}")]
    StoreRead(String),

    #[error("Store write failed: {0}")]
    StoreWrite(String),
}

impl ReconcileError {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ReconcileError::EmptyInput => "Type a question first.".to_string(),
            ReconcileError::NoParticipants => {
                "No models are configured; add some under [models].".to_string()
            }
            ReconcileError::NotAwaiting => "Ask a question before picking an answer.".to_string(),
            ReconcileError::UnknownModel(model) => {
                format!("{} was not asked this question.", model)
            }
            ReconcileError::Incomplete(model) => {
                format!("{} is still answering; wait until it finishes.", model)
            }
            ReconcileError::ModelFailed { model, message } => {
                format!("{} could not answer ({}). Pick another model.", model, message)
            }
            ReconcileError::NotFound(_) => {
                "This conversation no longer exists. Start a new one.".to_string()
            }
            ReconcileError::NotOwner(_) => "That conversation belongs to someone else.".to_string(),
            ReconcileError::StoreRead(_) => {
                "Could not load the conversation. Try again in a moment.".to_string()
            }
            ReconcileError::StoreWrite(_) => {
                "Could not save the conversation. Your message is kept locally; try again."
                    .to_string()
            }
        }
    }

    fn from_read(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => ReconcileError::NotFound(id),
            other => ReconcileError::StoreRead(other.to_string()),
        }
    }

    fn from_write(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => ReconcileError::NotFound(id),
            other => ReconcileError::StoreWrite(other.to_string()),
        }
    }
}

/// A committed answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub model: Model,
    pub epoch: TurnEpoch,
    pub text: String,
    /// A placeholder had to be inserted before the committed turn.
    pub placeholder_inserted: bool,
}

pub struct TranscriptReconciler {
    scope: SessionScope,
    store: Arc<dyn TranscriptStore>,
    adapters: Vec<Arc<dyn ModelStreamAdapter>>,
    publisher: RelayPublisher,
    aggregator: LiveAggregator,
    config: ConversationConfig,
    conversation_logger: Arc<dyn ConversationLogger>,
    transcript: Transcript,
    persisted: bool,
    phase: ReconcilePhase,
}

impl TranscriptReconciler {
    /// Start with a fresh transcript that is created on the first question.
    pub fn new(
        scope: SessionScope,
        store: Arc<dyn TranscriptStore>,
        adapters: Vec<Arc<dyn ModelStreamAdapter>>,
        publisher: RelayPublisher,
        aggregator: LiveAggregator,
        config: ConversationConfig,
    ) -> Self {
        let transcript = Transcript::new(TranscriptId::generate(), scope.identity.clone());
        Self {
            scope,
            store,
            adapters,
            publisher,
            aggregator,
            config,
            conversation_logger: Arc::new(NoConversationLogger),
            transcript,
            persisted: false,
            phase: ReconcilePhase::Idle,
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn phase(&self) -> ReconcilePhase {
        self.phase
    }

    pub fn aggregator(&self) -> &LiveAggregator {
        &self.aggregator
    }

    pub fn participants(&self) -> Vec<Model> {
        self.adapters.iter().map(|a| a.model().clone()).collect()
    }

    /// Live answers for the current question.
    pub fn snapshots(&self) -> Vec<PendingSnapshot> {
        self.aggregator.snapshots()
    }

    /// Ask every configured model `text`.
    ///
    /// A question submitted while another is still awaiting answers
    /// abandons the earlier one; its streams keep running but are ignored.
    pub async fn submit(&mut self, text: &str) -> Result<TurnEpoch, ReconcileError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ReconcileError::EmptyInput);
        }
        if self.adapters.is_empty() {
            return Err(ReconcileError::NoParticipants);
        }

        let turn = Turn::user(text);
        self.transcript.append(turn.clone());

        let history: Arc<[Message]> =
            upstream_history(self.transcript.turns(), &self.config.greeting).into();
        let epoch = self.aggregator.begin_question(&self.participants());
        self.phase = ReconcilePhase::AwaitingModels { epoch };

        info!(
            "Question {} on {} fanned out to {} model(s)",
            epoch,
            self.transcript.id(),
            self.adapters.len()
        );
        for adapter in &self.adapters {
            // Detached: answers come back through the relay.
            let _ = self.publisher.spawn(
                Arc::clone(adapter),
                Arc::clone(&history),
                self.scope.topic.clone(),
                epoch,
            );
        }

        self.conversation_logger.log(ConversationEvent::new(
            QUESTION_SUBMITTED,
            json!({
                "transcript": self.transcript.id().as_str(),
                "epoch": epoch.value(),
                "text": text,
                "models": self.participants().iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            }),
        ));

        self.persist_user_turn(turn).await?;
        Ok(epoch)
    }

    async fn persist_user_turn(&mut self, turn: Turn) -> Result<(), ReconcileError> {
        if !self.persisted {
            let created = self
                .store
                .create(
                    self.transcript.id(),
                    &self.scope.identity,
                    self.transcript.turns().to_vec(),
                )
                .await
                .map_err(|e| {
                    warn!("Creating transcript {} failed: {}", self.transcript.id(), e);
                    ReconcileError::from_write(e)
                })?;
            debug!("Created transcript {}", created.id());
            self.transcript = created;
            self.persisted = true;
            return Ok(());
        }

        let mut stored = match self.store.get(self.transcript.id()).await {
            Ok(stored) => stored,
            Err(e) => return Err(self.store_failure(ReconcileError::from_read(e))),
        };
        stored.append(turn);
        match self
            .store
            .update(self.transcript.id(), stored.into_turns())
            .await
        {
            Ok(updated) => {
                self.transcript = updated;
                Ok(())
            }
            Err(e) => Err(self.store_failure(ReconcileError::from_write(e))),
        }
    }

    /// Commit `model`'s completed answer to the transcript.
    ///
    /// Rejected without side effects unless the model has finished
    /// successfully for the current question.
    pub async fn select(&mut self, model: &Model) -> Result<Resolution, ReconcileError> {
        let ReconcilePhase::AwaitingModels { epoch } = self.phase else {
            return Err(ReconcileError::NotAwaiting);
        };

        let snapshot = self
            .aggregator
            .snapshot(model)
            .ok_or_else(|| ReconcileError::UnknownModel(model.clone()))?;
        if let Some(message) = snapshot.failure {
            return Err(ReconcileError::ModelFailed {
                model: model.clone(),
                message,
            });
        }
        if !snapshot.complete {
            return Err(ReconcileError::Incomplete(model.clone()));
        }

        let turn = Turn::model(model.clone(), snapshot.text.clone());
        let (turns, placeholder_inserted) = if self.persisted {
            let mut stored = match self.store.get(self.transcript.id()).await {
                Ok(stored) => stored,
                Err(e) => return Err(self.store_failure(ReconcileError::from_read(e))),
            };
            let inserted = stored.append(turn);
            (stored.into_turns(), inserted)
        } else {
            let mut local = self.transcript.clone();
            let inserted = local.append(turn);
            (local.into_turns(), inserted)
        };

        let written = if self.persisted {
            self.store.update(self.transcript.id(), turns).await
        } else {
            self.store
                .create(self.transcript.id(), &self.scope.identity, turns)
                .await
        };
        match written {
            Ok(updated) => {
                self.transcript = updated;
                self.persisted = true;
            }
            Err(e) => return Err(self.store_failure(ReconcileError::from_write(e))),
        }

        self.aggregator.clear();
        self.phase = ReconcilePhase::Idle;

        info!(
            "Committed answer from {} for question {} on {}",
            model,
            epoch,
            self.transcript.id()
        );
        self.conversation_logger.log(ConversationEvent::new(
            ANSWER_COMMITTED,
            json!({
                "transcript": self.transcript.id().as_str(),
                "epoch": epoch.value(),
                "model": model.to_string(),
                "text": snapshot.text,
                "placeholder_inserted": placeholder_inserted,
            }),
        ));

        Ok(Resolution {
            model: model.clone(),
            epoch,
            text: snapshot.text,
            placeholder_inserted,
        })
    }

    /// Start a new, empty transcript and persist it right away.
    pub async fn new_transcript(&mut self) -> Result<&Transcript, ReconcileError> {
        let id = TranscriptId::generate();
        let created = self
            .store
            .create(&id, &self.scope.identity, Vec::new())
            .await
            .map_err(ReconcileError::from_write)?;

        info!("Started transcript {}", id);
        self.reset_to(created);
        Ok(&self.transcript)
    }

    /// Continue an existing transcript owned by this session's identity.
    pub async fn open(&mut self, id: &TranscriptId) -> Result<&Transcript, ReconcileError> {
        let transcript = self
            .store
            .get(id)
            .await
            .map_err(ReconcileError::from_read)?;
        if !transcript.is_owned_by(&self.scope.identity) {
            return Err(ReconcileError::NotOwner(id.clone()));
        }

        info!(
            "Opened transcript {} ({} turns)",
            id,
            transcript.turns().len()
        );
        self.reset_to(transcript);
        Ok(&self.transcript)
    }

    fn reset_to(&mut self, transcript: Transcript) {
        self.transcript = transcript;
        self.persisted = true;
        self.aggregator.clear();
        self.phase = ReconcilePhase::Idle;
    }

    /// Log a store failure; a vanished transcript also ends the question.
    fn store_failure(&mut self, error: ReconcileError) -> ReconcileError {
        warn!("Transcript {}: {}", self.transcript.id(), error);
        if matches!(error, ReconcileError::NotFound(_)) {
            self.aggregator.clear();
            self.phase = ReconcilePhase::Idle;
        }
        error
    }
}
