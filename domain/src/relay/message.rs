//! Relay wire messages.
//!
//! Every payload on a topic is a flat JSON record:
//!
//! ```json
//! {"kind":"delta","role":"gpt-4o-mini","message":"Hel","sequence":1,"epoch":3}
//! ```
//!
//! `role` carries the model id, `epoch` the question the chunk answers.
//! End-of-stream and failure markers reuse the same shape with
//! `kind = "end"` / `kind = "error"`.

use crate::core::{error::DomainError, identity::Topic, model::Model};
use serde::{Deserialize, Serialize};

/// Identifies one outstanding question within a session.
///
/// Chunks stamped with an older epoch belong to an abandoned question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnEpoch(u64);

impl TurnEpoch {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for TurnEpoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One fragment of model text on the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    pub session_topic: Topic,
    pub model: Model,
    pub epoch: TurnEpoch,
    /// Starts at 1 per model per question.
    pub sequence: u64,
    pub text: String,
}

/// Everything a relay topic carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    Chunk(StreamChunk),
    /// The model's stream ended normally after `last_sequence` chunks.
    End {
        model: Model,
        epoch: TurnEpoch,
        last_sequence: u64,
    },
    /// The model's stream could not be established or broke down.
    Failed {
        model: Model,
        epoch: TurnEpoch,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RecordKind {
    Delta,
    End,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
struct RelayRecord {
    kind: RecordKind,
    role: Model,
    #[serde(default)]
    message: String,
    #[serde(default)]
    sequence: u64,
    epoch: TurnEpoch,
}

impl RelayMessage {
    pub fn model(&self) -> &Model {
        match self {
            RelayMessage::Chunk(chunk) => &chunk.model,
            RelayMessage::End { model, .. } | RelayMessage::Failed { model, .. } => model,
        }
    }

    pub fn epoch(&self) -> TurnEpoch {
        match self {
            RelayMessage::Chunk(chunk) => chunk.epoch,
            RelayMessage::End { epoch, .. } | RelayMessage::Failed { epoch, .. } => *epoch,
        }
    }

    /// Encode as the flat JSON payload published on the relay.
    pub fn encode(&self) -> String {
        let record = match self {
            RelayMessage::Chunk(chunk) => RelayRecord {
                kind: RecordKind::Delta,
                role: chunk.model.clone(),
                message: chunk.text.clone(),
                sequence: chunk.sequence,
                epoch: chunk.epoch,
            },
            RelayMessage::End {
                model,
                epoch,
                last_sequence,
            } => RelayRecord {
                kind: RecordKind::End,
                role: model.clone(),
                message: String::new(),
                sequence: *last_sequence,
                epoch: *epoch,
            },
            RelayMessage::Failed {
                model,
                epoch,
                message,
            } => RelayRecord {
                kind: RecordKind::Error,
                role: model.clone(),
                message: message.clone(),
                sequence: 0,
                epoch: *epoch,
            },
        };
        // A record of plain strings and integers always serializes.
        serde_json::to_string(&record).unwrap_or_default()
    }

    /// Decode a payload received on `topic`.
    pub fn decode(topic: &Topic, payload: &str) -> Result<Self, DomainError> {
        let record: RelayRecord = serde_json::from_str(payload)
            .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;

        match record.kind {
            RecordKind::Delta => {
                if record.sequence == 0 {
                    return Err(DomainError::MalformedPayload(
                        "delta sequence must start at 1".to_string(),
                    ));
                }
                Ok(RelayMessage::Chunk(StreamChunk {
                    session_topic: topic.clone(),
                    model: record.role,
                    epoch: record.epoch,
                    sequence: record.sequence,
                    text: record.message,
                }))
            }
            RecordKind::End => Ok(RelayMessage::End {
                model: record.role,
                epoch: record.epoch,
                last_sequence: record.sequence,
            }),
            RecordKind::Error => Ok(RelayMessage::Failed {
                model: record.role,
                epoch: record.epoch,
                message: record.message,
            }),
        }
    }
}
