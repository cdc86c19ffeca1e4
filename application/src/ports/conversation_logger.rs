//! Conversation log port.
//!
//! Records what happened to each question as one JSON object per event, next
//! to the `tracing` diagnostics. Three events are emitted:
//!
//! | event | emitted by | payload |
//! |-------|------------|---------|
//! | [`QUESTION_SUBMITTED`] | reconciler, after fan-out | `transcript`, `epoch`, `text`, `models` |
//! | [`ANSWER_COMMITTED`] | reconciler, on commit | `transcript`, `epoch`, `model`, `text`, `placeholder_inserted` |
//! | [`STREAM_FAILED`] | relay publisher | `model`, `epoch`, `error` |
//!
//! `transcript` is the transcript id, `epoch` the turn epoch number and
//! `model`/`models` the display names of the participating models.

use serde_json::Value;

/// A question was fanned out to every participating model.
pub const QUESTION_SUBMITTED: &str = "question_submitted";
/// A single answer was appended to the transcript.
pub const ANSWER_COMMITTED: &str = "answer_committed";
/// A model stream ended with an error instead of an end marker.
pub const STREAM_FAILED: &str = "stream_failed";

pub struct ConversationEvent {
    /// One of the event names above.
    pub event_type: &'static str,
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Sink for conversation events.
///
/// `log` never fails; implementations swallow their own I/O errors so a
/// broken log file cannot stall a turn.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// Discards everything.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
