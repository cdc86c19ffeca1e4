//! Per-model reassembly state for one outstanding question.

use crate::core::model::Model;

/// What happened to a chunk handed to [`PendingTurn::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Next expected sequence; appended.
    Appended,
    /// Already seen (`sequence <= highest`); discarded.
    Duplicate,
    /// Arrived past a gap; appended anyway and the counter jumped forward.
    /// `skipped` sequences were never seen and will be discarded if they
    /// show up later.
    GapAccepted { skipped: u64 },
    /// The model already finished; discarded.
    AfterCompletion,
}

/// Live reassembly of one model's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    model: Model,
    buffer: String,
    highest_sequence_seen: u64,
    complete: bool,
    failure: Option<String>,
}

impl PendingTurn {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            buffer: String::new(),
            highest_sequence_seen: 0,
            complete: false,
            failure: None,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn highest_sequence_seen(&self) -> u64 {
        self.highest_sequence_seen
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Finished one way or the other.
    pub fn is_settled(&self) -> bool {
        self.complete || self.failure.is_some()
    }

    /// Merge a chunk by sequence number.
    ///
    /// Out-of-order chunks are not buffered: a chunk past a gap is appended
    /// on arrival and the counter advances to it, so a late chunk from inside
    /// the gap is then treated as a duplicate.
    pub fn merge(&mut self, sequence: u64, text: &str) -> MergeOutcome {
        if self.is_settled() {
            return MergeOutcome::AfterCompletion;
        }
        if sequence <= self.highest_sequence_seen {
            return MergeOutcome::Duplicate;
        }

        let skipped = sequence - self.highest_sequence_seen - 1;
        self.buffer.push_str(text);
        self.highest_sequence_seen = sequence;

        if skipped == 0 {
            MergeOutcome::Appended
        } else {
            MergeOutcome::GapAccepted { skipped }
        }
    }

    pub fn mark_complete(&mut self) {
        if self.failure.is_none() {
            self.complete = true;
        }
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        if !self.complete {
            self.failure = Some(message.into());
        }
    }

    pub fn snapshot(&self) -> PendingSnapshot {
        PendingSnapshot {
            model: self.model.clone(),
            text: self.buffer.clone(),
            complete: self.complete,
            failure: self.failure.clone(),
        }
    }
}

/// Read-only view of a [`PendingTurn`] handed to presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSnapshot {
    pub model: Model,
    pub text: String,
    pub complete: bool,
    pub failure: Option<String>,
}

impl PendingSnapshot {
    pub fn is_settled(&self) -> bool {
        self.complete || self.failure.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_chunks_concatenate() {
        let mut pending = PendingTurn::new(Model::Echo);
        assert_eq!(pending.merge(1, "hi"), MergeOutcome::Appended);
        assert_eq!(pending.merge(2, "!"), MergeOutcome::Appended);
        assert_eq!(pending.text(), "hi!");
        assert_eq!(pending.highest_sequence_seen(), 2);
    }

    #[test]
    fn duplicate_chunk_is_idempotent() {
        let mut once = PendingTurn::new(Model::Echo);
        once.merge(1, "a");
        once.merge(2, "b");

        let mut twice = PendingTurn::new(Model::Echo);
        twice.merge(1, "a");
        assert_eq!(twice.merge(1, "a"), MergeOutcome::Duplicate);
        twice.merge(2, "b");
        assert_eq!(twice.merge(2, "b"), MergeOutcome::Duplicate);

        assert_eq!(once, twice);
    }

    #[test]
    fn out_of_order_appends_on_arrival() {
        let mut pending = PendingTurn::new(Model::Echo);
        pending.merge(1, "a");
        assert_eq!(pending.merge(3, "c"), MergeOutcome::GapAccepted { skipped: 1 });
        // The late chunk falls inside the gap and is discarded.
        assert_eq!(pending.merge(2, "b"), MergeOutcome::Duplicate);
        assert_eq!(pending.text(), "ac");
        assert_eq!(pending.highest_sequence_seen(), 3);
    }

    #[test]
    fn chunks_after_completion_are_ignored() {
        let mut pending = PendingTurn::new(Model::Echo);
        pending.merge(1, "done");
        pending.mark_complete();
        assert_eq!(pending.merge(2, "late"), MergeOutcome::AfterCompletion);
        assert_eq!(pending.text(), "done");
        assert!(pending.snapshot().complete);
    }

    #[test]
    fn failure_and_completion_are_exclusive() {
        let mut failed = PendingTurn::new(Model::Echo);
        failed.mark_failed("boom");
        failed.mark_complete();
        assert!(!failed.is_complete());
        assert_eq!(failed.failure(), Some("boom"));

        let mut done = PendingTurn::new(Model::Echo);
        done.mark_complete();
        done.mark_failed("late error");
        assert!(done.is_complete());
        assert!(done.failure().is_none());
    }
}
