//! Transcript entity

use super::alternation::append_alternating;
use super::turn::{RoleClass, Turn};
use crate::core::identity::{Identity, TranscriptId};

/// The persisted conversation of one identity (Entity)
///
/// Turns are append-only; the only mutation is [`Transcript::append`],
/// which applies the alternation rule at the insertion point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    id: TranscriptId,
    owner: Identity,
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(id: TranscriptId, owner: Identity) -> Self {
        Self::with_turns(id, owner, Vec::new())
    }

    pub fn with_turns(id: TranscriptId, owner: Identity, turns: Vec<Turn>) -> Self {
        Self { id, owner, turns }
    }

    pub fn id(&self) -> &TranscriptId {
        &self.id
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        &self.owner == identity
    }

    pub fn last_class(&self) -> Option<RoleClass> {
        self.turns.last().map(Turn::class)
    }

    /// Append a turn; returns `true` when a placeholder had to be inserted.
    pub fn append(&mut self, turn: Turn) -> bool {
        append_alternating(&mut self.turns, turn)
    }
}
