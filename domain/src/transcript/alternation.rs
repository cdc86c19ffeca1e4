//! Strict user / non-user alternation.
//!
//! Upstream chat APIs reject histories where two user (or two assistant)
//! messages are adjacent. Two rules live here:
//!
//! - [`append_alternating`] guards the single insertion point of an append.
//!   Earlier entries are never rewritten, so a transcript that was already
//!   malformed when it was read stays malformed before the insertion point.
//! - [`normalize`] rewrites a whole history, inserting a placeholder between
//!   every same-class pair. It is used when building a provider request, never
//!   for the persisted transcript.

use super::turn::Turn;

/// Whether appending `next` after `prev` would put two turns of the same
/// class next to each other.
pub fn collides(prev: Option<&Turn>, next: &Turn) -> bool {
    prev.is_some_and(|prev| prev.class() == next.class())
}

/// Append `turn`, inserting a placeholder first if the last turn has the same
/// class. Returns `true` when a placeholder was inserted.
pub fn append_alternating(turns: &mut Vec<Turn>, turn: Turn) -> bool {
    let inserted = collides(turns.last(), &turn);
    if inserted {
        turns.push(Turn::placeholder(turn.class().opposite()));
    }
    turns.push(turn);
    inserted
}

/// Copy of `turns` with a placeholder between every same-class pair.
pub fn normalize(turns: &[Turn]) -> Vec<Turn> {
    let mut out = Vec::with_capacity(turns.len());
    for turn in turns {
        append_alternating(&mut out, turn.clone());
    }
    out
}

/// Whether no two adjacent turns share a class.
pub fn is_alternating(turns: &[Turn]) -> bool {
    turns.windows(2).all(|pair| pair[0].class() != pair[1].class())
}
