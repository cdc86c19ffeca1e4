//! Transcript domain.
//!
//! - [`turn::Turn`]: one role-tagged message
//! - [`entities::Transcript`]: the persisted, strictly alternating conversation
//! - [`alternation`]: placeholder insertion rules
//! - [`history`]: conversion to the provider message format

pub mod alternation;
pub mod entities;
pub mod history;
pub mod turn;
