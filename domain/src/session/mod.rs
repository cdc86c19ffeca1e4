//! Chat session domain.
//!
//! - [`stream::StreamEvent`]: one event of a model's streamed answer
//! - [`scope::SessionScope`]: identity and relay topic of a session

pub mod scope;
pub mod stream;
