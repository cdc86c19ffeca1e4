//! Relay domain: what travels over the pub/sub topic and how it is
//! reassembled on the receiving side.

pub mod message;
pub mod pending;
