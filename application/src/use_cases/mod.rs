//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod reconciler;
pub mod relay_publisher;
pub mod session;
pub mod stream_aggregator;
