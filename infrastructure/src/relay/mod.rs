//! Relay transports.
//!
//! [`MemoryRelay`] is an in-process broker: enough for a single binary where
//! publishers and the aggregator share one runtime.

mod memory;

pub use memory::MemoryRelay;
