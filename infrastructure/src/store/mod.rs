//! Transcript stores.
//!
//! Both implementations keep full documents and replace the turn list on
//! every update.

mod file;
mod memory;

pub use file::FileTranscriptStore;
pub use memory::MemoryTranscriptStore;
