//! Transcript store port
//!
//! Persisted documents keyed by transcript id. Updates always replace the
//! full turn list; there is no partial patch.

use async_trait::async_trait;
use chorus_domain::{Identity, Transcript, TranscriptId, Turn};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transcript not found: {0}")]
    NotFound(TranscriptId),

    #[error("Failed to read transcript: {0}")]
    Read(String),

    #[error("Failed to write transcript: {0}")]
    Write(String),

    #[error("Stored transcript is invalid: {0}")]
    Invalid(String),
}

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn get(&self, id: &TranscriptId) -> Result<Transcript, StoreError>;

    async fn create(
        &self,
        id: &TranscriptId,
        owner: &Identity,
        turns: Vec<Turn>,
    ) -> Result<Transcript, StoreError>;

    async fn update(&self, id: &TranscriptId, turns: Vec<Turn>) -> Result<Transcript, StoreError>;

    async fn delete(&self, id: &TranscriptId) -> Result<(), StoreError>;
}
