//! Volatile transcript store, lost when the process exits.

use async_trait::async_trait;
use chorus_application::ports::transcript_store::{StoreError, TranscriptStore};
use chorus_domain::{Identity, Transcript, TranscriptId, Turn};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryTranscriptStore {
    documents: RwLock<HashMap<TranscriptId, Transcript>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn get(&self, id: &TranscriptId) -> Result<Transcript, StoreError> {
        self.documents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn create(
        &self,
        id: &TranscriptId,
        owner: &Identity,
        turns: Vec<Turn>,
    ) -> Result<Transcript, StoreError> {
        let transcript = Transcript::with_turns(id.clone(), owner.clone(), turns);
        self.documents
            .write()
            .await
            .insert(id.clone(), transcript.clone());
        Ok(transcript)
    }

    async fn update(&self, id: &TranscriptId, turns: Vec<Turn>) -> Result<Transcript, StoreError> {
        let mut documents = self.documents.write().await;
        let existing = documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let owner = existing.owner().clone();
        *existing = Transcript::with_turns(id.clone(), owner, turns);
        Ok(existing.clone())
    }

    async fn delete(&self, id: &TranscriptId) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}
