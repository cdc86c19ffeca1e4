//! JSON-file transcript store.
//!
//! One document per transcript at `<directory>/<id>.json`:
//!
//! ```json
//! { "id": "…", "owner": "alice", "content": [ { "role": "user", "message": "hello" } ] }
//! ```
//!
//! Documents are validated on read: every entry needs a non-empty `role`
//! and a `message`.

use async_trait::async_trait;
use chorus_application::ports::transcript_store::{StoreError, TranscriptStore};
use chorus_domain::{Identity, Role, Transcript, TranscriptId, Turn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct StoredTranscript {
    id: String,
    owner: String,
    #[serde(default)]
    content: Vec<StoredTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredTurn {
    #[serde(default)]
    role: String,
    message: Option<String>,
}

impl StoredTranscript {
    fn from_turns(id: &TranscriptId, owner: &Identity, turns: &[Turn]) -> Self {
        Self {
            id: id.to_string(),
            owner: owner.to_string(),
            content: turns
                .iter()
                .map(|t| StoredTurn {
                    role: t.role.to_string(),
                    message: Some(t.text.clone()),
                })
                .collect(),
        }
    }

    fn into_transcript(self) -> Result<Transcript, StoreError> {
        let owner = Identity::new(self.owner)
            .map_err(|e| StoreError::Invalid(format!("document {}: {}", self.id, e)))?;

        let mut turns = Vec::with_capacity(self.content.len());
        for (index, entry) in self.content.into_iter().enumerate() {
            let role: Role = entry
                .role
                .parse()
                .map_err(|e| StoreError::Invalid(format!("entry {}: {}", index, e)))?;
            let text = entry
                .message
                .ok_or_else(|| StoreError::Invalid(format!("entry {} has no message", index)))?;
            turns.push(Turn::new(role, text));
        }

        Ok(Transcript::with_turns(
            TranscriptId::from(self.id),
            owner,
            turns,
        ))
    }
}

pub struct FileTranscriptStore {
    directory: PathBuf,
    /// Serializes read-modify-write sequences within this process.
    write_lock: Mutex<()>,
}

impl FileTranscriptStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn document_path(&self, id: &TranscriptId) -> Result<PathBuf, StoreError> {
        let name = id.as_str();
        if name.is_empty()
            || name
                .chars()
                .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(StoreError::Invalid(format!("unusable transcript id '{}'", name)));
        }
        Ok(self.directory.join(format!("{}.json", name)))
    }

    async fn read(&self, id: &TranscriptId) -> Result<Transcript, StoreError> {
        let path = self.document_path(id)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(StoreError::Read(format!("{}: {}", path.display(), e))),
        };

        let document: StoredTranscript = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Invalid(format!("{}: {}", path.display(), e)))?;
        document.into_transcript()
    }

    async fn write(&self, transcript: &Transcript) -> Result<(), StoreError> {
        let path = self.document_path(transcript.id())?;
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| StoreError::Write(format!("{}: {}", self.directory.display(), e)))?;

        let document =
            StoredTranscript::from_turns(transcript.id(), transcript.owner(), transcript.turns());
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StoreError::Write(e.to_string()))?;

        // Write to a sibling file first so readers never see half a document.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Write(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Write(format!("{}: {}", path.display(), e)))?;

        debug!(
            "Wrote transcript {} ({} turns)",
            transcript.id(),
            transcript.turns().len()
        );
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn get(&self, id: &TranscriptId) -> Result<Transcript, StoreError> {
        self.read(id).await
    }

    async fn create(
        &self,
        id: &TranscriptId,
        owner: &Identity,
        turns: Vec<Turn>,
    ) -> Result<Transcript, StoreError> {
        let _guard = self.write_lock.lock().await;
        let transcript = Transcript::with_turns(id.clone(), owner.clone(), turns);
        self.write(&transcript).await?;
        Ok(transcript)
    }

    async fn update(&self, id: &TranscriptId, turns: Vec<Turn>) -> Result<Transcript, StoreError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.read(id).await?;
        let transcript = Transcript::with_turns(id.clone(), existing.owner().clone(), turns);
        self.write(&transcript).await?;
        Ok(transcript)
    }

    async fn delete(&self, id: &TranscriptId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.document_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(StoreError::Write(format!("{}: {}", path.display(), e))),
        }
    }
}
