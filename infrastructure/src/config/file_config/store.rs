//! Transcript store configuration from TOML (`[store]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where transcripts are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    File,
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreKind::Memory),
            "file" | "files" => Ok(StoreKind::File),
            other => Err(other.to_string()),
        }
    }
}

/// # Example
///
/// ```toml
/// [store]
/// kind = "file"
/// directory = "~/.local/share/chorus/transcripts"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// "memory" or "file"
    pub kind: String,
    /// Directory for the file store (default: data dir / chorus / transcripts)
    pub directory: Option<PathBuf>,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            kind: "file".to_string(),
            directory: None,
        }
    }
}

impl FileStoreConfig {
    pub fn parse_kind(&self) -> Result<StoreKind, String> {
        self.kind.parse()
    }

    /// Configured directory, with a leading `~` expanded.
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        match &self.directory {
            Some(dir) => Some(expand_home(dir)),
            None => dirs::data_dir().map(|d| d.join("chorus").join("transcripts")),
        }
    }
}

pub(crate) fn expand_home(path: &std::path::Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
