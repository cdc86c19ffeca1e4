//! Logging configuration from TOML (`[logging]` section)

use super::store::expand_home;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving conversation events; unset disables it
    pub conversation_log: Option<PathBuf>,
    /// Directory for daily-rolled operation logs; unset logs to stderr
    pub log_dir: Option<PathBuf>,
}

impl FileLoggingConfig {
    pub fn conversation_log_path(&self) -> Option<PathBuf> {
        self.conversation_log.as_deref().map(expand_home)
    }

    pub fn log_dir_path(&self) -> Option<PathBuf> {
        self.log_dir.as_deref().map(expand_home)
    }
}
