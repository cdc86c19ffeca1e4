//! Conversation configuration from TOML (`[conversation]` section)

use chorus_application::ConversationConfig;
use chorus_domain::DEFAULT_GREETING;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConversationConfig {
    /// Sent in place of an empty history
    pub greeting: String,
}

impl Default for FileConversationConfig {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl FileConversationConfig {
    pub fn to_conversation_config(&self) -> ConversationConfig {
        let config = ConversationConfig::default();
        if self.greeting.trim().is_empty() {
            config
        } else {
            config.with_greeting(self.greeting.clone())
        }
    }
}
