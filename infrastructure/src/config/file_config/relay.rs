//! Relay configuration from TOML (`[relay]` section)

use chorus_application::PublishPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRelayConfig {
    /// Attempts per payload before it is dropped
    pub publish_attempts: u32,
    /// First retry delay in milliseconds; doubles per retry
    pub backoff_ms: u64,
    /// Buffered payloads per topic before slow subscribers start lagging
    pub channel_capacity: usize,
}

impl Default for FileRelayConfig {
    fn default() -> Self {
        Self {
            publish_attempts: 3,
            backoff_ms: 100,
            channel_capacity: 1024,
        }
    }
}

impl FileRelayConfig {
    pub fn to_publish_policy(&self) -> PublishPolicy {
        PublishPolicy::new(self.publish_attempts, self.backoff_ms)
    }
}
