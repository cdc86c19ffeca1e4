//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave,
//! such as the empty-history greeting and the relay retry policy.

use chorus_domain::DEFAULT_GREETING;
use std::time::Duration;

/// Retry policy for publishing a single relay payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPolicy {
    /// Total attempts per payload, including the first one.
    pub max_attempts: u32,
    /// Pause before each retry; doubled after every failed attempt.
    pub backoff: Duration,
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl PublishPolicy {
    /// Creates a policy from raw config values. Zero attempts is treated as one.
    pub fn new(max_attempts: u32, backoff_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Duration::from_millis(backoff_ms),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.backoff.saturating_mul(factor)
    }
}

/// Conversation behavior configuration.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Substituted as the only user turn when a model is asked with an empty history.
    pub greeting: String,
    /// How hard the relay publisher tries before dropping a payload.
    pub publish: PublishPolicy,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            publish: PublishPolicy::default(),
        }
    }
}

impl ConversationConfig {
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn with_publish_policy(mut self, publish: PublishPolicy) -> Self {
        self.publish = publish;
        self
    }
}
