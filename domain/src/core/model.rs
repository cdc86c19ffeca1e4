//! Model value object identifying an LLM back-end

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Available LLM models (Value Object)
///
/// Each participating model streams its own candidate answer; the model id
/// doubles as the transcript role once an answer is committed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    // Claude models
    ClaudeSonnet45,
    ClaudeHaiku45,
    ClaudeSonnet4,
    Claude3Sonnet,
    // GPT models
    Gpt41,
    Gpt4o,
    Gpt4oMini,
    // Offline echo model (no provider call)
    Echo,
    // Custom
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::ClaudeSonnet45 => "claude-sonnet-4.5",
            Model::ClaudeHaiku45 => "claude-haiku-4.5",
            Model::ClaudeSonnet4 => "claude-sonnet-4",
            Model::Claude3Sonnet => "claude-3-sonnet",
            Model::Gpt41 => "gpt-4.1",
            Model::Gpt4o => "gpt-4o",
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Echo => "echo",
            Model::Custom(s) => s,
        }
    }

    /// Get the default pair of models answering side by side
    pub fn default_models() -> Vec<Model> {
        vec![Model::ClaudeSonnet45, Model::Gpt4oMini]
    }

    /// Check if this is a Claude model
    pub fn is_claude(&self) -> bool {
        match self {
            Model::ClaudeSonnet45
            | Model::ClaudeHaiku45
            | Model::ClaudeSonnet4
            | Model::Claude3Sonnet => true,
            Model::Custom(s) => s.starts_with("claude"),
            _ => false,
        }
    }

    /// Check if this is a GPT model
    pub fn is_gpt(&self) -> bool {
        match self {
            Model::Gpt41 | Model::Gpt4o | Model::Gpt4oMini => true,
            Model::Custom(s) => s.starts_with("gpt"),
            _ => false,
        }
    }
}

impl Default for Model {
    /// Returns the default model (Claude Sonnet 4.5)
    fn default() -> Self {
        Model::ClaudeSonnet45
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-haiku-4.5" => Model::ClaudeHaiku45,
            "claude-sonnet-4" => Model::ClaudeSonnet4,
            "claude-3-sonnet" => Model::Claude3Sonnet,
            "gpt-4.1" => Model::Gpt41,
            "gpt-4o" => Model::Gpt4o,
            "gpt-4o-mini" => Model::Gpt4oMini,
            "echo" => Model::Echo,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(model) = s.parse::<Model>();
        Ok(model)
    }
}
