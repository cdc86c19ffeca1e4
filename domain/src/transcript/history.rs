//! Conversion of a transcript into the message list a provider accepts.

use super::alternation::normalize;
use super::turn::{RoleClass, Turn};
use serde::{Deserialize, Serialize};

/// Greeting sent when a provider is invoked with an empty history.
pub const DEFAULT_GREETING: &str = "こんにちは";

/// Role of a message in a provider request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A message in a provider request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: ChatRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        match turn.class() {
            RoleClass::User => Message::user(turn.text.clone()),
            RoleClass::NonUser => Message::assistant(turn.text.clone()),
        }
    }
}

/// Build the strictly alternating user/assistant history for a provider.
///
/// - an empty transcript becomes a single greeting message
/// - every same-class pair gets a placeholder between them
/// - a history that opens with a non-user turn gets a leading placeholder
///   user message, since providers require the user to speak first
pub fn upstream_history(turns: &[Turn], greeting: &str) -> Vec<Message> {
    if turns.is_empty() {
        return vec![Message::user(greeting)];
    }

    let mut normalized = normalize(turns);
    if normalized
        .first()
        .is_some_and(|t| t.class() == RoleClass::NonUser)
    {
        normalized.insert(0, Turn::placeholder(RoleClass::User));
    }

    normalized.iter().map(Message::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Model;
    use crate::transcript::turn::PLACEHOLDER_TEXT;

    #[test]
    fn empty_history_uses_greeting() {
        let history = upstream_history(&[], DEFAULT_GREETING);
        assert_eq!(history, vec![Message::user(DEFAULT_GREETING)]);
    }

    #[test]
    fn model_turns_become_assistant_messages() {
        let turns = vec![
            Turn::user("hello"),
            Turn::model(Model::Gpt4oMini, "hey"),
            Turn::user("how are you"),
        ];
        let history = upstream_history(&turns, DEFAULT_GREETING);
        assert_eq!(
            history,
            vec![
                Message::user("hello"),
                Message::assistant("hey"),
                Message::user("how are you"),
            ]
        );
    }

    #[test]
    fn malformed_history_is_normalized() {
        let turns = vec![Turn::user("a"), Turn::user("b")];
        let history = upstream_history(&turns, DEFAULT_GREETING);
        assert_eq!(
            history,
            vec![
                Message::user("a"),
                Message::assistant(PLACEHOLDER_TEXT),
                Message::user("b"),
            ]
        );
    }

    #[test]
    fn leading_assistant_gets_placeholder_user() {
        let turns = vec![Turn::model(Model::Echo, "hi"), Turn::user("yo")];
        let history = upstream_history(&turns, DEFAULT_GREETING);
        assert_eq!(history[0], Message::user(PLACEHOLDER_TEXT));
        assert_eq!(history[1], Message::assistant("hi"));
        assert_eq!(history.len(), 3);
    }
}
