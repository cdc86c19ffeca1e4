//! Turn entity and the role it is spoken in

use crate::core::{error::DomainError, model::Model};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel text carried by placeholder turns.
pub const PLACEHOLDER_TEXT: &str = "skip";

/// Who spoke a turn.
///
/// `Assistant` is the generic non-user role: it is what placeholder turns
/// use, and what legacy transcripts recorded before answers were tagged
/// with the answering model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Assistant,
    Model(Model),
}

/// The two classes that must alternate in a persisted transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleClass {
    User,
    NonUser,
}

impl RoleClass {
    pub fn opposite(self) -> Self {
        match self {
            RoleClass::User => RoleClass::NonUser,
            RoleClass::NonUser => RoleClass::User,
        }
    }
}

impl Role {
    pub fn class(&self) -> RoleClass {
        match self {
            Role::User => RoleClass::User,
            Role::Assistant | Role::Model(_) => RoleClass::NonUser,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Model(model) => model.as_str(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(DomainError::EmptyRole),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => {
                let Ok(model) = other.parse::<Model>();
                Ok(Role::Model(model))
            }
        }
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One role-tagged message of a transcript (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(model: Model, text: impl Into<String>) -> Self {
        Self::new(Role::Model(model), text)
    }

    /// A placeholder turn of the given class.
    pub fn placeholder(class: RoleClass) -> Self {
        let role = match class {
            RoleClass::User => Role::User,
            RoleClass::NonUser => Role::Assistant,
        };
        Self::new(role, PLACEHOLDER_TEXT)
    }

    pub fn class(&self) -> RoleClass {
        self.role.class()
    }

    /// Whether this turn only exists to keep roles alternating.
    pub fn is_placeholder(&self) -> bool {
        self.text == PLACEHOLDER_TEXT && matches!(self.role, Role::User | Role::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!(
            "gpt-4o-mini".parse::<Role>().unwrap(),
            Role::Model(Model::Gpt4oMini)
        );
        assert_eq!("".parse::<Role>(), Err(DomainError::EmptyRole));
    }

    #[test]
    fn test_role_classes() {
        assert_eq!(Role::User.class(), RoleClass::User);
        assert_eq!(Role::Assistant.class(), RoleClass::NonUser);
        assert_eq!(Role::Model(Model::Echo).class(), RoleClass::NonUser);
        assert_eq!(RoleClass::User.opposite(), RoleClass::NonUser);
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(Turn::placeholder(RoleClass::User).is_placeholder());
        assert!(Turn::placeholder(RoleClass::NonUser).is_placeholder());
        // A model that literally answers "skip" is still a real answer
        assert!(!Turn::model(Model::Echo, PLACEHOLDER_TEXT).is_placeholder());
    }

    #[test]
    fn test_turn_serde_requires_role_and_text() {
        let turn: Turn = serde_json::from_str(r#"{"role":"user","text":"hi"}"#).unwrap();
        assert_eq!(turn, Turn::user("hi"));
        assert!(serde_json::from_str::<Turn>(r#"{"role":"user"}"#).is_err());
        assert!(serde_json::from_str::<Turn>(r#"{"role":"","text":"hi"}"#).is_err());
    }
}
