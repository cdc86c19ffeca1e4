//! Participating models from TOML (`[models]` section)

use super::ConfigValidationError;
use chorus_domain::Model;
use serde::{Deserialize, Serialize};

/// Models asked every question
///
/// # Example
///
/// ```toml
/// [models]
/// participants = ["claude-sonnet-4.5", "gpt-4o-mini"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub participants: Vec<String>,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            participants: Model::default_models()
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl FileModelsConfig {
    /// Parse the participant list, skipping empty names and duplicates.
    pub fn parse_participants(&self) -> (Vec<Model>, Vec<ConfigValidationError>) {
        let mut issues = Vec::new();
        let mut models: Vec<Model> = Vec::new();

        if self.participants.is_empty() {
            issues.push(ConfigValidationError::NoParticipants);
        }
        for name in &self.participants {
            if name.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyModelName);
                continue;
            }
            // Model::from_str is infallible; unknown names become Custom(...)
            let Ok(model) = name.trim().parse::<Model>();
            if models.contains(&model) {
                issues.push(ConfigValidationError::DuplicateModel(model.to_string()));
                continue;
            }
            models.push(model);
        }

        (models, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_participants() {
        let (models, issues) = FileModelsConfig::default().parse_participants();
        assert_eq!(models, Model::default_models());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_empty_and_duplicate_names_are_reported() {
        let config = FileModelsConfig {
            participants: vec![
                "gpt-4o".to_string(),
                " ".to_string(),
                "gpt-4o".to_string(),
                "my-local-model".to_string(),
            ],
        };
        let (models, issues) = config.parse_participants();
        assert_eq!(
            models,
            vec![Model::Gpt4o, Model::Custom("my-local-model".to_string())]
        );
        assert_eq!(
            issues,
            vec![
                ConfigValidationError::EmptyModelName,
                ConfigValidationError::DuplicateModel("gpt-4o".to_string()),
            ]
        );
    }
}
