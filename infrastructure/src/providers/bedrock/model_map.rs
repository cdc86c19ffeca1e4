//! Bedrock model ID mapping
//!
//! Maps domain `Model` variants to Bedrock model identifiers,
//! with optional cross-region inference prefix.

use chorus_domain::Model;

/// Convert a domain Model to a Bedrock model ID string.
///
/// Returns `None` for models Bedrock does not host (GPT, echo).
/// When `cross_region` is true, the id is prefixed with `"{region}."`.
pub fn to_bedrock_model_id(model: &Model, cross_region: bool, region: &str) -> Option<String> {
    let base_id = match model {
        Model::ClaudeSonnet45 => "anthropic.claude-sonnet-4-5-20250929-v1:0",
        Model::ClaudeHaiku45 => "anthropic.claude-haiku-4-5-20251001-v1:0",
        Model::ClaudeSonnet4 => "anthropic.claude-sonnet-4-20250514-v1:0",
        Model::Claude3Sonnet => "anthropic.claude-3-sonnet-20240229-v1:0",
        Model::Custom(id) => return Some(id.clone()),
        _ => return None,
    };

    if cross_region {
        Some(format!("{region}.{base_id}"))
    } else {
        Some(base_id.to_string())
    }
}

/// Check if a model is supported by the Bedrock provider.
pub fn is_bedrock_supported(model: &Model) -> bool {
    model.is_claude() || matches!(model, Model::Custom(_))
}
