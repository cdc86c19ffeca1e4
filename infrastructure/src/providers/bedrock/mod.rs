//! AWS Bedrock ConverseStream provider
//!
//! Streams Claude answers through the Bedrock ConverseStream API using AWS
//! IAM authentication.

mod adapter;
mod model_map;
mod stream;

pub use adapter::BedrockProviderAdapter;
