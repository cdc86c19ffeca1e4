//! Bedrock stream adapter
//!
//! The Converse API is stateless, so every call carries the full history.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::error::SdkError;
use aws_sdk_bedrockruntime::operation::converse_stream::ConverseStreamError;
use aws_sdk_bedrockruntime::types as bedrock;
use chorus_application::ports::model_stream::{GatewayError, ModelStreamAdapter, StreamHandle};
use chorus_domain::{ChatRole, Message, Model, StreamEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub struct BedrockStreamAdapter {
    client: Arc<BedrockClient>,
    model: Model,
    bedrock_model_id: String,
    system_prompt: Option<String>,
    max_tokens: i32,
}

impl BedrockStreamAdapter {
    pub fn new(
        client: Arc<BedrockClient>,
        model: Model,
        bedrock_model_id: String,
        system_prompt: Option<String>,
        max_tokens: i32,
    ) -> Self {
        Self {
            client,
            model,
            bedrock_model_id,
            system_prompt,
            max_tokens,
        }
    }

    fn system_blocks(&self) -> Vec<bedrock::SystemContentBlock> {
        match &self.system_prompt {
            Some(prompt) if !prompt.is_empty() => {
                vec![bedrock::SystemContentBlock::Text(prompt.clone())]
            }
            _ => vec![],
        }
    }
}

fn to_bedrock_messages(history: &[Message]) -> Result<Vec<bedrock::Message>, GatewayError> {
    history
        .iter()
        .filter(|m| m.role != ChatRole::System)
        .map(|m| {
            let role = match m.role {
                ChatRole::Assistant => bedrock::ConversationRole::Assistant,
                _ => bedrock::ConversationRole::User,
            };
            bedrock::Message::builder()
                .role(role)
                .content(bedrock::ContentBlock::Text(m.content.clone()))
                .build()
                .map_err(|e| GatewayError::RequestFailed(format!("Failed to build message: {}", e)))
        })
        .collect()
}

fn convert_stream_error(err: &SdkError<ConverseStreamError>) -> GatewayError {
    match err {
        SdkError::ServiceError(service_err) => {
            match service_err.err() {
                ConverseStreamError::ThrottlingException(e) => {
                    GatewayError::RequestFailed(format!("Bedrock throttled: {}", e))
                }
                ConverseStreamError::ModelNotReadyException(e) => {
                    GatewayError::ModelNotAvailable(format!("Bedrock model not ready: {}", e))
                }
                ConverseStreamError::ValidationException(e) => {
                    GatewayError::RequestFailed(format!("Bedrock validation error: {}", e))
                }
                ConverseStreamError::AccessDeniedException(e) => {
                    GatewayError::AuthenticationError(format!("Bedrock access denied: {}", e))
                }
                ConverseStreamError::ModelTimeoutException(_) => GatewayError::Timeout,
                other => GatewayError::RequestFailed(format!("Bedrock error: {:?}", other)),
            }
        }
        other => GatewayError::ConnectionError(format!("Bedrock SDK error: {}", other)),
    }
}

/// A `ResponseError` on the event receiver means one event failed to
/// unmarshal; the receiver can keep reading after it.
fn is_skippable_recv_error<E, R>(err: &SdkError<E, R>) -> bool {
    matches!(err, SdkError::ResponseError(_))
}

#[async_trait]
impl ModelStreamAdapter for BedrockStreamAdapter {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn open_stream(&self, history: &[Message]) -> Result<StreamHandle, GatewayError> {
        let messages = to_bedrock_messages(history)?;

        debug!(
            model = %self.bedrock_model_id,
            messages = messages.len(),
            "Calling Bedrock ConverseStream API"
        );

        let output = self
            .client
            .converse_stream()
            .model_id(&self.bedrock_model_id)
            .set_system(Some(self.system_blocks()))
            .set_messages(Some(messages))
            .inference_config(
                bedrock::InferenceConfiguration::builder()
                    .max_tokens(self.max_tokens)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| convert_stream_error(&e))?;

        let (tx, rx) = mpsc::channel(64);
        let model = self.model.clone();
        let mut stream = output.stream;
        tokio::spawn(async move {
            loop {
                let event = match stream.recv().await {
                    Ok(Some(event)) => event,
                    Ok(None) => break,
                    Err(e) if is_skippable_recv_error(&e) => {
                        warn!("Skipping undecodable Bedrock event from {}: {}", model, e);
                        continue;
                    }
                    Err(e) => {
                        warn!("Bedrock stream for {} interrupted: {}", model, e);
                        let _ = tx
                            .send(StreamEvent::Error(format!("Stream interrupted: {}", e)))
                            .await;
                        return;
                    }
                };
                match event {
                    bedrock::ConverseStreamOutput::ContentBlockDelta(delta) => {
                        if let Some(bedrock::ContentBlockDelta::Text(text)) = delta.delta()
                            && tx.send(StreamEvent::Delta(text.clone())).await.is_err()
                        {
                            return;
                        }
                    }
                    bedrock::ConverseStreamOutput::MessageStop(_) => break,
                    _ => {}
                }
            }
            let _ = tx.send(StreamEvent::Completed).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_maps_roles_and_drops_system() {
        let messages = to_bedrock_messages(&[
            Message::system("prompt"),
            Message::user("hi"),
            Message::assistant("hello"),
        ])
        .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role(), &bedrock::ConversationRole::User);
        assert_eq!(messages[1].role(), &bedrock::ConversationRole::Assistant);
    }

    #[test]
    fn test_unmarshal_failure_is_skipped_other_errors_end_stream() {
        let bad_event = SdkError::<std::io::Error, ()>::response_error("bad event payload", ());
        assert!(is_skippable_recv_error(&bad_event));

        let timeout = SdkError::<std::io::Error, ()>::timeout_error("read timed out");
        assert!(!is_skippable_recv_error(&timeout));

        let service = SdkError::<std::io::Error, ()>::service_error(
            std::io::Error::other("throttled"),
            (),
        );
        assert!(!is_skippable_recv_error(&service));
    }
}
