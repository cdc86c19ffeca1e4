//! Chat session wiring.
//!
//! Opening a session grants the identity access to its relay topic,
//! subscribes once, starts the aggregator's listener task and hands back a
//! [`TranscriptReconciler`] bound to that topic.

use crate::config::ConversationConfig;
use crate::ports::conversation_logger::ConversationLogger;
use crate::ports::model_stream::ModelStreamAdapter;
use crate::ports::relay_transport::{RelayError, RelayTransport};
use crate::ports::topic_authorizer::TopicAuthorizer;
use crate::ports::transcript_store::TranscriptStore;
use crate::use_cases::reconciler::TranscriptReconciler;
use crate::use_cases::relay_publisher::RelayPublisher;
use crate::use_cases::stream_aggregator::LiveAggregator;
use chorus_domain::SessionScope;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}

/// Explicitly constructed collaborators of a session.
pub struct SessionServices {
    pub store: Arc<dyn TranscriptStore>,
    pub relay: Arc<dyn RelayTransport>,
    pub authorizer: Arc<dyn TopicAuthorizer>,
    pub adapters: Vec<Arc<dyn ModelStreamAdapter>>,
    pub conversation_logger: Arc<dyn ConversationLogger>,
}

/// One identity's conversation. Dropping it stops the relay listener.
pub struct ChatSession {
    scope: SessionScope,
    reconciler: TranscriptReconciler,
    listener: JoinHandle<()>,
}

impl ChatSession {
    pub async fn open(
        scope: SessionScope,
        services: SessionServices,
        config: ConversationConfig,
    ) -> Result<Self, SessionError> {
        services
            .authorizer
            .authorize(&scope.identity, &scope.topic)
            .await?;
        let subscription = services.relay.subscribe(&scope.topic).await?;

        let aggregator = LiveAggregator::new();
        let listener = aggregator.spawn_listener(scope.topic.clone(), subscription);

        let publisher = RelayPublisher::new(services.relay, config.publish.clone())
            .with_conversation_logger(services.conversation_logger.clone());
        let reconciler = TranscriptReconciler::new(
            scope.clone(),
            services.store,
            services.adapters,
            publisher,
            aggregator,
            config,
        )
        .with_conversation_logger(services.conversation_logger);

        info!(
            "Session for {} listening on {} with {} model(s)",
            scope.identity,
            scope.topic,
            reconciler.participants().len()
        );

        Ok(Self {
            scope,
            reconciler,
            listener,
        })
    }

    pub fn scope(&self) -> &SessionScope {
        &self.scope
    }

    pub fn reconciler(&self) -> &TranscriptReconciler {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut TranscriptReconciler {
        &mut self.reconciler
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
