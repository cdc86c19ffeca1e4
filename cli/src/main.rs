//! CLI entrypoint for chorus
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod repl;

use anyhow::{Context, Result, bail};
use chorus_application::{
    ChatSession, ConversationLogger, NoConversationLogger, SessionServices, TranscriptStore,
};
use chorus_domain::{Identity, Model, SessionScope, Topic, TranscriptId};
use chorus_infrastructure::{
    ConfigLoader, FileConfig, FileTranscriptStore, JsonlConversationLogger, MemoryRelay,
    MemoryTranscriptStore, ModelRouter, StoreKind, default_providers,
};
use clap::Parser;
use cli::Cli;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber; the guard must live until exit.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "chorus.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    if cli.no_config {
        return Ok(ConfigLoader::load_defaults());
    }
    ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")
}

fn session_scope(cli: &Cli) -> Result<SessionScope> {
    let name = cli
        .identity
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "local".to_string());
    let identity = Identity::new(name)?;

    Ok(match &cli.topic {
        Some(topic) => SessionScope::new(identity, Topic::new(topic.clone())?),
        None => SessionScope::for_identity(identity),
    })
}

fn transcript_store(config: &FileConfig) -> Result<Arc<dyn TranscriptStore>> {
    let kind = config.store.parse_kind().unwrap_or_else(|kind| {
        warn!("Unknown store kind '{}', keeping transcripts in memory", kind);
        StoreKind::Memory
    });

    Ok(match kind {
        StoreKind::Memory => Arc::new(MemoryTranscriptStore::new()),
        StoreKind::File => {
            let Some(directory) = config.store.resolved_directory() else {
                bail!("No data directory available; set [store] directory");
            };
            info!("Transcripts are stored in {}", directory.display());
            Arc::new(FileTranscriptStore::new(directory))
        }
    })
}

fn conversation_logger(config: &FileConfig) -> Arc<dyn ConversationLogger> {
    config
        .logging
        .conversation_log_path()
        .and_then(JsonlConversationLogger::new)
        .map(|logger| Arc::new(logger) as Arc<dyn ConversationLogger>)
        .unwrap_or_else(|| Arc::new(NoConversationLogger))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = load_config(&cli)?;
    let log_dir = cli.log_dir.clone().or_else(|| config.logging.log_dir_path());
    let _guard = init_tracing(cli.verbose, log_dir.as_deref());

    info!("Starting chorus");

    for issue in config.validate() {
        warn!("Config: {}", issue);
    }

    let participants: Vec<Model> = if cli.model.is_empty() {
        config.models.parse_participants().0
    } else {
        cli.model
            .iter()
            .map(|s| {
                let Ok(model) = s.parse::<Model>();
                model
            })
            .collect()
    };

    // === Dependency Injection ===
    let provider_config = config.providers.to_provider_config();
    let router = ModelRouter::new(default_providers(&provider_config).await, &provider_config);
    let adapters = router
        .adapters_for(&participants)
        .context("Failed to route models to providers")?;

    let relay = Arc::new(MemoryRelay::new(config.relay.channel_capacity));
    let services = SessionServices {
        store: transcript_store(&config)?,
        relay: relay.clone(),
        authorizer: relay,
        adapters,
        conversation_logger: conversation_logger(&config),
    };
    let conversation = config
        .conversation
        .to_conversation_config()
        .with_publish_policy(config.relay.to_publish_policy());

    let mut session = ChatSession::open(session_scope(&cli)?, services, conversation).await?;

    if let Some(id) = &cli.transcript {
        session
            .reconciler_mut()
            .open(&TranscriptId::from(id.as_str()))
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    }

    repl::run(session).await
}
