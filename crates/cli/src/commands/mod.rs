//! Subcommand implementations plus the shared gateway wiring.

pub mod chat;
pub mod ingest;
pub mod onboard;
pub mod query;
pub mod status;

use recall_config::AppConfig;
use recall_context::{ContextManager, ContextRecord, ContextStore};
use recall_core::embedding::EmbeddingGateway;
use recall_core::index::{IndexGateway, IndexSpec};
use recall_index::{InMemoryIndex, ServerlessIndex};
use recall_providers::OpenAiCompatClient;
use std::sync::Arc;

/// Similarity candidates fetched per retrieval, before owner/topic
/// scoping trims them.
pub(crate) const RETRIEVAL_K: usize = 5;

/// Build the OpenAI-compatible client that serves both completion and
/// embedding calls. Missing credentials are fatal here, not later.
pub(crate) fn build_client(
    config: &AppConfig,
) -> Result<Arc<OpenAiCompatClient>, Box<dyn std::error::Error>> {
    let api_key = config.require_api_key()?;
    Ok(Arc::new(OpenAiCompatClient::new(
        "openai",
        config.completion.base_url.clone(),
        api_key,
        config.completion.model.clone(),
        config.completion.temperature,
        config.embedding.model.clone(),
        config.embedding.dimension,
        config.completion.request_timeout_secs,
    )))
}

/// Build the configured index gateway.
pub(crate) fn build_index(
    config: &AppConfig,
) -> Result<Arc<dyn IndexGateway>, Box<dyn std::error::Error>> {
    match config.index.backend.as_str() {
        "serverless" => {
            let api_key = config.require_index_api_key()?;
            let control_url = config
                .index
                .control_url
                .as_deref()
                .ok_or("index.control_url is required for the serverless backend")?;
            let data_url = config
                .index
                .data_url
                .as_deref()
                .ok_or("index.data_url is required for the serverless backend")?;
            Ok(Arc::new(ServerlessIndex::new(
                control_url,
                data_url,
                api_key,
                config.index.namespace.clone(),
            )?))
        }
        "in_memory" => Ok(Arc::new(InMemoryIndex::new())),
        other => Err(format!("Unknown index backend: {other}").into()),
    }
}

/// Build the context manager: index + embedding + authoritative record,
/// with the index provisioned up front (fatal on failure).
pub(crate) async fn build_context_manager(
    config: &AppConfig,
    embedding: Arc<dyn EmbeddingGateway>,
) -> Result<Arc<ContextManager>, Box<dyn std::error::Error>> {
    let index = build_index(config)?;
    let store = ContextStore::new(embedding, index);

    store
        .ensure_index(&IndexSpec {
            name: config.index.name.clone(),
            dimension: config.index.dimension,
            metric: config.index.metric,
        })
        .await?;

    let record = ContextRecord::new(config.storage.contexts_path());
    Ok(Arc::new(ContextManager::new(store, record)))
}
