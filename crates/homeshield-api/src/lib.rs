//! HomeShield API
//!
//! HTTP surface of the coverage assistant: health, question answering,
//! claim submission, direct coverage checks, plan suggestions and
//! re-ingestion.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::{AppConfig, ConfigError};
use handlers::{create_router, AppState};
use homeshield_assistant::{Assistant, AssistantError, Collaborators};
use homeshield_domain::traits::{EmbeddingClient, GenerationClient, VectorIndex};
use homeshield_llm::{AzureOpenAiProvider, AzureSettings, OllamaProvider};
use homeshield_store::{CsvCustomerTable, InMemoryIndex, PineconeIndex};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The assistant could not be built or failed
    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the assistant and its hosted collaborators from configuration
///
/// Azure OpenAI is used when configured, Ollama otherwise. Pinecone is used
/// when configured; otherwise chunks live in a process-local index and a
/// `/reindex` is needed after every start.
pub fn build_assistant(config: &AppConfig) -> Result<Assistant, ServerError> {
    config.validate()?;

    let (generation, embedding): (Arc<dyn GenerationClient>, Arc<dyn EmbeddingClient>) = if config.azure.is_configured() {
        info!("Using Azure OpenAI deployment '{}'", config.azure.chat_deployment);
        let provider = Arc::new(AzureOpenAiProvider::new(AzureSettings {
            endpoint: config.azure.endpoint.clone(),
            api_key: config.azure.api_key.clone(),
            api_version: config.azure.api_version.clone(),
            chat_deployment: config.azure.chat_deployment.clone(),
            embedding_deployment: config.azure.embedding_deployment.clone(),
        }));
        (provider.clone(), provider)
    } else {
        info!("Using Ollama at {} (model '{}')", config.ollama.endpoint, config.ollama.chat_model);
        let provider = Arc::new(OllamaProvider::new(
            config.ollama.endpoint.clone(),
            config.ollama.chat_model.clone(),
            config.ollama.embedding_model.clone(),
        ));
        (provider.clone(), provider)
    };

    let index: Arc<dyn VectorIndex> = if config.pinecone.is_configured() {
        info!("Using Pinecone index {} (namespace '{}')", config.pinecone.index_host, config.pinecone.namespace);
        Arc::new(PineconeIndex::new(
            config.pinecone.index_host.clone(),
            config.pinecone.api_key.clone(),
            config.pinecone.namespace.clone(),
            embedding.clone(),
        ))
    } else {
        info!("Using in-memory index (namespace '{}')", config.pinecone.namespace);
        Arc::new(InMemoryIndex::new(config.pinecone.namespace.clone(), embedding.clone()))
    };

    let collaborators = Collaborators {
        generation,
        embedding,
        index,
        customers: Arc::new(CsvCustomerTable::new(config.data.customers_csv.clone())),
    };

    Ok(Assistant::new(
        collaborators,
        config.assistant_config(),
        config.data.policy_dir.clone(),
    )?)
}

/// Start the API HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), ServerError> {
    info!("Starting HomeShield API");
    info!("Bind address: {}", config.bind_addr());
    info!("Policy directory: {}", config.data.policy_dir.display());
    info!("Customer table: {}", config.data.customers_csv.display());

    let assistant = build_assistant(&config)?;
    let state = AppState {
        assistant: Arc::new(assistant),
    };
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("API listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
