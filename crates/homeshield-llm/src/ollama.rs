//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local chat and embedding API, for
//! running the assistant without hosted credentials.
//!
//! # Examples
//!
//! ```no_run
//! use homeshield_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1", "nomic-embed-text");
//! ```

use crate::http::{classify_status, with_backoff};
use async_trait::async_trait;
use homeshield_domain::traits::{ChatMessage, EmbeddingClient, GenerationClient};
use homeshield_domain::UpstreamError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (120 seconds; local models are slow to load)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API provider for local inference
pub struct OllamaProvider {
    endpoint: String,
    chat_model: String,
    embedding_model: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    content: String,
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `chat_model`: Model used for generation (e.g., "llama3.1")
    /// - `embedding_model`: Model used for embeddings (e.g., "nomic-embed-text")
    pub fn new(
        endpoint: impl Into<String>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into(),
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    async fn post<B, R>(&self, path: &str, body: &B, model: &str) -> Result<R, UpstreamError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.endpoint.trim_end_matches('/'), path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, &text, &format!("ollama model {}", model)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl GenerationClient for OllamaProvider {
    async fn generate(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, UpstreamError> {
        let body = OllamaChatRequest {
            model: &self.chat_model,
            messages,
            stream: false,
            options: OllamaOptions { temperature },
        };
        let body = &body;
        let response: OllamaChatResponse =
            with_backoff(self.max_retries, move || self.post("/api/chat", body, &self.chat_model)).await?;
        Ok(response.message.content)
    }
}

#[async_trait]
impl EmbeddingClient for OllamaProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = OllamaEmbedRequest { model: &self.embedding_model, input: texts };
        let body = &body;
        let response: OllamaEmbedResponse =
            with_backoff(self.max_retries, move || self.post("/api/embed", body, &self.embedding_model)).await?;

        if response.embeddings.len() != texts.len() {
            return Err(UpstreamError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }
}
