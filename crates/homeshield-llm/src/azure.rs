//! Azure OpenAI Provider Implementation
//!
//! Chat completions and embeddings against an Azure OpenAI resource.
//!
//! # Features
//!
//! - Async HTTP communication via `reqwest`
//! - Separate chat and embedding deployments on one resource
//! - Back-off and retry on HTTP 429 only; every other failure is returned as is
//! - Timeout handling
//!
//! # Examples
//!
//! ```no_run
//! use homeshield_llm::{AzureOpenAiProvider, AzureSettings};
//!
//! let provider = AzureOpenAiProvider::new(AzureSettings {
//!     endpoint: "https://my-resource.openai.azure.com".to_string(),
//!     api_key: "secret".to_string(),
//!     api_version: "2024-06-01".to_string(),
//!     chat_deployment: "gpt-4o-mini".to_string(),
//!     embedding_deployment: "text-embedding-3-small".to_string(),
//! });
//! ```

use crate::http::{classify_status, with_backoff};
use async_trait::async_trait;
use homeshield_domain::traits::{ChatMessage, EmbeddingClient, GenerationClient};
use homeshield_domain::UpstreamError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default API version
pub const DEFAULT_API_VERSION: &str = "2024-06-01";

/// Default timeout for a single request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts for a rate-limited request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for an Azure OpenAI resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureSettings {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// API version query parameter
    pub api_version: String,
    /// Chat completion deployment name
    pub chat_deployment: String,
    /// Embedding deployment name
    pub embedding_deployment: String,
}

/// Azure OpenAI client for generation and embeddings
pub struct AzureOpenAiProvider {
    settings: AzureSettings,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl AzureOpenAiProvider {
    /// Create a new provider
    pub fn new(settings: AzureSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            settings,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the maximum number of attempts for rate-limited requests
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            deployment,
            operation,
            self.settings.api_version
        )
    }

    async fn post<B, R>(&self, url: &str, body: &B, what: &str) -> Result<R, UpstreamError>
    where
        B: Serialize + ?Sized + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .header("api-key", &self.settings.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, &text, what));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("Failed to parse {} response: {}", what, e)))
    }
}

#[async_trait]
impl GenerationClient for AzureOpenAiProvider {
    async fn generate(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, UpstreamError> {
        let url = self.deployment_url(&self.settings.chat_deployment, "chat/completions");
        let body = ChatRequest { messages, temperature };
        let (url, body) = (&url, &body);

        let response: ChatResponse =
            with_backoff(self.max_retries, move || self.post(url, body, "chat completion")).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| UpstreamError::InvalidResponse("Chat completion had no content".to_string()))?;

        debug!("Chat completion returned {} chars", content.len());
        Ok(content)
    }
}

#[async_trait]
impl EmbeddingClient for AzureOpenAiProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.deployment_url(&self.settings.embedding_deployment, "embeddings");
        let body = EmbeddingRequest { input: texts };
        let (url, body) = (&url, &body);

        let response: EmbeddingResponse =
            with_backoff(self.max_retries, move || self.post(url, body, "embedding")).await?;

        let mut data = response.data;
        if data.len() != texts.len() {
            return Err(UpstreamError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                data.len()
            )));
        }
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}
