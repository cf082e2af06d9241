//! HomeShield LLM Provider Layer
//!
//! Implementations of the `GenerationClient` and `EmbeddingClient` traits
//! from `homeshield-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic scripted replies for testing
//! - `AzureOpenAiProvider`: Hosted Azure OpenAI chat + embeddings
//! - `OllamaProvider`: Local Ollama chat + embeddings
//!
//! # Examples
//!
//! ```
//! use homeshield_llm::MockProvider;
//! use homeshield_domain::traits::{ChatMessage, GenerationClient};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = rt.block_on(provider.generate(&[ChatMessage::user("test")], 0.0)).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

mod http;
pub mod azure;
pub mod ollama;

use async_trait::async_trait;
use homeshield_domain::traits::{ChatMessage, GenerationClient};
use std::sync::{Arc, Mutex, MutexGuard};

pub use azure::{AzureOpenAiProvider, AzureSettings};
pub use homeshield_domain::UpstreamError;
pub use ollama::OllamaProvider;

/// Marker reply that makes [`MockProvider`] return an error
const ERROR_MARKER: &str = "ERROR";

/// Mock generation provider for deterministic testing
///
/// Returns pre-configured replies without making any network calls. A reply
/// is chosen by the first registered key contained in the last message of
/// the request; otherwise the default reply is returned.
///
/// # Examples
///
/// ```
/// use homeshield_llm::MockProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("stopped cooling", r#"{"appliance": "AC"}"#);
/// provider.add_error("explode");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, String)>>>,
    call_count: Arc<Mutex<usize>>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a new MockProvider with a fixed reply for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply with `response` when the last message contains `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        lock(&self.responses).push((key.into(), response.into()));
    }

    /// Fail when the last message contains `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        lock(&self.responses).push((key.into(), ERROR_MARKER.to_string()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *lock(&self.call_count)
    }

    /// Reset the call count and recorded requests
    pub fn reset_call_count(&self) {
        *lock(&self.call_count) = 0;
        lock(&self.requests).clear();
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.requests).clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl GenerationClient for MockProvider {
    async fn generate(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String, UpstreamError> {
        *lock(&self.call_count) += 1;
        lock(&self.requests).push(messages.to_vec());

        let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        let responses = lock(&self.responses);
        if let Some((_, response)) = responses.iter().find(|(key, _)| last.contains(key.as_str())) {
            if response == ERROR_MARKER {
                return Err(UpstreamError::Communication("Mock error".to_string()));
            }
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(text: &str) -> Vec<ChatMessage> {
        vec![ChatMessage::system("rules"), ChatMessage::user(text)]
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate(&user("any prompt"), 0.0).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(provider.generate(&user("say hello"), 0.0).await.unwrap(), "world");
        assert_eq!(provider.generate(&user("foo?"), 0.0).await.unwrap(), "bar");
        assert_eq!(provider.generate(&user("unknown"), 0.0).await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count_and_requests() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate(&user("prompt1"), 0.0).await.unwrap();
        provider.generate(&user("prompt2"), 0.0).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.requests()[1][1].content, "prompt2");

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = provider.generate(&user("a bad prompt"), 0.0).await;
        assert!(matches!(result, Err(UpstreamError::Communication(_))));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate(&user("test"), 0.0).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }
}
