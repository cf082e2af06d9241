//! Errors reported by external collaborators

use thiserror::Error;

/// Failure of a hosted service (language model, embeddings, vector store,
/// customer table)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// The service throttled the request; safe to retry after a delay
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// The service answered with something we cannot use
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Requested model, index or table does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials or endpoint configuration rejected
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl UpstreamError {
    /// True for throttling signals that warrant a back-off and retry
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, UpstreamError::RateLimited(_))
    }
}
