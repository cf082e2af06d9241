//! Error types for the assistant

use homeshield_domain::UpstreamError;
use thiserror::Error;

/// Errors that abort an assistant operation
///
/// Bad caller input (unknown customer, missing routing) is not an error; see
/// [`crate::Outcome::Rejected`].
#[derive(Error, Debug)]
pub enum AssistantError {
    /// A hosted collaborator failed
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Model output could not be parsed where no safe default exists
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// Policy documents could not be loaded
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AssistantError {
    /// True when the failure came from a hosted collaborator
    pub fn is_upstream(&self) -> bool {
        matches!(self, AssistantError::Upstream(_))
    }
}
