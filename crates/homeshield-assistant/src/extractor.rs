//! Structured claim field extraction

use crate::error::AssistantError;
use crate::parser::parse_extraction;
use crate::prompt::extraction_messages;
use homeshield_domain::traits::GenerationClient;
use homeshield_domain::ExtractedClaimFields;
use std::sync::Arc;
use tracing::{debug, info};

/// Pulls appliance, issue and failure date out of a customer message
#[derive(Clone)]
pub struct StructuredExtractor {
    llm: Arc<dyn GenerationClient>,
    temperature: f32,
}

impl StructuredExtractor {
    /// Create a new extractor
    pub fn new(llm: Arc<dyn GenerationClient>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Extract claim fields
    ///
    /// An unparseable reply is returned as [`AssistantError::MalformedOutput`].
    pub async fn extract(&self, message: &str) -> Result<ExtractedClaimFields, AssistantError> {
        debug!("Extracting claim fields from {} chars", message.len());
        let reply = self
            .llm
            .generate(&extraction_messages(message), self.temperature)
            .await?;

        let fields = parse_extraction(&reply)?;
        info!(
            "Extracted appliance={:?} issue={:?} failure_date={:?}",
            fields.appliance, fields.issue, fields.failure_date
        );
        Ok(fields)
    }
}
