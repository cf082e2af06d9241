//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the coverage pipeline and the
//! hosted services it delegates to. Implementations live in other crates and
//! are held as `Arc<dyn Trait>` by the pipeline, so every method reports
//! failures as [`UpstreamError`].

use crate::chunk::PolicyChunk;
use crate::customer::Customer;
use crate::error::UpstreamError;
use crate::filter::{Metadata, MetadataFilter};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions
    System,
    /// End-user content
    User,
    /// Model output
    Assistant,
}

/// One message of a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// System message
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// User message
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Hosted text generation
///
/// Implemented by the infrastructure layer (homeshield-llm)
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a completion for an ordered list of messages
    async fn generate(&self, messages: &[ChatMessage], temperature: f32) -> Result<String, UpstreamError>;
}

/// Hosted text embedding
///
/// Implemented by the infrastructure layer (homeshield-llm, homeshield-store)
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed each text, returning one vector per input in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError>;
}

/// A vector ready to be written to the index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// Vector id, unique within the namespace
    pub id: String,
    /// Embedding values
    pub embedding: Vec<f32>,
    /// Metadata, including the raw chunk text
    pub metadata: Metadata,
}

/// Diversity-aware similarity query
#[derive(Debug, Clone, PartialEq)]
pub struct MmrQuery {
    /// Free-text query; the index client embeds it
    pub text: String,
    /// Number of results to return
    pub k: usize,
    /// Candidate pool size before re-ranking
    pub fetch_k: usize,
    /// Relevance/diversity trade-off, 1.0 = pure relevance
    pub lambda_mult: f32,
    /// Hard metadata constraint
    pub filter: MetadataFilter,
}

/// Existence and size of a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NamespaceStats {
    /// Whether the namespace currently holds any vectors
    pub exists: bool,
    /// Number of vectors in the namespace
    pub vector_count: usize,
}

/// Namespaced vector store with metadata-filtered MMR search
///
/// Implemented by the infrastructure layer (homeshield-store)
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Namespace this client reads and writes
    fn namespace(&self) -> &str;

    /// Insert or replace vectors by id
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), UpstreamError>;

    /// Filtered similarity search with MMR re-ranking
    ///
    /// Returns an empty list, not an error, when nothing satisfies the filter.
    async fn query_mmr(&self, query: &MmrQuery) -> Result<Vec<PolicyChunk>, UpstreamError>;

    /// Remove every vector in the namespace
    async fn delete_all(&self) -> Result<(), UpstreamError>;

    /// Report whether the namespace exists and how large it is
    async fn describe(&self) -> Result<NamespaceStats, UpstreamError>;
}

/// Customer table
///
/// Implemented by the infrastructure layer (homeshield-store)
#[async_trait]
pub trait CustomerLookup: Send + Sync {
    /// Resolve a customer id; `Ok(None)` when the id is unknown
    async fn get_customer(&self, id: &str) -> Result<Option<Customer>, UpstreamError>;
}
