//! HomeShield Assistant
//!
//! Retrieval-augmented question answering and claim adjudication over
//! home-warranty policy documents.
//!
//! # Overview
//!
//! Policy documents are chunked with the plan, state and year parsed from
//! their filenames, embedded, and stored in a vector index. Every query is
//! filtered to exactly one (plan, state, year) and re-ranked for diversity
//! before the text reaches the model.
//!
//! # Architecture
//!
//! ```text
//! Customer → PlanRouting ─┐
//! Message → Extractor ────┼→ Retriever → DecisionEngine → WaitingPeriodRule → Claim
//!                         └→ Retriever → QA prompt → Answer
//! ```
//!
//! # Key Features
//!
//! - **Exact routing**: plan/state/year filters, with int/float year equivalence
//! - **Exclusion-first decisions**: keyword heuristics before any model call
//! - **Conservative fallbacks**: unreadable or uncertain adjudications are "not covered"
//! - **Rule overlay**: claims inside the waiting period are always denied
//! - **Soft rejections**: unknown customers come back as `{error}` payloads
//!
//! # Example Usage
//!
//! ```no_run
//! use homeshield_assistant::{Assistant, AssistantConfig, ClaimRequest, Collaborators};
//! use homeshield_llm::MockProvider;
//! use homeshield_store::{CsvCustomerTable, HashEmbedder, InMemoryIndex};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = Arc::new(HashEmbedder::default());
//! let collaborators = Collaborators {
//!     generation: Arc::new(MockProvider::new("{}")),
//!     embedding: embedder.clone(),
//!     index: Arc::new(InMemoryIndex::new("homeshield", embedder)),
//!     customers: Arc::new(CsvCustomerTable::new("data/customers.csv")),
//! };
//! let assistant = Assistant::new(collaborators, AssistantConfig::default(), "policies_docs")?;
//!
//! assistant.reindex().await?;
//! let request = ClaimRequest {
//!     customer_id: "C00001".to_string(),
//!     message: "My AC stopped cooling yesterday".to_string(),
//! };
//! let outcome = assistant.submit_claim(&request).await?;
//! println!("{}", serde_json::to_string(&outcome)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod chunking;
pub mod config;
pub mod context;
pub mod decision;
mod error;
pub mod extractor;
mod facade;
pub mod ingest;
pub mod parser;
pub mod prompt;
pub mod retriever;
pub mod rules;
pub mod upgrades;


pub use chunking::TextChunker;
pub use config::{AssistantConfig, ChunkingConfig, IngestionConfig, RetrievalConfig, RulesConfig};
pub use decision::{CoverageAssessment, DecisionEngine, DecisionPath, KeywordClassifier};
pub use error::AssistantError;
pub use extractor::StructuredExtractor;
pub use facade::{
    Assistant, ClaimRequest, Collaborators, CoverageRequest, Outcome, QaAnswer, QaRequest, UpgradeReport,
    UpgradeRequest, MISSING_ROUTING_ERROR, NO_POLICY_TEXT_ANSWER,
};
pub use ingest::{Ingestor, ReindexReport};
pub use retriever::Retriever;
pub use rules::WaitingPeriodRule;
pub use upgrades::{PlanSuggestion, UpgradeAdvisor};
