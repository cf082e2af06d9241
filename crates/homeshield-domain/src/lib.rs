//! HomeShield Domain Layer
//!
//! This crate contains the data model of the HomeShield coverage assistant
//! and the trait interfaces for every external collaborator (language model,
//! embedding model, vector index, customer table). It performs no I/O.
//!
//! ## Key Concepts
//!
//! - **PolicyChunk**: a bounded span of policy text with filter metadata
//! - **MetadataFilter**: a conjunctive equality/membership predicate over chunk metadata
//! - **Citation**: a source/page/quote view over a chunk, built at response time
//! - **CoverageVerdict**: a decision label with reasons and citations
//! - **Claim**: one adjudicated claim submission
//!
//! ## Architecture
//!
//! - Pure data types and validation only
//! - Infrastructure implementations live in `homeshield-llm` and `homeshield-store`
//! - Orchestration lives in `homeshield-assistant`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod citation;
pub mod claim;
pub mod customer;
pub mod error;
pub mod filter;
pub mod traits;
pub mod verdict;

// Re-exports for convenience
pub use chunk::PolicyChunk;
pub use citation::Citation;
pub use claim::{Claim, ClaimId, ExtractedClaimFields};
pub use customer::{Customer, PlanRouting};
pub use error::UpstreamError;
pub use filter::{FilterClause, Metadata, MetadataFilter, MetadataValue};
pub use verdict::{CoverageVerdict, Decision};
