//! HomeShield Storage Layer
//!
//! Implementations of the `VectorIndex` and `CustomerLookup` traits from
//! `homeshield-domain`.
//!
//! # Architecture
//!
//! - `PineconeIndex`: hosted index over REST, MMR re-ranking client-side
//! - `InMemoryIndex`: exhaustive process-local index for tests and offline runs
//! - `HashEmbedder`: deterministic bag-of-words embeddings
//! - `CsvCustomerTable`: customer records read from a CSV file
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use homeshield_store::{HashEmbedder, InMemoryIndex};
//!
//! let embedder = Arc::new(HashEmbedder::default());
//! let index = InMemoryIndex::new("homeshield", embedder);
//! assert!(index.is_empty());
//! ```

#![warn(missing_docs)]

pub mod customers;
pub mod embedding;
pub mod memory;
pub mod mmr;
pub mod pinecone;

use homeshield_domain::UpstreamError;
use thiserror::Error;

pub use customers::CsvCustomerTable;
pub use embedding::{cosine_similarity, HashEmbedder};
pub use memory::InMemoryIndex;
pub use mmr::maximal_marginal_relevance;
pub use pinecone::PineconeIndex;

/// Errors that can occur while reading local stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// File could not be opened or read
    #[error("I/O error: {0}")]
    Io(String),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<StoreError> for UpstreamError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(msg) => UpstreamError::Communication(msg),
            other => UpstreamError::InvalidResponse(other.to_string()),
        }
    }
}
