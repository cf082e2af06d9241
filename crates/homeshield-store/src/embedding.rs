//! Deterministic embeddings for local runs and tests
//!
//! `HashEmbedder` maps text to a bag-of-words vector by feature hashing:
//! every lowercase alphanumeric token increments one bucket chosen by its
//! hash, and the result is normalised to unit length. Texts sharing words
//! therefore point in similar directions, which is enough for relevance and
//! diversity behaviour to be observable without a hosted model.
//!
//! # Examples
//!
//! ```rust
//! use homeshield_store::embedding::{cosine_similarity, HashEmbedder};
//!
//! let model = HashEmbedder::new(256);
//! let a = model.embed_one("air conditioner compressor failure");
//! let b = model.embed_one("compressor failure in the air conditioner");
//! let c = model.embed_one("roof leak after storm");
//! assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
//! ```

use async_trait::async_trait;
use homeshield_domain::traits::EmbeddingClient;
use homeshield_domain::UpstreamError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Default embedding dimension
pub const DEFAULT_DIMENSION: usize = 384;

/// Feature-hashing bag-of-words embedder
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create a new embedder
    ///
    /// # Parameters
    ///
    /// - `dimension`: The embedding dimension; zero is raised to one
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    /// Get the dimension of embeddings produced by this model
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed a single text; empty text yields the zero vector
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            embedding[bucket] += 1.0;
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns a value in `[-1, 1]`; vectors of different length or zero
/// magnitude have similarity `0.0`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}
