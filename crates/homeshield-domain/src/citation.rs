//! Citation - a source/page/quote view over a retrieved chunk

use crate::chunk::PolicyChunk;
use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in a citation quote
pub const MAX_QUOTE_CHARS: usize = 300;

/// Reference to a passage of a policy document
///
/// Built at response time from the chunks used for a decision; never
/// persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Source filename
    #[serde(default)]
    pub source: String,

    /// Page proxy of the cited chunk
    #[serde(default)]
    pub page: u32,

    /// Quoted policy text
    #[serde(default)]
    pub quote: String,
}

impl Citation {
    /// Cite a chunk, trimming the quote to [`MAX_QUOTE_CHARS`]
    pub fn from_chunk(chunk: &PolicyChunk) -> Self {
        Self {
            source: chunk.source.clone(),
            page: chunk.page,
            quote: truncate_chars(chunk.text.trim(), MAX_QUOTE_CHARS).to_string(),
        }
    }
}

/// Cite every chunk, preserving order
pub fn cite_all(chunks: &[PolicyChunk]) -> Vec<Citation> {
    chunks.iter().map(Citation::from_chunk).collect()
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
