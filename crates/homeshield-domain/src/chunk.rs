//! Policy chunk - a bounded span of policy text with filter metadata

use crate::filter::{Metadata, MetadataValue};
use serde::{Deserialize, Serialize};

/// Metadata key under which the raw chunk text is stored
pub const TEXT_KEY: &str = "text";

/// Section label assigned to every ingested chunk
pub const DEFAULT_SECTION: &str = "policy";

/// Source name used when a chunk carries no source metadata
pub const UNKNOWN_SOURCE: &str = "unknown.txt";

/// A contiguous span of policy text and the metadata needed to filter it
///
/// `plan`, `state` and `effective_year` are `None` when the originating
/// filename did not follow the naming convention; such chunks are stored
/// but can never satisfy a routed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyChunk {
    /// Chunk text
    pub text: String,

    /// Source filename (basename only)
    pub source: String,

    /// Title-cased plan name (e.g. "Gold")
    pub plan: Option<String>,

    /// Upper-cased two-letter state code (e.g. "TX")
    pub state: Option<String>,

    /// Effective year of the policy document
    pub effective_year: Option<i64>,

    /// Coarse page proxy: `(index / 5) + 1` over the document's chunks
    pub page: u32,

    /// Free section label
    pub section: String,

    /// Unique id within the source: `"{source}-{index:04}"`
    pub chunk_id: String,
}

impl PolicyChunk {
    /// Build the metadata map stored with this chunk's vector
    ///
    /// Unset filter fields are omitted, so filters on them never match.
    pub fn to_metadata(&self) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert(TEXT_KEY.to_string(), self.text.clone().into());
        meta.insert("source".to_string(), self.source.clone().into());
        meta.insert("policy_file".to_string(), self.source.clone().into());
        meta.insert("page".to_string(), MetadataValue::Int(i64::from(self.page)));
        meta.insert("section".to_string(), self.section.clone().into());
        meta.insert("chunk_id".to_string(), self.chunk_id.clone().into());
        if let Some(plan) = &self.plan {
            meta.insert("plan".to_string(), plan.clone().into());
        }
        if let Some(state) = &self.state {
            meta.insert("state".to_string(), state.clone().into());
        }
        if let Some(year) = self.effective_year {
            meta.insert("effective_year".to_string(), MetadataValue::Int(year));
        }
        meta
    }

    /// Rebuild a chunk from stored metadata
    ///
    /// The source is reduced to its basename, the page
    /// is coerced (floats truncate, anything else becomes 0) and the year
    /// accepts int or float storage.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let get_str = |key: &str| metadata.get(key).and_then(MetadataValue::as_str).map(str::to_string);

        let source = get_str("source")
            .map(|s| basename(&s).to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        let page = metadata
            .get("page")
            .and_then(MetadataValue::as_lenient_i64)
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0);

        Self {
            text: get_str(TEXT_KEY).unwrap_or_default(),
            plan: get_str("plan"),
            state: get_str("state"),
            effective_year: metadata.get("effective_year").and_then(MetadataValue::as_lenient_i64),
            page,
            section: get_str("section").unwrap_or_else(|| DEFAULT_SECTION.to_string()),
            chunk_id: get_str("chunk_id").unwrap_or_default(),
            source,
        }
    }

    /// True when the chunk carries every routing field
    pub fn is_routable(&self) -> bool {
        self.plan.is_some() && self.state.is_some() && self.effective_year.is_some()
    }
}

/// Strip any directory components from a path-like string
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Title-case a word list: first letter of each word upper, rest lower
///
/// # Examples
///
/// ```
/// use homeshield_domain::chunk::title_case;
///
/// assert_eq!(title_case("gold"), "Gold");
/// assert_eq!(title_case("PLATINUM plus"), "Platinum Plus");
/// ```
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
