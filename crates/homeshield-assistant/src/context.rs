//! Rendering retrieved chunks into prompt context

use homeshield_domain::chunk::{basename, UNKNOWN_SOURCE};
use homeshield_domain::{Citation, PolicyChunk};

/// Separator placed between rendered chunks
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Anything that can be rendered as one context entry
pub trait ContextEntry {
    /// Source filename, possibly with directories
    fn source(&self) -> &str;
    /// Page number
    fn page(&self) -> u32;
    /// Body text
    fn body(&self) -> &str;
}

impl ContextEntry for PolicyChunk {
    fn source(&self) -> &str {
        &self.source
    }

    fn page(&self) -> u32 {
        self.page
    }

    fn body(&self) -> &str {
        &self.text
    }
}

impl ContextEntry for Citation {
    fn source(&self) -> &str {
        &self.source
    }

    fn page(&self) -> u32 {
        self.page
    }

    fn body(&self) -> &str {
        &self.quote
    }
}

/// Render entries as `[i] <source> p.<page>` headers followed by the text
///
/// # Examples
///
/// ```
/// use homeshield_assistant::context::format_context;
/// use homeshield_domain::Citation;
///
/// let entries = vec![
///     Citation { source: "dir/LHG_Gold_TX_2025.txt".into(), page: 1, quote: "A".into() },
///     Citation { source: "".into(), page: 2, quote: "B".into() },
/// ];
/// assert_eq!(
///     format_context(&entries),
///     "[0] LHG_Gold_TX_2025.txt p.1\nA\n\n---\n\n[1] unknown.txt p.2\nB"
/// );
/// ```
pub fn format_context<E: ContextEntry>(entries: &[E]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let source = basename(entry.source());
            let source = if source.is_empty() { UNKNOWN_SOURCE } else { source };
            format!("[{}] {} p.{}\n{}", i, source, entry.page(), entry.body())
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeshield_domain::{Metadata, MetadataValue};

    fn chunk_with_page(page: MetadataValue) -> PolicyChunk {
        let mut meta = Metadata::new();
        meta.insert("text".into(), "Water heaters are covered.".into());
        meta.insert("source".into(), "/srv/docs/LHG_Gold_TX_2025.txt".into());
        meta.insert("page".into(), page);
        PolicyChunk::from_metadata(&meta)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_context::<PolicyChunk>(&[]), "");
    }

    #[test]
    fn test_page_coercion() {
        let chunks = vec![
            chunk_with_page(MetadataValue::Float(2.9)),
            chunk_with_page("n/a".into()),
        ];
        let rendered = format_context(&chunks);
        assert!(rendered.starts_with("[0] LHG_Gold_TX_2025.txt p.2\nWater heaters are covered."));
        assert!(rendered.contains("\n\n---\n\n[1] LHG_Gold_TX_2025.txt p.0\n"));
    }

    #[test]
    fn test_single_entry_has_no_separator() {
        let rendered = format_context(&[chunk_with_page(MetadataValue::Int(1))]);
        assert!(!rendered.contains(CONTEXT_SEPARATOR));
    }
}
