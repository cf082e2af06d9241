//! Policy document ingestion
//!
//! Loads `*.txt` policy documents, chunks them with filter metadata parsed
//! from the filename, and (re)builds a vector index namespace from them.

use crate::chunking::TextChunker;
use crate::config::{ChunkingConfig, IngestionConfig};
use crate::error::AssistantError;
use homeshield_domain::chunk::{DEFAULT_SECTION, UNKNOWN_SOURCE};
use homeshield_domain::traits::{EmbeddingClient, VectorIndex, VectorRecord};
use homeshield_domain::{PlanRouting, PolicyChunk, UpstreamError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Chunks sharing one page number
pub const CHUNKS_PER_PAGE: usize = 5;

/// Result of a full re-ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
    /// Whether the namespace held vectors before it was cleared
    pub cleared: bool,
    /// Number of chunks written
    pub chunks: usize,
    /// Namespace that was rebuilt
    pub namespace: String,
}

/// Parse routing metadata from a `<Prefix>_<Plan>_<STATE>_<YEAR>.<ext>` filename
///
/// Returns `None` when the stem has fewer than four `_`-separated parts, the
/// prefix does not match, or the year is not an integer.
///
/// # Examples
///
/// ```
/// use homeshield_assistant::ingest::parse_policy_filename;
///
/// let routing = parse_policy_filename("LHG_gold_tx_2025.txt", "LHG").unwrap();
/// assert_eq!((routing.plan.as_str(), routing.state.as_str()), ("Gold", "TX"));
/// assert!(parse_policy_filename("notes.txt", "LHG").is_none());
/// ```
pub fn parse_policy_filename(filename: &str, prefix: &str) -> Option<PlanRouting> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 4 || parts[0] != prefix {
        return None;
    }
    let year = parts[3].trim().parse::<i64>().ok()?;
    PlanRouting::new(parts[1], parts[2], year)
}

/// Chunk one document and attach its metadata
///
/// `page` is `(index / 5) + 1` and `chunk_id` is `"{source}-{index:04}"`,
/// both over this document's chunk sequence.
pub fn chunk_document(
    source: &str,
    text: &str,
    routing: Option<&PlanRouting>,
    chunker: &TextChunker,
) -> Vec<PolicyChunk> {
    let source = homeshield_domain::chunk::basename(source);
    let source = if source.is_empty() { UNKNOWN_SOURCE } else { source };

    chunker
        .chunk(text)
        .into_iter()
        .enumerate()
        .map(|(index, text)| PolicyChunk {
            text,
            source: source.to_string(),
            plan: routing.map(|r| r.plan.clone()),
            state: routing.map(|r| r.state.clone()),
            effective_year: routing.map(|r| r.effective_year),
            page: (index / CHUNKS_PER_PAGE + 1) as u32,
            section: DEFAULT_SECTION.to_string(),
            chunk_id: format!("{}-{:04}", source, index),
        })
        .collect()
}

/// List `*.txt` files in a directory, sorted by filename
pub fn policy_files(dir: &Path) -> Result<Vec<PathBuf>, AssistantError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AssistantError::Ingestion(format!("Cannot read {}: {}", dir.display(), e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

/// Load and chunk every policy document in `dir`
///
/// Unreadable files are skipped with a warning; a missing directory is an
/// error.
pub fn load_policy_dir(
    dir: &Path,
    chunker: &TextChunker,
    prefix: &str,
) -> Result<Vec<PolicyChunk>, AssistantError> {
    let mut chunks = Vec::new();

    for path in policy_files(dir)? {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping unreadable policy file {}: {}", path.display(), e);
                continue;
            }
        };

        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or(UNKNOWN_SOURCE);
        let routing = parse_policy_filename(filename, prefix);
        if routing.is_none() {
            warn!("Policy file {} does not follow the naming convention; its chunks are unfilterable", filename);
        }

        let document = chunk_document(filename, &text, routing.as_ref(), chunker);
        debug!("Chunked {} into {} chunks", filename, document.len());
        chunks.extend(document);
    }

    info!("Loaded {} chunks from {}", chunks.len(), dir.display());
    Ok(chunks)
}

/// Rebuilds a vector index namespace from a policy directory
pub struct Ingestor {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingClient>,
    chunker: TextChunker,
    config: IngestionConfig,
}

impl Ingestor {
    /// Create a new ingestor
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingClient>,
        chunking: &ChunkingConfig,
        config: IngestionConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            chunker: TextChunker::from_config(chunking),
            config,
        }
    }

    /// Namespace being rebuilt
    pub fn namespace(&self) -> &str {
        self.index.namespace()
    }

    /// Remove every vector in the namespace, reporting whether it existed
    pub async fn clear_namespace(&self) -> Result<bool, AssistantError> {
        let stats = self.index.describe().await?;
        if !stats.exists {
            return Ok(false);
        }
        self.index.delete_all().await?;
        info!(
            "Cleared namespace '{}' ({} vectors)",
            self.index.namespace(),
            stats.vector_count
        );
        Ok(true)
    }

    /// Clear the namespace, then chunk, embed and upsert every document
    ///
    /// Clearing completes before any upsert so stale and fresh chunks never
    /// coexist.
    pub async fn reindex(&self, dir: &Path) -> Result<ReindexReport, AssistantError> {
        let chunks = load_policy_dir(dir, &self.chunker, &self.config.filename_prefix)?;
        let cleared = self.clear_namespace().await?;
        let written = self.upsert_chunks(&chunks).await?;

        Ok(ReindexReport {
            cleared,
            chunks: written,
            namespace: self.index.namespace().to_string(),
        })
    }

    /// Embed and upsert chunks in batches; vector ids are `hs-{index:08}`
    pub async fn upsert_chunks(&self, chunks: &[PolicyChunk]) -> Result<usize, AssistantError> {
        let batch_size = self.config.batch_size.max(1);
        for (batch_index, batch) in chunks.chunks(batch_size).enumerate() {
            let start = batch_index * batch_size;
            self.upsert_batch_with_retry(batch, start).await?;
            debug!("Upserted chunks {}..{}", start, start + batch.len());
        }
        info!("Upserted {} chunks into '{}'", chunks.len(), self.index.namespace());
        Ok(chunks.len())
    }

    async fn upsert_batch_with_retry(&self, batch: &[PolicyChunk], start: usize) -> Result<(), AssistantError> {
        let mut attempt = 1;
        loop {
            match self.upsert_batch(batch, start).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_rate_limited() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_delay(attempt);
                    warn!(
                        "Batch at {} rate limited (attempt {}/{}), retrying in {:?}",
                        start, attempt, self.config.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn upsert_batch(&self, batch: &[PolicyChunk], start: usize) -> Result<(), UpstreamError> {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(UpstreamError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            )));
        }

        let records = batch
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(offset, (chunk, embedding))| VectorRecord {
                id: format!("hs-{:08}", start + offset),
                embedding,
                metadata: chunk.to_metadata(),
            })
            .collect();

        self.index.upsert(records).await
    }
}
