//! Process-local vector index
//!
//! `InMemoryIndex` keeps every namespace in one shared map so that clients
//! bound to different namespaces (see [`InMemoryIndex::with_namespace`]) see
//! the same data, the way separate clients of a hosted index would. Search is
//! exhaustive: filter, score every survivor, keep the `fetch_k` best, then
//! re-rank with MMR.

use crate::mmr::maximal_marginal_relevance;
use crate::embedding::cosine_similarity;
use async_trait::async_trait;
use homeshield_domain::traits::{EmbeddingClient, MmrQuery, NamespaceStats, VectorIndex, VectorRecord};
use homeshield_domain::{PolicyChunk, UpstreamError};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type Namespaces = HashMap<String, BTreeMap<String, VectorRecord>>;

/// In-memory implementation of [`VectorIndex`]
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use homeshield_store::{HashEmbedder, InMemoryIndex};
/// use homeshield_domain::traits::VectorIndex;
///
/// let index = InMemoryIndex::new("policies", Arc::new(HashEmbedder::default()));
/// assert_eq!(index.namespace(), "policies");
/// assert!(index.is_empty());
/// ```
#[derive(Clone)]
pub struct InMemoryIndex {
    namespace: String,
    embedder: Arc<dyn EmbeddingClient>,
    namespaces: Arc<RwLock<Namespaces>>,
}

impl InMemoryIndex {
    /// Create an empty index bound to `namespace`
    pub fn new(namespace: impl Into<String>, embedder: Arc<dyn EmbeddingClient>) -> Self {
        Self {
            namespace: namespace.into(),
            embedder,
            namespaces: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// A client for another namespace sharing this index's storage
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            embedder: Arc::clone(&self.embedder),
            namespaces: Arc::clone(&self.namespaces),
        }
    }

    /// Number of vectors in this client's namespace
    pub fn len(&self) -> usize {
        self.read().get(&self.namespace).map_or(0, BTreeMap::len)
    }

    /// True when this client's namespace holds no vectors
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Namespaces> {
        self.namespaces.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Namespaces> {
        self.namespaces.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), UpstreamError> {
        let count = records.len();
        let mut namespaces = self.write();
        let space = namespaces.entry(self.namespace.clone()).or_default();
        for record in records {
            space.insert(record.id.clone(), record);
        }
        debug!("Upserted {} vectors into namespace '{}'", count, self.namespace);
        Ok(())
    }

    async fn query_mmr(&self, query: &MmrQuery) -> Result<Vec<PolicyChunk>, UpstreamError> {
        let mut embedded = self.embedder.embed(std::slice::from_ref(&query.text)).await?;
        let query_vec = embedded
            .pop()
            .ok_or_else(|| UpstreamError::InvalidResponse("Embedder returned no vector".to_string()))?;

        // Filter and score under the lock, then release it before re-ranking
        let mut scored: Vec<(f32, VectorRecord)> = {
            let namespaces = self.read();
            let Some(space) = namespaces.get(&self.namespace) else {
                return Ok(Vec::new());
            };
            space
                .values()
                .filter(|r| query.filter.matches(&r.metadata))
                .map(|r| (cosine_similarity(&query_vec, &r.embedding), r.clone()))
                .collect()
        };

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        scored.truncate(query.fetch_k.max(query.k));

        let candidates: Vec<Vec<f32>> = scored.iter().map(|(_, r)| r.embedding.clone()).collect();
        let order = maximal_marginal_relevance(&query_vec, &candidates, query.k, query.lambda_mult);

        debug!(
            "MMR query in '{}': {} candidates, {} selected",
            self.namespace,
            candidates.len(),
            order.len()
        );

        Ok(order
            .into_iter()
            .map(|i| PolicyChunk::from_metadata(&scored[i].1.metadata))
            .collect())
    }

    async fn delete_all(&self) -> Result<(), UpstreamError> {
        self.write().remove(&self.namespace);
        Ok(())
    }

    async fn describe(&self) -> Result<NamespaceStats, UpstreamError> {
        let vector_count = self.len();
        Ok(NamespaceStats {
            exists: vector_count > 0,
            vector_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashEmbedder;
    use homeshield_domain::{MetadataFilter, MetadataValue};

    fn chunk(plan: &str, index: usize, text: &str) -> PolicyChunk {
        let source = format!("LHG_{}_TX_2025.txt", plan);
        PolicyChunk {
            text: text.to_string(),
            chunk_id: format!("{}-{:04}", source, index),
            source,
            plan: Some(plan.to_string()),
            state: Some("TX".to_string()),
            effective_year: Some(2025),
            page: 1,
            section: "policy".to_string(),
        }
    }

    fn record(id: &str, chunk: &PolicyChunk) -> VectorRecord {
        let embedder = HashEmbedder::default();
        VectorRecord {
            id: id.to_string(),
            embedding: embedder.embed_one(&chunk.text),
            metadata: chunk.to_metadata(),
        }
    }

    fn index() -> InMemoryIndex {
        InMemoryIndex::new("test", Arc::new(HashEmbedder::default()))
    }

    fn query(text: &str, filter: MetadataFilter) -> MmrQuery {
        MmrQuery {
            text: text.to_string(),
            k: 4,
            fetch_k: 12,
            lambda_mult: 0.5,
            filter,
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let index = index();
        let c = chunk("Gold", 0, "roof leaks");
        index.upsert(vec![record("a", &c)]).await.unwrap();
        index.upsert(vec![record("a", &c)]).await.unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_query_respects_filter() {
        let index = index();
        index
            .upsert(vec![
                record("a", &chunk("Gold", 0, "air conditioner is covered")),
                record("b", &chunk("Silver", 0, "air conditioner is excluded")),
            ])
            .await
            .unwrap();

        let results = index
            .query_mmr(&query("air conditioner", MetadataFilter::new().eq("plan", "Silver")))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].plan.as_deref(), Some("Silver"));
    }

    #[tokio::test]
    async fn test_float_year_needs_float_clause() {
        let index = index();
        let c = chunk("Gold", 0, "water heater covered");
        let mut r = record("a", &c);
        r.metadata.insert("effective_year".into(), MetadataValue::Float(2025.0));
        index.upsert(vec![r]).await.unwrap();

        let int_only = MetadataFilter::new().eq("effective_year", 2025i64);
        assert!(index.query_mmr(&query("water", int_only)).await.unwrap().is_empty());

        let either = MetadataFilter::new().one_of(
            "effective_year",
            vec![MetadataValue::Int(2025), MetadataValue::Float(2025.0)],
        );
        assert_eq!(index.query_mmr(&query("water", either)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated_but_share_storage() {
        let index = index();
        let other = index.with_namespace("other");
        index.upsert(vec![record("a", &chunk("Gold", 0, "x"))]).await.unwrap();
        assert!(other.is_empty());

        let again = other.with_namespace("test");
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_all_and_describe() {
        let index = index();
        assert_eq!(index.describe().await.unwrap(), NamespaceStats::default());

        index.upsert(vec![record("a", &chunk("Gold", 0, "x"))]).await.unwrap();
        let stats = index.describe().await.unwrap();
        assert!(stats.exists);
        assert_eq!(stats.vector_count, 1);

        index.delete_all().await.unwrap();
        assert!(!index.describe().await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_empty_namespace_returns_nothing() {
        let results = index().query_mmr(&query("anything", MetadataFilter::new())).await.unwrap();
        assert!(results.is_empty());
    }
}
