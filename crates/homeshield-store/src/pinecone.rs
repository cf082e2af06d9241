//! Pinecone REST client
//!
//! Talks to a single index host over its data-plane endpoints. Candidates are
//! fetched with their values so MMR re-ranking can run client-side.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use homeshield_store::{HashEmbedder, PineconeIndex};
//!
//! let index = PineconeIndex::new(
//!     "https://policies-abc123.svc.us-east-1.pinecone.io",
//!     "pc-secret",
//!     "homeshield",
//!     Arc::new(HashEmbedder::default()),
//! );
//! ```

use crate::mmr::maximal_marginal_relevance;
use async_trait::async_trait;
use homeshield_domain::traits::{EmbeddingClient, MmrQuery, NamespaceStats, VectorIndex, VectorRecord};
use homeshield_domain::{Metadata, MetadataValue, PolicyChunk, UpstreamError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default timeout for a single request (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Vector index backed by a hosted Pinecone index
pub struct PineconeIndex {
    host: String,
    api_key: String,
    namespace: String,
    embedder: Arc<dyn EmbeddingClient>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<WireVector<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct WireVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: Map<String, Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
    include_values: bool,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    values: Vec<f32>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
struct DescribeResponse {
    #[serde(default)]
    namespaces: HashMap<String, NamespaceSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: usize,
}

impl PineconeIndex {
    /// Create a client for `namespace` on the index served at `host`
    ///
    /// A host given without a scheme is assumed to be HTTPS.
    pub fn new(
        host: impl Into<String>,
        api_key: impl Into<String>,
        namespace: impl Into<String>,
        embedder: Arc<dyn EmbeddingClient>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        Self {
            host: host.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            namespace: namespace.into(),
            embedder,
            client,
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, UpstreamError>
    where
        B: Serialize + ?Sized + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.host, path);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Communication(format!("Pinecone request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, &text, path));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("Failed to parse {} response: {}", path, e)))
    }
}

fn classify_status(status: StatusCode, body: &str, path: &str) -> UpstreamError {
    let message = format!("Pinecone {} returned {}: {}", path, status, body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Configuration(message),
        StatusCode::NOT_FOUND => UpstreamError::NotFound(message),
        _ => UpstreamError::Communication(message),
    }
}

fn metadata_to_wire(metadata: &Metadata) -> Map<String, Value> {
    metadata.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

fn metadata_from_wire(wire: &Map<String, Value>) -> Metadata {
    wire.iter()
        .filter_map(|(k, v)| MetadataValue::from_json(v).map(|v| (k.clone(), v)))
        .collect()
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), UpstreamError> {
        if records.is_empty() {
            return Ok(());
        }
        let body = UpsertRequest {
            vectors: records
                .iter()
                .map(|r| WireVector {
                    id: &r.id,
                    values: &r.embedding,
                    metadata: metadata_to_wire(&r.metadata),
                })
                .collect(),
            namespace: &self.namespace,
        };
        let _: Value = self.post("/vectors/upsert", &body).await?;
        debug!("Upserted {} vectors into namespace '{}'", records.len(), self.namespace);
        Ok(())
    }

    async fn query_mmr(&self, query: &MmrQuery) -> Result<Vec<PolicyChunk>, UpstreamError> {
        let mut embedded = self.embedder.embed(std::slice::from_ref(&query.text)).await?;
        let query_vec = embedded
            .pop()
            .ok_or_else(|| UpstreamError::InvalidResponse("Embedder returned no vector".to_string()))?;

        let body = QueryRequest {
            namespace: &self.namespace,
            vector: &query_vec,
            top_k: query.fetch_k.max(query.k),
            filter: (!query.filter.clauses().is_empty()).then(|| query.filter.to_json()),
            include_values: true,
            include_metadata: true,
        };
        let response: QueryResponse = self.post("/query", &body).await?;

        let candidates: Vec<Vec<f32>> = response.matches.iter().map(|m| m.values.clone()).collect();
        let order = maximal_marginal_relevance(&query_vec, &candidates, query.k, query.lambda_mult);

        debug!(
            "MMR query in '{}': {} candidates, {} selected",
            self.namespace,
            candidates.len(),
            order.len()
        );

        Ok(order
            .into_iter()
            .map(|i| PolicyChunk::from_metadata(&metadata_from_wire(&response.matches[i].metadata)))
            .collect())
    }

    async fn delete_all(&self) -> Result<(), UpstreamError> {
        let body = json!({ "deleteAll": true, "namespace": self.namespace });
        match self.post::<_, Value>("/vectors/delete", &body).await {
            Ok(_) => Ok(()),
            // Deleting a namespace that was never written is not a failure
            Err(UpstreamError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn describe(&self) -> Result<NamespaceStats, UpstreamError> {
        let response: DescribeResponse = self.post("/describe_index_stats", &json!({})).await?;
        Ok(response
            .namespaces
            .get(&self.namespace)
            .map(|ns| NamespaceStats {
                exists: true,
                vector_count: ns.vector_count,
            })
            .unwrap_or_default())
    }
}
