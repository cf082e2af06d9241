//! Filtered, diversity-aware retrieval of policy chunks

use crate::config::RetrievalConfig;
use crate::error::AssistantError;
use homeshield_domain::chunk::basename;
use homeshield_domain::traits::{MmrQuery, VectorIndex};
use homeshield_domain::{MetadataFilter, PlanRouting, PolicyChunk};
use std::sync::Arc;
use tracing::debug;

/// Build the conjunctive filter for one routing key
///
/// Exact equality on plan and state, the year as either int or float, and
/// optionally the source basename of a single document.
pub fn routing_filter(routing: &PlanRouting, policy_source: Option<&str>) -> MetadataFilter {
    let filter = routing.to_filter();
    match policy_source.map(basename).filter(|s| !s.is_empty()) {
        Some(source) => filter.eq("source", source),
        None => filter,
    }
}

/// Issues MMR queries scoped to one (plan, state, year)
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    config: RetrievalConfig,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(index: Arc<dyn VectorIndex>, config: RetrievalConfig) -> Self {
        Self { index, config }
    }

    /// Retrieval settings in use
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Retrieve up to `k` chunks for `query` that match `routing`
    ///
    /// An empty result means no applicable policy text, not a failure.
    pub async fn retrieve(
        &self,
        query: &str,
        routing: &PlanRouting,
        policy_source: Option<&str>,
    ) -> Result<Vec<PolicyChunk>, AssistantError> {
        let request = MmrQuery {
            text: query.to_string(),
            k: self.config.k,
            fetch_k: self.config.fetch_k,
            lambda_mult: self.config.lambda_mult,
            filter: routing_filter(routing, policy_source),
        };

        let chunks = self.index.query_mmr(&request).await?;
        debug!(
            "Retrieved {} chunks for {}/{}/{}",
            chunks.len(),
            routing.plan,
            routing.state,
            routing.effective_year
        );
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeshield_domain::FilterClause;

    #[test]
    fn test_routing_filter_shape() {
        let routing = PlanRouting::new("Gold", "TX", 2025).unwrap();
        let json = routing_filter(&routing, None).to_json();
        assert_eq!(json["$and"][0]["plan"]["$eq"], "Gold");
        assert_eq!(json["$and"][1]["state"]["$eq"], "TX");
        assert_eq!(json["$and"][2]["effective_year"]["$in"][0], 2025);
        assert_eq!(json["$and"][2]["effective_year"]["$in"][1], 2025.0);
    }

    #[test]
    fn test_policy_source_uses_basename() {
        let routing = PlanRouting::new("Gold", "TX", 2025).unwrap();
        let filter = routing_filter(&routing, Some("/data/LHG_Gold_TX_2025.txt"));
        let last = filter.clauses().last().unwrap();
        assert_eq!(last.field(), "source");
        assert!(matches!(last, FilterClause::Eq(_, v) if v.as_str() == Some("LHG_Gold_TX_2025.txt")));
    }

    #[test]
    fn test_blank_policy_source_is_ignored() {
        let routing = PlanRouting::new("Gold", "TX", 2025).unwrap();
        assert_eq!(routing_filter(&routing, Some("")).clauses().len(), 3);
    }
}
