//! Coverage decision engine
//!
//! One evaluation walks a small state machine:
//!
//! - no chunks retrieved: terminal, not covered, no citations
//! - only exclusion wording matched: terminal, not covered
//! - only coverage wording matched: terminal, covered
//! - both or neither matched: the model adjudicates, and anything short of
//!   an explicit "yes" is not covered

use crate::context::format_context;
use crate::error::AssistantError;
use crate::parser::{parse_adjudication, Adjudication};
use crate::prompt::adjudication_messages;
use crate::retriever::Retriever;
use homeshield_domain::citation::cite_all;
use homeshield_domain::traits::GenerationClient;
use homeshield_domain::{Citation, CoverageVerdict, Decision, PlanRouting, PolicyChunk};
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Reason when retrieval found nothing for the routing key
pub const NO_CONTEXT_REASON: &str = "No relevant policy clauses found.";

/// Reason when only exclusion wording matched
pub const EXCLUDED_REASON: &str = "Policy clauses indicate an explicit exclusion for this issue.";

/// Reason when only coverage wording matched
pub const COVERED_REASON: &str = "Policy clauses indicate this issue is covered.";

const EXCLUSION_PATTERNS: &[&str] = &[
    r"\bnot\s+covered\b",
    r"\bno\s+coverage\b",
    r"\bdoes\s+not\s+cover\b",
    r"\bwe\s+do\s+not\s+cover\b",
    r"\bexcluded\b",
    r"\bexclusions?\b",
    r"\boutside\s+scope\b",
];

const COVERAGE_PATTERNS: &[&str] = &[
    r"\bis\s+covered\b",
    r"\bare\s+covered\b",
    r"\bwe\s+cover\b",
    r"\b(includes?|provides?)\s+coverage\b",
    r"\bcovers\b",
];

/// Which branch of the engine produced an assessment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    /// Nothing was retrieved
    NoContext,
    /// Exclusion wording only
    HeuristicExcluded,
    /// Coverage wording only
    HeuristicCovered,
    /// Decided by the model
    ModelAdjudication,
}

/// Boolean coverage outcome with its rationale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageAssessment {
    /// Whether the issue is covered
    pub covered: bool,

    /// One-sentence rationale
    pub reason: String,

    /// Passages the assessment was made from
    pub citations: Vec<Citation>,

    /// Branch taken
    #[serde(skip, default = "default_path")]
    pub path: DecisionPath,
}

fn default_path() -> DecisionPath {
    DecisionPath::ModelAdjudication
}

impl CoverageAssessment {
    fn new(covered: bool, reason: impl Into<String>, citations: Vec<Citation>, path: DecisionPath) -> Self {
        Self {
            covered,
            reason: reason.into(),
            citations,
            path,
        }
    }

    /// Map onto the claim decision labels
    ///
    /// No context is ambiguous; otherwise covered or denied.
    pub fn to_verdict(&self) -> CoverageVerdict {
        let decision = match (self.path, self.covered) {
            (DecisionPath::NoContext, _) => Decision::Ambiguous,
            (_, true) => Decision::Covered,
            (_, false) => Decision::Denied,
        };
        CoverageVerdict::new(decision, self.reason.clone(), self.citations.clone())
    }
}

/// Case-insensitive keyword matcher for exclusion and coverage wording
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    exclusion: RegexSet,
    coverage: RegexSet,
}

impl KeywordClassifier {
    /// Compile the pattern sets
    pub fn new() -> Result<Self, AssistantError> {
        Ok(Self {
            exclusion: compile(EXCLUSION_PATTERNS)?,
            coverage: compile(COVERAGE_PATTERNS)?,
        })
    }

    /// True when any exclusion pattern matches
    pub fn mentions_exclusion(&self, text: &str) -> bool {
        self.exclusion.is_match(text)
    }

    /// True when any coverage pattern matches
    pub fn mentions_coverage(&self, text: &str) -> bool {
        self.coverage.is_match(text)
    }
}

fn compile(patterns: &[&str]) -> Result<RegexSet, AssistantError> {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .build()
        .map_err(|e| AssistantError::Config(format!("Invalid keyword pattern: {}", e)))
}

/// Retrieves policy text for an issue and decides coverage
#[derive(Clone)]
pub struct DecisionEngine {
    retriever: Retriever,
    llm: Arc<dyn GenerationClient>,
    classifier: KeywordClassifier,
    temperature: f32,
}

impl DecisionEngine {
    /// Create a new decision engine
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn GenerationClient>,
        temperature: f32,
    ) -> Result<Self, AssistantError> {
        Ok(Self {
            retriever,
            llm,
            classifier: KeywordClassifier::new()?,
            temperature,
        })
    }

    /// Retrieve chunks for `issue` under `routing` and assess them
    pub async fn evaluate(
        &self,
        issue: &str,
        routing: &PlanRouting,
        policy_source: Option<&str>,
    ) -> Result<CoverageAssessment, AssistantError> {
        let chunks = self.retriever.retrieve(issue, routing, policy_source).await?;
        self.assess(issue, &chunks).await
    }

    /// Assess already retrieved chunks
    ///
    /// Citations always come from `chunks`, whichever branch decides.
    pub async fn assess(&self, issue: &str, chunks: &[PolicyChunk]) -> Result<CoverageAssessment, AssistantError> {
        if chunks.is_empty() {
            debug!("No context for issue; skipping adjudication");
            return Ok(CoverageAssessment::new(false, NO_CONTEXT_REASON, Vec::new(), DecisionPath::NoContext));
        }

        let citations = cite_all(chunks);
        let text = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n");
        let excluded = self.classifier.mentions_exclusion(&text);
        let covered = self.classifier.mentions_coverage(&text);

        let assessment = match (excluded, covered) {
            (true, false) => CoverageAssessment::new(false, EXCLUDED_REASON, citations, DecisionPath::HeuristicExcluded),
            (false, true) => CoverageAssessment::new(true, COVERED_REASON, citations, DecisionPath::HeuristicCovered),
            _ => {
                let adjudication = self.adjudicate(issue, chunks).await?;
                CoverageAssessment::new(
                    adjudication.covered,
                    adjudication.reason,
                    citations,
                    DecisionPath::ModelAdjudication,
                )
            }
        };

        info!("Coverage decided via {:?}: covered={}", assessment.path, assessment.covered);
        Ok(assessment)
    }

    async fn adjudicate(
        &self,
        issue: &str,
        chunks: &[PolicyChunk],
    ) -> Result<Adjudication, AssistantError> {
        let messages = adjudication_messages(issue, &format_context(chunks));
        let reply = self.llm.generate(&messages, self.temperature).await?;
        debug!("Adjudication reply length: {} chars", reply.len());
        Ok(parse_adjudication(&reply))
    }
}
