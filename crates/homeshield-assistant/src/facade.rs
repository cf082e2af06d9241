//! Claim and question-answering entry points
//!
//! [`Assistant`] resolves the customer, derives the plan routing, and runs
//! extraction, the decision engine and the rule overlay in order. Bad input
//! comes back as [`Outcome::Rejected`]; only collaborator failures are
//! errors.

use crate::config::AssistantConfig;
use crate::context::format_context;
use crate::decision::{CoverageAssessment, DecisionEngine};
use crate::error::AssistantError;
use crate::extractor::StructuredExtractor;
use crate::ingest::{Ingestor, ReindexReport};
use crate::parser::parse_answer;
use crate::prompt::qa_messages;
use crate::retriever::Retriever;
use crate::rules::WaitingPeriodRule;
use crate::upgrades::{PlanSuggestion, UpgradeAdvisor, DEFAULT_SUGGESTION_LIMIT};
use chrono::{Local, NaiveDate};
use homeshield_domain::citation::cite_all;
use homeshield_domain::traits::{CustomerLookup, EmbeddingClient, GenerationClient, VectorIndex};
use homeshield_domain::{Citation, Claim, ClaimId, Customer, PlanRouting};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Answer when retrieval finds nothing for a question
pub const NO_POLICY_TEXT_ANSWER: &str = "No relevant policy text found.";

/// Rejection when neither a customer nor a full routing key is given
pub const MISSING_ROUTING_ERROR: &str = "Provide plan/state/year or customer_id.";

/// Result of an operation that may reject bad input
///
/// Serializes as the bare payload, or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    /// The operation ran
    Completed(T),
    /// The input could not be served
    Rejected {
        /// Human-readable reason
        error: String,
    },
}

impl<T> Outcome<T> {
    fn rejected(error: impl Into<String>) -> Self {
        Outcome::Rejected { error: error.into() }
    }

    /// The completed payload, if any
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Rejected { .. } => None,
        }
    }

    /// The rejection message, if any
    pub fn rejection(&self) -> Option<&str> {
        match self {
            Outcome::Completed(_) => None,
            Outcome::Rejected { error } => Some(error.as_str()),
        }
    }
}

/// Question about coverage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaRequest {
    /// Free-text question
    pub question: String,
    /// Plan name
    #[serde(default)]
    pub plan: Option<String>,
    /// State code
    #[serde(default)]
    pub state: Option<String>,
    /// Effective year
    #[serde(default)]
    pub year: Option<i64>,
    /// Customer whose plan overrides the fields above
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Answer with supporting passages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaAnswer {
    /// Answer text
    pub answer: String,
    /// Supporting passages
    pub citations: Vec<Citation>,
}

/// Claim submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    /// Submitting customer
    pub customer_id: String,
    /// Free-text description of the problem
    pub message: String,
}

/// Direct coverage check for an issue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageRequest {
    /// Described issue
    pub issue: String,
    /// Customer whose plan overrides the fields below
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Plan name
    #[serde(default)]
    pub plan: Option<String>,
    /// State code
    #[serde(default)]
    pub state: Option<String>,
    /// Effective year
    #[serde(default)]
    pub year: Option<i64>,
}

/// Request for alternative plans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeRequest {
    /// Described issue
    pub issue: String,
    /// Customer whose plan overrides the fields below
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Current plan
    #[serde(default)]
    pub plan: Option<String>,
    /// State code
    #[serde(default)]
    pub state: Option<String>,
    /// Effective year
    #[serde(default)]
    pub year: Option<i64>,
    /// Maximum suggestions (default 3)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Alternative plans for an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeReport {
    /// Plan the suggestions are alternatives to
    pub current_plan: String,
    /// Suggested plans, best tier first
    pub suggestions: Vec<PlanSuggestion>,
}

/// Hosted services the assistant delegates to
#[derive(Clone)]
pub struct Collaborators {
    /// Text generation
    pub generation: Arc<dyn GenerationClient>,
    /// Text embedding, used for ingestion
    pub embedding: Arc<dyn EmbeddingClient>,
    /// Vector index holding the policy chunks
    pub index: Arc<dyn VectorIndex>,
    /// Customer table
    pub customers: Arc<dyn CustomerLookup>,
}

enum Routed {
    Found(PlanRouting, Option<Customer>),
    Rejected(String),
}

/// The HomeShield coverage assistant
pub struct Assistant {
    llm: Arc<dyn GenerationClient>,
    customers: Arc<dyn CustomerLookup>,
    retriever: Retriever,
    extractor: StructuredExtractor,
    engine: DecisionEngine,
    advisor: UpgradeAdvisor,
    ingestor: Ingestor,
    waiting_period: WaitingPeriodRule,
    config: AssistantConfig,
    policy_dir: PathBuf,
}

impl Assistant {
    /// Wire the pipeline together
    ///
    /// `policy_dir` holds the policy documents used for re-ingestion and
    /// plan discovery.
    pub fn new(
        collaborators: Collaborators,
        config: AssistantConfig,
        policy_dir: impl Into<PathBuf>,
    ) -> Result<Self, AssistantError> {
        config.validate().map_err(AssistantError::Config)?;
        let policy_dir = policy_dir.into();

        let retriever = Retriever::new(collaborators.index.clone(), config.retrieval.clone());
        let engine = DecisionEngine::new(retriever.clone(), collaborators.generation.clone(), config.temperature)?;
        let advisor = UpgradeAdvisor::new(engine.clone(), policy_dir.clone(), config.ingestion.filename_prefix.clone());
        let ingestor = Ingestor::new(
            collaborators.index.clone(),
            collaborators.embedding.clone(),
            &config.chunking,
            config.ingestion.clone(),
        );

        Ok(Self {
            extractor: StructuredExtractor::new(collaborators.generation.clone(), config.temperature),
            waiting_period: WaitingPeriodRule::from_config(&config.rules),
            llm: collaborators.generation,
            customers: collaborators.customers,
            retriever,
            engine,
            advisor,
            ingestor,
            config,
            policy_dir,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Vector index namespace queried and rebuilt
    pub fn namespace(&self) -> &str {
        self.ingestor.namespace()
    }

    /// Directory holding the policy documents
    pub fn policy_dir(&self) -> &Path {
        &self.policy_dir
    }

    /// Answer a coverage question from policy text
    pub async fn ask(&self, request: &QaRequest) -> Result<Outcome<QaAnswer>, AssistantError> {
        let routing = match self
            .resolve(
                request.customer_id.as_deref(),
                request.plan.as_deref(),
                request.state.as_deref(),
                request.year,
            )
            .await?
        {
            Routed::Found(routing, _) => routing,
            Routed::Rejected(error) => return Ok(Outcome::rejected(error)),
        };

        let chunks = self.retriever.retrieve(&request.question, &routing, None).await?;
        if chunks.is_empty() {
            info!("No policy text for question under {}/{}", routing.plan, routing.state);
            return Ok(Outcome::Completed(QaAnswer {
                answer: NO_POLICY_TEXT_ANSWER.to_string(),
                citations: Vec::new(),
            }));
        }

        let messages = qa_messages(&request.question, &format_context(&chunks));
        let reply = self.llm.generate(&messages, self.config.temperature).await?;

        let answer = match parse_answer(&reply) {
            Some((answer, citations)) => QaAnswer { answer, citations },
            None => {
                debug!("Answer reply is not JSON; returning raw text");
                QaAnswer {
                    answer: reply.trim().to_string(),
                    citations: cite_all(&chunks),
                }
            }
        };
        Ok(Outcome::Completed(answer))
    }

    /// Extract, adjudicate and finalise a claim as of the local date
    pub async fn submit_claim(&self, request: &ClaimRequest) -> Result<Outcome<Claim>, AssistantError> {
        self.submit_claim_on(request, Local::now().date_naive()).await
    }

    /// Extract, adjudicate and finalise a claim as of `today`
    pub async fn submit_claim_on(
        &self,
        request: &ClaimRequest,
        today: NaiveDate,
    ) -> Result<Outcome<Claim>, AssistantError> {
        let (routing, customer) = match self.resolve(Some(&request.customer_id), None, None, None).await? {
            Routed::Found(routing, Some(customer)) => (routing, customer),
            Routed::Found(_, None) => return Ok(Outcome::rejected(MISSING_ROUTING_ERROR)),
            Routed::Rejected(error) => return Ok(Outcome::rejected(error)),
        };

        let extraction = self.extractor.extract(&request.message).await?;
        let query = extraction.retrieval_query();

        let policy_source = if self.config.retrieval.scope_to_policy_file {
            customer.policy_file.as_deref()
        } else {
            None
        };
        let assessment = self.engine.evaluate(&query, &routing, policy_source).await?;

        let verdict = self.waiting_period.apply(
            assessment.to_verdict(),
            customer.waiting_period_date().as_deref(),
            today,
        );

        let claim = Claim {
            claim_id: ClaimId::new(),
            extraction,
            decision: verdict.decision,
            reasons: verdict.reasons,
            citations: verdict.citations,
        };
        info!("Claim {} for {}: {}", claim.claim_id, customer.id, claim.decision);
        Ok(Outcome::Completed(claim))
    }

    /// Decide coverage for an issue without extraction or rule overlay
    pub async fn evaluate_issue(&self, request: &CoverageRequest) -> Result<Outcome<CoverageAssessment>, AssistantError> {
        let routing = match self
            .resolve(
                request.customer_id.as_deref(),
                request.plan.as_deref(),
                request.state.as_deref(),
                request.year,
            )
            .await?
        {
            Routed::Found(routing, _) => routing,
            Routed::Rejected(error) => return Ok(Outcome::rejected(error)),
        };

        let assessment = self.engine.evaluate(&request.issue, &routing, None).await?;
        Ok(Outcome::Completed(assessment))
    }

    /// Suggest other plans in the same state and year that cover an issue
    pub async fn suggest_upgrades(&self, request: &UpgradeRequest) -> Result<Outcome<UpgradeReport>, AssistantError> {
        let routing = match self
            .resolve(
                request.customer_id.as_deref(),
                request.plan.as_deref(),
                request.state.as_deref(),
                request.year,
            )
            .await?
        {
            Routed::Found(routing, _) => routing,
            Routed::Rejected(error) => return Ok(Outcome::rejected(error)),
        };

        let limit = request.limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);
        let suggestions = self.advisor.suggest(&request.issue, &routing, limit).await?;
        Ok(Outcome::Completed(UpgradeReport {
            current_plan: routing.plan,
            suggestions,
        }))
    }

    /// Clear the namespace and re-ingest every policy document
    pub async fn reindex(&self) -> Result<ReindexReport, AssistantError> {
        info!("Reindexing {}", self.policy_dir.display());
        self.ingestor.reindex(&self.policy_dir).await
    }

    /// A customer id, when given, overrides the explicit routing fields
    async fn resolve(
        &self,
        customer_id: Option<&str>,
        plan: Option<&str>,
        state: Option<&str>,
        year: Option<i64>,
    ) -> Result<Routed, AssistantError> {
        if let Some(id) = customer_id.map(str::trim).filter(|id| !id.is_empty()) {
            let Some(customer) = self.customers.get_customer(id).await? else {
                return Ok(Routed::Rejected(format!("customer_id {} not found", id)));
            };
            return Ok(match customer.routing() {
                Some(routing) => Routed::Found(routing, Some(customer)),
                None => Routed::Rejected(MISSING_ROUTING_ERROR.to_string()),
            });
        }

        let routing = match (plan, state, year) {
            (Some(plan), Some(state), Some(year)) => PlanRouting::new(plan, state, year),
            _ => None,
        };
        Ok(match routing {
            Some(routing) => Routed::Found(routing, None),
            None => Routed::Rejected(MISSING_ROUTING_ERROR.to_string()),
        })
    }
}
