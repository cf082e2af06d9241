//! Alternative plan suggestions
//!
//! Runs the decision engine against every other plan offered in the same
//! state and year, preferring plans that cover the issue.

use crate::decision::DecisionEngine;
use crate::error::AssistantError;
use crate::ingest::{parse_policy_filename, policy_files};
use homeshield_domain::{Citation, PlanRouting};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Plans tried when no policy file for the state and year can be found
pub const FALLBACK_PLANS: [&str; 5] = ["Bronze", "Silver", "Gold", "Platinum", "Diamond"];

/// Suggestions returned when the caller does not ask for a number
pub const DEFAULT_SUGGESTION_LIMIT: usize = 3;

const UNKNOWN_RANK: u32 = 100;

/// Tier of a plan; unknown plans sort last
pub fn plan_rank(plan: &str) -> u32 {
    match plan {
        "Bronze" => 1,
        "Silver" => 2,
        "Gold" => 3,
        "Platinum" => 4,
        "Diamond" => 5,
        "Premium" => 6,
        _ => UNKNOWN_RANK,
    }
}

/// Plans with a policy document for `state`/`year`, excluding `exclude`
///
/// Names are title-cased and ordered by tier. Falls back to
/// [`FALLBACK_PLANS`] when the directory is unreadable or has no match.
pub fn discover_plans(dir: &Path, prefix: &str, state: &str, year: i64, exclude: Option<&str>) -> Vec<String> {
    let state = state.trim().to_uppercase();
    let excluded = |plan: &str| exclude.is_some_and(|e| e.trim().eq_ignore_ascii_case(plan));

    let files = match policy_files(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("Plan discovery failed: {}", e);
            Vec::new()
        }
    };

    let found: BTreeSet<String> = files
        .iter()
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()))
        .filter_map(|name| parse_policy_filename(name, prefix))
        .filter(|routing| routing.state == state && routing.effective_year == year)
        .map(|routing| routing.plan)
        .filter(|plan| !excluded(plan.as_str()))
        .collect();

    let mut plans: Vec<String> = if found.is_empty() {
        debug!("No policy files for {}/{}; using fallback plans", state, year);
        FALLBACK_PLANS
            .iter()
            .filter(|plan| !excluded(**plan))
            .map(|plan| plan.to_string())
            .collect()
    } else {
        found.into_iter().collect()
    };

    plans.sort_by_key(|plan| plan_rank(plan));
    plans
}

/// Coverage of an issue under one alternative plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSuggestion {
    /// Plan name
    pub plan: String,
    /// Whether the plan covers the issue
    pub covered: bool,
    /// Rationale
    pub reason: String,
    /// Passages the decision was made from
    pub citations: Vec<Citation>,
}

/// Covering plans by tier, or the top not-covered plans when none cover
pub fn select_suggestions(mut candidates: Vec<PlanSuggestion>, limit: usize) -> Vec<PlanSuggestion> {
    if candidates.iter().any(|c| c.covered) {
        candidates.retain(|c| c.covered);
    }
    candidates.sort_by_key(|c| plan_rank(&c.plan));
    candidates.truncate(limit);
    candidates
}

/// Finds better plans for an issue
#[derive(Clone)]
pub struct UpgradeAdvisor {
    engine: DecisionEngine,
    policy_dir: PathBuf,
    prefix: String,
}

impl UpgradeAdvisor {
    /// Create a new advisor over the documents in `policy_dir`
    pub fn new(engine: DecisionEngine, policy_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            engine,
            policy_dir: policy_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Evaluate `issue` under every other plan for the same state and year
    ///
    /// Plans without any retrieved policy text are skipped.
    pub async fn suggest(
        &self,
        issue: &str,
        current: &PlanRouting,
        limit: usize,
    ) -> Result<Vec<PlanSuggestion>, AssistantError> {
        let plans = discover_plans(
            &self.policy_dir,
            &self.prefix,
            &current.state,
            current.effective_year,
            Some(&current.plan),
        );

        let mut candidates = Vec::new();
        for plan in plans {
            let Some(routing) = PlanRouting::new(&plan, &current.state, current.effective_year) else {
                continue;
            };
            let assessment = self.engine.evaluate(issue, &routing, None).await?;
            if assessment.citations.is_empty() {
                debug!("No policy text for plan {}; skipped", routing.plan);
                continue;
            }
            candidates.push(PlanSuggestion {
                plan: routing.plan,
                covered: assessment.covered,
                reason: assessment.reason,
                citations: assessment.citations,
            });
        }

        Ok(select_suggestions(candidates, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(plan: &str, covered: bool) -> PlanSuggestion {
        PlanSuggestion {
            plan: plan.to_string(),
            covered,
            reason: String::new(),
            citations: Vec::new(),
        }
    }

    fn plans(suggestions: &[PlanSuggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.plan.as_str()).collect()
    }

    #[test]
    fn test_plan_rank() {
        assert!(plan_rank("Bronze") < plan_rank("Gold"));
        assert!(plan_rank("Diamond") < plan_rank("Premium"));
        assert_eq!(plan_rank("Titanium"), UNKNOWN_RANK);
    }

    #[test]
    fn test_discover_plans_from_filenames() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "LHG_Platinum_TX_2025.txt",
            "LHG_gold_TX_2025.txt",
            "LHG_Silver_TX_2025.txt",
            "LHG_Zinc_TX_2025.txt",
            "LHG_Diamond_FL_2025.txt",
            "LHG_Diamond_TX_2024.txt",
        ] {
            std::fs::write(dir.path().join(name), "text").unwrap();
        }

        let found = discover_plans(dir.path(), "LHG", "tx", 2025, Some("silver"));
        assert_eq!(found, vec!["Gold", "Platinum", "Zinc"]);
    }

    #[test]
    fn test_discover_plans_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let found = discover_plans(dir.path(), "LHG", "TX", 2025, Some("Gold"));
        assert_eq!(found, vec!["Bronze", "Silver", "Platinum", "Diamond"]);

        let missing = discover_plans(&dir.path().join("absent"), "LHG", "TX", 2025, None);
        assert_eq!(missing.len(), FALLBACK_PLANS.len());
    }

    #[test]
    fn test_select_prefers_covering_plans() {
        let selected = select_suggestions(
            vec![
                suggestion("Diamond", true),
                suggestion("Silver", false),
                suggestion("Platinum", true),
            ],
            3,
        );
        assert_eq!(plans(&selected), vec!["Platinum", "Diamond"]);
    }

    #[test]
    fn test_select_falls_back_to_not_covered() {
        let selected = select_suggestions(
            vec![
                suggestion("Diamond", false),
                suggestion("Bronze", false),
                suggestion("Platinum", false),
                suggestion("Silver", false),
            ],
            2,
        );
        assert_eq!(plans(&selected), vec!["Bronze", "Silver"]);
    }

    #[test]
    fn test_select_empty() {
        assert!(select_suggestions(Vec::new(), 3).is_empty());
    }
}
