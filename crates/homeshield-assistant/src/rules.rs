//! Deterministic rule overlay applied after adjudication
//!
//! Rules can only tighten a verdict. They never turn a denial into
//! coverage.

use crate::config::RulesConfig;
use chrono::{Local, NaiveDate};
use homeshield_domain::{CoverageVerdict, Decision};
use tracing::{debug, info};

/// Denies claims filed too soon after the policy's effective date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingPeriodRule {
    days: i64,
}

impl WaitingPeriodRule {
    /// Create a rule with the given waiting period in days
    pub fn new(days: i64) -> Self {
        Self { days }
    }

    /// Create a rule from configuration
    pub fn from_config(config: &RulesConfig) -> Self {
        Self::new(config.waiting_period_days)
    }

    /// Reason appended when the rule fires
    pub fn reason(&self) -> String {
        format!("Waiting period (<{} days from effective date).", self.days)
    }

    /// Apply the rule as of `today`
    ///
    /// The effective date is January 1 of the year in the first four
    /// characters of `effective_date`. Anything unparseable leaves the
    /// verdict as it was.
    pub fn apply(&self, mut verdict: CoverageVerdict, effective_date: Option<&str>, today: NaiveDate) -> CoverageVerdict {
        let Some(effective) = effective_date.and_then(policy_start) else {
            debug!("No usable effective date; waiting period not applied");
            return verdict;
        };

        if (today - effective).num_days() < self.days {
            info!("Claim falls inside the waiting period starting {}", effective);
            verdict.decision = Decision::Denied;
            verdict.reasons.push(self.reason());
        }
        verdict
    }

    /// Apply the rule as of the local date
    pub fn apply_today(&self, verdict: CoverageVerdict, effective_date: Option<&str>) -> CoverageVerdict {
        self.apply(verdict, effective_date, Local::now().date_naive())
    }
}

impl Default for WaitingPeriodRule {
    fn default() -> Self {
        Self::from_config(&RulesConfig::default())
    }
}

fn policy_start(date: &str) -> Option<NaiveDate> {
    let year: i32 = date.trim().get(..4)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeshield_domain::Citation;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn covered() -> CoverageVerdict {
        CoverageVerdict::new(
            Decision::Covered,
            "Policy clauses indicate this issue is covered.",
            vec![Citation {
                source: "LHG_Gold_TX_2025.txt".into(),
                page: 1,
                quote: "AC units are covered.".into(),
            }],
        )
    }

    #[test]
    fn test_inside_waiting_period_denies_and_appends() {
        let rule = WaitingPeriodRule::default();
        let verdict = rule.apply(covered(), Some("2025-01-01"), date(2025, 1, 10));
        assert_eq!(verdict.decision, Decision::Denied);
        assert_eq!(
            verdict.reasons,
            vec![
                "Policy clauses indicate this issue is covered.".to_string(),
                "Waiting period (<30 days from effective date).".to_string(),
            ]
        );
        assert_eq!(verdict.citations.len(), 1);
    }

    #[test]
    fn test_after_waiting_period_unchanged() {
        let rule = WaitingPeriodRule::default();
        assert_eq!(rule.apply(covered(), Some("2025-01-01"), date(2025, 6, 1)), covered());
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let rule = WaitingPeriodRule::new(30);
        assert_eq!(rule.apply(covered(), Some("2025"), date(2025, 1, 31)), covered());
        let verdict = rule.apply(covered(), Some("2025"), date(2025, 1, 30));
        assert_eq!(verdict.decision, Decision::Denied);
    }

    #[test]
    fn test_only_year_prefix_counts() {
        let rule = WaitingPeriodRule::default();
        let verdict = rule.apply(covered(), Some("2025-11-20"), date(2025, 3, 1));
        assert_eq!(verdict.decision, Decision::Covered);
    }

    #[test]
    fn test_unparseable_dates_fail_open() {
        let rule = WaitingPeriodRule::default();
        let today = date(2025, 1, 2);
        assert_eq!(rule.apply(covered(), Some("01/01/2025"), today), covered());
        assert_eq!(rule.apply(covered(), Some(""), today), covered());
        assert_eq!(rule.apply(covered(), None, today), covered());
    }

    #[test]
    fn test_denial_stays_denied() {
        let rule = WaitingPeriodRule::default();
        let denied = CoverageVerdict::new(Decision::Denied, "Excluded.", vec![]);
        let verdict = rule.apply(denied, Some("2025-01-01"), date(2025, 1, 5));
        assert_eq!(verdict.decision, Decision::Denied);
        assert_eq!(verdict.reasons.len(), 2);
    }
}
