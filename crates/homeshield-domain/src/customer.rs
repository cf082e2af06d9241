//! Customer records and the plan routing derived from them

use crate::chunk::title_case;
use crate::filter::{MetadataFilter, MetadataValue};
use serde::{Deserialize, Serialize};

/// A customer resolved from the external customer table
///
/// Read-only from this system's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer identifier (e.g. "C00001")
    pub id: String,

    /// Plan name as stored
    pub plan: String,

    /// State code as stored
    pub state: String,

    /// Effective year of the customer's policy, when known
    pub effective_year: Option<i64>,

    /// Raw effective date (e.g. "2025-01-01"), when the table has one
    pub effective_date: Option<String>,

    /// Policy document filename, when the table has one
    pub policy_file: Option<String>,

    /// Customer first name, when the table has one
    pub first_name: Option<String>,
}

impl Customer {
    /// Derive the (plan, state, year) routing key, or `None` if any part is missing
    pub fn routing(&self) -> Option<PlanRouting> {
        let year = self
            .effective_year
            .or_else(|| self.effective_date.as_deref().and_then(effective_year_from_date))?;
        PlanRouting::new(&self.plan, &self.state, year)
    }

    /// Date string used by the waiting-period rule
    ///
    /// Falls back to the bare year, which the rule reads as January 1.
    pub fn waiting_period_date(&self) -> Option<String> {
        self.effective_date
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.effective_year.map(|y| y.to_string()))
    }
}

/// Take the year from the first four characters of an effective date
///
/// # Examples
///
/// ```
/// use homeshield_domain::customer::effective_year_from_date;
///
/// assert_eq!(effective_year_from_date("2025-03-14"), Some(2025));
/// assert_eq!(effective_year_from_date("03/14/2025"), None);
/// ```
pub fn effective_year_from_date(date: &str) -> Option<i64> {
    let prefix = date.trim().get(..4)?;
    if !prefix.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Exact-match key selecting one policy document family
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanRouting {
    /// Title-cased plan name
    pub plan: String,

    /// Upper-cased state code
    pub state: String,

    /// Effective year
    pub effective_year: i64,
}

impl PlanRouting {
    /// Normalise and validate routing fields; blank plan or state yields `None`
    pub fn new(plan: &str, state: &str, effective_year: i64) -> Option<Self> {
        let plan = title_case(plan.trim());
        let state = state.trim().to_uppercase();
        if plan.is_empty() || state.is_empty() {
            return None;
        }
        Some(Self { plan, state, effective_year })
    }

    /// Conjunctive filter on plan, state and year
    ///
    /// The year clause matches both the integer and float representation,
    /// since a store may have persisted the year as either.
    pub fn to_filter(&self) -> MetadataFilter {
        MetadataFilter::new()
            .eq("plan", self.plan.as_str())
            .eq("state", self.state.as_str())
            .one_of(
                "effective_year",
                vec![
                    MetadataValue::Int(self.effective_year),
                    MetadataValue::Float(self.effective_year as f64),
                ],
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Customer {
        Customer {
            id: "C00001".to_string(),
            plan: "gold".to_string(),
            state: "tx".to_string(),
            effective_year: None,
            effective_date: Some("2025-01-01".to_string()),
            policy_file: Some("LHG_Gold_TX_2025.txt".to_string()),
            first_name: None,
        }
    }

    #[test]
    fn test_routing_from_effective_date() {
        let routing = customer().routing().unwrap();
        assert_eq!(routing.plan, "Gold");
        assert_eq!(routing.state, "TX");
        assert_eq!(routing.effective_year, 2025);
    }

    #[test]
    fn test_routing_prefers_stored_year() {
        let mut c = customer();
        c.effective_year = Some(2024);
        assert_eq!(c.routing().unwrap().effective_year, 2024);
    }

    #[test]
    fn test_routing_missing_fields() {
        let mut c = customer();
        c.effective_date = None;
        assert!(c.routing().is_none());

        let mut c = customer();
        c.plan = "  ".to_string();
        assert!(c.routing().is_none());
    }

    #[test]
    fn test_year_from_short_or_garbage_date() {
        assert_eq!(effective_year_from_date("20"), None);
        assert_eq!(effective_year_from_date("abcd-01-01"), None);
        assert_eq!(effective_year_from_date(" 2023"), Some(2023));
    }

    #[test]
    fn test_waiting_period_date_falls_back_to_year() {
        let mut c = customer();
        c.effective_date = None;
        c.effective_year = Some(2022);
        assert_eq!(c.waiting_period_date().as_deref(), Some("2022"));
    }

    #[test]
    fn test_filter_has_dual_year_clause() {
        let filter = PlanRouting::new("Gold", "TX", 2025).unwrap().to_filter();
        assert_eq!(filter.clauses().len(), 3);
        assert_eq!(filter.clauses()[2].field(), "effective_year");
    }
}
