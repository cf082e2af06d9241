//! Coverage decisions

use crate::citation::Citation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decision label attached to a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// The issue is covered
    Covered,
    /// The issue is partly covered (limits, fees, partial exclusions)
    Partial,
    /// The issue is not covered
    Denied,
    /// Policy text did not settle the question
    Ambiguous,
}

impl Decision {
    /// Lowercase label as used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Covered => "covered",
            Decision::Partial => "partial",
            Decision::Denied => "denied",
            Decision::Ambiguous => "ambiguous",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "covered" => Ok(Decision::Covered),
            "partial" => Ok(Decision::Partial),
            "denied" => Ok(Decision::Denied),
            "ambiguous" => Ok(Decision::Ambiguous),
            other => Err(format!("Unknown decision: {}", other)),
        }
    }
}

/// Decision with its reasons and citations
///
/// `reasons` and `citations` are always lists, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageVerdict {
    /// Decision label
    pub decision: Decision,

    /// Reasons, in the order they were added
    #[serde(default)]
    pub reasons: Vec<String>,

    /// Supporting policy passages
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl CoverageVerdict {
    /// Create a verdict with a single reason
    pub fn new(decision: Decision, reason: impl Into<String>, citations: Vec<Citation>) -> Self {
        let reason = reason.into();
        let reasons = if reason.trim().is_empty() { Vec::new() } else { vec![reason] };
        Self { decision, reasons, citations }
    }

    /// Boolean view: only `covered` counts as covered
    pub fn is_covered(&self) -> bool {
        self.decision == Decision::Covered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_parse_and_display() {
        for label in ["covered", "partial", "denied", "ambiguous"] {
            let decision: Decision = label.parse().unwrap();
            assert_eq!(decision.to_string(), label);
        }
        assert_eq!(" Covered ".parse::<Decision>().unwrap(), Decision::Covered);
        assert!("maybe".parse::<Decision>().is_err());
    }

    #[test]
    fn test_verdict_serializes_lists() {
        let verdict = CoverageVerdict::new(Decision::Ambiguous, "", Vec::new());
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["decision"], "ambiguous");
        assert!(json["reasons"].as_array().unwrap().is_empty());
        assert!(json["citations"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_is_covered() {
        assert!(CoverageVerdict::new(Decision::Covered, "ok", vec![]).is_covered());
        assert!(!CoverageVerdict::new(Decision::Partial, "limits", vec![]).is_covered());
    }
}
