//! Claim module - extracted claim fields and the assembled claim record

use crate::citation::Citation;
use crate::verdict::Decision;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque claim identifier rendered as `CLM-` plus 8 lowercase hex digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(String);

impl ClaimId {
    /// Generate a fresh identifier from a random UUID
    ///
    /// # Examples
    ///
    /// ```
    /// use homeshield_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(id.as_str().starts_with("CLM-"));
    /// assert_eq!(id.as_str().len(), 12);
    /// ```
    pub fn new() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("CLM-{}", &hex[..8]))
    }

    /// Borrow the rendered identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claim fields pulled out of a free-text customer message
///
/// Always exactly these three keys; a field the model omitted is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedClaimFields {
    /// Appliance or system involved (e.g. "AC")
    pub appliance: Option<String>,

    /// Described failure (e.g. "stopped cooling")
    pub issue: Option<String>,

    /// Failure date as given by the customer
    pub failure_date: Option<String>,
}

impl ExtractedClaimFields {
    /// Retrieval query built from appliance and issue, `"coverage"` when both are empty
    pub fn retrieval_query(&self) -> String {
        let joined = [self.appliance.as_deref(), self.issue.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            "coverage".to_string()
        } else {
            joined
        }
    }
}

/// A finalised claim submission
///
/// Assembled once, after the waiting-period rule; not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Generated identifier
    pub claim_id: ClaimId,

    /// Fields extracted from the customer's message
    pub extraction: ExtractedClaimFields,

    /// Final decision label
    pub decision: Decision,

    /// Reasons for the decision, in the order they were added
    pub reasons: Vec<String>,

    /// Policy passages the decision relied on
    pub citations: Vec<Citation>,
}
