//! Chunk metadata values and the conjunctive filter evaluated against them
//!
//! Metadata values are typed: an integer `2025` and a float `2025.0` are
//! different values, exactly as they are in a store that persisted one or the
//! other. Filters that must match either representation use
//! [`FilterClause::In`] with both.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single metadata value attached to a stored chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Integer value (e.g. an effective year stored as an int)
    Int(i64),
    /// Floating-point value (e.g. an effective year stored as a float)
    Float(f64),
    /// Text value
    Str(String),
    /// Boolean value
    Bool(bool),
}

impl MetadataValue {
    /// Borrow the string content, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Lenient integer view: floats truncate, numeric strings parse,
    /// everything else is `None`
    pub fn as_lenient_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(i) => Some(*i),
            MetadataValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            MetadataValue::Str(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64),
            _ => None,
        }
    }

    /// Convert to a JSON value (wire form used by hosted stores)
    pub fn to_json(&self) -> Value {
        match self {
            MetadataValue::Int(i) => json!(i),
            MetadataValue::Float(f) => json!(f),
            MetadataValue::Str(s) => json!(s),
            MetadataValue::Bool(b) => json!(b),
        }
    }

    /// Convert from a JSON value; arrays, objects and null are not metadata
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(MetadataValue::Bool(*b)),
            Value::String(s) => Some(MetadataValue::Str(s.clone())),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(MetadataValue::Int(i))
                } else {
                    n.as_f64().map(MetadataValue::Float)
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Int(i) => write!(f, "{}", i),
            MetadataValue::Float(v) => write!(f, "{}", v),
            MetadataValue::Str(s) => write!(f, "{}", s),
            MetadataValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::Str(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::Str(s)
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Int(i)
    }
}

impl From<f64> for MetadataValue {
    fn from(f: f64) -> Self {
        MetadataValue::Float(f)
    }
}

/// Metadata map stored alongside each vector
pub type Metadata = BTreeMap<String, MetadataValue>;

/// One clause of a conjunctive filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Field must equal the value
    Eq(String, MetadataValue),
    /// Field must equal one of the values
    In(String, Vec<MetadataValue>),
}

impl FilterClause {
    /// Field name this clause constrains
    pub fn field(&self) -> &str {
        match self {
            FilterClause::Eq(field, _) | FilterClause::In(field, _) => field,
        }
    }

    /// Evaluate the clause against a metadata map; a missing field never matches
    pub fn matches(&self, metadata: &Metadata) -> bool {
        let Some(actual) = metadata.get(self.field()) else {
            return false;
        };
        match self {
            FilterClause::Eq(_, expected) => actual == expected,
            FilterClause::In(_, options) => options.iter().any(|o| o == actual),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FilterClause::Eq(field, value) => json!({ field: { "$eq": value.to_json() } }),
            FilterClause::In(field, values) => {
                let values: Vec<Value> = values.iter().map(MetadataValue::to_json).collect();
                json!({ field: { "$in": values } })
            }
        }
    }
}

/// Conjunction of clauses; the empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    clauses: Vec<FilterClause>,
}

impl MetadataFilter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality clause
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.clauses.push(FilterClause::Eq(field.into(), value.into()));
        self
    }

    /// Add a membership clause
    pub fn one_of(mut self, field: impl Into<String>, values: Vec<MetadataValue>) -> Self {
        self.clauses.push(FilterClause::In(field.into(), values));
        self
    }

    /// The clauses in insertion order
    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    /// True when every clause matches
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.clauses.iter().all(|c| c.matches(metadata))
    }

    /// Render as a `{"$and": [...]}` JSON predicate
    pub fn to_json(&self) -> Value {
        let clauses: Vec<Value> = self.clauses.iter().map(FilterClause::to_json).collect();
        json!({ "$and": clauses })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, MetadataValue)]) -> Metadata {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_eq_clause_requires_field() {
        let filter = MetadataFilter::new().eq("plan", "Gold");
        assert!(filter.matches(&meta(&[("plan", "Gold".into())])));
        assert!(!filter.matches(&meta(&[("plan", "Silver".into())])));
        assert!(!filter.matches(&Metadata::new()));
    }

    #[test]
    fn test_int_and_float_are_distinct_values() {
        let filter = MetadataFilter::new().eq("effective_year", 2025i64);
        assert!(!filter.matches(&meta(&[("effective_year", MetadataValue::Float(2025.0))])));
    }

    #[test]
    fn test_membership_matches_either_representation() {
        let filter = MetadataFilter::new().one_of(
            "effective_year",
            vec![MetadataValue::Int(2025), MetadataValue::Float(2025.0)],
        );
        assert!(filter.matches(&meta(&[("effective_year", MetadataValue::Int(2025))])));
        assert!(filter.matches(&meta(&[("effective_year", MetadataValue::Float(2025.0))])));
        assert!(!filter.matches(&meta(&[("effective_year", MetadataValue::Int(2024))])));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(MetadataFilter::new().matches(&Metadata::new()));
    }

    #[test]
    fn test_to_json_wire_form() {
        let filter = MetadataFilter::new()
            .eq("plan", "Gold")
            .one_of("effective_year", vec![MetadataValue::Int(2025), MetadataValue::Float(2025.0)]);
        let value = filter.to_json();
        assert_eq!(value["$and"][0]["plan"]["$eq"], "Gold");
        assert_eq!(value["$and"][1]["effective_year"]["$in"][0], 2025);
        assert!(value["$and"][1]["effective_year"]["$in"][1].is_f64());
    }

    #[test]
    fn test_lenient_i64() {
        assert_eq!(MetadataValue::Float(3.9).as_lenient_i64(), Some(3));
        assert_eq!(MetadataValue::Str("7".into()).as_lenient_i64(), Some(7));
        assert_eq!(MetadataValue::Str("seven".into()).as_lenient_i64(), None);
        assert_eq!(MetadataValue::Bool(true).as_lenient_i64(), None);
    }

    #[test]
    fn test_from_json_keeps_number_kind() {
        assert_eq!(MetadataValue::from_json(&json!(2025)), Some(MetadataValue::Int(2025)));
        assert_eq!(MetadataValue::from_json(&json!(2025.0)), Some(MetadataValue::Float(2025.0)));
        assert_eq!(MetadataValue::from_json(&json!(null)), None);
    }
}
