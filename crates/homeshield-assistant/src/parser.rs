//! Parse model output into typed results
//!
//! Models sometimes wrap JSON in markdown code fences or surround it with
//! prose. Each parser here names its own recovery path: extraction fails
//! hard, adjudication falls back to "not covered", answers fall back to
//! the raw text.

use crate::error::AssistantError;
use homeshield_domain::chunk::{basename, UNKNOWN_SOURCE};
use homeshield_domain::{Citation, ExtractedClaimFields, MetadataValue};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Reason used when an adjudication reply cannot be read
pub const UNDETERMINED_REASON: &str = "Unable to determine from the context with high confidence.";

/// Strip a leading ```` ```json ```` or ```` ``` ```` fence and a trailing ```` ``` ````
///
/// # Examples
///
/// ```
/// use homeshield_assistant::parser::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```JSON\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("{\"a\": 1}"), "{\"a\": 1}");
/// ```
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

/// Parse JSON directly, then once more after stripping code fences
pub fn repair_json(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text.trim()).or_else(|_| serde_json::from_str(strip_code_fence(text)))
}

/// Parse the span from the first `{` to the last `}`
pub fn first_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Parse an extraction reply into exactly the three claim fields
///
/// Missing keys become `None`; numbers and booleans are stringified. A reply
/// that is not JSON even after fence stripping is an error, since there is
/// no safe default for the claim fields.
pub fn parse_extraction(text: &str) -> Result<ExtractedClaimFields, AssistantError> {
    let json = repair_json(text)
        .map_err(|e| AssistantError::MalformedOutput(format!("Extraction reply is not JSON: {}", e)))?;

    let Some(obj) = json.as_object() else {
        warn!("Extraction reply is JSON but not an object; all fields unset");
        return Ok(ExtractedClaimFields::default());
    };

    Ok(ExtractedClaimFields {
        appliance: field_as_string(obj, "appliance"),
        issue: field_as_string(obj, "issue"),
        failure_date: field_as_string(obj, "failure_date"),
    })
}

fn field_as_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Model verdict for one issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjudication {
    /// Only an explicit "yes" counts as covered
    pub covered: bool,
    /// One-sentence rationale
    pub reason: String,
}

impl Adjudication {
    fn undetermined() -> Self {
        Self {
            covered: false,
            reason: UNDETERMINED_REASON.to_string(),
        }
    }
}

/// Parse an adjudication reply `{"covered": "yes|no|uncertain", "reason": ...}`
///
/// `yes` (or JSON `true`) maps to covered; `no`, `uncertain` and anything
/// else map to not covered. Unreadable replies become [`UNDETERMINED_REASON`].
pub fn parse_adjudication(text: &str) -> Adjudication {
    let Some(json) = repair_json(text).ok().or_else(|| first_json_object(text)) else {
        warn!("Adjudication reply is not JSON; defaulting to not covered");
        return Adjudication::undetermined();
    };
    let Some(obj) = json.as_object() else {
        return Adjudication::undetermined();
    };

    let covered = match obj.get("covered") {
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "yes" | "true"),
        Some(Value::Bool(b)) => *b,
        _ => false,
    };
    let reason = obj
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(UNDETERMINED_REASON)
        .to_string();

    debug!("Adjudicated covered={}", covered);
    Adjudication { covered, reason }
}

/// Parse a question-answering reply `{"answer": ..., "citations": [...]}`
///
/// Returns `None` when the reply is not a JSON object with a string
/// `answer`. Citations that are not a list become an empty list; entries
/// are read leniently (`quote` or `text`, page coerced to an integer).
pub fn parse_answer(text: &str) -> Option<(String, Vec<Citation>)> {
    let json = repair_json(text).ok()?;
    let obj = json.as_object()?;
    let answer = obj.get("answer")?.as_str()?.to_string();

    let citations = obj
        .get("citations")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(citation_from_json).collect())
        .unwrap_or_default();

    Some((answer, citations))
}

fn citation_from_json(value: &Value) -> Option<Citation> {
    let obj = value.as_object()?;

    let source = obj
        .get("source")
        .and_then(Value::as_str)
        .map(basename)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_SOURCE)
        .to_string();
    let page = obj
        .get("page")
        .and_then(MetadataValue::from_json)
        .and_then(|v| v.as_lenient_i64())
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(0);
    let quote = obj
        .get("quote")
        .or_else(|| obj.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(Citation { source, page, quote })
}
