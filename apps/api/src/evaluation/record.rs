use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the evaluation prompt asks the model to produce, followed by the
/// snake_case spellings some models fall back to.
pub const DESCRIPTION_MATCH_KEYS: &[&str] = &["Description Match", "description_match"];
pub const MISSING_KEYWORDS_KEYS: &[&str] = &["Missing Keywords", "missing_keywords"];
pub const SUGGESTIONS_KEYS: &[&str] = &[
    "Suggestions for improvement",
    "Suggestions for Improvement",
    "suggestions",
];

/// Structured result of one model's evaluation of a résumé against a JD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Exactly what the model produced, e.g. `"82%"`. Never re-validated.
    pub description_match: Option<String>,
    pub missing_keywords: MissingKeywords,
    /// Free text, may contain markdown.
    pub suggestions: Option<String>,
}

/// Shape of the `Missing Keywords` field after field-level normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MissingKeywords {
    List(Vec<String>),
    /// Present, but not a sequence even after decoding a string value.
    Invalid(Value),
    Absent,
}

impl EvaluationRecord {
    /// Builds a record from a decoded object. `missing_keywords` must already
    /// be normalized by the caller.
    pub(crate) fn from_object(object: &Map<String, Value>, missing_keywords: MissingKeywords) -> Self {
        Self {
            description_match: lookup(object, DESCRIPTION_MATCH_KEYS).and_then(scalar_text),
            missing_keywords,
            suggestions: lookup(object, SUGGESTIONS_KEYS).and_then(scalar_text),
        }
    }
}

pub(crate) fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(*k))
}

/// Textual form of a scalar field. Strings are passed through untouched;
/// numbers and bools keep their literal spelling. `null` counts as absent.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Element of a keyword sequence. Nested structures fall back to compact JSON.
pub(crate) fn keyword_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => scalar_text(other).unwrap_or_default(),
    }
}
