//! Response Normalizer: turns raw model text into an `EvaluationRecord`.
//!
//! Pipeline: strip fences → strict JSON → lenient literal fallback →
//! field-level normalization of `Missing Keywords`.
//!
//! Never panics and never returns a partial record. Malformed model output is
//! expected, so every parse error ends up in `NormalizationFailure`.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::evaluation::literal::{parse_literal, LiteralError};
use crate::evaluation::record::{
    keyword_text, lookup, EvaluationRecord, MissingKeywords, MISSING_KEYWORDS_KEYS,
};

const FENCE: &str = "```";

/// Why a payload could not become a record.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("neither strict JSON ({json}) nor a literal ({literal})")]
    Undecodable { json: String, literal: String },

    #[error("decoded a {found}, expected an object")]
    NotAnObject { found: &'static str },
}

/// Terminal failure for one payload. Carries the text for diagnostic display.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("model output could not be normalized: {reason}")]
pub struct NormalizationFailure {
    /// Input exactly as received.
    pub raw: String,
    /// Input after fence stripping.
    pub stripped: String,
    pub reason: FailureReason,
}

/// Removes one leading ```` ```lang ```` line and one trailing ```` ``` ```` line.
///
/// Text without fence markers comes back unchanged, whitespace included.
pub fn strip_fences(text: &str) -> &str {
    let mut body = text;
    let mut opened = false;

    let leading = text.trim_start();
    if leading.starts_with(FENCE) {
        if let Some(newline) = leading.find('\n') {
            body = &leading[newline + 1..];
            opened = true;
        }
    }

    let trailing = body.trim_end();
    if let Some(before) = trailing.strip_suffix(FENCE) {
        if let Some(content) = before.strip_suffix('\n') {
            body = content.strip_suffix('\r').unwrap_or(content);
        } else if opened || before.is_empty() {
            // Closing fence glued to the last line of an opened block.
            body = before;
        }
    }

    body
}

/// Normalizes one raw model response.
pub fn normalize(raw: &str) -> Result<EvaluationRecord, NormalizationFailure> {
    let stripped = strip_fences(raw);

    let decoded = match serde_json::from_str::<Value>(stripped) {
        Ok(value) => value,
        Err(json_err) => {
            debug!("strict JSON decode failed ({json_err}), trying literal fallback");
            match parse_literal(stripped) {
                Ok(value) => value,
                Err(literal_err) => {
                    return Err(failure(
                        raw,
                        stripped,
                        FailureReason::Undecodable {
                            json: json_err.to_string(),
                            literal: literal_err.to_string(),
                        },
                    ))
                }
            }
        }
    };

    let Value::Object(object) = decoded else {
        return Err(failure(
            raw,
            stripped,
            FailureReason::NotAnObject {
                found: value_kind(&decoded),
            },
        ));
    };

    let missing_keywords = normalize_keywords(lookup(&object, MISSING_KEYWORDS_KEYS));
    Ok(EvaluationRecord::from_object(&object, missing_keywords))
}

/// Field-level normalization. Models double-encode this list as a string
/// (`"['Python', 'SQL']"`), so strings get a second literal decode.
pub fn normalize_keywords(value: Option<&Value>) -> MissingKeywords {
    match value {
        None | Some(Value::Null) => MissingKeywords::Absent,
        Some(Value::Array(items)) => MissingKeywords::List(items.iter().map(keyword_text).collect()),
        Some(Value::String(s)) => match parse_literal(s) {
            Ok(Value::Array(items)) => {
                MissingKeywords::List(items.iter().map(keyword_text).collect())
            }
            Ok(other) => MissingKeywords::Invalid(other),
            Err(LiteralError { .. }) => MissingKeywords::List(vec![s.clone()]),
        },
        Some(other) => MissingKeywords::Invalid(other.clone()),
    }
}

fn failure(raw: &str, stripped: &str, reason: FailureReason) -> NormalizationFailure {
    NormalizationFailure {
        raw: raw.to_string(),
        stripped: stripped.to_string(),
        reason,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const RECORD_JSON: &str = r#"{"Description Match":"85%","Missing Keywords":"[]","Suggestions for improvement":"Add Kubernetes."}"#;

    #[test]
    fn test_strip_fences_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_fences_without_tag() {
        let input = "```\n[1, 2]\n```";
        assert_eq!(strip_fences(input), "[1, 2]");
    }

    #[test]
    fn test_strip_fences_surrounding_whitespace() {
        let input = "\n  ```python\n{'a': 1}\n```\n\n";
        assert_eq!(strip_fences(input), "{'a': 1}");
    }

    #[test]
    fn test_strip_fences_crlf() {
        let input = "```json\r\n{}\r\n```";
        assert_eq!(strip_fences(input), "{}");
        assert!(normalize(input).is_ok());
    }

    #[test]
    fn test_strip_fences_identity_without_markers() {
        for input in [
            "{\"key\": \"value\"}",
            "  padded  \n",
            "",
            "Sorry, I cannot comply.",
            "inline ``` in the middle",
            "ends with backticks```",
        ] {
            assert_eq!(strip_fences(input), input);
        }
    }

    #[test]
    fn test_strip_fences_only_outer_markers() {
        let input = "```md\nbefore\n```\ninner\n```\nafter\n```";
        assert_eq!(strip_fences(input), "before\n```\ninner\n```\nafter");
    }

    #[test]
    fn test_strip_fences_opening_only() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_fences_closing_glued_to_content() {
        assert_eq!(strip_fences("```json\n{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_fenced_scenario() {
        let input = format!("```json\n{RECORD_JSON}\n```");
        let record = normalize(&input).unwrap();
        assert_eq!(record.description_match.as_deref(), Some("85%"));
        assert_eq!(record.missing_keywords, MissingKeywords::List(vec![]));
        assert_eq!(record.suggestions.as_deref(), Some("Add Kubernetes."));
    }

    #[test]
    fn test_fences_do_not_change_result() {
        let bare = normalize(RECORD_JSON).unwrap();
        let fenced = normalize(&format!("```json\n{RECORD_JSON}\n```")).unwrap();
        let untagged = normalize(&format!("```\n{RECORD_JSON}\n```")).unwrap();
        assert_eq!(bare, fenced);
        assert_eq!(bare, untagged);
    }

    #[test]
    fn test_refusal_scenario_preserves_raw() {
        let failure = normalize("Sorry, I cannot comply.").unwrap_err();
        assert_eq!(failure.raw, "Sorry, I cannot comply.");
        assert_eq!(failure.stripped, "Sorry, I cannot comply.");
        assert!(matches!(failure.reason, FailureReason::Undecodable { .. }));
    }

    #[test]
    fn test_failure_keeps_pre_strip_text() {
        let raw = "```json\n{\"Description Match\": \n```";
        let failure = normalize(raw).unwrap_err();
        assert_eq!(failure.raw, raw);
        assert_eq!(failure.stripped, "{\"Description Match\": ");
    }

    #[test]
    fn test_literal_fallback_single_quotes() {
        let raw = "{'Description Match': '70%', 'Missing Keywords': ['Docker', 'AWS'], \
                   'Suggestions for improvement': 'Mention containers.'}";
        let record = normalize(raw).unwrap();
        assert_eq!(record.description_match.as_deref(), Some("70%"));
        assert_eq!(
            record.missing_keywords,
            MissingKeywords::List(vec!["Docker".into(), "AWS".into()])
        );
        assert_eq!(record.suggestions.as_deref(), Some("Mention containers."));
    }

    #[test]
    fn test_double_encoded_keywords_decoded() {
        let raw = r#"{"Description Match":"60%","Missing Keywords":"['Python', 'SQL']","Suggestions for improvement":""}"#;
        let record = normalize(raw).unwrap();
        assert_eq!(
            record.missing_keywords,
            MissingKeywords::List(vec!["Python".into(), "SQL".into()])
        );
    }

    #[test]
    fn test_undecodable_keywords_wrapped() {
        let raw = r#"{"Description Match":"90%","Missing Keywords":"None found","Suggestions for improvement":"-"}"#;
        let record = normalize(raw).unwrap();
        assert_eq!(
            record.missing_keywords,
            MissingKeywords::List(vec!["None found".into()])
        );
    }

    #[test]
    fn test_keywords_string_decoding_to_scalar_is_invalid() {
        let raw = r#"{"Missing Keywords":"'just text'"}"#;
        let record = normalize(raw).unwrap();
        assert_eq!(record.missing_keywords, MissingKeywords::Invalid(json!("just text")));
    }

    #[test]
    fn test_keywords_non_sequence_is_invalid() {
        let record = normalize(r#"{"Missing Keywords": {"a": 1}}"#).unwrap();
        assert_eq!(record.missing_keywords, MissingKeywords::Invalid(json!({"a": 1})));
    }

    #[test]
    fn test_keywords_absent() {
        let record = normalize(r#"{"Description Match": "10%"}"#).unwrap();
        assert_eq!(record.missing_keywords, MissingKeywords::Absent);
    }

    #[test]
    fn test_non_object_is_failure() {
        let failure = normalize("['Python', 'SQL']").unwrap_err();
        assert_eq!(failure.reason, FailureReason::NotAnObject { found: "sequence" });

        let failure = normalize("42").unwrap_err();
        assert_eq!(failure.reason, FailureReason::NotAnObject { found: "number" });
    }

    #[test]
    fn test_tuple_keywords_via_fallback() {
        let record = normalize("{'Missing Keywords': ('Go', 'gRPC')}").unwrap();
        assert_eq!(
            record.missing_keywords,
            MissingKeywords::List(vec!["Go".into(), "gRPC".into()])
        );
    }

    #[test]
    fn test_literal_fallback_with_escaped_emoji() {
        let raw = r"{'Description Match': '80%', 'Missing Keywords': [], 'Suggestions for improvement': 'Nice \ud83d\ude00'}";
        let record = normalize(raw).unwrap();
        assert_eq!(record.suggestions.as_deref(), Some("Nice \u{1F600}"));
        assert_eq!(record.missing_keywords, MissingKeywords::List(vec![]));
    }

    #[test]
    fn test_literal_fallback_with_prefixed_keys() {
        let raw = "{u'Description Match': u'75%', u'Missing Keywords': '''['Kafka']'''}";
        let record = normalize(raw).unwrap();
        assert_eq!(record.description_match.as_deref(), Some("75%"));
        assert_eq!(
            record.missing_keywords,
            MissingKeywords::List(vec!["Kafka".into()])
        );
    }
}
