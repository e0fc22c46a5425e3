//! Markdown rendering for evaluation results.
//!
//! Placeholders: an empty keyword list renders `_None_`; a keyword field that
//! is not a list renders `_Invalid format_`. Unparseable responses are shown
//! raw in a code block so a human can see what the model said.

use crate::evaluation::evaluator::{Comparison, ModelOutcome};
use crate::evaluation::record::{EvaluationRecord, MissingKeywords};
use crate::llm_client::ModelChoice;
use crate::session::EvaluationSession;

pub const NONE_PLACEHOLDER: &str = "_None_";
pub const INVALID_PLACEHOLDER: &str = "_Invalid format_";
const UNKNOWN_MATCH: &str = "N/A";

pub fn render_keywords(keywords: &MissingKeywords) -> String {
    match keywords {
        MissingKeywords::List(items) if items.is_empty() => NONE_PLACEHOLDER.to_string(),
        MissingKeywords::List(items) => format!("- {}", items.join("\n- ")),
        MissingKeywords::Invalid(_) | MissingKeywords::Absent => INVALID_PLACEHOLDER.to_string(),
    }
}

pub fn render_record(record: &EvaluationRecord) -> String {
    format!(
        "**Match %:** {}\n\n**Missing Keywords:**\n{}\n\n**Suggestions for Improvement:**\n{}\n",
        record.description_match.as_deref().unwrap_or(UNKNOWN_MATCH),
        render_keywords(&record.missing_keywords),
        record.suggestions.as_deref().unwrap_or(NONE_PLACEHOLDER),
    )
}

pub fn render_outcome(outcome: &ModelOutcome) -> String {
    match outcome {
        ModelOutcome::Parsed { record } => render_record(record),
        ModelOutcome::Unparseable { failure } => format!(
            "Could not parse the response as JSON.\n\nRaw response:\n{}\n",
            code_block(&failure.raw)
        ),
        ModelOutcome::CallFailed { message } => {
            format!("The model call failed.\n\n{}\n", code_block(message))
        }
    }
}

pub fn render_comparison(comparison: &Comparison) -> String {
    let mut out = String::from("## Comparison Results\n");
    for choice in [ModelChoice::Gemini, ModelChoice::Gpt] {
        out.push_str(&format!(
            "\n### {choice} Response\n\n{}",
            render_outcome(comparison.outcome(choice))
        ));
    }
    out
}

/// Full report: comparison plus whichever follow-ups have been generated.
pub fn render_report(session: &EvaluationSession) -> String {
    let mut out = render_comparison(&session.comparison);
    if let Some(letter) = &session.cover_letter {
        out.push_str(&format!(
            "\n---\n\n## Generated Cover Letter ({})\n\n{}\n",
            letter.model, letter.markdown
        ));
    }
    if let Some(points) = &session.resume_points {
        out.push_str(&format!(
            "\n---\n\n## Suggested Resume Points ({})\n\n{}\n",
            points.model, points.markdown
        ));
    }
    out
}

/// Fenced block long enough that backticks inside `text` can't close it.
fn code_block(text: &str) -> String {
    let longest_run = text
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);
    format!("{fence}\n{text}\n{fence}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::normalizer::normalize;
    use serde_json::json;

    #[test]
    fn test_render_keywords_list() {
        let kw = MissingKeywords::List(vec!["Python".into(), "SQL".into()]);
        assert_eq!(render_keywords(&kw), "- Python\n- SQL");
    }

    #[test]
    fn test_render_keywords_placeholders() {
        assert_eq!(render_keywords(&MissingKeywords::List(vec![])), "_None_");
        assert_eq!(
            render_keywords(&MissingKeywords::Invalid(json!(42))),
            "_Invalid format_"
        );
        assert_eq!(render_keywords(&MissingKeywords::Absent), "_Invalid format_");
    }

    #[test]
    fn test_render_record_missing_fields() {
        let record = EvaluationRecord {
            description_match: None,
            missing_keywords: MissingKeywords::List(vec![]),
            suggestions: None,
        };
        let out = render_record(&record);
        assert!(out.contains("**Match %:** N/A"));
        assert!(out.contains("**Missing Keywords:**\n_None_"));
    }

    #[test]
    fn test_render_unparseable_shows_raw() {
        let failure = normalize("```\nnot json at all\n```").unwrap_err();
        let out = render_outcome(&ModelOutcome::Unparseable { failure });
        assert!(out.contains("Could not parse the response as JSON."));
        assert!(out.contains("````\n```\nnot json at all\n```\n````"));
    }

    #[test]
    fn test_code_block_minimum_fence() {
        assert_eq!(code_block("plain"), "```\nplain\n```");
    }

    #[test]
    fn test_render_comparison_has_both_sections() {
        let comparison = Comparison {
            gemini: ModelOutcome::Parsed {
                record: normalize(r#"{"Description Match":"85%","Missing Keywords":["Go"]}"#)
                    .unwrap(),
            },
            gpt: ModelOutcome::CallFailed {
                message: "timeout".to_string(),
            },
        };
        let out = render_comparison(&comparison);
        assert!(out.contains("### Gemini Response"));
        assert!(out.contains("**Match %:** 85%"));
        assert!(out.contains("- Go"));
        assert!(out.contains("### GPT Response"));
        assert!(out.contains("The model call failed."));
    }

    #[test]
    fn test_render_report_appends_followups() {
        use crate::session::Followup;
        use chrono::Utc;
        use uuid::Uuid;

        let failed = || ModelOutcome::CallFailed {
            message: "offline".to_string(),
        };
        let mut session = EvaluationSession::new(
            Uuid::new_v4(),
            "resume".to_string(),
            "jd".to_string(),
            Comparison {
                gemini: failed(),
                gpt: failed(),
            },
        );
        session.resume_points = Some(Followup {
            model: ModelChoice::Gpt,
            markdown: "- Led migration".to_string(),
            created_at: Utc::now(),
        });

        let out = render_report(&session);
        assert!(out.starts_with("## Comparison Results\n"));
        assert!(out.contains("\n---\n\n## Suggested Resume Points (GPT)\n\n- Led migration\n"));
        assert!(!out.contains("Generated Cover Letter"));
    }
}
