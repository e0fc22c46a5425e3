// Prompt templates for the evaluation and follow-up calls.
// Placeholders: {resume_text}, {jd_text}. Fill with `fill_template`.

/// Evaluation prompt. The model is asked for the three-key object the
/// normalizer expects, but nothing enforces it.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"
I need you to act as an expert State of the Art ATS (Applicant Tracking System) with a deep understanding of the tech field, Software roles, AI roles, ML roles, NLP/LLM roles, Data Science/Engineering Roles, etc. You need to evaluate the resume based on the given job description. Assign a match percentage based on the Job Description and any missing words with high accuracy but make sure these missing words are really important and relevant.
resume: {resume_text}
Job-description: {jd_text}

The response NEEDS to be a single string in the structure:
{"Description Match":"[int]%", "Missing Keywords":"[]", "Suggestions for improvement":""}
Please only respond with a valid JSON object. Do not include explanations, markdown, or extra text.
"#;

/// Cover letter prompt. Output is rendered as markdown, never parsed.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"
I need you to act as an expert Cover Letter Writer with a deep understanding of the tech field, Software roles, AI roles, ML roles, NLP/LLM roles, Data Science/Engineering Roles, etc. You need to evaluate the resume based on the given job description and write a ATS-optimized cover letter tailored for this role. The Cover letter should be very hearty and human, your tone, grammar and vocabulary should be as human as possible. Use bullet points to highlight the main points of relevance, and it should have an intro and conclusion, no need to add writer details, directly start from Dear... . ONLY PROVIDE THE COVER LETTER AND NO ADDITIONAL TEXT, NO EMOJIS Please format the cover letter using proper Markdown.

Resume:
{resume_text}

Job Description:
{jd_text}
"#;

/// Résumé bullet-point prompt. Output is rendered as markdown, never parsed.
pub const RESUME_POINTS_PROMPT_TEMPLATE: &str = r#"
I need you to act as an expert Resume Maker with a deep understanding of the tech field, Software roles, AI roles, ML roles, NLP/LLM roles, Data Science/Engineering Roles, etc. You need to evaluate the resume based on the given job description and suggest specific, ready-to-paste bullet points that can be added or edited into the resume to improve its ATS score and relevance for this job.

Resume:
{resume_text}

Job Description:
{jd_text}
"#;

/// Replaces `{name}` placeholders in one left-to-right pass.
///
/// Substituted values are never re-scanned, so a résumé that happens to
/// contain `{jd_text}` stays as written. Braces that don't form a known
/// placeholder (like the JSON example above) are copied through.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Fills any of the templates above.
pub fn render_prompt(template: &str, resume_text: &str, jd_text: &str) -> String {
    fill_template(
        template,
        &[("resume_text", resume_text), ("jd_text", jd_text)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_basic() {
        let out = fill_template("a {x} b {y}", &[("x", "1"), ("y", "2")]);
        assert_eq!(out, "a 1 b 2");
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        let out = fill_template(r#"{"k": "{x}"} {unknown}"#, &[("x", "v")]);
        assert_eq!(out, r#"{"k": "v"} {unknown}"#);
    }

    #[test]
    fn test_fill_template_single_pass() {
        let out = fill_template("{a}|{b}", &[("a", "{b}"), ("b", "B")]);
        assert_eq!(out, "{b}|B");
    }

    #[test]
    fn test_fill_template_unclosed_brace() {
        assert_eq!(fill_template("tail {x", &[("x", "v")]), "tail {x");
    }

    #[test]
    fn test_evaluation_prompt_contains_inputs_and_schema() {
        let prompt = render_prompt(EVALUATION_PROMPT_TEMPLATE, "RESUME BODY", "JD BODY");
        assert!(prompt.contains("resume: RESUME BODY"));
        assert!(prompt.contains("Job-description: JD BODY"));
        assert!(prompt.contains(r#"{"Description Match":"[int]%", "Missing Keywords":"[]", "Suggestions for improvement":""}"#));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_followup_prompts_substitute_both_inputs() {
        for template in [COVER_LETTER_PROMPT_TEMPLATE, RESUME_POINTS_PROMPT_TEMPLATE] {
            let prompt = render_prompt(template, "R", "J");
            assert!(prompt.contains("Resume:\nR\n"));
            assert!(prompt.contains("Job Description:\nJ\n"));
        }
    }
}
