//! Evaluation flow: one prompt, two providers, one normalized outcome each.
//!
//! Calls are sequential (Gemini, then GPT). A provider error becomes a
//! `CallFailed` outcome for that provider only.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::evaluation::normalizer::{normalize, NormalizationFailure};
use crate::evaluation::prompts::{
    render_prompt, COVER_LETTER_PROMPT_TEMPLATE, EVALUATION_PROMPT_TEMPLATE,
    RESUME_POINTS_PROMPT_TEMPLATE,
};
use crate::evaluation::record::EvaluationRecord;
use crate::llm_client::{ModelChoice, ModelClient, ModelSet};
use crate::session::{EvaluationSession, Followup};

/// What one provider's evaluation turned into.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Parsed { record: EvaluationRecord },
    /// The model answered, but not with anything record-shaped.
    Unparseable { failure: NormalizationFailure },
    CallFailed { message: String },
}

impl ModelOutcome {
    #[cfg(test)]
    pub fn record(&self) -> Option<&EvaluationRecord> {
        match self {
            ModelOutcome::Parsed { record } => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub gemini: ModelOutcome,
    pub gpt: ModelOutcome,
}

impl Comparison {
    pub fn outcome(&self, choice: ModelChoice) -> &ModelOutcome {
        match choice {
            ModelChoice::Gemini => &self.gemini,
            ModelChoice::Gpt => &self.gpt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowupKind {
    CoverLetter,
    ResumePoints,
}

impl FollowupKind {
    fn template(self) -> &'static str {
        match self {
            FollowupKind::CoverLetter => COVER_LETTER_PROMPT_TEMPLATE,
            FollowupKind::ResumePoints => RESUME_POINTS_PROMPT_TEMPLATE,
        }
    }
}

/// Asks both providers to evaluate the résumé against the JD.
pub async fn evaluate(models: &ModelSet, resume_text: &str, jd_text: &str) -> Comparison {
    let prompt = render_prompt(EVALUATION_PROMPT_TEMPLATE, resume_text, jd_text);

    let gemini = evaluate_with(models.gemini.as_ref(), &prompt).await;
    let gpt = evaluate_with(models.gpt.as_ref(), &prompt).await;

    Comparison { gemini, gpt }
}

async fn evaluate_with(model: &dyn ModelClient, prompt: &str) -> ModelOutcome {
    let provider = model.provider();
    info!("Requesting {provider} evaluation");

    let raw = match model.call(prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("{provider} evaluation call failed: {e}");
            return ModelOutcome::CallFailed {
                message: e.to_string(),
            };
        }
    };

    match normalize(&raw) {
        Ok(record) => {
            info!(
                "{provider} evaluation parsed: match={}",
                record.description_match.as_deref().unwrap_or("?")
            );
            ModelOutcome::Parsed { record }
        }
        Err(failure) => {
            warn!("{provider} evaluation unparseable: {}", failure.reason);
            ModelOutcome::Unparseable { failure }
        }
    }
}

/// Generates a cover letter or résumé bullet suggestions for `session`.
/// The model's markdown is returned untouched.
pub async fn generate_followup(
    models: &ModelSet,
    session: &EvaluationSession,
    kind: FollowupKind,
    choice: ModelChoice,
) -> Result<Followup, AppError> {
    let prompt = render_prompt(kind.template(), &session.resume_text, &session.jd_text);
    info!("Generating {kind:?} for session {} with {choice}", session.id);

    let markdown = models
        .get(choice)
        .call(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("{choice} {kind:?} generation failed: {e}")))?;

    Ok(Followup {
        model: choice,
        markdown,
        created_at: Utc::now(),
    })
}
