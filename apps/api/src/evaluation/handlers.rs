//! Axum route handlers for the Evaluation API.

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::display::{render_outcome, render_report};
use crate::evaluation::evaluator::{evaluate, generate_followup, FollowupKind, ModelOutcome};
use crate::evaluation::extract::{extract_pdf_text, looks_like_pdf};
use crate::llm_client::ModelChoice;
use crate::session::{EvaluationSession, Followup};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FollowupRequest {
    #[serde(default)]
    pub model: ModelChoice,
}

#[derive(Debug, Serialize)]
pub struct OutcomeView {
    pub outcome: ModelOutcome,
    /// Ready-to-render markdown, placeholders applied.
    pub markdown: String,
}

impl From<&ModelOutcome> for OutcomeView {
    fn from(outcome: &ModelOutcome) -> Self {
        Self {
            outcome: outcome.clone(),
            markdown: render_outcome(outcome),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub resume_chars: usize,
    pub gemini: OutcomeView,
    pub gpt: OutcomeView,
    pub cover_letter: Option<Followup>,
    pub resume_points: Option<Followup>,
}

impl From<&EvaluationSession> for SessionView {
    fn from(session: &EvaluationSession) -> Self {
        Self {
            session_id: session.id,
            revision: session.revision,
            created_at: session.created_at,
            resume_chars: session.resume_text.chars().count(),
            gemini: (&session.comparison.gemini).into(),
            gpt: (&session.comparison.gpt).into(),
            cover_letter: session.cover_letter.clone(),
            resume_points: session.resume_points.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowupResponse {
    pub session_id: Uuid,
    pub kind: FollowupKind,
    #[serde(flatten)]
    pub followup: Followup,
}

struct Upload {
    content_type: Option<String>,
    data: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/evaluations
///
/// Multipart fields: `resume` (PDF file), `jd` (text), optional `session_id`
/// to replace an earlier session. Runs both evaluations and stores the result.
pub async fn handle_create_evaluation(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, AppError> {
    let mut upload: Option<Upload> = None;
    let mut jd_text: Option<String> = None;
    let mut session_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                upload = Some(Upload { content_type, data });
            }
            Some("jd") => jd_text = Some(field.text().await?),
            Some("session_id") => {
                let raw = field.text().await?;
                let id = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Validation(format!("invalid session_id '{raw}'")))?;
                session_id = Some(id);
            }
            _ => {}
        }
    }

    let jd_text = jd_text
        .filter(|jd| !jd.trim().is_empty())
        .ok_or_else(|| AppError::Validation("jd cannot be empty".to_string()))?;
    let upload = upload
        .filter(|u| !u.data.is_empty())
        .ok_or_else(|| AppError::Validation("resume PDF is required".to_string()))?;
    if !looks_like_pdf(upload.content_type.as_deref(), &upload.data) {
        return Err(AppError::Validation("resume must be a PDF".to_string()));
    }

    let resume_text = extract_pdf_text(upload.data).await?;
    let comparison = evaluate(&state.models, &resume_text, &jd_text).await;

    let id = session_id.unwrap_or_else(Uuid::new_v4);
    let session = state
        .sessions
        .replace(EvaluationSession::new(id, resume_text, jd_text, comparison))
        .await;
    info!("Evaluation session {id} stored (revision {})", session.revision);

    Ok(Json(SessionView::from(&session)))
}

/// GET /api/v1/evaluations/:id
pub async fn handle_get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = load_session(&state, id).await?;
    Ok(Json(SessionView::from(&session)))
}

/// GET /api/v1/evaluations/:id/report
///
/// Markdown rendering of both outcomes and any generated follow-ups.
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_report(&session),
    ))
}

/// POST /api/v1/evaluations/:id/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FollowupRequest>,
) -> Result<Json<FollowupResponse>, AppError> {
    run_followup(&state, id, FollowupKind::CoverLetter, request.model).await
}

/// POST /api/v1/evaluations/:id/resume-points
pub async fn handle_resume_points(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FollowupRequest>,
) -> Result<Json<FollowupResponse>, AppError> {
    run_followup(&state, id, FollowupKind::ResumePoints, request.model).await
}

async fn run_followup(
    state: &AppState,
    id: Uuid,
    kind: FollowupKind,
    choice: ModelChoice,
) -> Result<Json<FollowupResponse>, AppError> {
    let session = load_session(state, id).await?;
    let followup = generate_followup(&state.models, &session, kind, choice).await?;

    if !state
        .sessions
        .attach_followup(id, session.revision, kind, followup.clone())
        .await
    {
        return Err(AppError::NotFound(format!(
            "Evaluation {id} was replaced or expired during generation"
        )));
    }

    Ok(Json(FollowupResponse {
        session_id: id,
        kind,
        followup,
    }))
}

async fn load_session(state: &AppState, id: Uuid) -> Result<EvaluationSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Evaluation {id} not found")))
}
