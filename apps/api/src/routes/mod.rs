pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers;
use crate::state::AppState;

/// Résumé uploads above this size are rejected by the multipart extractor.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/evaluations",
            post(handlers::handle_create_evaluation),
        )
        .route(
            "/api/v1/evaluations/:id",
            get(handlers::handle_get_evaluation),
        )
        .route(
            "/api/v1/evaluations/:id/report",
            get(handlers::handle_get_report),
        )
        .route(
            "/api/v1/evaluations/:id/cover-letter",
            post(handlers::handle_cover_letter),
        )
        .route(
            "/api/v1/evaluations/:id/resume-points",
            post(handlers::handle_resume_points),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
