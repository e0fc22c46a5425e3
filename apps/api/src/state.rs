use crate::llm_client::ModelSet;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Gemini and GPT clients. Swappable for fakes in tests.
    pub models: ModelSet,
    pub sessions: SessionStore,
}
