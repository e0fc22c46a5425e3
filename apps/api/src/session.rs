//! In-memory evaluation sessions.
//!
//! A session is created on submission and replaced wholesale by the next
//! submission for the same id. Nothing is persisted. The store is capped and
//! evicts the oldest session once full.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::evaluation::evaluator::{Comparison, FollowupKind};
use crate::llm_client::ModelChoice;

/// Markdown produced by a cover-letter or résumé-points call. Rendered as is.
#[derive(Debug, Clone, Serialize)]
pub struct Followup {
    pub model: ModelChoice,
    pub markdown: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSession {
    pub id: Uuid,
    /// Bumped by the store on every `replace`. Follow-ups computed against an
    /// older revision are dropped instead of overwriting the newer session.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub resume_text: String,
    pub jd_text: String,
    pub comparison: Comparison,
    pub cover_letter: Option<Followup>,
    pub resume_points: Option<Followup>,
}

impl EvaluationSession {
    pub fn new(id: Uuid, resume_text: String, jd_text: String, comparison: Comparison) -> Self {
        Self {
            id,
            revision: 0,
            created_at: Utc::now(),
            resume_text,
            jd_text,
            comparison,
            cover_letter: None,
            resume_points: None,
        }
    }
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, EvaluationSession>,
    /// Insertion order, oldest first. Ids are unique.
    order: VecDeque<Uuid>,
    next_revision: u64,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Inner>>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            capacity: capacity.max(1),
        }
    }

    /// Stores `session`, replacing any earlier session with the same id.
    /// Returns the stored copy with its assigned revision.
    pub async fn replace(&self, mut session: EvaluationSession) -> EvaluationSession {
        let mut inner = self.inner.write().await;
        inner.next_revision += 1;
        session.revision = inner.next_revision;

        let id = session.id;
        if inner.sessions.insert(id, session.clone()).is_some() {
            inner.order.retain(|existing| *existing != id);
            info!("Replaced evaluation session {id}");
        } else {
            debug!("Created evaluation session {id}");
        }
        inner.order.push_back(id);

        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.sessions.remove(&evicted);
                debug!("Evicted evaluation session {evicted}");
            }
        }

        session
    }

    pub async fn get(&self, id: Uuid) -> Option<EvaluationSession> {
        self.inner.read().await.sessions.get(&id).cloned()
    }

    /// Attaches a follow-up to the session at `revision`. Returns `false` if
    /// the session is gone or has been replaced since.
    pub async fn attach_followup(
        &self,
        id: Uuid,
        revision: u64,
        kind: FollowupKind,
        followup: Followup,
    ) -> bool {
        let mut inner = self.inner.write().await;
        let Some(session) = inner.sessions.get_mut(&id) else {
            return false;
        };
        if session.revision != revision {
            return false;
        }
        match kind {
            FollowupKind::CoverLetter => session.cover_letter = Some(followup),
            FollowupKind::ResumePoints => session.resume_points = Some(followup),
        }
        true
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::evaluator::ModelOutcome;

    fn comparison() -> Comparison {
        Comparison {
            gemini: ModelOutcome::CallFailed {
                message: "offline".to_string(),
            },
            gpt: ModelOutcome::CallFailed {
                message: "offline".to_string(),
            },
        }
    }

    fn session(id: Uuid, jd: &str) -> EvaluationSession {
        EvaluationSession::new(id, "resume".to_string(), jd.to_string(), comparison())
    }

    fn followup(text: &str) -> Followup {
        Followup {
            model: ModelChoice::Gemini,
            markdown: text.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_replace_then_get() {
        let store = SessionStore::new(4);
        let id = Uuid::new_v4();
        let stored = store.replace(session(id, "jd one")).await;
        assert_eq!(stored.revision, 1);

        let fetched = store.get(id).await.unwrap();
        assert_eq!(fetched.jd_text, "jd one");
        assert!(store.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_new_submission_replaces_session_and_clears_followups() {
        let store = SessionStore::new(4);
        let id = Uuid::new_v4();
        let first = store.replace(session(id, "jd one")).await;
        assert!(
            store
                .attach_followup(id, first.revision, FollowupKind::CoverLetter, followup("Dear"))
                .await
        );

        store.replace(session(id, "jd two")).await;
        let current = store.get(id).await.unwrap();
        assert_eq!(current.jd_text, "jd two");
        assert!(current.cover_letter.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_followup_is_dropped() {
        let store = SessionStore::new(4);
        let id = Uuid::new_v4();
        let first = store.replace(session(id, "jd one")).await;
        store.replace(session(id, "jd two")).await;

        let attached = store
            .attach_followup(id, first.revision, FollowupKind::ResumePoints, followup("- x"))
            .await;
        assert!(!attached);
        assert!(store.get(id).await.unwrap().resume_points.is_none());
    }

    #[tokio::test]
    async fn test_followup_on_unknown_session() {
        let store = SessionStore::new(4);
        let attached = store
            .attach_followup(Uuid::new_v4(), 1, FollowupKind::CoverLetter, followup("x"))
            .await;
        assert!(!attached);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let store = SessionStore::new(2);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        store.replace(session(a, "a")).await;
        store.replace(session(b, "b")).await;
        // Refreshing `a` makes `b` the oldest.
        store.replace(session(a, "a2")).await;
        store.replace(session(c, "c")).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get(b).await.is_none());
        assert_eq!(store.get(a).await.unwrap().jd_text, "a2");
        assert!(store.get(c).await.is_some());
    }
}
