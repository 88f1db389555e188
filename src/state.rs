//! Application state: in-memory stores, prompts, and the OpenAI client.
//!
//! This module owns:
//!   - the exercise registry (id -> live session) and the pending-ticket store
//!   - the proficiency store (session id -> CEFR level)
//!   - the prompts struct (from TOML or defaults)
//!   - optional OpenAI client
//!
//! All stores are keyed by opaque ids and only need per-key atomicity; there
//! are no cross-key transactions. Sessions live for the process lifetime —
//! nothing evicts them.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};

use crate::config::{load_agent_config_from_env, Prompts};
use crate::domain::{CefrLevel, PendingExercise};
use crate::exercise::ExerciseSession;
use crate::openai::OpenAI;

/// A live session behind its own mutex, so two concurrent calls against the
/// same exercise id (e.g. a duplicate submit) serialize instead of racing on
/// the cursor.
pub type SharedSession = Arc<Mutex<ExerciseSession>>;

/// Concurrent id-keyed store. The backing map is plain `HashMap` under an
/// async `RwLock`; lookups clone the value out so no lock is held across
/// awaits.
#[derive(Clone)]
pub struct SessionStore<T> {
    inner: Arc<RwLock<HashMap<String, T>>>,
}

impl<T: Clone> SessionStore<T> {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub async fn insert(&self, id: String, value: T) {
        self.inner.write().await.insert(id, value);
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.inner.read().await.get(id).cloned()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

const DEFAULT_SESSION: &str = "default";

/// Session id -> CEFR level, defaulting to A1 when unset. A caller that
/// supplies no session id lands on the implicit "default" session.
#[derive(Clone)]
pub struct ProficiencyStore {
    levels: Arc<RwLock<HashMap<String, CefrLevel>>>,
}

impl ProficiencyStore {
    pub fn new() -> Self {
        Self { levels: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub async fn get(&self, session_id: Option<&str>) -> CefrLevel {
        let id = session_id.unwrap_or(DEFAULT_SESSION);
        self.levels.read().await.get(id).copied().unwrap_or_default()
    }

    pub async fn set(&self, session_id: Option<&str>, level: CefrLevel) {
        let id = session_id.unwrap_or(DEFAULT_SESSION);
        self.levels.write().await.insert(id.to_string(), level);
        info!(target: "lexio_backend", session = %id, %level, "User level set");
    }
}

#[derive(Clone)]
pub struct AppState {
    pub exercises: SessionStore<SharedSession>,
    pub pending: SessionStore<PendingExercise>,
    pub profiles: ProficiencyStore,
    pub openai: Option<OpenAI>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        // Load TOML config if provided (prompt overrides).
        let prompts = load_agent_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "lexio_backend", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
        } else {
            info!(target: "lexio_backend", "OpenAI disabled (no OPENAI_API_KEY). Using offline fallbacks.");
        }

        Self::with(openai, prompts)
    }

    /// Assemble state from explicit parts. Tests use this with no client.
    pub fn with(openai: Option<OpenAI>, prompts: Prompts) -> Self {
        Self {
            exercises: SessionStore::new(),
            pending: SessionStore::new(),
            profiles: ProficiencyStore::new(),
            openai,
            prompts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn proficiency_defaults_to_a1() {
        let store = ProficiencyStore::new();
        assert_eq!(store.get(None).await, CefrLevel::A1);
        assert_eq!(store.get(Some("alice")).await, CefrLevel::A1);
    }

    #[tokio::test]
    async fn proficiency_is_per_session() {
        let store = ProficiencyStore::new();
        store.set(Some("alice"), CefrLevel::B2).await;
        store.set(None, CefrLevel::A2).await;
        assert_eq!(store.get(Some("alice")).await, CefrLevel::B2);
        assert_eq!(store.get(None).await, CefrLevel::A2);
        assert_eq!(store.get(Some("bob")).await, CefrLevel::A1);
    }

    #[tokio::test]
    async fn store_insert_then_get_round_trips() {
        let store: SessionStore<PendingExercise> = SessionStore::new();
        store
            .insert("p1".into(), PendingExercise {
                topic: "law".into(),
                question_count: 5,
                topic_level: CefrLevel::C1,
            })
            .await;
        let ticket = store.get("p1").await.unwrap();
        assert_eq!(ticket.topic, "law");
        assert!(store.get("missing").await.is_none());
    }
}
