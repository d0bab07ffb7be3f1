//! Session-backed facade over the story catalog and calculator, with pluggable
//! storage and an HTTP surface.

mod config;
mod persistence;
mod server;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use contracts::{Decision, GameState, OutcomeReport};
use story_core::{compute_all_outcomes, new_game_state, record_decision, Catalog, DecisionEffect};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use config::{ConfigError, ServerConfig, StoreBackend, DEFAULT_SQLITE_PATH};
pub use persistence::{PersistedSessionSummary, PersistenceError, SqliteSessionStore};
pub use server::{router, serve, serve_listener, ServerError};
pub use story_core::ImpactThresholds;

/// Whole-document key-value storage for game sessions. `put` replaces any
/// existing document under the same `session_id`.
pub trait SessionStore: Send + fmt::Debug {
    fn get(&self, session_id: &str) -> Result<Option<GameState>, PersistenceError>;
    fn put(&mut self, state: &GameState) -> Result<(), PersistenceError>;
    fn backend(&self) -> &'static str;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: HashMap<String, GameState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str) -> Result<Option<GameState>, PersistenceError> {
        Ok(self.sessions.get(session_id).cloned())
    }

    fn put(&mut self, state: &GameState) -> Result<(), PersistenceError> {
        self.sessions
            .insert(state.session_id.clone(), state.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("game session not found: {0}")]
    SessionNotFound(String),
    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Every operation is a single read-modify-write against the store. Two
/// callers racing on one session resolve as last write wins unless the caller
/// serializes access (the HTTP server does, through its mutex).
#[derive(Debug)]
pub struct StoryApi {
    catalog: Arc<Catalog>,
    store: Box<dyn SessionStore>,
    thresholds: ImpactThresholds,
}

impl StoryApi {
    pub fn new(catalog: Arc<Catalog>, store: Box<dyn SessionStore>) -> Self {
        Self {
            catalog,
            store,
            thresholds: ImpactThresholds::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(Catalog::builtin()),
            Box::new(MemorySessionStore::new()),
        )
    }

    pub fn with_thresholds(mut self, thresholds: ImpactThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn thresholds(&self) -> ImpactThresholds {
        self.thresholds
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Starting an id that already exists replaces the stored session.
    pub fn start_session(&mut self, session_id: &str) -> Result<GameState, StoryError> {
        if self.store.get(session_id)?.is_some() {
            warn!(session_id, "restarting existing session; previous state is overwritten");
        }

        let state = new_game_state(session_id, &self.catalog, Utc::now());
        self.store.put(&state)?;
        info!(session_id, characters = state.characters.len(), "session started");
        Ok(state)
    }

    pub fn get_session(&self, session_id: &str) -> Result<GameState, StoryError> {
        self.store
            .get(session_id)?
            .ok_or_else(|| StoryError::SessionNotFound(session_id.to_string()))
    }

    pub fn record_decision(
        &mut self,
        session_id: &str,
        decision: &Decision,
    ) -> Result<DecisionEffect, StoryError> {
        let mut state = self.get_session(session_id)?;
        let effect = record_decision(&mut state, decision);

        match effect {
            DecisionEffect::Applied => {
                self.store.put(&state)?;
                info!(
                    session_id,
                    character_id = %decision.character_id,
                    option_id = %decision.insurance_option_id,
                    "decision recorded"
                );
                if let Some(reasoning) = decision.reasoning.as_deref() {
                    debug!(
                        session_id,
                        character_id = %decision.character_id,
                        reasoning,
                        "decision reasoning"
                    );
                }
            }
            DecisionEffect::UnknownCharacter => {
                debug!(
                    session_id,
                    character_id = %decision.character_id,
                    "decision ignored for unknown character"
                );
            }
        }

        Ok(effect)
    }

    pub fn calculate_outcome(
        &self,
        session_id: &str,
        scenario_id: &str,
    ) -> Result<OutcomeReport, StoryError> {
        let state = self.get_session(session_id)?;
        let scenario = self
            .catalog
            .scenario(scenario_id)
            .cloned()
            .ok_or_else(|| StoryError::ScenarioNotFound(scenario_id.to_string()))?;

        let outcomes = compute_all_outcomes(&self.catalog, &state, &scenario, &self.thresholds);
        debug!(session_id, scenario_id, outcomes = outcomes.len(), "outcome calculated");

        Ok(OutcomeReport { scenario, outcomes })
    }
}
