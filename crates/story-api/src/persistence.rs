use std::path::Path;

use chrono::Utc;
use contracts::GameState;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::SessionStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedSessionSummary {
    pub session_id: String,
    pub current_chapter: u32,
    pub decision_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One row per session; the full `GameState` lives in `state_json`.
#[derive(Debug)]
pub struct SqliteSessionStore {
    conn: Connection,
}

impl SqliteSessionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn session_exists(&self, session_id: &str) -> Result<bool, PersistenceError> {
        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM game_states WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    pub fn list_sessions(
        &self,
        limit: usize,
    ) -> Result<Vec<PersistedSessionSummary>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, current_chapter, decision_count, created_at, updated_at
             FROM game_states
             ORDER BY updated_at DESC, session_id ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(
            params![i64::try_from(limit).unwrap_or(i64::MAX)],
            |row| {
                Ok(PersistedSessionSummary {
                    session_id: row.get(0)?,
                    current_chapter: row.get(1)?,
                    decision_count: usize::try_from(row.get::<_, i64>(2)?).unwrap_or(0),
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            },
        )?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }

        Ok(sessions)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS game_states (
                session_id TEXT PRIMARY KEY,
                current_chapter INTEGER NOT NULL,
                decision_count INTEGER NOT NULL,
                state_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_game_states_updated ON game_states(updated_at);
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'initial_game_states', ?1)",
            params![Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, session_id: &str) -> Result<Option<GameState>, PersistenceError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT state_json FROM game_states WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(raw) => Ok(Some(serde_json::from_str::<GameState>(&raw)?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, state: &GameState) -> Result<(), PersistenceError> {
        let state_json = serde_json::to_string(state)?;

        self.conn.execute(
            "INSERT INTO game_states (
                session_id,
                current_chapter,
                decision_count,
                state_json,
                created_at,
                updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(session_id) DO UPDATE SET
                current_chapter = excluded.current_chapter,
                decision_count = excluded.decision_count,
                state_json = excluded.state_json,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
            params![
                state.session_id.as_str(),
                state.current_chapter,
                i64::try_from(state.completed_decisions.len()).unwrap_or(i64::MAX),
                state_json,
                state.created_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
