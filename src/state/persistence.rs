//! Persisted state.
//!
//! The whole [`AppState`] is stored as one JSON string under a fixed key.
//! Loading never fails: a missing, unreadable or inconsistent snapshot falls
//! back to the default state.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use super::board::Board;
use super::store::{AppState, Scene};

/// String key-value storage, e.g. browser local storage.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// In-memory storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("malformed state snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("stage must start at 1")]
    InvalidStage,
}

/// Parse a snapshot without normalizing it.
pub fn decode_state(json: &str) -> Result<AppState, PersistenceError> {
    let state: AppState = serde_json::from_str(json)?;
    if state.stage == 0 {
        return Err(PersistenceError::InvalidStage);
    }
    Ok(state)
}

/// Serialize a state snapshot.
pub fn encode_state(state: &AppState) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(state)?)
}

/// Make a restored state safe to resume.
///
/// A game interrupted mid-play restarts from the intro screen, and a board
/// interrupted mid-shuffle goes back to solved so the shuffle can rerun.
pub fn normalize(mut state: AppState) -> AppState {
    state.is_sorted = state.table.is_solved();
    if !state.is_sorted && state.scene == Scene::Playing {
        state.scene = Scene::Intro;
    }
    if state.should_rand {
        state.table = Board::solved();
        state.is_sorted = true;
    }
    state
}

/// Load the state stored under `key`, falling back to defaults.
pub fn load_state<S: KeyValueStorage + ?Sized>(storage: &S, key: &str) -> AppState {
    let Some(json) = storage.get(key) else {
        debug!(key, "no persisted state");
        return AppState::default();
    };
    match decode_state(&json) {
        Ok(state) => normalize(state),
        Err(e) => {
            warn!(key, error = %e, "discarding persisted state");
            AppState::default()
        }
    }
}

/// Store the state under `key`.
pub fn save_state<S: KeyValueStorage + ?Sized>(
    storage: &mut S,
    key: &str,
    state: &AppState,
) -> Result<(), PersistenceError> {
    let json = encode_state(state)?;
    storage.set(key, json);
    debug!(key, "state persisted");
    Ok(())
}
