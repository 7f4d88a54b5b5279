//! Application state and reducer.
//!
//! [`AppState`] is the single source of truth for the game. It only changes
//! through [`reduce`], a pure function from the current state and an
//! [`Action`] to the next state. [`Store`] owns the current snapshot and is
//! the one place actions get applied.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::board::{Board, Position};
use super::records::RecordLedger;

/// Last stage; finishing it leads to the records screen.
pub const FINAL_STAGE: u32 = 4;

/// Screens of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scene {
    #[default]
    Intro,
    Playing,
    Records,
}

impl Scene {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Playing => "playing",
            Self::Records => "records",
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State transitions.
///
/// On the wire an action is `{"type": "MOVE_PIECE", "data": [x, y]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Switch screens
    ChangeScene(Scene),
    /// Move on to the next stage with a fresh board
    #[serde(rename = "NEXT_STAGE")]
    AdvanceStage,
    /// End the game, recording the time unless the player resigned
    #[serde(rename = "END_GAME")]
    FinishGame { resign: bool },
    /// Slide the tile at a position
    MovePiece(Position),
    /// Shuffle finished, the board is playable
    EndRand,
    /// One clock tick elapsed
    IncrementClock,
    /// Name the record at `index`
    RegisterName { player: String, index: usize },
}

impl Action {
    /// Actions behind the intro screen's "new game" button.
    pub fn new_game() -> [Action; 2] {
        [
            Action::FinishGame { resign: true },
            Action::ChangeScene(Scene::Playing),
        ]
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChangeScene(_) => "change_scene",
            Self::AdvanceStage => "advance_stage",
            Self::FinishGame { .. } => "finish_game",
            Self::MovePiece(_) => "move_piece",
            Self::EndRand => "end_rand",
            Self::IncrementClock => "increment_clock",
            Self::RegisterName { .. } => "register_name",
        }
    }
}

/// Complete application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Current screen
    pub scene: Scene,

    /// Current stage, starting at 1
    pub stage: u32,

    /// Clock ticks elapsed in the current game
    pub current_time: u64,

    /// Best times, fastest first
    pub records: RecordLedger,

    /// Tile arrangement
    pub table: Board,

    /// Board must be shuffled before it can be played
    pub should_rand: bool,

    /// Board is in the solved arrangement
    pub is_sorted: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            scene: Scene::Intro,
            stage: 1,
            current_time: 0,
            records: RecordLedger::new(),
            table: Board::solved(),
            should_rand: true,
            is_sorted: true,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a game was started and not finished.
    pub fn has_game_in_progress(&self) -> bool {
        self.current_time > 0
    }

    /// Check if a solved board leads to another stage rather than the records.
    pub fn can_advance_stage(&self) -> bool {
        self.stage < FINAL_STAGE
    }

    /// Check if the player can currently move tiles.
    pub fn is_playable(&self) -> bool {
        self.scene == Scene::Playing && !self.should_rand && !self.is_sorted
    }

    /// Convert to JSON for presenters.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "scene": self.scene.as_str(),
            "stage": self.stage,
            "currentTime": self.current_time,
            "records": self.records.to_json(),
            "table": self.table.to_json(),
            "shouldRand": self.should_rand,
            "isSorted": self.is_sorted
        })
    }
}

/// Apply an action, stamping new records with the current time.
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    reduce_at(state, action, chrono::Utc::now().timestamp_millis())
}

/// Apply an action with an explicit timestamp for new records.
///
/// Never mutates `state`; every branch builds a new value.
pub fn reduce_at(state: &AppState, action: &Action, now_ms: i64) -> AppState {
    match action {
        Action::ChangeScene(scene) => {
            let mut next = AppState {
                scene: *scene,
                ..state.clone()
            };
            // A board left mid-shuffle is never shown again
            if state.should_rand {
                next.table = Board::solved();
                next.is_sorted = true;
            }
            next
        }

        Action::AdvanceStage => AppState {
            stage: state.stage.saturating_add(1),
            table: Board::solved(),
            is_sorted: true,
            should_rand: true,
            ..state.clone()
        },

        Action::FinishGame { resign } => {
            let (scene, records) = if *resign {
                (Scene::Intro, state.records.clone())
            } else {
                let (records, _) = state.records.insert_candidate(state.current_time, now_ms);
                (Scene::Records, records)
            };
            AppState {
                scene,
                stage: 1,
                current_time: 0,
                records,
                table: Board::solved(),
                should_rand: true,
                is_sorted: true,
            }
        }

        Action::MovePiece(position) => {
            let (table, moved) = state.table.attempt_move(*position);
            let is_sorted = if moved {
                table.is_solved()
            } else {
                state.is_sorted
            };
            AppState {
                table,
                is_sorted,
                ..state.clone()
            }
        }

        Action::EndRand => AppState {
            should_rand: false,
            ..state.clone()
        },

        Action::IncrementClock => AppState {
            current_time: state.current_time.saturating_add(1),
            ..state.clone()
        },

        Action::RegisterName { player, index } => AppState {
            records: state.records.register_name(*index, player),
            ..state.clone()
        },
    }
}

/// Owner of the current state.
///
/// Holds the latest snapshot behind an [`Rc`]. Each applied action installs a
/// new snapshot; a payload that is not a recognized action keeps the old one,
/// so presenters can use [`Rc::ptr_eq`] to skip work.
#[derive(Debug, Default)]
pub struct Store {
    state: Rc<AppState>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Rc::new(state),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Rc<AppState> {
        Rc::clone(&self.state)
    }

    /// Borrow the current state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Apply an action. Returns whether the state value changed.
    pub fn dispatch(&mut self, action: &Action) -> bool {
        let next = reduce(&self.state, action);
        let changed = next != *self.state;

        match action {
            Action::MovePiece(_) | Action::IncrementClock => {
                trace!(action = action.kind(), changed, "dispatch");
            }
            _ => debug!(action = action.kind(), changed, "dispatch"),
        }

        self.state = Rc::new(next);
        changed
    }

    /// Apply a JSON action payload.
    ///
    /// Unknown action types and malformed payloads leave the snapshot
    /// untouched and return `false`.
    pub fn dispatch_raw(&mut self, payload: &serde_json::Value) -> bool {
        match Action::deserialize(payload) {
            Ok(action) => self.dispatch(&action),
            Err(e) => {
                debug!(error = %e, "ignoring unrecognized action");
                false
            }
        }
    }

    /// Take the final state, e.g. for persisting on shutdown.
    pub fn into_state(self) -> AppState {
        Rc::try_unwrap(self.state).unwrap_or_else(|shared| (*shared).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::VOID_CELL;
    use pretty_assertions::assert_eq;

    fn playing_state() -> AppState {
        AppState {
            scene: Scene::Playing,
            should_rand: false,
            ..AppState::default()
        }
    }

    #[test]
    fn test_default_state() {
        let state = AppState::new();
        assert_eq!(state.scene, Scene::Intro);
        assert_eq!(state.stage, 1);
        assert_eq!(state.current_time, 0);
        assert!(state.records.is_empty());
        assert!(state.table.is_solved());
        assert!(state.should_rand);
        assert!(state.is_sorted);
    }

    #[test]
    fn test_change_scene_resets_pending_shuffle() {
        let (table, _) = Board::solved().attempt_move(Position::new(3, 2));
        let state = AppState {
            table,
            is_sorted: false,
            ..AppState::default()
        };

        let next = reduce(&state, &Action::ChangeScene(Scene::Playing));
        assert_eq!(next.scene, Scene::Playing);
        assert!(next.table.is_solved());
        assert!(next.is_sorted);
    }

    #[test]
    fn test_change_scene_keeps_game_in_progress() {
        let (table, _) = Board::solved().attempt_move(Position::new(3, 2));
        let state = AppState {
            table: table.clone(),
            is_sorted: false,
            ..playing_state()
        };

        let next = reduce(&state, &Action::ChangeScene(Scene::Intro));
        assert_eq!(next.scene, Scene::Intro);
        assert_eq!(next.table, table);
        assert!(!next.is_sorted);
    }

    #[test]
    fn test_advance_stage() {
        let state = AppState {
            stage: 2,
            ..playing_state()
        };
        let next = reduce(&state, &Action::AdvanceStage);
        assert_eq!(next.stage, 3);
        assert!(next.should_rand);
        assert!(next.table.is_solved());
    }

    #[test]
    fn test_finish_game_records_time() {
        let state = AppState {
            current_time: 42,
            stage: 4,
            ..playing_state()
        };

        let next = reduce_at(&state, &Action::FinishGame { resign: false }, 1_234);
        assert_eq!(next.scene, Scene::Records);
        assert_eq!(next.stage, 1);
        assert_eq!(next.current_time, 0);
        assert!(next.should_rand);
        assert!(next.table.is_solved());
        assert_eq!(next.records.len(), 1);

        let record = next.records.get(0).unwrap();
        assert_eq!(record.player, "");
        assert_eq!(record.time, 42);
        assert_eq!(record.date, 1_234);
    }

    #[test]
    fn test_resign_skips_record() {
        let state = AppState {
            current_time: 42,
            stage: 3,
            ..playing_state()
        };

        let next = reduce(&state, &Action::FinishGame { resign: true });
        assert_eq!(next.scene, Scene::Intro);
        assert!(next.records.is_empty());
        assert_eq!(next.stage, 1);
        assert_eq!(next.current_time, 0);
        assert!(next.should_rand);
    }

    #[test]
    fn test_move_piece_updates_sorted() {
        let state = playing_state();

        let moved = reduce(&state, &Action::MovePiece(Position::new(2, 3)));
        assert_eq!(moved.table.cell(Position::new(2, 3)), Some(VOID_CELL));
        assert_eq!(moved.table.cell(Position::new(3, 3)), Some(14));
        assert!(!moved.is_sorted);

        let back = reduce(&moved, &Action::MovePiece(Position::new(3, 3)));
        assert!(back.is_sorted);
    }

    #[test]
    fn test_invalid_move_keeps_flags() {
        let state = AppState {
            is_sorted: false,
            ..playing_state()
        };
        let next = reduce(&state, &Action::MovePiece(Position::new(0, 0)));
        assert_eq!(next, state);
    }

    #[test]
    fn test_end_rand_and_clock() {
        let state = AppState::default();
        let next = reduce(&state, &Action::EndRand);
        assert!(!next.should_rand);

        let ticked = reduce(&next, &Action::IncrementClock);
        assert_eq!(ticked.current_time, 1);
        assert!(ticked.has_game_in_progress());
    }

    #[test]
    fn test_register_name() {
        let state = reduce_at(
            &AppState {
                current_time: 10,
                ..playing_state()
            },
            &Action::FinishGame { resign: false },
            0,
        );

        let named = reduce(
            &state,
            &Action::RegisterName {
                player: "ABC".to_string(),
                index: 0,
            },
        );
        assert_eq!(named.records.get(0).unwrap().player, "ABC");

        let ignored = reduce(
            &state,
            &Action::RegisterName {
                player: "XYZ".to_string(),
                index: 5,
            },
        );
        assert_eq!(ignored, state);
    }

    #[test]
    fn test_reduce_leaves_input_untouched() {
        let state = playing_state();
        let copy = state.clone();
        let _ = reduce(&state, &Action::MovePiece(Position::new(3, 2)));
        assert_eq!(state, copy);
    }

    #[test]
    fn test_stage_progression() {
        assert!(AppState::default().can_advance_stage());
        let last = AppState {
            stage: FINAL_STAGE,
            ..AppState::default()
        };
        assert!(!last.can_advance_stage());
    }

    #[test]
    fn test_counters_saturate() {
        let state = AppState {
            stage: u32::MAX,
            current_time: u64::MAX,
            ..playing_state()
        };

        let next = reduce(&state, &Action::AdvanceStage);
        assert_eq!(next.stage, u32::MAX);

        let next = reduce(&state, &Action::IncrementClock);
        assert_eq!(next.current_time, u64::MAX);
    }

    #[test]
    fn test_extreme_snapshot_survives_actions() {
        let json = serde_json::json!({
            "scene": "playing",
            "stage": u32::MAX,
            "currentTime": u64::MAX,
            "records": [],
            "table": Board::solved().to_json(),
            "shouldRand": false,
            "isSorted": true,
        });
        let state = crate::state::persistence::decode_state(&json.to_string()).unwrap();

        let next = reduce(&reduce(&state, &Action::IncrementClock), &Action::AdvanceStage);
        assert!(next.stage >= 1);
        assert_eq!(next.current_time, u64::MAX);
    }

    #[test]
    fn test_action_wire_format() {
        let action: Action =
            serde_json::from_value(serde_json::json!({"type": "MOVE_PIECE", "data": [1, 2]}))
                .unwrap();
        assert_eq!(action, Action::MovePiece(Position::new(1, 2)));

        let action: Action =
            serde_json::from_value(serde_json::json!({"type": "CHANGE_SCENE", "data": "records"}))
                .unwrap();
        assert_eq!(action, Action::ChangeScene(Scene::Records));

        let action: Action =
            serde_json::from_value(serde_json::json!({"type": "END_RAND"})).unwrap();
        assert_eq!(action, Action::EndRand);

        let json = serde_json::to_value(Action::FinishGame { resign: true }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "END_GAME", "data": {"resign": true}})
        );
    }

    #[test]
    fn test_store_unknown_action_keeps_snapshot() {
        let mut store = Store::new(AppState::default());
        let before = store.snapshot();

        assert!(!store.dispatch_raw(&serde_json::json!({"type": "TELEPORT", "data": 3})));
        assert!(!store.dispatch_raw(&serde_json::json!({"type": "MOVE_PIECE", "data": "x"})));
        assert!(Rc::ptr_eq(&before, &store.snapshot()));

        assert!(store.dispatch_raw(&serde_json::json!({"type": "INCREMENT_CLOCK"})));
        assert!(!Rc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(store.state().current_time, 1);
    }

    #[test]
    fn test_store_new_game_sequence() {
        let mut store = Store::new(AppState {
            current_time: 99,
            stage: 2,
            should_rand: false,
            is_sorted: false,
            ..AppState::default()
        });

        for action in Action::new_game() {
            store.dispatch(&action);
        }

        let state = store.into_state();
        assert_eq!(state.scene, Scene::Playing);
        assert_eq!(state.stage, 1);
        assert_eq!(state.current_time, 0);
        assert!(state.records.is_empty());
        assert!(state.is_sorted);
    }

    #[test]
    fn test_to_json() {
        let json = AppState::default().to_json();
        assert_eq!(json["scene"], "intro");
        assert_eq!(json["currentTime"], 0);
        assert_eq!(json["shouldRand"], true);
        assert_eq!(json["table"][0], serde_json::json!([0, 1, 2, 3]));
    }
}
