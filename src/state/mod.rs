//! State management module for Magic Square.
//!
//! This module provides the core state types and controllers:
//!
//! - `board` - 4x4 tile grid, moves and solved detection
//! - `records` - Bounded high-score ledger
//! - `store` - Application state, actions and the reducer
//! - `shuffle` - Randomized pre-game scrambling
//! - `clock` - Game clock ticks and formatting
//! - `timer` - Timer handles and virtual-time scheduling
//! - `session` - Controllers for one mount of the playing screen
//! - `persistence` - Snapshot load/save over key-value storage
//! - `config` - Timing and storage settings
//! - `game` - Driver tying all of the above to a host
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                                Game                                   │
//! │                                                                       │
//! │  KeyValueStorage ──load──▶ ┌──────────────────────┐ ──save──▶ storage │
//! │                            │        Store         │                   │
//! │   host actions ──────────▶ │  Rc<AppState>        │                   │
//! │                            │  reduce(state, act)  │                   │
//! │                            └──────────▲───────────┘                   │
//! │                                       │ MovePiece / EndRand /         │
//! │                                       │ IncrementClock                │
//! │  ┌────────────────────────────────────┴───────────────────────────┐  │
//! │  │                  PlayingSession (scene == playing)              │  │
//! │  │                                                                 │  │
//! │  │   ShuffleController                 ClockController             │  │
//! │  │   Idle ▶ Delaying ▶ Running ▶ Done  tick every resolution       │  │
//! │  └────────────────────────────▲────────────────────────────────────┘  │
//! │                               │ TimerHandle                           │
//! │                            Timers                                     │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use magic_square_state::state::{reduce, Action, AppState, Position, Scene};
//!
//! let state = AppState::new();
//! let state = reduce(&state, &Action::ChangeScene(Scene::Playing));
//! let state = reduce(&state, &Action::EndRand);
//! let state = reduce(&state, &Action::MovePiece(Position::new(3, 2)));
//! assert!(!state.is_sorted);
//! ```

pub mod board;
pub mod clock;
pub mod config;
pub mod game;
pub mod persistence;
pub mod records;
pub mod session;
pub mod shuffle;
pub mod store;
pub mod timer;

// Re-export commonly used types
pub use board::{Board, BoardError, Position, BOARD_SIZE, CELL_COUNT, VOID_CELL};
pub use clock::{format_clock, format_clock_slot, ClockController};
pub use config::{ConfigError, GameConfig, Timing};
pub use game::Game;
pub use persistence::{
    decode_state, encode_state, load_state, normalize, save_state, KeyValueStorage,
    MemoryStorage, PersistenceError,
};
pub use records::{Record, RecordLedger, MAX_PLAYER_NAME, MAX_RECORDS};
pub use session::PlayingSession;
pub use shuffle::{
    Direction, InvalidTransition, ShuffleController, ShuffleEvent, ShuffleMove, ShufflePhase,
    ShuffleProgress, ShuffleSession, ShuffleStep,
};
pub use store::{reduce, reduce_at, Action, AppState, Scene, Store, FINAL_STAGE};
pub use timer::{ManualTimers, TimerHandle, Timers};
