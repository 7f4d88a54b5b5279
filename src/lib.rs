//! Magic Square State Library
//!
//! This crate provides the state core of Magic Square, a 4x4 sliding-tile
//! puzzle with an introduction, a playing and a records screen.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Board Model** - The tile grid, move validation and solved detection.
//!
//! - **Record Ledger** - The nine best completion times, fastest first, with
//!   pending name entry.
//!
//! - **Store & Reducer** - One owned application state, changed only by a pure
//!   reducer over seven actions.
//!
//! - **Shuffle & Clock Controllers** - Timer-driven scrambling before play and
//!   the game clock during play.
//!
//! - **Persistence** - The whole state as one JSON string in key-value storage.
//!
//! # Design Principles
//!
//! 1. **One writer** - Only the reducer produces new states; controllers emit
//!    actions and never touch the state directly.
//!
//! 2. **Invalid input is a no-op** - Illegal moves, unknown record indices and
//!    unrecognized actions leave the state as it was.
//!
//! 3. **Explicit timers** - Controllers hold timer handles and release them on
//!    teardown; nothing fires after a screen is gone.
//!
//! 4. **No rendering** - This crate is pure state, no DOM or drawing.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use magic_square_state::state::{
//!     Action, Game, GameConfig, ManualTimers, MemoryStorage, Scene,
//! };
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut game = Game::open(
//!     MemoryStorage::new(),
//!     ManualTimers::new(),
//!     GameConfig::default(),
//!     StdRng::seed_from_u64(7),
//! );
//!
//! // Entering the playing screen shows the picture, then shuffles it
//! game.dispatch(&Action::ChangeScene(Scene::Playing));
//! game.advance(Duration::from_secs(30));
//! assert!(!game.state().should_rand);
//!
//! // Persist on the way out
//! let storage = game.close().unwrap();
//! # let _ = storage;
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
