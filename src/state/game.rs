//! Game driver.
//!
//! Ties the pieces together for a host: loads the persisted state on open,
//! mounts and unmounts the playing session as the scene changes, routes
//! timers, and persists the final state on close.

use std::rc::Rc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::board::Position;
use super::config::GameConfig;
use super::persistence::{load_state, save_state, KeyValueStorage, PersistenceError};
use super::session::PlayingSession;
use super::store::{Action, AppState, Scene, Store};
use super::timer::{ManualTimers, TimerHandle, Timers};

/// A running game bound to its storage and timers.
#[derive(Debug)]
pub struct Game<S, T> {
    config: GameConfig,
    storage: S,
    timers: T,
    rng: StdRng,
    store: Store,
    session: Option<PlayingSession<StdRng>>,
}

impl<S: KeyValueStorage, T: Timers> Game<S, T> {
    /// Start from the persisted state, or defaults if there is none.
    pub fn open(storage: S, timers: T, config: GameConfig, rng: StdRng) -> Self {
        let state = load_state(&storage, &config.storage_key);
        debug!(scene = %state.scene, stage = state.stage, "game opened");

        let mut game = Self {
            config,
            storage,
            timers,
            rng,
            store: Store::new(state),
            session: None,
        };
        game.sync_scene();
        game
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn snapshot(&self) -> Rc<AppState> {
        self.store.snapshot()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&PlayingSession<StdRng>> {
        self.session.as_ref()
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Apply an action. Returns whether the state changed.
    pub fn dispatch(&mut self, action: &Action) -> bool {
        let changed = self.store.dispatch(action);
        self.sync_scene();
        changed
    }

    /// Apply a JSON action payload; unrecognized payloads are ignored.
    pub fn dispatch_raw(&mut self, payload: &serde_json::Value) -> bool {
        let changed = self.store.dispatch_raw(payload);
        self.sync_scene();
        changed
    }

    /// Handle a tile click. Ignored while shuffling or once solved.
    pub fn click(&mut self, position: Position) -> bool {
        let action = self
            .session
            .as_ref()
            .and_then(|session| session.click(self.store.state(), position));
        match action {
            Some(action) => self.dispatch(&action),
            None => false,
        }
    }

    /// Route a fired timer to the playing session.
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        let handled = match self.session.as_mut() {
            Some(session) => session.on_timer(handle, &mut self.store, &mut self.timers),
            None => false,
        };
        self.sync_scene();
        handled
    }

    /// Mount or unmount the playing session to match the scene.
    fn sync_scene(&mut self) {
        let playing = self.store.state().scene == Scene::Playing;
        match (playing, self.session.take()) {
            (true, None) => {
                let rng = StdRng::seed_from_u64(self.rng.gen());
                self.session = Some(PlayingSession::mount(
                    self.store.state(),
                    self.config.timing,
                    rng,
                    &mut self.timers,
                ));
            }
            (true, Some(mut session)) => {
                session.observe(self.store.state(), &mut self.timers);
                self.session = Some(session);
            }
            (false, Some(session)) => session.unmount(&mut self.timers),
            (false, None) => {}
        }
    }

    /// Tear down timers and persist the final state.
    ///
    /// Returns the storage so the host can reuse it.
    pub fn close(mut self) -> Result<S, PersistenceError> {
        if let Some(session) = self.session.take() {
            session.unmount(&mut self.timers);
        }
        save_state(&mut self.storage, &self.config.storage_key, self.store.state())?;
        debug!("game closed");
        Ok(self.storage)
    }
}

impl<S: KeyValueStorage> Game<S, ManualTimers> {
    /// Let virtual time pass, firing every timer that comes due.
    pub fn advance(&mut self, by: Duration) {
        let until = self.timers.now() + by;
        while let Some(handle) = self.timers.fire_next(until) {
            self.on_timer(handle);
        }
        self.timers.settle(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::persistence::MemoryStorage;
    use pretty_assertions::assert_eq;

    fn open(storage: MemoryStorage) -> Game<MemoryStorage, ManualTimers> {
        Game::open(
            storage,
            ManualTimers::new(),
            GameConfig::default(),
            StdRng::seed_from_u64(21),
        )
    }

    #[test]
    fn test_open_defaults() {
        let game = open(MemoryStorage::new());
        assert_eq!(*game.state(), AppState::default());
        assert!(game.session().is_none());
    }

    #[test]
    fn test_scene_changes_mount_and_unmount() {
        let mut game = open(MemoryStorage::new());

        game.dispatch(&Action::ChangeScene(Scene::Playing));
        assert!(game.session().is_some_and(|s| s.is_shuffling()));
        assert_eq!(game.timers().pending(), 1);

        game.advance(Duration::from_millis(6000));
        assert!(game.state().should_rand);

        game.dispatch(&Action::ChangeScene(Scene::Intro));
        assert!(game.session().is_none());
        assert_eq!(game.timers().pending(), 0);

        // Leaving mid-shuffle resets the board when coming back
        game.dispatch(&Action::ChangeScene(Scene::Playing));
        assert!(game.state().table.is_solved());
        assert!(game.state().is_sorted);
    }

    #[test]
    fn test_clicks_ignored_while_shuffling() {
        let mut game = open(MemoryStorage::new());
        game.dispatch(&Action::ChangeScene(Scene::Playing));
        assert!(!game.click(Position::new(3, 2)));
        assert!(game.state().table.is_solved());
    }

    #[test]
    fn test_close_persists() {
        let mut game = open(MemoryStorage::new());
        game.dispatch(&Action::ChangeScene(Scene::Records));
        let storage = game.close().unwrap();

        let reopened = open(storage);
        assert_eq!(reopened.state().scene, Scene::Records);
    }
}
