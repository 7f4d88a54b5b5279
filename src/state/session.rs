//! Playing-screen session.
//!
//! Owns the shuffle and clock controllers while the playing screen is
//! mounted. Fired timers are routed to whichever controller owns them and
//! the resulting actions go straight into the [`Store`]. Unmounting cancels
//! every outstanding timer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::board::Position;
use super::clock::ClockController;
use super::config::Timing;
use super::shuffle::{ShuffleController, ShuffleProgress, ShuffleStep};
use super::store::{Action, AppState, Store};
use super::timer::{TimerHandle, Timers};

/// Controllers for one mount of the playing screen.
#[derive(Debug)]
pub struct PlayingSession<R> {
    timing: Timing,
    rng: R,
    shuffle: Option<ShuffleController<StdRng>>,
    clock: ClockController,
    /// Stage the controllers were prepared for
    stage: u32,
}

impl<R: Rng> PlayingSession<R> {
    /// Mount the screen: shuffle if the board needs it, otherwise resume the
    /// clock on an unsolved board.
    pub fn mount<T: Timers + ?Sized>(
        state: &AppState,
        timing: Timing,
        rng: R,
        timers: &mut T,
    ) -> Self {
        let mut session = Self {
            timing,
            rng,
            shuffle: None,
            clock: ClockController::new(timing.clock_resolution),
            stage: state.stage,
        };
        debug!(stage = state.stage, should_rand = state.should_rand, "playing session mounted");
        session.prepare(state, timers);
        session
    }

    fn prepare<T: Timers + ?Sized>(&mut self, state: &AppState, timers: &mut T) {
        if state.should_rand {
            let rng = StdRng::seed_from_u64(self.rng.gen());
            let mut shuffle = ShuffleController::new(state.table.empty_cell(), self.timing, rng);
            if let Err(e) = shuffle.start(timers) {
                debug!(error = %e, "shuffle not started");
            }
            self.shuffle = Some(shuffle);
        } else if !state.is_sorted {
            self.clock.start(timers);
        }
    }

    /// Check if a shuffle is still waiting or moving tiles.
    pub fn is_shuffling(&self) -> bool {
        self.shuffle.as_ref().is_some_and(|s| s.is_pending())
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Progress hint for the shuffle bar.
    pub fn progress(&self) -> ShuffleProgress {
        match &self.shuffle {
            Some(shuffle) => shuffle.progress(),
            None => ShuffleProgress {
                step: ShuffleStep::Playing,
                duration: self.timing.rand_delay,
            },
        }
    }

    /// Check if a tile click should reach the store.
    pub fn accepts_click(&self, state: &AppState) -> bool {
        state.is_playable() && !self.is_shuffling()
    }

    /// Turn a tile click into an action, if clicks are accepted right now.
    pub fn click(&self, state: &AppState, position: Position) -> Option<Action> {
        self.accepts_click(state).then_some(Action::MovePiece(position))
    }

    /// Route a fired timer and dispatch what it produces.
    ///
    /// Returns `false` for handles this session does not own.
    pub fn on_timer<T: Timers + ?Sized>(
        &mut self,
        handle: TimerHandle,
        store: &mut Store,
        timers: &mut T,
    ) -> bool {
        let actions = if let Some(shuffle) = self.shuffle.as_mut().filter(|s| s.owns(handle)) {
            shuffle.on_timer(handle, timers)
        } else if let Some(action) = self.clock.on_timer(handle) {
            vec![action]
        } else {
            return false;
        };

        for action in &actions {
            store.dispatch(action);
            if *action == Action::EndRand {
                self.clock.start(timers);
            }
        }
        self.observe(store.state(), timers);
        true
    }

    /// React to a state change made outside the session.
    ///
    /// A solved board stops the clock; a new stage reshuffles.
    pub fn observe<T: Timers + ?Sized>(&mut self, state: &AppState, timers: &mut T) {
        self.clock.observe(state, timers);

        if state.stage != self.stage {
            debug!(from = self.stage, to = state.stage, "stage changed");
            self.stage = state.stage;
            if let Some(mut shuffle) = self.shuffle.take() {
                shuffle.cancel(timers);
            }
            self.prepare(state, timers);
        }
    }

    /// Tear down the screen, cancelling every outstanding timer.
    pub fn unmount<T: Timers + ?Sized>(mut self, timers: &mut T) {
        if let Some(mut shuffle) = self.shuffle.take() {
            shuffle.cancel(timers);
        }
        self.clock.stop(timers);
        debug!(stage = self.stage, "playing session unmounted");
    }
}
