//! Game clock.
//!
//! Emits [`Action::IncrementClock`] at a fixed resolution while the player
//! works on an unsolved board. The controller does not look at the board
//! itself; it stops when [`ClockController::observe`] sees a solved state.

use std::time::Duration;

use tracing::{debug, trace};

use super::store::{Action, AppState};
use super::timer::{TimerHandle, Timers};

/// Repeating tick source for the game clock.
#[derive(Debug)]
pub struct ClockController {
    resolution: Duration,
    timer: Option<TimerHandle>,
}

impl ClockController {
    pub fn new(resolution: Duration) -> Self {
        Self {
            resolution,
            timer: None,
        }
    }

    /// Check if the clock is ticking.
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Check if a fired timer belongs to this controller.
    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
    }

    /// Start ticking. Starting a running clock does nothing.
    pub fn start<T: Timers + ?Sized>(&mut self, timers: &mut T) {
        if self.timer.is_none() {
            self.timer = Some(timers.set_interval(self.resolution));
            debug!(resolution_ms = self.resolution.as_millis() as u64, "clock started");
        }
    }

    /// Stop ticking and release the timer.
    pub fn stop<T: Timers + ?Sized>(&mut self, timers: &mut T) {
        if let Some(timer) = self.timer.take() {
            timers.clear(timer);
            debug!("clock stopped");
        }
    }

    /// Handle a fired timer.
    pub fn on_timer(&mut self, handle: TimerHandle) -> Option<Action> {
        if self.owns(handle) {
            trace!("clock tick");
            Some(Action::IncrementClock)
        } else {
            None
        }
    }

    /// React to a new state: a solved board stops the clock.
    pub fn observe<T: Timers + ?Sized>(&mut self, state: &AppState, timers: &mut T) {
        if state.is_sorted && self.is_running() {
            self.stop(timers);
        }
    }
}

/// Render elapsed ticks as `MM:SS:d`, the live clock face.
pub fn format_clock(ticks: u64, resolution: Duration) -> String {
    let ms = ticks as u128 * resolution.as_millis();
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let tenths = (ms % 1_000) / 100;
    format!("{:02}:{:02}:{}", minutes, seconds, tenths)
}

/// Render a record slot; placeholder rows have no time.
///
/// Placeholders read `00:00.0`, unlike the live clock face.
pub fn format_clock_slot(ticks: Option<u64>, resolution: Duration) -> String {
    match ticks {
        Some(ticks) => format_clock(ticks, resolution),
        None => "00:00.0".to_string(),
    }
}
