//! Shuffle controller.
//!
//! Scrambles a solved board by walking the empty cell around with random
//! moves. The player first sees the finished picture for a while, then the
//! tiles move one at a time until the move budget is spent.
//!
//! # Phases
//!
//! ```text
//! ┌──────┐  start   ┌──────────┐  delay elapsed  ┌─────────┐  last move  ┌──────┐
//! │ Idle │─────────▶│ Delaying │────────────────▶│ Running │────────────▶│ Done │
//! └──┬───┘          └────┬─────┘                 └────┬────┘             └──────┘
//!    │ cancel            │ cancel                     │ cancel
//!    ▼                   ▼                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Cancelled                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`ShuffleSession`] is the pure part: phases, counters and move selection.
//! [`ShuffleController`] ties a session to timers and turns each step into
//! actions for the store.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use super::board::Position;
use super::config::Timing;
use super::store::Action;
use super::timer::{TimerHandle, Timers};

/// Direction the empty cell travels in one shuffle move.
///
/// The tile on the far side slides into the empty cell. Index order is
/// right, down, left, up, so opposite directions are two indices apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Right => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Up => 3,
        }
    }

    pub fn from_index(index: usize) -> Direction {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Column and row offset.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Up => (0, -1),
        }
    }

    pub fn opposite(self) -> Direction {
        Self::from_index(self.index() + 2)
    }
}

/// Shuffle lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShufflePhase {
    #[default]
    Idle,
    Delaying,
    Running,
    Done,
    Cancelled,
}

impl ShufflePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Delaying => "delaying",
            Self::Running => "running",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Check if the shuffle still owns the board.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Delaying | Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl fmt::Display for ShufflePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleEvent {
    Start,
    DelayElapsed,
    Step,
    Cancel,
}

/// Error when a phase transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid shuffle transition from {from} via {event:?}: {reason}")]
pub struct InvalidTransition {
    pub from: ShufflePhase,
    pub event: ShuffleEvent,
    pub reason: &'static str,
}

/// One generated move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleMove {
    /// Tile to slide into the empty cell
    pub piece: Position,

    /// Direction the empty cell travelled
    pub direction: Direction,

    /// This was the last move of the shuffle
    pub finished: bool,
}

/// Pure shuffle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleSession {
    pub phase: ShufflePhase,

    /// Moves made so far
    pub move_counter: u32,

    /// Moves to make in total
    pub counter_limit: u32,

    /// Where the empty cell currently is
    pub empty_cell: Position,

    /// Direction of the previous move
    pub last_direction: Option<Direction>,

    /// Direction the next move may not take
    pub opposite: Direction,
}

impl ShuffleSession {
    /// Create an idle session for a board whose empty cell is at `empty_cell`.
    ///
    /// No move has been made yet, so only [`Direction::Right`] is excluded
    /// from the first pick.
    pub fn new(empty_cell: Position, counter_limit: u32) -> Self {
        Self {
            phase: ShufflePhase::Idle,
            move_counter: 0,
            counter_limit,
            empty_cell,
            last_direction: None,
            opposite: Direction::Right,
        }
    }

    /// Apply a phase event, returning the new session or an error.
    pub fn apply(&self, event: ShuffleEvent) -> Result<Self, InvalidTransition> {
        let phase = self.transition(event)?;
        Ok(Self {
            phase,
            ..self.clone()
        })
    }

    /// Calculate the new phase for an event.
    fn transition(&self, event: ShuffleEvent) -> Result<ShufflePhase, InvalidTransition> {
        use ShuffleEvent::*;
        use ShufflePhase::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: self.phase,
            event,
            reason,
        };

        match (self.phase, event) {
            (Idle, Start) => Ok(Delaying),
            (_, Start) => Err(invalid("Shuffle already started")),

            (Delaying, DelayElapsed) => Ok(Running),
            (_, DelayElapsed) => Err(invalid("Not waiting for the delay")),

            (Running, Step) if self.move_counter + 1 >= self.counter_limit => Ok(Done),
            (Running, Step) => Ok(Running),
            (_, Step) => Err(invalid("Shuffle is not running")),

            (Idle | Delaying | Running, Cancel) => Ok(Cancelled),
            (_, Cancel) => Err(invalid("Shuffle already ended")),
        }
    }

    /// Make one random move.
    ///
    /// Picks a direction other than the reverse of the previous move, re-picking
    /// until the target lies on the board, then moves the empty cell there.
    pub fn step<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(ShuffleSession, ShuffleMove), InvalidTransition> {
        let phase = self.transition(ShuffleEvent::Step)?;

        let (direction, piece) = loop {
            let direction = Direction::from_index(rng.gen_range(0..Direction::ALL.len()));
            if direction == self.opposite {
                continue;
            }
            let (dx, dy) = direction.delta();
            if let Some(piece) = self.empty_cell.offset(dx, dy) {
                break (direction, piece);
            }
        };

        let next = ShuffleSession {
            phase,
            move_counter: self.move_counter + 1,
            counter_limit: self.counter_limit,
            empty_cell: piece,
            last_direction: Some(direction),
            opposite: direction.opposite(),
        };
        let mv = ShuffleMove {
            piece,
            direction,
            finished: phase == ShufflePhase::Done,
        };
        Ok((next, mv))
    }
}

/// What the progress bar should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuffleStep {
    Delay,
    Randomizing,
    Playing,
}

/// Progress hint for the playing screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleProgress {
    pub step: ShuffleStep,

    /// How long the current step takes to fill
    pub duration: Duration,
}

/// Drives a [`ShuffleSession`] from timers.
#[derive(Debug)]
pub struct ShuffleController<R> {
    session: ShuffleSession,
    timing: Timing,
    rng: R,
    delay_timer: Option<TimerHandle>,
    run_timer: Option<TimerHandle>,
}

impl<R: Rng> ShuffleController<R> {
    pub fn new(empty_cell: Position, timing: Timing, rng: R) -> Self {
        Self {
            session: ShuffleSession::new(empty_cell, timing.counter_limit),
            timing,
            rng,
            delay_timer: None,
            run_timer: None,
        }
    }

    pub fn session(&self) -> &ShuffleSession {
        &self.session
    }

    pub fn phase(&self) -> ShufflePhase {
        self.session.phase
    }

    /// Check if the shuffle still owns the board.
    pub fn is_pending(&self) -> bool {
        self.session.phase.is_pending()
    }

    /// Check if a fired timer belongs to this controller.
    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.delay_timer == Some(handle) || self.run_timer == Some(handle)
    }

    /// Begin the pre-shuffle delay.
    pub fn start<T: Timers + ?Sized>(&mut self, timers: &mut T) -> Result<(), InvalidTransition> {
        self.session = self.session.apply(ShuffleEvent::Start)?;
        self.delay_timer = Some(timers.set_timeout(self.timing.rand_delay));
        debug!(phase = %self.session.phase, "shuffle started");
        Ok(())
    }

    /// Handle a fired timer, returning the actions to dispatch.
    ///
    /// Handles this controller does not own produce nothing.
    pub fn on_timer<T: Timers + ?Sized>(
        &mut self,
        handle: TimerHandle,
        timers: &mut T,
    ) -> Vec<Action> {
        if self.delay_timer == Some(handle) {
            self.delay_timer = None;
            match self.session.apply(ShuffleEvent::DelayElapsed) {
                Ok(session) => {
                    self.session = session;
                    self.run_timer = Some(timers.set_interval(self.timing.move_speed));
                    debug!(phase = %self.session.phase, "shuffle running");
                }
                Err(e) => debug!(error = %e, "stale shuffle delay"),
            }
            return Vec::new();
        }

        if self.run_timer != Some(handle) {
            return Vec::new();
        }

        let (session, mv) = match self.session.step(&mut self.rng) {
            Ok(step) => step,
            Err(e) => {
                debug!(error = %e, "stale shuffle tick");
                return Vec::new();
            }
        };
        self.session = session;
        trace!(
            piece = %mv.piece,
            direction = ?mv.direction,
            counter = self.session.move_counter,
            "shuffle move"
        );

        let mut actions = vec![Action::MovePiece(mv.piece)];
        if mv.finished {
            if let Some(run) = self.run_timer.take() {
                timers.clear(run);
            }
            debug!(moves = self.session.move_counter, "shuffle done");
            actions.push(Action::EndRand);
        }
        actions
    }

    /// Stop the shuffle and release its timers.
    ///
    /// No moves are produced after this returns.
    pub fn cancel<T: Timers + ?Sized>(&mut self, timers: &mut T) {
        if let Some(delay) = self.delay_timer.take() {
            timers.clear(delay);
        }
        if let Some(run) = self.run_timer.take() {
            timers.clear(run);
        }
        if let Ok(session) = self.session.apply(ShuffleEvent::Cancel) {
            debug!(counter = session.move_counter, "shuffle cancelled");
            self.session = session;
        }
    }

    /// Progress hint for the current phase.
    pub fn progress(&self) -> ShuffleProgress {
        match self.session.phase {
            ShufflePhase::Delaying => ShuffleProgress {
                step: ShuffleStep::Delay,
                duration: self.timing.rand_delay,
            },
            ShufflePhase::Running => ShuffleProgress {
                step: ShuffleStep::Randomizing,
                duration: self.timing.shuffle_duration(),
            },
            _ => ShuffleProgress {
                step: ShuffleStep::Playing,
                duration: self.timing.rand_delay,
            },
        }
    }
}
