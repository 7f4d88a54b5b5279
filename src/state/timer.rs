//! Timer scheduling.
//!
//! Controllers never own a clock. They ask a [`Timers`] implementation for
//! one-shot or repeating timers, keep the returned [`TimerHandle`], and are
//! handed that handle back when it fires. Every timer a controller starts is
//! released through [`Timers::clear`] when the controller stops.
//!
//! [`ManualTimers`] is a virtual-time implementation: nothing fires until the
//! owner pulls due timers with [`ManualTimers::fire_next`]. Hosts with a real
//! event loop implement [`Timers`] over their own scheduler.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tracing::trace;

/// Shortest allowed interval period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Opaque timer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Scheduling capability used by the controllers.
pub trait Timers {
    /// Fire once after `delay`.
    fn set_timeout(&mut self, delay: Duration) -> TimerHandle;

    /// Fire every `period` until cleared.
    fn set_interval(&mut self, period: Duration) -> TimerHandle;

    /// Cancel a timer. Clearing an unknown or already-fired handle is a no-op.
    fn clear(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone, Copy)]
struct ScheduledTimer {
    deadline: Duration,
    period: Option<Duration>,
}

/// Virtual-time timers.
///
/// Time only moves when due timers are pulled. Timers with equal deadlines
/// fire in creation order.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now: Duration,
    next_id: u64,
    scheduled: BTreeMap<TimerHandle, ScheduledTimer>,
    cancelled: Vec<TimerHandle>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Check if a timer is still scheduled.
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.scheduled.contains_key(&handle)
    }

    /// Count scheduled timers.
    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    /// Timers cancelled while still scheduled, in cancellation order.
    pub fn cancelled(&self) -> &[TimerHandle] {
        &self.cancelled
    }

    /// Pop the earliest timer due at or before `until`.
    ///
    /// Virtual time jumps to that timer's deadline. Repeating timers are
    /// rescheduled one period later. Returns `None` once nothing else is due,
    /// leaving the clock where the last timer fired.
    pub fn fire_next(&mut self, until: Duration) -> Option<TimerHandle> {
        let (handle, timer) = self
            .scheduled
            .iter()
            .filter(|(_, t)| t.deadline <= until)
            .min_by_key(|(handle, t)| (t.deadline, **handle))
            .map(|(handle, t)| (*handle, *t))?;

        self.now = timer.deadline;
        match timer.period {
            Some(period) => {
                if let Some(entry) = self.scheduled.get_mut(&handle) {
                    entry.deadline = timer.deadline + period;
                }
            }
            None => {
                self.scheduled.remove(&handle);
            }
        }

        trace!(%handle, now_ms = self.now.as_millis() as u64, "timer fired");
        Some(handle)
    }

    /// Move the clock forward to `until` without firing anything.
    pub fn settle(&mut self, until: Duration) {
        if until > self.now {
            self.now = until;
        }
    }

    fn schedule(&mut self, delay: Duration, period: Option<Duration>) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.scheduled.insert(
            handle,
            ScheduledTimer {
                deadline: self.now + delay,
                period,
            },
        );
        handle
    }
}

impl Timers for ManualTimers {
    fn set_timeout(&mut self, delay: Duration) -> TimerHandle {
        let handle = self.schedule(delay, None);
        trace!(%handle, delay_ms = delay.as_millis() as u64, "timeout set");
        handle
    }

    fn set_interval(&mut self, period: Duration) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        let handle = self.schedule(period, Some(period));
        trace!(%handle, period_ms = period.as_millis() as u64, "interval set");
        handle
    }

    fn clear(&mut self, handle: TimerHandle) {
        if self.scheduled.remove(&handle).is_some() {
            trace!(%handle, "timer cleared");
            self.cancelled.push(handle);
        }
    }
}
