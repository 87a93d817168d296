//! Scoped timer handles polled by the event loop.
//!
//! Nothing here runs on its own: the owner asks each handle whether it is due
//! on every loop iteration. A handle that is cancelled or dropped is simply
//! never asked again, which is all the cancellation there is.

use std::time::{Duration, Instant};

/// Fixed-period repeating timer.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    next: Option<Instant>,
}

impl Interval {
    /// Starts the interval; the first tick is due immediately.
    pub fn start(period: Duration, now: Instant) -> Self {
        Self { period, next: Some(now) }
    }

    /// Returns true when a tick is due and schedules the following one.
    /// Missed ticks are not replayed: a stalled loop fires once and then
    /// resumes on the period from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next {
            Some(due) if now >= due => {
                let next = due + self.period;
                self.next = Some(if next <= now { now + self.period } else { next });
                true
            }
            _ => false,
        }
    }
}

/// Per-frame callback registration. While running, the owner advances its
/// animation once per loop iteration.
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    running: bool,
}

impl FrameLoop {
    pub fn request(&mut self) {
        self.running = true;
    }

    pub fn cancel(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True when the owner should draw another frame.
    pub fn poll(&self) -> bool {
        self.running
    }
}

/// One-shot delayed callback.
#[derive(Debug, Clone, Default)]
pub struct Timeout {
    deadline: Option<Instant>,
}

impl Timeout {
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Time left before the deadline, for animations keyed to it.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    /// Fires at most once per schedule.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
