//! Single-slot debounce timer driven by an external clock.
//!
//! # Invariants
//! - At most one task is pending; scheduling replaces it and restarts the
//!   window (debounce, not throttle).
//! - A task is handed out exactly once, by `take_due`, `flush` or never
//!   (after `cancel`).

use crate::clock::to_time_delta;
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone)]
struct PendingTask<P> {
    due_at: DateTime<Utc>,
    payload: P,
}

/// Cancellable deferred task carrying a payload of type `P`.
#[derive(Debug, Clone)]
pub struct Debouncer<P> {
    delay: Duration,
    pending: Option<PendingTask<P>>,
}

impl<P> Debouncer<P> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replaces any pending task with `payload`, due one delay after `now`.
    pub fn schedule(&mut self, now: DateTime<Utc>, payload: P) -> DateTime<Utc> {
        let due_at = now + to_time_delta(self.delay);
        self.pending = Some(PendingTask { due_at, payload });
        due_at
    }

    /// Drops the pending task; returns whether one existed.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Hands out the pending task if its window has elapsed at `now`.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Option<P> {
        let elapsed = self
            .pending
            .as_ref()
            .is_some_and(|task| now >= task.due_at);
        if elapsed {
            self.flush()
        } else {
            None
        }
    }

    /// Hands out the pending task immediately, ignoring its deadline.
    pub fn flush(&mut self) -> Option<P> {
        self.pending.take().map(|task| task.payload)
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|task| task.due_at)
    }

    /// Payload of the pending task, if any.
    pub fn pending(&self) -> Option<&P> {
        self.pending.as_ref().map(|task| &task.payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
