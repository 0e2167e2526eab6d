//! Debounced save scheduling.
//!
//! Every mutation pushes the save deadline out by the debounce window;
//! the write fires once the board has been quiet for the full window.
//! Deadlines are evaluated against the injectable [`Clock`](crate::clock::Clock),
//! so tests advance time instead of sleeping.

use std::time::{Duration, Instant};

/// Quiet period after the last mutation before a save fires.
pub const SAVE_DEBOUNCE: Duration = Duration::from_secs(1);

/// Deadline-based debounce scheduler for persistence writes.
#[derive(Debug, Clone, Copy)]
pub struct SaveScheduler {
    debounce: Duration,
    deadline: Option<Instant>,
}

impl SaveScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
        }
    }

    /// Push the deadline out to `now + debounce`. Coalesces with any
    /// already-pending save.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    /// Whether a save is pending (scheduled and not yet taken).
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the pending save's deadline has passed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.map(|d| now >= d).unwrap_or(false)
    }

    /// Consume a due deadline. Returns true exactly once per elapsed
    /// deadline; the caller performs the write. On write failure, call
    /// [`SaveScheduler::schedule`] again to retry on the next cycle.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Drop any pending save.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new(SAVE_DEBOUNCE)
    }
}
