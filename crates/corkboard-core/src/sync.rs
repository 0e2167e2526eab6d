//! Remote synchronization: status tracking, polling cadence, and the
//! recency-window arbitration between local and remote state.
//!
//! There is no merge protocol here. A remote snapshot either replaces the
//! local board wholesale or is discarded; the only rule is that recent
//! local edits win. The transport itself lives behind [`RemoteSync`].

use crate::board::BoardData;
use crate::storage::PersistedEnvelope;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often the remote collaborator is polled for updates.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default trailing window after a local edit during which remote
/// snapshots are discarded. A tunable heuristic, not a correctness bound.
pub const DEFAULT_CONFLICT_WINDOW: Duration = Duration::from_secs(10);

/// Errors at the sync transport boundary.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Remote sync collaborator. Push/pull of whole-board envelopes; the
/// delivery mechanism (HTTP, websocket relay, ...) is the implementor's
/// concern.
pub trait RemoteSync {
    fn push(
        &mut self,
        user_id: &str,
        project_id: &str,
        envelope: &PersistedEnvelope,
    ) -> Result<(), SyncError>;

    fn pull(&mut self, project_id: &str) -> Result<Option<PersistedEnvelope>, SyncError>;
}

/// Explicit sync status service object with an init/reset lifecycle.
/// Passed by reference into the engine; never an ambient global.
#[derive(Debug, Clone, Default)]
pub struct SyncStatus {
    last_local_change: Option<Instant>,
    last_synced: Option<Instant>,
    last_error: Option<(Instant, String)>,
}

impl SyncStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all recorded activity (e.g. when switching projects).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Stamp a local mutation.
    pub fn mark_local_change(&mut self, now: Instant) {
        self.last_local_change = Some(now);
    }

    pub fn mark_synced(&mut self, now: Instant) {
        self.last_synced = Some(now);
        self.last_error = None;
    }

    /// Record a boundary failure; retried on the next cycle.
    pub fn record_error(&mut self, now: Instant, message: impl Into<String>) {
        let message = message.into();
        log::error!("sync/persistence failure: {message}");
        self.last_error = Some((now, message));
    }

    pub fn last_local_change(&self) -> Option<Instant> {
        self.last_local_change
    }

    pub fn last_synced(&self) -> Option<Instant> {
        self.last_synced
    }

    pub fn last_error(&self) -> Option<(Instant, &str)> {
        self.last_error.as_ref().map(|(at, msg)| (*at, msg.as_str()))
    }

    /// Whether a local edit happened within the trailing window.
    pub fn locally_changed_within(&self, window: Duration, now: Instant) -> bool {
        self.last_local_change
            .map(|at| now.saturating_duration_since(at) <= window)
            .unwrap_or(false)
    }
}

/// What the arbiter decided about an incoming remote snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbitrationOutcome {
    /// Remote equals local; nothing to do.
    Identical,
    /// A local edit is more recent than the window; remote discarded.
    DiscardedRecentLocal,
    /// Remote should replace the local board.
    Adopt,
}

/// Recency-window arbitration between local and remote board state.
#[derive(Debug, Clone, Copy)]
pub struct SyncArbiter {
    window: Duration,
}

impl Default for SyncArbiter {
    fn default() -> Self {
        Self::new(DEFAULT_CONFLICT_WINDOW)
    }
}

impl SyncArbiter {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide whether a remote snapshot should be adopted.
    pub fn arbitrate(
        &self,
        status: &SyncStatus,
        local: &BoardData,
        remote: &BoardData,
        now: Instant,
    ) -> ArbitrationOutcome {
        if local == remote {
            return ArbitrationOutcome::Identical;
        }
        if status.locally_changed_within(self.window, now) {
            log::warn!("discarding remote snapshot: local edits within conflict window");
            return ArbitrationOutcome::DiscardedRecentLocal;
        }
        ArbitrationOutcome::Adopt
    }
}

/// Fixed-interval timer driving the pull cycle.
#[derive(Debug, Clone, Copy)]
pub struct PollTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl PollTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True (and re-arms) when a poll is due.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}
