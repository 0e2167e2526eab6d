//! Injectable clock so time-dependent behavior (debounced saves, the
//! conflict window, pinch rate-limiting) is deterministic under test.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic instant for intervals and deadlines.
    fn now(&self) -> Instant;

    /// Milliseconds since the Unix epoch, for persisted timestamps.
    fn epoch_millis(&self) -> u64;
}

/// Production clock backed by the system time sources.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Test clock that only moves when advanced.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    epoch_base: u64,
    offset_millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            epoch_base: 1_700_000_000_000,
            offset_millis: AtomicU64::new(0),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.offset_millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.offset()
    }

    fn epoch_millis(&self) -> u64 {
        self.epoch_base + self.offset_millis.load(Ordering::SeqCst)
    }
}
