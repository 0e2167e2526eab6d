//! Storage abstraction for persistence.

mod memory;
mod scheduler;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;
pub use scheduler::{SaveScheduler, SAVE_DEBOUNCE};

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::board::BoardData;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Version tag written into every persisted envelope.
pub const ENVELOPE_VERSION: &str = "corkboard/1";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with single-threaded
/// executors).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Versioned wrapper written to and read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEnvelope {
    pub version: String,
    /// Milliseconds since the Unix epoch at save time.
    pub timestamp: u64,
    pub data: BoardData,
}

impl PersistedEnvelope {
    pub fn new(data: BoardData, timestamp: u64) -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            timestamp,
            data,
        }
    }

    pub fn is_current_version(&self) -> bool {
        self.version == ENVELOPE_VERSION
    }

    /// Unwrap the board, treating a version mismatch as "no usable data"
    /// rather than a failure.
    pub fn into_current_data(self) -> Option<BoardData> {
        if self.is_current_version() {
            Some(self.data)
        } else {
            log::warn!(
                "ignoring persisted data with version {:?} (expected {ENVELOPE_VERSION:?})",
                self.version
            );
            None
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Trait for board storage backends.
///
/// Implementations can store envelopes in memory, on the filesystem, or
/// behind a remote service. A missing project id loads as `Ok(None)`
/// rather than an error, and deleting a missing id is a no-op.
pub trait Storage: Send + Sync {
    /// Save an envelope under a project id.
    fn save(&self, id: &str, envelope: &PersistedEnvelope) -> BoxFuture<'_, StorageResult<()>>;

    /// Load the envelope for a project id, if one exists.
    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Option<PersistedEnvelope>>>;

    /// Delete a project's envelope.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// List all stored project ids.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    /// Check whether a project id exists.
    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    // Simple blocking executor for tests
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}
