//! Corkboard Core Library
//!
//! Platform-agnostic interaction and state engine for the Corkboard
//! sticky-note whiteboard: coordinate transforms, selection, drag/resize,
//! alignment snapping, grouping, snapshot history, generated-note
//! placement, and recency-window sync arbitration.

pub mod align;
pub mod board;
pub mod camera;
pub mod clock;
pub mod drag;
pub mod engine;
pub mod history;
pub mod input;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod storage;
pub mod suggest;
pub mod sync;

pub use align::{AlignmentGuide, GuideAxis, GUIDE_MARGIN, SNAP_THRESHOLD};
pub use board::BoardData;
pub use camera::{Camera, PinchState, ViewportState, MAX_ZOOM, MIN_ZOOM};
pub use clock::{Clock, ManualClock, SystemClock};
pub use drag::{Gesture, HandleKind, DRAG_THRESHOLD, MAX_OBJECT_SIZE, MIN_OBJECT_SIZE};
pub use engine::{Engine, ToolKind, PINCH_MIN_INTERVAL};
pub use history::{History, MAX_HISTORY};
pub use input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::{InteractionManager, ObjectState};
pub use model::{Edge, Group, Image, Note, ObjectId, SerializableColor};
pub use storage::{MemoryStorage, PersistedEnvelope, SaveScheduler, Storage, StorageError};
pub use suggest::{SuggestError, Suggestion, SuggestionProvider, SuggestionRequest};
pub use sync::{
    ArbitrationOutcome, PollTimer, RemoteSync, SyncArbiter, SyncError, SyncStatus,
    DEFAULT_CONFLICT_WINDOW, POLL_INTERVAL,
};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
