//! Snapshot-based undo/redo over the whole board state.
//!
//! The stack holds deep copies of [`BoardData`] taken *before* each
//! mutation, bounded to [`MAX_HISTORY`] checkpoints with the oldest dropped
//! silently. A cursor walks the stack on undo/redo; it is clamped at both
//! ends, so undoing past the oldest retained snapshot is a no-op rather
//! than an error.

use crate::board::BoardData;

/// Maximum number of checkpoints to keep.
pub const MAX_HISTORY: usize = 50;

/// Undo/redo stack.
///
/// The cursor normally sits one past the last checkpoint ("live edge").
/// The first undo records the live state at the top of the stack so a
/// redo chain can return to it; undo and redo otherwise only move the
/// cursor and install the snapshot at the new position.
#[derive(Debug, Clone, Default)]
pub struct History {
    snapshots: Vec<BoardData>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pre-mutation state. Call before applying any mutating
    /// action. Discards any redo tail beyond the cursor.
    pub fn checkpoint(&mut self, pre_state: &BoardData) {
        if self.cursor < self.snapshots.len() {
            // Mid-history after undos: drop the redo tail. The snapshot at
            // the cursor already equals the pre-state being checkpointed.
            self.snapshots.truncate(self.cursor + 1);
        } else {
            self.snapshots.push(pre_state.clone());
            if self.snapshots.len() > MAX_HISTORY {
                self.snapshots.remove(0);
            }
        }
        self.cursor = self.snapshots.len();
    }

    /// Step back one snapshot, installing it as the live state.
    /// Returns false (leaving `live` untouched) at the bottom of the stack.
    pub fn undo(&mut self, live: &mut BoardData) -> bool {
        if self.cursor == 0 {
            return false;
        }
        if self.cursor == self.snapshots.len() {
            // Leaving the live edge: retain the live state so redo can
            // come back to it. This is not a checkpoint and is not
            // counted against MAX_HISTORY.
            self.snapshots.push(live.clone());
        }
        self.cursor -= 1;
        *live = self.snapshots[self.cursor].clone();
        true
    }

    /// Step forward one snapshot. Returns false at the top of the stack.
    pub fn redo(&mut self, live: &mut BoardData) -> bool {
        if self.cursor + 1 >= self.snapshots.len() {
            return false;
        }
        self.cursor += 1;
        *live = self.snapshots[self.cursor].clone();
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Number of retained checkpoints (excluding the live-edge entry).
    pub fn len(&self) -> usize {
        if self.cursor < self.snapshots.len() {
            self.snapshots.len() - 1
        } else {
            self.snapshots.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
    }
}
