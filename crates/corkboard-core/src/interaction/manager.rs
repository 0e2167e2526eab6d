//! Interaction manager tracking selection and editing state per object.

use super::state::ObjectState;
use crate::model::ObjectId;
use std::collections::{HashMap, HashSet};

/// Manages interaction state for all objects on the board.
///
/// This keeps UI concerns (selection, marquee preview, editing focus,
/// hover) out of the pure board data.
#[derive(Debug, Clone, Default)]
pub struct InteractionManager {
    /// Interaction state for each object.
    states: HashMap<ObjectId, ObjectState>,
    /// Currently selected objects.
    selected: HashSet<ObjectId>,
    /// Transient marquee preview set; promoted on release.
    preview: HashSet<ObjectId>,
    /// Object activated for editing.
    focused: Option<ObjectId>,
    /// Object currently under the pointer.
    hovered: Option<ObjectId>,
}

impl InteractionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: ObjectId) -> ObjectState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    fn set_state(&mut self, id: ObjectId, state: ObjectState) {
        if state.is_selected() {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }

        if state.is_editing() {
            self.focused = Some(id);
        } else if self.focused == Some(id) {
            self.focused = None;
        }

        if state == ObjectState::Idle {
            self.states.remove(&id);
        } else {
            self.states.insert(id, state);
        }
    }

    // --- Selection ---

    pub fn is_selected(&self, id: ObjectId) -> bool {
        self.selected.contains(&id)
    }

    pub fn selected(&self) -> &HashSet<ObjectId> {
        &self.selected
    }

    pub fn selection_len(&self) -> usize {
        self.selected.len()
    }

    /// Select a single object, clearing the rest.
    pub fn select(&mut self, id: ObjectId) {
        self.clear_selection();
        self.add_to_selection(id);
    }

    pub fn add_to_selection(&mut self, id: ObjectId) {
        self.set_state(id, ObjectState::Selected);
    }

    pub fn deselect(&mut self, id: ObjectId) {
        if self.selected.contains(&id) {
            self.set_state(id, ObjectState::Idle);
        }
    }

    /// Toggle membership without touching the rest of the selection.
    pub fn toggle(&mut self, id: ObjectId) {
        if self.is_selected(id) {
            self.deselect(id);
        } else {
            self.add_to_selection(id);
        }
    }

    pub fn clear_selection(&mut self) {
        let selected: Vec<_> = self.selected.iter().copied().collect();
        for id in selected {
            self.set_state(id, ObjectState::Idle);
        }
        self.selected.clear();
    }

    // --- Marquee preview ---

    /// Replace the transient preview set.
    pub fn set_preview<I: IntoIterator<Item = ObjectId>>(&mut self, ids: I) {
        self.preview = ids.into_iter().collect();
    }

    pub fn preview(&self) -> &HashSet<ObjectId> {
        &self.preview
    }

    pub fn clear_preview(&mut self) {
        self.preview.clear();
    }

    /// Promote the preview set into the committed selection (additive).
    pub fn promote_preview(&mut self) {
        let ids: Vec<_> = self.preview.drain().collect();
        for id in ids {
            self.add_to_selection(id);
        }
    }

    // --- Editing ---

    /// Activate editing. Only an already-selected object can be activated;
    /// any other editing session ends first.
    pub fn enter_editing(&mut self, id: ObjectId) -> bool {
        if !self.is_selected(id) {
            return false;
        }
        if let Some(old) = self.focused {
            if old != id {
                self.exit_editing();
            }
        }
        self.set_state(id, ObjectState::Editing);
        true
    }

    /// End editing, dropping back to `Selected`.
    pub fn exit_editing(&mut self) {
        if let Some(id) = self.focused {
            self.set_state(id, ObjectState::Selected);
        }
    }

    pub fn focused(&self) -> Option<ObjectId> {
        self.focused
    }

    pub fn is_editing(&self, id: ObjectId) -> bool {
        self.focused == Some(id)
    }

    // --- Hover ---

    pub fn set_hovered(&mut self, id: Option<ObjectId>) {
        self.hovered = id;
    }

    pub fn hovered(&self) -> Option<ObjectId> {
        self.hovered
    }

    /// Drop all state for a deleted object.
    pub fn remove(&mut self, id: ObjectId) {
        self.states.remove(&id);
        self.selected.remove(&id);
        self.preview.remove(&id);
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }
}
