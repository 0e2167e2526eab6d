//! Runtime engine: owns the board and routes gestures, history, alignment,
//! sync arbitration and persistence scheduling through one synchronous
//! mutation pipeline.
//!
//! Everything here runs on a single thread. Events apply in arrival order;
//! the only throttling is the pinch rate limit, which skips work without
//! reordering anything. Long-running collaborators (storage, remote sync,
//! suggestions) sit behind traits and re-enter through the same mutating
//! entry points.

use crate::align::{self, AlignmentGuide};
use crate::board::BoardData;
use crate::camera::{Camera, PinchState};
use crate::clock::{Clock, SystemClock};
use crate::drag::{
    hit_test_handles, resize_bounds, Gesture, DRAG_THRESHOLD, HANDLE_HIT_TOLERANCE,
};
use crate::history::History;
use crate::input::{Modifiers, MouseButton};
use crate::interaction::InteractionManager;
use crate::layout;
use crate::model::{GroupId, Note, ObjectId, NOTE_PALETTE};
use crate::storage::{PersistedEnvelope, SaveScheduler};
use crate::suggest::{Suggestion, SuggestionProvider, SuggestionRequest};
use crate::sync::{ArbitrationOutcome, SyncArbiter, SyncStatus};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum interval between applied pinch updates (~60 per second).
pub const PINCH_MIN_INTERVAL: Duration = Duration::from_millis(16);

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Note,
    Connect,
}

/// The whiteboard engine.
pub struct Engine {
    pub board: BoardData,
    pub camera: Camera,
    pub interaction: InteractionManager,
    pub history: History,
    pub status: SyncStatus,
    pub tool: ToolKind,
    gesture: Gesture,
    guides: Vec<AlignmentGuide>,
    scheduler: SaveScheduler,
    arbiter: SyncArbiter,
    clock: Arc<dyn Clock>,
    pinch: Option<PinchState>,
    last_pinch_applied: Option<Instant>,
    /// User-visible fallback message from a failed collaborator call.
    notice: Option<String>,
    notes_created: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Build an engine against an explicit clock (tests pass a
    /// [`ManualClock`](crate::clock::ManualClock)).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            board: BoardData::new(),
            camera: Camera::new(),
            interaction: InteractionManager::new(),
            history: History::new(),
            status: SyncStatus::new(),
            tool: ToolKind::default(),
            gesture: Gesture::Idle,
            guides: Vec::new(),
            scheduler: SaveScheduler::default(),
            arbiter: SyncArbiter::default(),
            clock,
            pinch: None,
            last_pinch_applied: None,
            notice: None,
            notes_created: 0,
        }
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.tool = tool;
        self.gesture = Gesture::Idle;
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Guides from the current drag tick, empty unless alignment is active.
    pub fn active_guides(&self) -> &[AlignmentGuide] {
        &self.guides
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn board_point(&self, screen: Point) -> Point {
        self.camera.screen_to_board(screen)
    }

    /// Stamp a local mutation: conflict-window bookkeeping plus the save
    /// debounce.
    fn mark_local_change(&mut self) {
        let now = self.clock.now();
        self.status.mark_local_change(now);
        self.scheduler.schedule(now);
    }

    /// Drop interaction state for objects that no longer exist (after
    /// undo/redo, remote adoption, cascading deletes).
    fn prune_interaction(&mut self) {
        let stale: Vec<ObjectId> = self
            .interaction
            .selected()
            .iter()
            .copied()
            .filter(|&id| !self.board.contains_object(id))
            .collect();
        for id in stale {
            self.interaction.remove(id);
        }
        if let Some(focused) = self.interaction.focused() {
            if !self.board.contains_object(focused) {
                self.interaction.remove(focused);
            }
        }
    }

    // --- Pointer pipeline ---

    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, mods: Modifiers) {
        let point = self.board_point(screen);

        if button == MouseButton::Middle {
            self.gesture = Gesture::Panning { last_screen: screen };
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        match self.tool {
            ToolKind::Pan => {
                self.gesture = Gesture::Panning { last_screen: screen };
            }
            ToolKind::Note => {
                self.create_note_at(point);
            }
            ToolKind::Connect => {
                if let Some(id) = self.board.hit_test(point) {
                    self.gesture = Gesture::Connecting {
                        from: id,
                        current: point,
                    };
                }
            }
            ToolKind::Select => self.select_pointer_down(point, mods),
        }
    }

    fn select_pointer_down(&mut self, point: Point, mods: Modifiers) {
        // A handle of the single selected object takes priority over the
        // objects underneath it.
        if let Some(&id) = (self.interaction.selection_len() == 1)
            .then(|| self.interaction.selected().iter().next())
            .flatten()
        {
            if let Some(bounds) = self.board.object_bounds(id) {
                let tolerance = HANDLE_HIT_TOLERANCE / self.camera.zoom;
                if let Some(handle) = hit_test_handles(bounds, point, tolerance) {
                    log::debug!("resize begin on {id} via {handle:?}");
                    self.gesture = Gesture::Resizing {
                        target: id,
                        handle,
                        original: bounds,
                        start: point,
                        pre_state: Box::new(self.board.clone()),
                    };
                    return;
                }
            }
        }

        match self.board.hit_test(point) {
            Some(id) => {
                if mods.shift {
                    // Toggle membership, leaving the rest untouched.
                    self.interaction.toggle(id);
                    return;
                }
                let was_selected = self.interaction.is_selected(id);
                if !was_selected {
                    self.interaction.select(id);
                }
                self.gesture = Gesture::Pending {
                    target: id,
                    press: point,
                    was_selected,
                };
            }
            None => {
                if !mods.shift {
                    self.interaction.exit_editing();
                    self.interaction.clear_selection();
                }
                self.interaction.clear_preview();
                self.gesture = Gesture::Marquee {
                    start: point,
                    current: point,
                };
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Point, mods: Modifiers) {
        let point = self.board_point(screen);

        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {
                self.interaction.set_hovered(self.board.hit_test(point));
            }
            Gesture::Pending {
                target,
                press,
                was_selected,
            } => {
                if (point - press).hypot() > DRAG_THRESHOLD {
                    let origins = self.capture_move_origins();
                    log::debug!("drag begin: {} object(s)", origins.len());
                    let pre_state = Box::new(self.board.clone());
                    self.apply_move(press, point, &origins, mods);
                    self.gesture = Gesture::MovingObjects {
                        start: press,
                        origins,
                        pre_state,
                    };
                } else {
                    self.gesture = Gesture::Pending {
                        target,
                        press,
                        was_selected,
                    };
                }
            }
            Gesture::MovingObjects {
                start,
                origins,
                pre_state,
            } => {
                self.apply_move(start, point, &origins, mods);
                self.gesture = Gesture::MovingObjects {
                    start,
                    origins,
                    pre_state,
                };
            }
            Gesture::Resizing {
                target,
                handle,
                original,
                start,
                pre_state,
            } => {
                let new_bounds = resize_bounds(original, handle, point - start, mods.shift);
                self.board.set_object_bounds(target, new_bounds);
                self.gesture = Gesture::Resizing {
                    target,
                    handle,
                    original,
                    start,
                    pre_state,
                };
            }
            Gesture::Marquee { start, .. } => {
                let rect = Rect::from_points(start, point);
                self.interaction.set_preview(self.board.objects_in_rect(rect));
                self.gesture = Gesture::Marquee {
                    start,
                    current: point,
                };
            }
            Gesture::Panning { last_screen } => {
                self.camera.pan_by(screen - last_screen);
                self.gesture = Gesture::Panning { last_screen: screen };
            }
            Gesture::Connecting { from, .. } => {
                self.gesture = Gesture::Connecting {
                    from,
                    current: point,
                };
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Point, _mods: Modifiers) {
        let point = self.board_point(screen);

        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => {}
            Gesture::Pending {
                target,
                was_selected,
                ..
            } => {
                // Never crossed the threshold: a click. Selecting happened
                // on the press; a press on an already-selected object
                // activates it on release.
                if was_selected {
                    self.interaction.enter_editing(target);
                }
            }
            Gesture::MovingObjects { pre_state, .. } => {
                self.guides.clear();
                if *pre_state != self.board {
                    self.history.checkpoint(&pre_state);
                    self.mark_local_change();
                }
            }
            Gesture::Resizing { pre_state, .. } => {
                if *pre_state != self.board {
                    self.history.checkpoint(&pre_state);
                    self.mark_local_change();
                }
            }
            Gesture::Marquee { .. } => {
                self.interaction.promote_preview();
            }
            Gesture::Panning { .. } => {}
            Gesture::Connecting { from, .. } => {
                match self.board.hit_test(point) {
                    Some(target) if target != from => {
                        let pre_state = self.board.clone();
                        if self.board.add_edge(from, target).is_some() {
                            self.history.checkpoint(&pre_state);
                            self.mark_local_change();
                        }
                    }
                    // Released over empty space (or the source): discard.
                    _ => log::debug!("connection draw discarded"),
                }
            }
        }
    }

    /// The set of objects a drag moves: the selection plus every member of
    /// any group the selection touches.
    fn capture_move_origins(&self) -> HashMap<ObjectId, Point> {
        let mut ids: Vec<ObjectId> = self.interaction.selected().iter().copied().collect();
        let mut i = 0;
        while i < ids.len() {
            if let Some(gid) = self.board.object_group(ids[i]) {
                if let Some(group) = self.board.group(gid) {
                    for &member in &group.note_ids {
                        if !ids.contains(&member) {
                            ids.push(member);
                        }
                    }
                }
            }
            i += 1;
        }

        ids.into_iter()
            .filter_map(|id| {
                self.board
                    .object_bounds(id)
                    .map(|b| (id, Point::new(b.x0, b.y0)))
            })
            .collect()
    }

    /// Apply a uniform move delta, with alignment correction while the
    /// modifier is held. The whole moving set snaps as one virtual object
    /// and never against its own members.
    fn apply_move(
        &mut self,
        start: Point,
        current: Point,
        origins: &HashMap<ObjectId, Point>,
        mods: Modifiers,
    ) {
        let mut delta = current - start;

        if mods.alt {
            let mut moving: Option<Rect> = None;
            for (&id, &origin) in origins {
                if let Some(bounds) = self.board.object_bounds(id) {
                    let proposed = Rect::from_origin_size(origin + delta, bounds.size());
                    moving = Some(match moving {
                        Some(r) => r.union(proposed),
                        None => proposed,
                    });
                }
            }
            let peers: Vec<Rect> = self
                .board
                .object_ids()
                .into_iter()
                .filter(|id| !origins.contains_key(id))
                .filter_map(|id| self.board.object_bounds(id))
                .collect();

            if let Some(moving) = moving {
                let result = align::align_rect(moving, &peers);
                delta += result.delta;
                self.guides = result.guides;
            }
        } else {
            self.guides.clear();
        }

        for (&id, &origin) in origins {
            self.board.set_object_position(id, origin + delta);
        }
    }

    // --- Wheel / pinch ---

    /// Plain scroll pans; scroll with the zoom modifier zooms about the
    /// cursor.
    pub fn scroll(&mut self, screen: Point, delta: Vec2, mods: Modifiers) {
        if mods.ctrl {
            self.camera.zoom_with_scroll(screen, delta.y);
        } else {
            self.camera.pan_by(Vec2::new(-delta.x, -delta.y));
        }
    }

    pub fn pinch_begin(&mut self, a: Point, b: Point) {
        self.pinch = Some(PinchState::begin(&self.camera, a, b));
        self.last_pinch_applied = None;
    }

    /// Apply a pinch update, rate-limited to [`PINCH_MIN_INTERVAL`].
    /// Skipped updates are safe: each application derives from the gesture
    /// baseline, not from the previous event.
    pub fn pinch_update(&mut self, a: Point, b: Point) -> bool {
        let Some(pinch) = self.pinch else {
            return false;
        };
        let now = self.clock.now();
        if let Some(last) = self.last_pinch_applied {
            if now.saturating_duration_since(last) < PINCH_MIN_INTERVAL {
                return false;
            }
        }
        pinch.apply(&mut self.camera, a, b);
        self.last_pinch_applied = Some(now);
        true
    }

    pub fn pinch_end(&mut self) {
        self.pinch = None;
        self.last_pinch_applied = None;
    }

    // --- Cancellation ---

    /// Escape: cancel the in-progress gesture without mutating committed
    /// state; with no gesture active, leave editing or clear the
    /// selection.
    pub fn escape(&mut self) {
        match std::mem::take(&mut self.gesture) {
            Gesture::MovingObjects { pre_state, .. } | Gesture::Resizing { pre_state, .. } => {
                self.board = *pre_state;
                self.guides.clear();
            }
            Gesture::Marquee { .. } => {
                self.interaction.clear_preview();
            }
            Gesture::Connecting { .. } | Gesture::Pending { .. } | Gesture::Panning { .. } => {}
            Gesture::Idle => {
                if self.interaction.focused().is_some() {
                    self.interaction.exit_editing();
                } else {
                    self.interaction.clear_selection();
                }
            }
        }
    }

    // --- Editing operations ---

    /// Create a note centered at a board point, select it, and stamp the
    /// change.
    pub fn create_note_at(&mut self, point: Point) -> ObjectId {
        let pre_state = self.board.clone();
        let color = NOTE_PALETTE[self.notes_created % NOTE_PALETTE.len()];
        self.notes_created += 1;

        let id = self
            .board
            .add_note(Note::centered_at(point, "").with_color(color));
        self.history.checkpoint(&pre_state);
        self.interaction.select(id);
        self.mark_local_change();
        id
    }

    /// Replace a note's text content. No-op for unknown ids.
    pub fn set_note_content(&mut self, id: ObjectId, content: impl Into<String>) {
        if self.board.note(id).is_none() {
            return;
        }
        let pre_state = self.board.clone();
        if let Some(note) = self.board.note_mut(id) {
            note.content = content.into();
        }
        self.history.checkpoint(&pre_state);
        self.mark_local_change();
    }

    pub fn select_all(&mut self) {
        self.interaction.clear_selection();
        for id in self.board.object_ids() {
            self.interaction.add_to_selection(id);
        }
    }

    pub fn delete_selected(&mut self) {
        if self.interaction.selection_len() == 0 {
            return;
        }
        let pre_state = self.board.clone();
        let ids: Vec<ObjectId> = self.interaction.selected().iter().copied().collect();
        for id in ids {
            self.board.remove_object(id);
            self.interaction.remove(id);
        }
        self.history.checkpoint(&pre_state);
        self.prune_interaction();
        self.mark_local_change();
    }

    /// Group the current selection. Members stay selected.
    pub fn group_selected(&mut self, name: impl Into<String>) -> Option<GroupId> {
        let ids: Vec<ObjectId> = self.interaction.selected().iter().copied().collect();
        let pre_state = self.board.clone();
        let group_id = self
            .board
            .create_group(&ids, name, self.clock.epoch_millis())?;
        self.history.checkpoint(&pre_state);
        self.mark_local_change();
        Some(group_id)
    }

    /// Ungroup every group touched by the selection; members stay
    /// selected.
    pub fn ungroup_selected(&mut self) -> Vec<ObjectId> {
        let mut group_ids: Vec<GroupId> = Vec::new();
        for &id in self.interaction.selected() {
            if let Some(gid) = self.board.object_group(id) {
                if !group_ids.contains(&gid) {
                    group_ids.push(gid);
                }
            }
        }
        if group_ids.is_empty() {
            return Vec::new();
        }

        let pre_state = self.board.clone();
        let mut members = Vec::new();
        for gid in group_ids {
            if let Some(freed) = self.board.ungroup(gid) {
                members.extend(freed);
            }
        }
        self.history.checkpoint(&pre_state);
        self.mark_local_change();
        members
    }

    /// Delete a group and everything in it.
    pub fn delete_group(&mut self, id: GroupId) -> bool {
        let pre_state = self.board.clone();
        if !self.board.remove_group(id) {
            return false;
        }
        self.history.checkpoint(&pre_state);
        self.prune_interaction();
        self.mark_local_change();
        true
    }

    pub fn rename_group(&mut self, id: GroupId, name: impl Into<String>) -> bool {
        let pre_state = self.board.clone();
        if !self.board.rename_group(id, name) {
            return false;
        }
        self.history.checkpoint(&pre_state);
        self.mark_local_change();
        true
    }

    pub fn recolor_group(&mut self, id: GroupId, color: crate::model::SerializableColor) -> bool {
        let pre_state = self.board.clone();
        if !self.board.recolor_group(id, color) {
            return false;
        }
        self.history.checkpoint(&pre_state);
        self.mark_local_change();
        true
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        if self.history.undo(&mut self.board) {
            self.prune_interaction();
            self.mark_local_change();
            true
        } else {
            false
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.history.redo(&mut self.board) {
            self.prune_interaction();
            self.mark_local_change();
            true
        } else {
            false
        }
    }

    // --- Suggestions ---

    /// Ask the provider for a suggestion around `target` and apply it.
    /// On failure the board is untouched and a user-visible notice is
    /// recorded.
    pub fn request_suggestion(
        &mut self,
        provider: &dyn SuggestionProvider,
        target: ObjectId,
    ) -> bool {
        let Some(request) = SuggestionRequest::for_target(&self.board, target) else {
            return false;
        };
        match provider.suggest(&request) {
            Ok(suggestion) => {
                self.apply_suggestion(target, suggestion);
                true
            }
            Err(e) => {
                log::warn!("suggestion request failed: {e}");
                self.notice = Some(format!("Suggestions are unavailable right now ({e})"));
                false
            }
        }
    }

    /// Apply one typed suggestion. The single place suggestion payloads
    /// are consumed; each arm validates through the same silent-reject
    /// rules as manual edits.
    pub fn apply_suggestion(&mut self, target: ObjectId, suggestion: Suggestion) {
        let pre_state = self.board.clone();
        let mutated = match suggestion {
            Suggestion::GeneratedNotes { contents } => {
                let positions = layout::place_around(&self.board, target, contents.len());
                let mut added = false;
                for (content, position) in contents.into_iter().zip(positions) {
                    let color = NOTE_PALETTE[self.notes_created % NOTE_PALETTE.len()];
                    self.notes_created += 1;
                    let id = self
                        .board
                        .add_note(Note::centered_at(position, content).with_color(color));
                    self.board.add_edge(target, id);
                    added = true;
                }
                added
            }
            Suggestion::EdgeProposal { edges } => {
                let mut added = false;
                for (from, to) in edges {
                    added |= self.board.add_edge(from, to).is_some();
                }
                added
            }
            Suggestion::GroupProposal { name, member_ids } => self
                .board
                .create_group(&member_ids, name, self.clock.epoch_millis())
                .is_some(),
            Suggestion::ConvergenceProposal { keep: _, remove } => {
                let mut removed = false;
                for id in remove {
                    removed |= self.board.remove_object(id);
                }
                removed
            }
        };

        if mutated {
            self.history.checkpoint(&pre_state);
            self.prune_interaction();
            self.mark_local_change();
        }
    }

    // --- Persistence & sync ---

    /// Build the envelope that would be persisted right now, with the
    /// current viewport folded in.
    pub fn envelope(&self) -> PersistedEnvelope {
        let mut data = self.board.clone();
        data.viewport = Some(self.camera.viewport_state());
        PersistedEnvelope::new(data, self.clock.epoch_millis())
    }

    /// Take the debounced save if its deadline has passed. The caller
    /// performs the actual write.
    pub fn take_due_save(&mut self) -> Option<PersistedEnvelope> {
        if self.scheduler.take_due(self.clock.now()) {
            Some(self.envelope())
        } else {
            None
        }
    }

    /// Record a persistence/sync failure and re-arm the debounce so the
    /// write retries on the next cycle. In-memory state is untouched.
    pub fn record_save_error(&mut self, message: impl Into<String>) {
        let now = self.clock.now();
        self.status.record_error(now, message);
        self.scheduler.schedule(now);
    }

    pub fn record_save_ok(&mut self) {
        self.status.mark_synced(self.clock.now());
    }

    /// Install loaded state. Returns false (leaving everything untouched)
    /// when the envelope's version doesn't match.
    pub fn load_from(&mut self, envelope: PersistedEnvelope) -> bool {
        let Some(data) = envelope.into_current_data() else {
            return false;
        };
        if let Some(viewport) = data.viewport {
            self.camera.apply_viewport_state(viewport);
        }
        self.board = data;
        self.history.clear();
        self.interaction = InteractionManager::new();
        self.status.reset();
        self.gesture = Gesture::Idle;
        true
    }

    /// Feed a polled remote snapshot through the recency-window arbiter.
    /// Adoption replaces the board (checkpointed, so it is undoable);
    /// anything else leaves local state alone.
    pub fn handle_remote(&mut self, remote: BoardData) -> ArbitrationOutcome {
        let now = self.clock.now();
        let outcome = self
            .arbiter
            .arbitrate(&self.status, &self.board, &remote, now);
        if outcome == ArbitrationOutcome::Adopt {
            let pre_state = self.board.clone();
            self.board = remote;
            self.history.checkpoint(&pre_state);
            self.prune_interaction();
            self.status.mark_synced(now);
        }
        outcome
    }

    /// Replace the conflict window (tunable, not a correctness bound).
    pub fn set_conflict_window(&mut self, window: Duration) {
        self.arbiter = SyncArbiter::new(window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::Image;
    use crate::suggest::SuggestError;

    const NO_MODS: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };
    const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };
    const ALT: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: true,
        meta: false,
    };

    fn test_engine() -> (Engine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (Engine::with_clock(clock.clone()), clock)
    }

    /// Add a note with explicit geometry, bypassing history.
    fn add_note(engine: &mut Engine, x: f64, y: f64, w: f64, h: f64) -> ObjectId {
        let mut note = Note::new(Point::new(x, y), "");
        note.width = w;
        note.height = h;
        engine.board.add_note(note)
    }

    fn click(engine: &mut Engine, p: Point, mods: Modifiers) {
        engine.pointer_down(p, MouseButton::Left, mods);
        engine.pointer_up(p, mods);
    }

    fn drag(engine: &mut Engine, from: Point, to: Point, mods: Modifiers) {
        engine.pointer_down(from, MouseButton::Left, mods);
        engine.pointer_move(to, mods);
        engine.pointer_up(to, mods);
    }

    #[test]
    fn test_click_selects_then_activates() {
        let (mut engine, _) = test_engine();
        let id = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);

        // First click selects but does not edit.
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        assert!(engine.interaction.is_selected(id));
        assert!(!engine.interaction.is_editing(id));

        // Second click on the selected note activates editing.
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        assert!(engine.interaction.is_editing(id));
    }

    #[test]
    fn test_click_on_multi_selection_preserves_it() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);

        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        click(&mut engine, Point::new(350.0, 50.0), SHIFT);
        assert_eq!(engine.interaction.selection_len(), 2);

        // Plain click on a member must not collapse the selection.
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        assert!(engine.interaction.is_selected(a));
        assert!(engine.interaction.is_selected(b));
    }

    #[test]
    fn test_shift_click_toggles_membership() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);

        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        click(&mut engine, Point::new(350.0, 50.0), SHIFT);
        assert!(engine.interaction.is_selected(a) && engine.interaction.is_selected(b));

        click(&mut engine, Point::new(350.0, 50.0), SHIFT);
        assert!(engine.interaction.is_selected(a));
        assert!(!engine.interaction.is_selected(b));
    }

    #[test]
    fn test_empty_click_clears_selection() {
        let (mut engine, _) = test_engine();
        let id = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        assert!(engine.interaction.is_selected(id));

        click(&mut engine, Point::new(2000.0, 2000.0), NO_MODS);
        assert!(!engine.interaction.is_selected(id));
    }

    #[test]
    fn test_select_all() {
        let (mut engine, _) = test_engine();
        add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);
        engine
            .board
            .add_image(Image::new(Point::new(600.0, 0.0), 100.0, 100.0, "x"));

        engine.select_all();
        assert_eq!(engine.interaction.selection_len(), 3);
    }

    #[test]
    fn test_sub_threshold_move_is_still_a_click() {
        let (mut engine, _) = test_engine();
        let id = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);

        // 3 units of motion: below the threshold, treated as a click, so
        // the already-selected note activates and nothing moves.
        drag(
            &mut engine,
            Point::new(50.0, 50.0),
            Point::new(53.0, 50.0),
            NO_MODS,
        );
        assert!(engine.interaction.is_editing(id));
        assert_eq!(engine.board.note(id).unwrap().position, Point::new(0.0, 0.0));
        assert!(!engine.history.can_undo());
    }

    #[test]
    fn test_drag_moves_and_is_undoable() {
        let (mut engine, _) = test_engine();
        let id = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);

        drag(
            &mut engine,
            Point::new(50.0, 50.0),
            Point::new(150.0, 80.0),
            NO_MODS,
        );
        assert_eq!(
            engine.board.note(id).unwrap().position,
            Point::new(100.0, 30.0)
        );

        assert!(engine.undo());
        assert_eq!(engine.board.note(id).unwrap().position, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_batch_drag_applies_uniform_delta() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 200.0, 100.0, 100.0);

        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        click(&mut engine, Point::new(350.0, 250.0), SHIFT);

        drag(
            &mut engine,
            Point::new(350.0, 250.0),
            Point::new(370.0, 260.0),
            NO_MODS,
        );
        assert_eq!(engine.board.note(a).unwrap().position, Point::new(20.0, 10.0));
        assert_eq!(
            engine.board.note(b).unwrap().position,
            Point::new(320.0, 210.0)
        );
    }

    #[test]
    fn test_group_drag_moves_all_members() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);
        engine.board.create_group(&[a, b], "g", 0).unwrap();

        // Select and drag only A; B follows through the group.
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        drag(
            &mut engine,
            Point::new(50.0, 50.0),
            Point::new(100.0, 50.0),
            NO_MODS,
        );
        assert_eq!(engine.board.note(a).unwrap().position, Point::new(50.0, 0.0));
        assert_eq!(engine.board.note(b).unwrap().position, Point::new(350.0, 0.0));
    }

    #[test]
    fn test_marquee_preview_then_promote() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);
        let far = add_note(&mut engine, 5000.0, 5000.0, 100.0, 100.0);

        engine.pointer_down(Point::new(-50.0, -50.0), MouseButton::Left, NO_MODS);
        engine.pointer_move(Point::new(450.0, 150.0), NO_MODS);
        assert!(engine.interaction.preview().contains(&a));
        assert!(engine.interaction.preview().contains(&b));
        assert!(!engine.interaction.preview().contains(&far));
        // Preview is not yet a selection.
        assert_eq!(engine.interaction.selection_len(), 0);

        engine.pointer_up(Point::new(450.0, 150.0), NO_MODS);
        assert!(engine.interaction.is_selected(a));
        assert!(engine.interaction.is_selected(b));
        assert!(!engine.interaction.is_selected(far));
    }

    #[test]
    fn test_alignment_snap_with_modifier() {
        // Note A dragged so its right edge lands 8 units short of B's left
        // edge, with the alignment modifier held: A snaps flush.
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 200.0, 0.0, 100.0, 100.0);

        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        engine.pointer_down(Point::new(50.0, 50.0), MouseButton::Left, NO_MODS);
        engine.pointer_move(Point::new(142.0, 50.0), ALT);

        let note_a = engine.board.note(a).unwrap();
        assert!((note_a.position.x + note_a.width - 200.0).abs() < f64::EPSILON);
        let guides = engine.active_guides();
        assert_eq!(guides.len(), 2); // flush on x, co-aligned on y
        let vertical = guides
            .iter()
            .find(|g| g.axis == crate::align::GuideAxis::Vertical)
            .unwrap();
        assert!((vertical.position - 200.0).abs() < f64::EPSILON);
        assert!((vertical.start - -50.0).abs() < f64::EPSILON);
        assert!((vertical.end - 150.0).abs() < f64::EPSILON);

        engine.pointer_up(Point::new(142.0, 50.0), ALT);
        assert!(engine.active_guides().is_empty());
        let _ = b;
    }

    #[test]
    fn test_no_alignment_without_modifier() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        add_note(&mut engine, 200.0, 0.0, 100.0, 100.0);

        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        engine.pointer_down(Point::new(50.0, 50.0), MouseButton::Left, NO_MODS);
        engine.pointer_move(Point::new(142.0, 50.0), NO_MODS);

        assert_eq!(engine.board.note(a).unwrap().position, Point::new(92.0, 0.0));
        assert!(engine.active_guides().is_empty());
    }

    #[test]
    fn test_resize_via_handle() {
        let (mut engine, _) = test_engine();
        let id = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);

        // Grab the bottom-right handle and pull outward.
        drag(
            &mut engine,
            Point::new(100.0, 100.0),
            Point::new(150.0, 130.0),
            NO_MODS,
        );
        let note = engine.board.note(id).unwrap();
        assert!((note.width - 150.0).abs() < f64::EPSILON);
        assert!((note.height - 130.0).abs() < f64::EPSILON);
        assert_eq!(note.position, Point::new(0.0, 0.0));

        assert!(engine.undo());
        let note = engine.board.note(id).unwrap();
        assert!((note.width - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_escape_cancels_drag() {
        let (mut engine, _) = test_engine();
        let id = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);

        engine.pointer_down(Point::new(50.0, 50.0), MouseButton::Left, NO_MODS);
        engine.pointer_move(Point::new(200.0, 200.0), NO_MODS);
        assert_ne!(engine.board.note(id).unwrap().position, Point::new(0.0, 0.0));

        engine.escape();
        assert_eq!(engine.board.note(id).unwrap().position, Point::new(0.0, 0.0));
        assert!(engine.gesture().is_idle());
        // Cancelled gesture left nothing to undo.
        assert!(!engine.history.can_undo());
    }

    #[test]
    fn test_escape_exits_editing_then_clears_selection() {
        let (mut engine, _) = test_engine();
        let id = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        assert!(engine.interaction.is_editing(id));

        engine.escape();
        assert!(!engine.interaction.is_editing(id));
        assert!(engine.interaction.is_selected(id));

        engine.escape();
        assert!(!engine.interaction.is_selected(id));
    }

    #[test]
    fn test_connect_tool_commits_edge() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);

        engine.set_tool(ToolKind::Connect);
        drag(
            &mut engine,
            Point::new(50.0, 50.0),
            Point::new(350.0, 50.0),
            NO_MODS,
        );
        assert_eq!(engine.board.edges.len(), 1);
        assert_eq!(engine.board.edges[0].from, a);
        assert_eq!(engine.board.edges[0].to, b);
        assert!(engine.history.can_undo());
    }

    #[test]
    fn test_connect_over_empty_space_discards() {
        let (mut engine, _) = test_engine();
        add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);

        engine.set_tool(ToolKind::Connect);
        drag(
            &mut engine,
            Point::new(50.0, 50.0),
            Point::new(2000.0, 2000.0),
            NO_MODS,
        );
        assert!(engine.board.edges.is_empty());
        assert!(!engine.history.can_undo());
    }

    #[test]
    fn test_note_tool_creates_selected_note() {
        let (mut engine, _) = test_engine();
        engine.set_tool(ToolKind::Note);
        engine.pointer_down(Point::new(400.0, 300.0), MouseButton::Left, NO_MODS);

        assert_eq!(engine.board.notes.len(), 1);
        let note = &engine.board.notes[0];
        assert!(engine.interaction.is_selected(note.id));
        let center = note.center();
        assert!((center.x - 400.0).abs() < f64::EPSILON);
        assert!((center.y - 300.0).abs() < f64::EPSILON);
        assert!(engine.history.can_undo());
    }

    #[test]
    fn test_images_participate_in_selection_and_drag() {
        let (mut engine, _) = test_engine();
        let img = engine
            .board
            .add_image(Image::new(Point::new(0.0, 0.0), 200.0, 100.0, "asset://x"));

        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        assert!(engine.interaction.is_selected(img));

        drag(
            &mut engine,
            Point::new(50.0, 50.0),
            Point::new(80.0, 60.0),
            NO_MODS,
        );
        assert_eq!(
            engine.board.image(img).unwrap().position,
            Point::new(30.0, 10.0)
        );
    }

    #[test]
    fn test_group_and_ungroup_via_engine() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);

        click(&mut engine, Point::new(50.0, 50.0), NO_MODS);
        click(&mut engine, Point::new(350.0, 50.0), SHIFT);

        let gid = engine.group_selected("cluster").unwrap();
        assert!(engine.interaction.is_selected(a) && engine.interaction.is_selected(b));

        let members = engine.ungroup_selected();
        assert_eq!(members.len(), 2);
        assert!(engine.board.group(gid).is_none());
        assert!(engine.interaction.is_selected(a) && engine.interaction.is_selected(b));

        // Both operations are undoable.
        assert!(engine.undo()); // back to grouped
        assert!(engine.board.group(gid).is_some());
        assert!(engine.undo()); // back to ungrouped
        assert!(engine.board.groups.is_empty());
    }

    #[test]
    fn test_delete_selected_prunes_edges() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);
        engine.board.add_edge(a, b).unwrap();

        click(&mut engine, Point::new(350.0, 50.0), NO_MODS);
        engine.delete_selected();

        assert!(engine.board.note(b).is_none());
        assert!(engine.board.edges.is_empty());
        assert!(engine.board.integrity_ok());

        assert!(engine.undo());
        assert!(engine.board.note(b).is_some());
        assert_eq!(engine.board.edges.len(), 1);
    }

    #[test]
    fn test_save_debounce_flow() {
        let (mut engine, clock) = test_engine();
        engine.create_note_at(Point::new(0.0, 0.0));

        // Immediately after the mutation: not due yet.
        assert!(engine.take_due_save().is_none());

        clock.advance(Duration::from_millis(1100));
        let envelope = engine.take_due_save().expect("save should be due");
        assert_eq!(envelope.data.notes.len(), 1);
        assert!(envelope.data.viewport.is_some());

        // Consumed until the next mutation.
        assert!(engine.take_due_save().is_none());
    }

    #[test]
    fn test_save_error_retries_next_cycle() {
        let (mut engine, clock) = test_engine();
        engine.create_note_at(Point::new(0.0, 0.0));
        clock.advance(Duration::from_secs(2));
        assert!(engine.take_due_save().is_some());

        engine.record_save_error("disk full");
        assert!(engine.status.last_error().is_some());

        clock.advance(Duration::from_secs(2));
        assert!(engine.take_due_save().is_some());
        engine.record_save_ok();
        assert!(engine.status.last_error().is_none());
    }

    #[test]
    fn test_remote_arbitration_through_engine() {
        let (mut engine, clock) = test_engine();
        engine.create_note_at(Point::new(0.0, 0.0));

        let mut remote = BoardData::new();
        remote.add_note(Note::new(Point::new(500.0, 500.0), "remote"));

        // 3 s after the local edit: discarded.
        clock.advance(Duration::from_secs(3));
        assert_eq!(
            engine.handle_remote(remote.clone()),
            ArbitrationOutcome::DiscardedRecentLocal
        );
        assert_eq!(engine.board.notes.len(), 1);
        assert_ne!(engine.board.notes[0].content, "remote");

        // 11 s after the local edit: adopted.
        clock.advance(Duration::from_secs(8));
        assert_eq!(engine.handle_remote(remote), ArbitrationOutcome::Adopt);
        assert_eq!(engine.board.notes[0].content, "remote");

        // Adoption is undoable back to the local state.
        assert!(engine.undo());
        assert_ne!(engine.board.notes[0].content, "remote");
    }

    #[test]
    fn test_load_from_envelope() {
        let (mut engine, clock) = test_engine();
        let mut data = BoardData::new();
        data.add_note(Note::new(Point::new(0.0, 0.0), "loaded"));
        data.viewport = Some(crate::camera::ViewportState {
            zoom: 2.0,
            pan: Vec2::new(10.0, 20.0),
        });

        assert!(engine.load_from(PersistedEnvelope::new(data, clock.epoch_millis())));
        assert_eq!(engine.board.notes[0].content, "loaded");
        assert!((engine.camera.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_rejects_version_mismatch() {
        let (mut engine, _) = test_engine();
        engine.create_note_at(Point::new(0.0, 0.0));

        let mut envelope = PersistedEnvelope::new(BoardData::new(), 0);
        envelope.version = "corkboard/99".to_string();
        assert!(!engine.load_from(envelope));
        // Local state untouched.
        assert_eq!(engine.board.notes.len(), 1);
    }

    #[test]
    fn test_pinch_updates_are_rate_limited() {
        let (mut engine, clock) = test_engine();
        let a = Point::new(100.0, 300.0);
        let b = Point::new(300.0, 300.0);
        engine.pinch_begin(a, b);

        assert!(engine.pinch_update(Point::new(50.0, 300.0), Point::new(350.0, 300.0)));
        let zoom_after_first = engine.camera.zoom;

        // Same instant: skipped, camera unchanged.
        assert!(!engine.pinch_update(Point::new(0.0, 300.0), Point::new(400.0, 300.0)));
        assert!((engine.camera.zoom - zoom_after_first).abs() < f64::EPSILON);

        // 20 ms later: applied, derived from the gesture baseline.
        clock.advance(Duration::from_millis(20));
        assert!(engine.pinch_update(Point::new(0.0, 300.0), Point::new(400.0, 300.0)));
        assert!((engine.camera.zoom - 2.0).abs() < 1e-9);

        engine.pinch_end();
        assert!(!engine.pinch_update(a, b));
    }

    #[test]
    fn test_scroll_pans_and_modifier_zooms() {
        let (mut engine, _) = test_engine();
        engine.scroll(Point::new(400.0, 300.0), Vec2::new(0.0, 30.0), NO_MODS);
        assert!((engine.camera.pan.y - -30.0).abs() < f64::EPSILON);
        assert!((engine.camera.zoom - 1.0).abs() < f64::EPSILON);

        let ctrl = Modifiers {
            ctrl: true,
            ..NO_MODS
        };
        engine.scroll(Point::new(400.0, 300.0), Vec2::new(0.0, -120.0), ctrl);
        assert!(engine.camera.zoom > 1.0);
    }

    struct FixedProvider(Result<Suggestion, ()>);

    impl SuggestionProvider for FixedProvider {
        fn suggest(
            &self,
            _request: &SuggestionRequest<'_>,
        ) -> Result<Suggestion, SuggestError> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(()) => Err(SuggestError::Unavailable("offline".to_string())),
            }
        }
    }

    #[test]
    fn test_generated_notes_are_placed_and_connected() {
        let (mut engine, _) = test_engine();
        let target = add_note(&mut engine, -90.0, -60.0, 180.0, 120.0);

        let provider = FixedProvider(Ok(Suggestion::GeneratedNotes {
            contents: vec!["one".into(), "two".into(), "three".into()],
        }));
        assert!(engine.request_suggestion(&provider, target));

        assert_eq!(engine.board.notes.len(), 4);
        assert_eq!(engine.board.edges.len(), 3);
        assert!(engine.board.edges.iter().all(|e| e.from == target));
        assert!(engine.board.integrity_ok());

        // One checkpoint for the whole batch.
        assert!(engine.undo());
        assert_eq!(engine.board.notes.len(), 1);
        assert!(engine.board.edges.is_empty());
    }

    #[test]
    fn test_suggestion_failure_leaves_board_and_sets_notice() {
        let (mut engine, _) = test_engine();
        let target = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let before = engine.board.clone();

        let provider = FixedProvider(Err(()));
        assert!(!engine.request_suggestion(&provider, target));
        assert_eq!(engine.board, before);
        assert!(engine.take_notice().is_some());
        assert!(engine.take_notice().is_none());
    }

    #[test]
    fn test_convergence_proposal_removes_objects() {
        let (mut engine, _) = test_engine();
        let target = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let keep = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);
        let remove = add_note(&mut engine, 600.0, 0.0, 100.0, 100.0);
        engine.board.add_edge(target, remove).unwrap();

        engine.apply_suggestion(
            target,
            Suggestion::ConvergenceProposal {
                keep: vec![keep],
                remove: vec![remove],
            },
        );
        assert!(engine.board.note(remove).is_none());
        assert!(engine.board.note(keep).is_some());
        assert!(engine.board.edges.is_empty());
        assert!(engine.board.integrity_ok());
    }

    #[test]
    fn test_group_proposal_groups_objects() {
        let (mut engine, _) = test_engine();
        let target = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let a = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 600.0, 0.0, 100.0, 100.0);

        engine.apply_suggestion(
            target,
            Suggestion::GroupProposal {
                name: "theme".to_string(),
                member_ids: vec![a, b],
            },
        );
        assert_eq!(engine.board.groups.len(), 1);
        assert_eq!(engine.board.groups[0].name, "theme");
    }

    #[test]
    fn test_edge_proposal_rejects_invalid_silently() {
        let (mut engine, _) = test_engine();
        let a = add_note(&mut engine, 0.0, 0.0, 100.0, 100.0);
        let b = add_note(&mut engine, 300.0, 0.0, 100.0, 100.0);
        engine.board.add_edge(a, b).unwrap();

        engine.apply_suggestion(
            a,
            Suggestion::EdgeProposal {
                edges: vec![(a, a), (a, b), (b, a)],
            },
        );
        // Self-edge and duplicate dropped; only b->a landed.
        assert_eq!(engine.board.edges.len(), 2);
    }
}
