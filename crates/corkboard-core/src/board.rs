//! Board document: the aggregate root owning all notes, images, edges and
//! groups.
//!
//! Every deletion carries its cascades (edge pruning, group membership,
//! empty-group removal) in the same call, so the document never references
//! a dead id. Validation failures (self-edges, duplicate edges, missing
//! ids) are silent no-ops rather than errors.

use crate::camera::ViewportState;
use crate::model::{Edge, EdgeId, Group, GroupId, Image, Note, ObjectId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// The whole board state. This is the single shared mutable resource; the
/// engine owns it exclusively and history snapshots deep-copy it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardData {
    pub notes: Vec<Note>,
    pub edges: Vec<Edge>,
    pub groups: Vec<Group>,
    pub images: Vec<Image>,
    #[serde(default)]
    pub viewport: Option<ViewportState>,
}

impl BoardData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.images.is_empty()
    }

    /// Number of notes and images.
    pub fn object_count(&self) -> usize {
        self.notes.len() + self.images.len()
    }

    // --- Lookup ---

    pub fn note(&self, id: ObjectId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn note_mut(&mut self, id: ObjectId) -> Option<&mut Note> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    pub fn image(&self, id: ObjectId) -> Option<&Image> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn image_mut(&mut self, id: ObjectId) -> Option<&mut Image> {
        self.images.iter_mut().find(|i| i.id == id)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.note(id).is_some() || self.image(id).is_some()
    }

    /// All object ids, notes first, in insertion (z) order.
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.notes
            .iter()
            .map(|n| n.id)
            .chain(self.images.iter().map(|i| i.id))
            .collect()
    }

    /// Bounds of any object by id.
    pub fn object_bounds(&self, id: ObjectId) -> Option<Rect> {
        self.note(id)
            .map(Note::bounds)
            .or_else(|| self.image(id).map(Image::bounds))
    }

    pub fn object_center(&self, id: ObjectId) -> Option<Point> {
        self.object_bounds(id).map(|b| b.center())
    }

    /// Group membership of an object, if any.
    pub fn object_group(&self, id: ObjectId) -> Option<GroupId> {
        self.note(id)
            .and_then(|n| n.group_id)
            .or_else(|| self.image(id).and_then(|i| i.group_id))
    }

    /// Topmost object containing the point. Later insertions are considered
    /// frontmost; images sit above notes.
    pub fn hit_test(&self, point: Point) -> Option<ObjectId> {
        self.images
            .iter()
            .rev()
            .find(|i| i.hit_test(point))
            .map(|i| i.id)
            .or_else(|| self.notes.iter().rev().find(|n| n.hit_test(point)).map(|n| n.id))
    }

    /// Ids of objects whose bounds intersect the rectangle.
    pub fn objects_in_rect(&self, rect: Rect) -> Vec<ObjectId> {
        self.object_ids()
            .into_iter()
            .filter(|&id| {
                self.object_bounds(id)
                    .map(|b| rect.intersect(b).area() > 0.0)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Union of all object bounds.
    pub fn bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for id in self.object_ids() {
            if let Some(b) = self.object_bounds(id) {
                result = Some(match result {
                    Some(r) => r.union(b),
                    None => b,
                });
            }
        }
        result
    }

    // --- Object mutation ---

    pub fn add_note(&mut self, note: Note) -> ObjectId {
        let id = note.id;
        self.notes.push(note);
        id
    }

    pub fn add_image(&mut self, image: Image) -> ObjectId {
        let id = image.id;
        self.images.push(image);
        id
    }

    /// Replace a note by id. No-op (returns false) when the id is unknown.
    pub fn update_note(&mut self, note: Note) -> bool {
        match self.note_mut(note.id) {
            Some(existing) => {
                *existing = note;
                true
            }
            None => false,
        }
    }

    pub fn translate_object(&mut self, id: ObjectId, delta: Vec2) -> bool {
        if let Some(note) = self.note_mut(id) {
            note.translate(delta);
            return true;
        }
        if let Some(image) = self.image_mut(id) {
            image.translate(delta);
            return true;
        }
        false
    }

    pub fn set_object_position(&mut self, id: ObjectId, position: Point) -> bool {
        if let Some(note) = self.note_mut(id) {
            note.position = position;
            return true;
        }
        if let Some(image) = self.image_mut(id) {
            image.position = position;
            return true;
        }
        false
    }

    pub fn set_object_bounds(&mut self, id: ObjectId, bounds: Rect) -> bool {
        if let Some(note) = self.note_mut(id) {
            note.set_bounds(bounds);
            return true;
        }
        if let Some(image) = self.image_mut(id) {
            image.set_bounds(bounds);
            return true;
        }
        false
    }

    /// Remove a note or image, pruning edges that touch it and fixing up
    /// group membership. Removing the last member of a group deletes the
    /// group record in the same call.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let group_id = self.object_group(id);

        let before = self.object_count();
        self.notes.retain(|n| n.id != id);
        self.images.retain(|i| i.id != id);
        if self.object_count() == before {
            return false;
        }

        self.edges.retain(|e| !e.touches(id));

        if let Some(gid) = group_id {
            self.remove_member_from_group(gid, id);
        }
        true
    }

    fn remove_member_from_group(&mut self, group_id: GroupId, member: ObjectId) {
        let mut now_empty = false;
        if let Some(group) = self.group_mut(group_id) {
            group.note_ids.retain(|&m| m != member);
            now_empty = group.note_ids.is_empty();
        }
        // A group never persists with an empty member list.
        if now_empty {
            self.groups.retain(|g| g.id != group_id);
        }
    }

    // --- Edges ---

    /// Add a directed edge. Self-edges, duplicate directed edges, and dead
    /// endpoints are rejected silently.
    pub fn add_edge(&mut self, from: ObjectId, to: ObjectId) -> Option<EdgeId> {
        if from == to {
            log::debug!("rejecting self-edge on {from}");
            return None;
        }
        if !self.contains_object(from) || !self.contains_object(to) {
            return None;
        }
        if self.edges.iter().any(|e| e.from == from && e.to == to) {
            log::debug!("rejecting duplicate edge {from} -> {to}");
            return None;
        }
        let edge = Edge::new(from, to);
        let id = edge.id;
        self.edges.push(edge);
        Some(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    /// Targets of outgoing edges from an object.
    pub fn children_of(&self, id: ObjectId) -> Vec<ObjectId> {
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to)
            .collect()
    }

    /// Source of the first incoming edge, if any.
    pub fn parent_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.edges.iter().find(|e| e.to == id).map(|e| e.from)
    }

    // --- Groups ---

    /// Group the given objects. Ids that don't resolve to live objects are
    /// dropped; fewer than two survivors means no group is created. Members
    /// already in another group are moved out of it first.
    pub fn create_group(
        &mut self,
        ids: &[ObjectId],
        name: impl Into<String>,
        created_at: u64,
    ) -> Option<GroupId> {
        let mut members: Vec<ObjectId> = Vec::new();
        for &id in ids {
            if self.contains_object(id) && !members.contains(&id) {
                members.push(id);
            }
        }
        if members.len() < 2 {
            return None;
        }

        for &id in &members {
            if let Some(old) = self.object_group(id) {
                self.remove_member_from_group(old, id);
            }
        }

        let color = Group::palette_color(self.groups.len());
        let group = Group::new(name, color, created_at, members.clone());
        let group_id = group.id;

        for &id in &members {
            if let Some(note) = self.note_mut(id) {
                note.group_id = Some(group_id);
                continue;
            }
            if let Some(image) = self.image_mut(id) {
                image.group_id = Some(group_id);
            }
        }

        self.groups.push(group);
        Some(group_id)
    }

    /// Dissolve a group, leaving its members on the board. Returns the
    /// former member ids.
    pub fn ungroup(&mut self, id: GroupId) -> Option<Vec<ObjectId>> {
        let pos = self.groups.iter().position(|g| g.id == id)?;
        let group = self.groups.remove(pos);
        for &member in &group.note_ids {
            if let Some(note) = self.note_mut(member) {
                note.group_id = None;
                continue;
            }
            if let Some(image) = self.image_mut(member) {
                image.group_id = None;
            }
        }
        Some(group.note_ids)
    }

    /// Delete a group and everything in it: member objects and any edge
    /// touching them.
    pub fn remove_group(&mut self, id: GroupId) -> bool {
        let Some(pos) = self.groups.iter().position(|g| g.id == id) else {
            return false;
        };
        let members = self.groups.remove(pos).note_ids;
        for member in members {
            self.notes.retain(|n| n.id != member);
            self.images.retain(|i| i.id != member);
            self.edges.retain(|e| !e.touches(member));
        }
        true
    }

    pub fn rename_group(&mut self, id: GroupId, name: impl Into<String>) -> bool {
        match self.group_mut(id) {
            Some(group) => {
                group.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn recolor_group(&mut self, id: GroupId, color: crate::model::SerializableColor) -> bool {
        match self.group_mut(id) {
            Some(group) => {
                group.color = color;
                true
            }
            None => false,
        }
    }

    /// Derived display rectangle of a group (member union + margin).
    pub fn group_bounds(&self, id: GroupId) -> Option<Rect> {
        let group = self.group(id)?;
        Group::display_bounds(
            group
                .note_ids
                .iter()
                .filter_map(|&m| self.object_bounds(m)),
        )
    }

    // --- Integrity / serialization ---

    /// Check the structural invariants: no dangling edge endpoints, no
    /// empty groups, group membership consistent with back-references.
    pub fn integrity_ok(&self) -> bool {
        let edges_ok = self
            .edges
            .iter()
            .all(|e| self.contains_object(e.from) && self.contains_object(e.to));
        let groups_ok = self.groups.iter().all(|g| {
            !g.note_ids.is_empty()
                && g.note_ids
                    .iter()
                    .all(|&m| self.object_group(m) == Some(g.id))
        });
        edges_ok && groups_ok
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
