//! Directed edge between board objects.

use super::{EdgeId, ObjectId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A directed connection between two board objects.
///
/// Both endpoints must reference live objects; the board prunes edges as
/// part of every object deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: ObjectId,
    pub to: ObjectId,
}

impl Edge {
    pub fn new(from: ObjectId, to: ObjectId) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
        }
    }

    /// Whether this edge touches the given object.
    pub fn touches(&self, id: ObjectId) -> bool {
        self.from == id || self.to == id
    }
}
