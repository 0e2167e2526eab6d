//! Group records for combining notes and images.

use super::{GroupId, ObjectId, SerializableColor};
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Margin added around the union of member bounds when deriving a group's
/// display rectangle.
pub const GROUP_BOUNDS_MARGIN: f64 = 16.0;

/// Colors assigned to new groups, cycled by creation order.
pub const GROUP_PALETTE: [SerializableColor; 6] = [
    SerializableColor { r: 66, g: 133, b: 244, a: 255 },
    SerializableColor { r: 219, g: 68, b: 55, a: 255 },
    SerializableColor { r: 244, g: 180, b: 0, a: 255 },
    SerializableColor { r: 15, g: 157, b: 88, a: 255 },
    SerializableColor { r: 171, g: 71, b: 188, a: 255 },
    SerializableColor { r: 0, g: 172, b: 193, a: 255 },
];

/// A named group of board objects.
///
/// A group only exists while it has members: removing the last member
/// deletes the record in the same transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub color: SerializableColor,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Member object ids. Non-empty while the group exists.
    pub note_ids: Vec<ObjectId>,
}

impl Group {
    pub fn new(name: impl Into<String>, color: SerializableColor, created_at: u64, note_ids: Vec<ObjectId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color,
            created_at,
            note_ids,
        }
    }

    /// Color for the nth created group.
    pub fn palette_color(index: usize) -> SerializableColor {
        GROUP_PALETTE[index % GROUP_PALETTE.len()]
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.note_ids.contains(&id)
    }

    /// Derive the display rectangle from member bounds.
    ///
    /// Returns `None` when no member bounds are supplied (a state the board
    /// never persists).
    pub fn display_bounds<I>(member_bounds: I) -> Option<Rect>
    where
        I: IntoIterator<Item = Rect>,
    {
        let mut result: Option<Rect> = None;
        for bounds in member_bounds {
            result = Some(match result {
                Some(r) => r.union(bounds),
                None => bounds,
            });
        }
        result.map(|r| r.inflate(GROUP_BOUNDS_MARGIN, GROUP_BOUNDS_MARGIN))
    }
}
