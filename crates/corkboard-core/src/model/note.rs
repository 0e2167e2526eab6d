//! Sticky note object.

use super::{GroupId, ObjectId, SerializableColor};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default sticky note colors, cycled when notes are created without an
/// explicit color.
pub const NOTE_PALETTE: [SerializableColor; 5] = [
    SerializableColor { r: 255, g: 235, b: 130, a: 255 }, // yellow
    SerializableColor { r: 186, g: 225, b: 255, a: 255 }, // blue
    SerializableColor { r: 196, g: 241, b: 190, a: 255 }, // green
    SerializableColor { r: 255, g: 204, b: 204, a: 255 }, // pink
    SerializableColor { r: 230, g: 214, b: 255, a: 255 }, // violet
];

/// A sticky note on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: ObjectId,
    /// Top-left corner in board coordinates.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Text content.
    pub content: String,
    pub color: SerializableColor,
    /// Back-reference to the owning group, if any.
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl Note {
    /// Default note width in board units.
    pub const DEFAULT_WIDTH: f64 = 180.0;
    /// Default note height in board units.
    pub const DEFAULT_HEIGHT: f64 = 120.0;

    /// Create a new note at the given position with default size.
    pub fn new(position: Point, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            content: content.into(),
            color: NOTE_PALETTE[0],
            group_id: None,
        }
    }

    /// Create a note centered on a point (used for generated placements).
    pub fn centered_at(center: Point, content: impl Into<String>) -> Self {
        let position = Point::new(
            center.x - Self::DEFAULT_WIDTH / 2.0,
            center.y - Self::DEFAULT_HEIGHT / 2.0,
        );
        Self::new(position, content)
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.color = color;
        self
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn hit_test(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Replace position and size from a bounding rectangle.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.position = Point::new(bounds.x0, bounds.y0);
        self.width = bounds.width();
        self.height = bounds.height();
    }
}
