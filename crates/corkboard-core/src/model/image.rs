//! Image object.

use super::{GroupId, ObjectId};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An image placed on the board.
///
/// Geometrically identical to a note; the pixel data lives behind the
/// `source` reference and is resolved by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: ObjectId,
    /// Top-left corner in board coordinates.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Content reference (URL, data URI, or asset key).
    pub source: String,
    /// Intrinsic pixel dimensions of the source, when known.
    #[serde(default)]
    pub natural_width: Option<u32>,
    #[serde(default)]
    pub natural_height: Option<u32>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl Image {
    /// Create a new image at the given position.
    pub fn new(position: Point, width: f64, height: f64, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            width,
            height,
            source: source.into(),
            natural_width: None,
            natural_height: None,
            group_id: None,
        }
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

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.position = Point::new(bounds.x0, bounds.y0);
        self.width = bounds.width();
        self.height = bounds.height();
    }

    /// Aspect ratio of the source pixels, falling back to the placed bounds.
    pub fn natural_aspect(&self) -> f64 {
        match (self.natural_width, self.natural_height) {
            (Some(w), Some(h)) if h > 0 => w as f64 / h as f64,
            _ => self.width / self.height.max(1.0),
        }
    }
}
