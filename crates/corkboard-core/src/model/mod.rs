//! Board object definitions.

mod edge;
mod group;
mod image;
mod note;

pub use edge::Edge;
pub use group::{Group, GROUP_BOUNDS_MARGIN, GROUP_PALETTE};
pub use image::Image;
pub use note::{Note, NOTE_PALETTE};

use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for any board object (note or image).
pub type ObjectId = Uuid;

/// Identifier for a group.
pub type GroupId = Uuid;

/// Identifier for an edge.
pub type EdgeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn black() -> Self {
        Self::opaque(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::opaque(255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}
