//! Drag and resize: handle geometry, resize math, and the gesture state
//! machine driven by the engine.
//!
//! A press enters `Pending`; crossing [`DRAG_THRESHOLD`] promotes it to an
//! active move. A release below the threshold is a click, which either
//! selects (object was not selected) or activates editing (object was
//! already selected before the press).

use crate::board::BoardData;
use crate::model::ObjectId;
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Movement (in board units) required to promote a press into a drag.
pub const DRAG_THRESHOLD: f64 = 5.0;
/// Minimum object width/height after a resize.
pub const MIN_OBJECT_SIZE: f64 = 40.0;
/// Maximum object width/height after a resize.
pub const MAX_OBJECT_SIZE: f64 = 2000.0;
/// Handle hit tolerance in screen pixels (divide by zoom for board units).
pub const HANDLE_HIT_TOLERANCE: f64 = 12.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge midpoint positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// One of the eight directional resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Corner(Corner),
    Side(Side),
}

/// A resize handle with its position.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    pub position: Point,
    pub kind: HandleKind,
}

/// The eight handles of a bounding rectangle.
pub fn handles(bounds: Rect) -> Vec<Handle> {
    let cx = bounds.center().x;
    let cy = bounds.center().y;
    vec![
        Handle { position: Point::new(bounds.x0, bounds.y0), kind: HandleKind::Corner(Corner::TopLeft) },
        Handle { position: Point::new(bounds.x1, bounds.y0), kind: HandleKind::Corner(Corner::TopRight) },
        Handle { position: Point::new(bounds.x0, bounds.y1), kind: HandleKind::Corner(Corner::BottomLeft) },
        Handle { position: Point::new(bounds.x1, bounds.y1), kind: HandleKind::Corner(Corner::BottomRight) },
        Handle { position: Point::new(cx, bounds.y0), kind: HandleKind::Side(Side::Top) },
        Handle { position: Point::new(bounds.x1, cy), kind: HandleKind::Side(Side::Right) },
        Handle { position: Point::new(cx, bounds.y1), kind: HandleKind::Side(Side::Bottom) },
        Handle { position: Point::new(bounds.x0, cy), kind: HandleKind::Side(Side::Left) },
    ]
}

/// Which handle (if any) the point hits. Corners are listed first, so a
/// corner wins over the adjacent sides at small sizes.
pub fn hit_test_handles(bounds: Rect, point: Point, tolerance: f64) -> Option<HandleKind> {
    handles(bounds)
        .into_iter()
        .find(|h| h.position.distance(point) <= tolerance)
        .map(|h| h.kind)
}

impl Corner {
    /// Movement signs: +1 where dragging in the positive direction grows
    /// the rectangle.
    fn signs(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (-1.0, -1.0),
            Corner::TopRight => (1.0, -1.0),
            Corner::BottomLeft => (-1.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }

    /// The fixed opposite corner.
    fn anchor(self, bounds: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(bounds.x1, bounds.y1),
            Corner::TopRight => Point::new(bounds.x0, bounds.y1),
            Corner::BottomLeft => Point::new(bounds.x1, bounds.y0),
            Corner::BottomRight => Point::new(bounds.x0, bounds.y0),
        }
    }
}

/// Resize a rectangle by dragging one of its eight handles.
///
/// The opposite edge/corner anchors the operation; size clamps to
/// [`MIN_OBJECT_SIZE`]..[`MAX_OBJECT_SIZE`] keep the anchor fixed. With
/// `keep_aspect`, the drag is projected onto the rectangle's original
/// diagonal (sign following the movement quadrant) and both dimensions
/// scale together.
pub fn resize_bounds(original: Rect, handle: HandleKind, delta: Vec2, keep_aspect: bool) -> Rect {
    match handle {
        HandleKind::Corner(corner) => resize_corner(original, corner, delta, keep_aspect),
        HandleKind::Side(side) => resize_side(original, side, delta, keep_aspect),
    }
}

fn clamp_scale(width: f64, height: f64, scale: f64) -> f64 {
    let lo = (MIN_OBJECT_SIZE / width).max(MIN_OBJECT_SIZE / height);
    let hi = (MAX_OBJECT_SIZE / width).min(MAX_OBJECT_SIZE / height);
    scale.clamp(lo, hi)
}

fn resize_corner(original: Rect, corner: Corner, delta: Vec2, keep_aspect: bool) -> Rect {
    let width = original.width().max(1.0);
    let height = original.height().max(1.0);
    let (sx, sy) = corner.signs();
    let anchor = corner.anchor(original);

    let (new_width, new_height) = if keep_aspect {
        // Project the drag onto the diagonal through the dragged corner;
        // the quadrant of movement decides growth vs shrink.
        let t = (delta.x * sx * width + delta.y * sy * height) / (width * width + height * height);
        let scale = clamp_scale(width, height, 1.0 + t);
        (width * scale, height * scale)
    } else {
        (
            (width + sx * delta.x).clamp(MIN_OBJECT_SIZE, MAX_OBJECT_SIZE),
            (height + sy * delta.y).clamp(MIN_OBJECT_SIZE, MAX_OBJECT_SIZE),
        )
    };

    // Rebuild from the anchored corner outward.
    let x0 = if sx < 0.0 { anchor.x - new_width } else { anchor.x };
    let y0 = if sy < 0.0 { anchor.y - new_height } else { anchor.y };
    Rect::new(x0, y0, x0 + new_width, y0 + new_height)
}

fn resize_side(original: Rect, side: Side, delta: Vec2, keep_aspect: bool) -> Rect {
    let width = original.width().max(1.0);
    let height = original.height().max(1.0);
    let aspect = width / height;

    match side {
        Side::Top | Side::Bottom => {
            let sy = if side == Side::Top { -1.0 } else { 1.0 };
            let new_height = (height + sy * delta.y).clamp(MIN_OBJECT_SIZE, MAX_OBJECT_SIZE);
            let anchor_y = if side == Side::Top { original.y1 } else { original.y0 };
            let y0 = if sy < 0.0 { anchor_y - new_height } else { anchor_y };
            if keep_aspect {
                let new_width = (new_height * aspect).clamp(MIN_OBJECT_SIZE, MAX_OBJECT_SIZE);
                let cx = original.center().x;
                Rect::new(cx - new_width / 2.0, y0, cx + new_width / 2.0, y0 + new_height)
            } else {
                Rect::new(original.x0, y0, original.x1, y0 + new_height)
            }
        }
        Side::Left | Side::Right => {
            let sx = if side == Side::Left { -1.0 } else { 1.0 };
            let new_width = (width + sx * delta.x).clamp(MIN_OBJECT_SIZE, MAX_OBJECT_SIZE);
            let anchor_x = if side == Side::Left { original.x1 } else { original.x0 };
            let x0 = if sx < 0.0 { anchor_x - new_width } else { anchor_x };
            if keep_aspect {
                let new_height = (new_width / aspect).clamp(MIN_OBJECT_SIZE, MAX_OBJECT_SIZE);
                let cy = original.center().y;
                Rect::new(x0, cy - new_height / 2.0, x0 + new_width, cy + new_height)
            } else {
                Rect::new(x0, original.y0, x0 + new_width, original.y1)
            }
        }
    }
}

/// The active pointer gesture.
///
/// Move/resize gestures carry the board state captured at activation:
/// committing checkpoints that pre-state into history, cancelling
/// (Escape) restores it, so an abandoned gesture never mutates committed
/// state.
#[derive(Debug, Clone, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Pressed on an object; not yet past the drag threshold.
    Pending {
        target: ObjectId,
        press: Point,
        /// Whether the object was selected before this press (drives the
        /// click-to-activate rule on release).
        was_selected: bool,
    },
    /// Moving the selection (or a whole group) with a uniform delta.
    MovingObjects {
        start: Point,
        /// Positions captured at drag start.
        origins: HashMap<ObjectId, Point>,
        pre_state: Box<BoardData>,
    },
    /// Resizing a single object by a handle.
    Resizing {
        target: ObjectId,
        handle: HandleKind,
        original: Rect,
        start: Point,
        pre_state: Box<BoardData>,
    },
    /// Rectangular drag-to-select.
    Marquee { start: Point, current: Point },
    /// Dragging the canvas.
    Panning { last_screen: Point },
    /// Drawing a connection from an object; released over a target
    /// commits an edge, anywhere else discards.
    Connecting { from: ObjectId, current: Point },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}
