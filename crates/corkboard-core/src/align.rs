//! Edge and center alignment between a moving object and its static peers.
//!
//! Alignment is computed per axis: the horizontal correction (a vertical
//! guide) and the vertical correction (a horizontal guide) are chosen
//! independently, never jointly. When two candidates tie in distance the
//! first one found wins; peer iteration order is the caller's slice order,
//! which keeps the tie-break stable.

use kurbo::{Rect, Vec2};

/// Maximum distance at which an edge or center is pulled onto a peer's
/// aligned coordinate, in board units.
pub const SNAP_THRESHOLD: f64 = 10.0;

/// Extension added to each end of a guide segment, in board units.
pub const GUIDE_MARGIN: f64 = 50.0;

/// Coordinate-equality tolerance when collecting objects that share a
/// snapped coordinate for the guide segment.
const COORD_EPSILON: f64 = 0.5;

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAxis {
    /// A horizontal line (y = position, x from start to end).
    Horizontal,
    /// A vertical line (x = position, y from start to end).
    Vertical,
}

/// An ephemeral alignment guide. Recomputed on every drag tick and never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentGuide {
    pub axis: GuideAxis,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

/// Outcome of an alignment query: the positional correction to apply to
/// the moving bounds, plus the guides to display.
#[derive(Debug, Clone)]
pub struct AlignResult {
    pub delta: Vec2,
    pub guides: Vec<AlignmentGuide>,
}

impl AlignResult {
    fn none() -> Self {
        Self {
            delta: Vec2::ZERO,
            guides: Vec::new(),
        }
    }

    pub fn is_snapped(&self) -> bool {
        self.delta.x != 0.0 || self.delta.y != 0.0 || !self.guides.is_empty()
    }
}

/// The three alignable coordinates of a rect on one axis.
fn axis_coords(min: f64, max: f64) -> [f64; 3] {
    [min, max, (min + max) / 2.0]
}

/// Best correction on one axis: the minimum-distance candidate among the
/// five edge/center pairings, under the snap threshold.
///
/// Returns `(correction, snapped_coordinate)`.
fn best_axis_snap(moving_min: f64, moving_max: f64, peers: &[(f64, f64)]) -> Option<(f64, f64)> {
    let moving_center = (moving_min + moving_max) / 2.0;
    // near-near, near-far, far-near, far-far, center-center
    let mut best: Option<(f64, f64)> = None;
    let mut best_dist = SNAP_THRESHOLD;

    for &(peer_min, peer_max) in peers {
        let peer_center = (peer_min + peer_max) / 2.0;
        let candidates = [
            (moving_min, peer_min),
            (moving_min, peer_max),
            (moving_max, peer_min),
            (moving_max, peer_max),
            (moving_center, peer_center),
        ];
        for (from, to) in candidates {
            let dist = (to - from).abs();
            if dist < best_dist {
                best_dist = dist;
                best = Some((to - from, to));
            }
        }
    }
    best
}

/// Guide segment along the perpendicular axis: the union of the
/// perpendicular ranges of every rect sharing the snapped coordinate,
/// extended by [`GUIDE_MARGIN`] on each end.
fn guide_span(
    coordinate: f64,
    snapped: Rect,
    peers: &[Rect],
    coords_of: impl Fn(&Rect) -> [f64; 3],
    range_of: impl Fn(&Rect) -> (f64, f64),
) -> (f64, f64) {
    let (mut start, mut end) = range_of(&snapped);
    for peer in peers {
        if coords_of(peer)
            .iter()
            .any(|&c| (c - coordinate).abs() < COORD_EPSILON)
        {
            let (peer_start, peer_end) = range_of(peer);
            start = start.min(peer_start);
            end = end.max(peer_end);
        }
    }
    (start - GUIDE_MARGIN, end + GUIDE_MARGIN)
}

/// Compute the alignment correction for a moving rect against static
/// peers.
///
/// For a multi-object move, pass the bounding box of the whole moving set;
/// the returned delta applies uniformly to every member. Applying the
/// result and re-running the query yields a zero correction (idempotent).
pub fn align_rect(moving: Rect, peers: &[Rect]) -> AlignResult {
    if peers.is_empty() {
        return AlignResult::none();
    }

    let x_ranges: Vec<(f64, f64)> = peers.iter().map(|p| (p.x0, p.x1)).collect();
    let y_ranges: Vec<(f64, f64)> = peers.iter().map(|p| (p.y0, p.y1)).collect();

    let x_snap = best_axis_snap(moving.x0, moving.x1, &x_ranges);
    let y_snap = best_axis_snap(moving.y0, moving.y1, &y_ranges);

    let delta = Vec2::new(
        x_snap.map(|(d, _)| d).unwrap_or(0.0),
        y_snap.map(|(d, _)| d).unwrap_or(0.0),
    );
    let snapped = moving + delta;

    let mut guides = Vec::new();
    if let Some((_, coord)) = x_snap {
        let (start, end) = guide_span(
            coord,
            snapped,
            peers,
            |r| axis_coords(r.x0, r.x1),
            |r| (r.y0, r.y1),
        );
        guides.push(AlignmentGuide {
            axis: GuideAxis::Vertical,
            position: coord,
            start,
            end,
        });
    }
    if let Some((_, coord)) = y_snap {
        let (start, end) = guide_span(
            coord,
            snapped,
            peers,
            |r| axis_coords(r.y0, r.y1),
            |r| (r.x0, r.x1),
        );
        guides.push(AlignmentGuide {
            axis: GuideAxis::Horizontal,
            position: coord,
            start,
            end,
        });
    }

    AlignResult { delta, guides }
}
