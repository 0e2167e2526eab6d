//! Placement of freshly generated notes around a target node.
//!
//! The mind-map topology is a plain edge list with no enforced acyclicity:
//! every traversal here takes an explicit visited set and never assumes a
//! tree.

use crate::board::BoardData;
use crate::model::ObjectId;
use kurbo::Point;
use std::collections::HashSet;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Distance from the target at which new nodes are placed.
pub const BASE_RADIUS: f64 = 260.0;
/// Maximum radial jitter applied per placement, in board units.
pub const RADIUS_JITTER: f64 = 24.0;
/// Angular spread contributed per additional fanned node.
pub const FAN_STEP: f64 = PI / 6.0;
/// Cap on the total fan spread.
pub const MAX_FAN_SPREAD: f64 = 2.0 * PI / 3.0;
/// Guaranteed pairwise angular separation for small batches.
pub const MIN_ANGULAR_SEPARATION: f64 = PI / 16.0;
/// Cell spacing of the grid fallback.
pub const GRID_SPACING: f64 = 220.0;

/// Compute `count` positions (note centers) around the target object.
///
/// - Existing children (outgoing edges) occupy angular sectors; new nodes
///   fill the single largest gap between them at equal angular steps.
/// - With no children, new nodes fan outward continuing the parent-to-
///   target direction, or downward when the target has no parent.
/// - With no usable target, positions fall back to a centered grid.
///
/// The angular partition is deterministic; only the radius carries a small
/// per-item jitter to break mechanical regularity.
pub fn place_around(board: &BoardData, target: ObjectId, count: usize) -> Vec<Point> {
    if count == 0 {
        return Vec::new();
    }
    let Some(center) = board.object_center(target) else {
        return grid_fallback(Point::ZERO, count);
    };

    let child_angles = child_angles(board, target, center);
    let angles = if child_angles.is_empty() {
        fan_angles(board, target, center, count)
    } else {
        gap_angles(&child_angles, count)
    };

    angles
        .into_iter()
        .enumerate()
        .map(|(i, angle)| {
            let radius = BASE_RADIUS + radius_jitter(target, i);
            Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Angles of existing children relative to the target center, normalized
/// to [0, 2π). Children sitting exactly on the center are skipped.
fn child_angles(board: &BoardData, target: ObjectId, center: Point) -> Vec<f64> {
    let mut angles: Vec<f64> = board
        .children_of(target)
        .into_iter()
        .filter_map(|child| board.object_center(child))
        .filter_map(|child_center| {
            let dx = child_center.x - center.x;
            let dy = child_center.y - center.y;
            if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
                None
            } else {
                Some(normalize_angle(dy.atan2(dx)))
            }
        })
        .collect();
    angles.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    angles
}

/// Fan `count` angles around an outward direction: away from the parent
/// when one exists, straight down otherwise. The spread grows with the
/// batch size up to [`MAX_FAN_SPREAD`].
fn fan_angles(board: &BoardData, target: ObjectId, center: Point, count: usize) -> Vec<f64> {
    let direction = board
        .parent_of(target)
        .and_then(|parent| board.object_center(parent))
        .map(|parent_center| {
            let dx = center.x - parent_center.x;
            let dy = center.y - parent_center.y;
            if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
                FRAC_PI_2
            } else {
                dy.atan2(dx)
            }
        })
        .unwrap_or(FRAC_PI_2);

    if count == 1 {
        return vec![normalize_angle(direction)];
    }

    let spread = (FAN_STEP * (count - 1) as f64).min(MAX_FAN_SPREAD);
    let step = spread / (count - 1) as f64;
    (0..count)
        .map(|i| normalize_angle(direction - spread / 2.0 + step * i as f64))
        .collect()
}

/// Distribute `count` angles evenly inside the largest gap between the
/// sorted child angles.
fn gap_angles(sorted: &[f64], count: usize) -> Vec<f64> {
    let (gap_start, gap_size) = largest_angular_gap(sorted);
    let step = gap_size / (count + 1) as f64;
    (0..count)
        .map(|i| normalize_angle(gap_start + step * (i + 1) as f64))
        .collect()
}

/// The largest unoccupied sector between consecutive sorted angles,
/// including the wraparound gap from the last angle back to the first.
/// Returns `(start, size)`.
fn largest_angular_gap(sorted: &[f64]) -> (f64, f64) {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return (sorted[0], TAU);
    }

    let mut best_start = sorted[sorted.len() - 1];
    let mut best_size = sorted[0] + TAU - sorted[sorted.len() - 1];
    for pair in sorted.windows(2) {
        let size = pair[1] - pair[0];
        if size > best_size {
            best_size = size;
            best_start = pair[0];
        }
    }
    (best_start, best_size)
}

/// Grid fallback: `count` positions in a centered grid below the origin.
fn grid_fallback(origin: Point, count: usize) -> Vec<Point> {
    let cols = (count as f64).sqrt().ceil() as usize;
    (0..count)
        .map(|i| {
            let col = i % cols;
            let row = i / cols;
            Point::new(
                origin.x + (col as f64 - (cols - 1) as f64 / 2.0) * GRID_SPACING,
                origin.y + BASE_RADIUS + row as f64 * GRID_SPACING,
            )
        })
        .collect()
}

fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle % TAU;
    if wrapped < 0.0 { wrapped + TAU } else { wrapped }
}

/// Deterministic per-placement radius jitter in [-RADIUS_JITTER,
/// RADIUS_JITTER], derived from the target id and slot index with a
/// splitmix-style mix (no RNG dependency, stable on all platforms).
fn radius_jitter(target: ObjectId, index: usize) -> f64 {
    let mut x = (target.as_u128() as u32) ^ (index as u32).wrapping_mul(0x9E37_79B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2_AE35);
    x ^= x >> 16;
    let unit = x as f64 / u32::MAX as f64; // [0, 1]
    (unit * 2.0 - 1.0) * RADIUS_JITTER
}

/// Collect the ids reachable from `start` within `max_depth` edge hops,
/// following edges in both directions. The caller-supplied visited set is
/// mutated in place; topology may contain cycles.
pub fn related_neighborhood(
    board: &BoardData,
    start: ObjectId,
    max_depth: usize,
    visited: &mut HashSet<ObjectId>,
) -> Vec<ObjectId> {
    let mut result = Vec::new();
    let mut frontier = vec![start];
    visited.insert(start);

    for _ in 0..max_depth {
        let mut next = Vec::new();
        for &id in &frontier {
            for edge in &board.edges {
                let neighbor = if edge.from == id {
                    edge.to
                } else if edge.to == id {
                    edge.from
                } else {
                    continue;
                };
                if visited.insert(neighbor) {
                    result.push(neighbor);
                    next.push(neighbor);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Note;

    fn board_with_target() -> (BoardData, ObjectId) {
        let mut board = BoardData::new();
        let target = board.add_note(Note::centered_at(Point::new(0.0, 0.0), "target"));
        (board, target)
    }

    fn add_child_at(board: &mut BoardData, target: ObjectId, center: Point) -> ObjectId {
        let child = board.add_note(Note::centered_at(center, "child"));
        board.add_edge(target, child).unwrap();
        child
    }

    fn angle_of(center: Point, p: Point) -> f64 {
        normalize_angle((p.y - center.y).atan2(p.x - center.x))
    }

    fn angular_distance(a: f64, b: f64) -> f64 {
        let d = normalize_angle(a - b);
        d.min(TAU - d)
    }

    #[test]
    fn test_no_topology_fans_downward() {
        let (board, target) = board_with_target();
        let positions = place_around(&board, target, 3);
        assert_eq!(positions.len(), 3);
        // All placements are below the target.
        for p in &positions {
            assert!(p.y > 0.0);
        }
    }

    #[test]
    fn test_fan_continues_parent_direction() {
        let (mut board, target) = board_with_target();
        let parent = board.add_note(Note::centered_at(Point::new(-400.0, 0.0), "parent"));
        board.add_edge(parent, target).unwrap();

        let positions = place_around(&board, target, 3);
        // Parent is to the left, so the fan continues rightward.
        for p in &positions {
            assert!(p.x > 0.0, "expected rightward placement, got {p:?}");
        }
    }

    #[test]
    fn test_gap_placement_avoids_children(){
        let (mut board, target) = board_with_target();
        // Children to the right and below: the largest gap opens between
        // the downward child (90°) around to the rightward child (0/360°).
        add_child_at(&mut board, target, Point::new(300.0, 0.0));
        add_child_at(&mut board, target, Point::new(0.0, 300.0));

        let positions = place_around(&board, target, 2);
        let center = Point::new(0.0, 0.0);
        for p in &positions {
            let a = angle_of(center, *p);
            // Inside (90°, 360°), clear of both children.
            assert!(a > FRAC_PI_2 && a < TAU);
        }
    }

    #[test]
    fn test_single_child_wraparound_gap() {
        let (mut board, target) = board_with_target();
        add_child_at(&mut board, target, Point::new(300.0, 0.0));

        let positions = place_around(&board, target, 1);
        let a = angle_of(Point::ZERO, positions[0]);
        // One child at 0°: the whole circle is the gap, so the single new
        // node lands opposite it.
        assert!((a - PI).abs() < 1e-9);
    }

    #[test]
    fn test_angular_separation_property() {
        // For K <= 6 around a target with a couple of children, every pair
        // of placements (new-new and new-existing) stays separated.
        let (mut board, target) = board_with_target();
        add_child_at(&mut board, target, Point::new(300.0, 0.0));
        add_child_at(&mut board, target, Point::new(-300.0, 0.0));

        for k in 1..=6 {
            let positions = place_around(&board, target, k);
            let mut angles: Vec<f64> = positions
                .iter()
                .map(|&p| angle_of(Point::ZERO, p))
                .collect();
            angles.push(0.0); // existing child
            angles.push(PI); // existing child

            for i in 0..angles.len() {
                for j in (i + 1)..angles.len() {
                    assert!(
                        angular_distance(angles[i], angles[j]) >= MIN_ANGULAR_SEPARATION,
                        "k={k}: angles {i} and {j} too close"
                    );
                }
            }
        }
    }

    #[test]
    fn test_radius_stays_near_base() {
        let (board, target) = board_with_target();
        for (i, p) in place_around(&board, target, 6).iter().enumerate() {
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!(
                (r - BASE_RADIUS).abs() <= RADIUS_JITTER + 1e-9,
                "placement {i} at radius {r}"
            );
        }
    }

    #[test]
    fn test_missing_target_grid_fallback() {
        let board = BoardData::new();
        let positions = place_around(&board, uuid::Uuid::new_v4(), 5);
        assert_eq!(positions.len(), 5);
        // Distinct cells.
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                assert!(positions[i].distance(positions[j]) > 1.0);
            }
        }
    }

    #[test]
    fn test_neighborhood_handles_cycles() {
        let mut board = BoardData::new();
        let a = board.add_note(Note::centered_at(Point::new(0.0, 0.0), "a"));
        let b = board.add_note(Note::centered_at(Point::new(300.0, 0.0), "b"));
        let c = board.add_note(Note::centered_at(Point::new(600.0, 0.0), "c"));
        board.add_edge(a, b).unwrap();
        board.add_edge(b, c).unwrap();
        board.add_edge(c, a).unwrap(); // cycle

        let mut visited = HashSet::new();
        let related = related_neighborhood(&board, a, 10, &mut visited);
        assert_eq!(related.len(), 2);
        assert!(visited.contains(&a) && visited.contains(&b) && visited.contains(&c));
    }

    #[test]
    fn test_neighborhood_depth_limit() {
        let mut board = BoardData::new();
        let a = board.add_note(Note::centered_at(Point::new(0.0, 0.0), "a"));
        let b = board.add_note(Note::centered_at(Point::new(300.0, 0.0), "b"));
        let c = board.add_note(Note::centered_at(Point::new(600.0, 0.0), "c"));
        board.add_edge(a, b).unwrap();
        board.add_edge(b, c).unwrap();

        let mut visited = HashSet::new();
        let related = related_neighborhood(&board, a, 1, &mut visited);
        assert_eq!(related, vec![b]);
    }
}
