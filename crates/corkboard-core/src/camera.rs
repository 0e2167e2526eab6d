//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Maximum allowed zoom level.
pub const MAX_ZOOM: f64 = 10.0;
/// Scroll-to-zoom sensitivity (multiplicative factor per scroll unit).
pub const WHEEL_ZOOM_INTENSITY: f64 = 0.0015;

/// Persisted view state, stored alongside the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub zoom: f64,
    pub pan: Vec2,
}

/// Camera manages the view transform for the board.
///
/// It handles panning (translation) and zooming (scaling), converting
/// between screen coordinates and board coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen units.
    pub pan: Vec2,
    /// Current zoom level.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// The affine transform converting board coordinates to screen
    /// coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// The inverse transform, for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.pan)
    }

    /// Convert a screen point to board coordinates.
    pub fn screen_to_board(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    /// Convert a board point to screen coordinates.
    pub fn board_to_screen(&self, board: Point) -> Point {
        self.transform() * board
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Zoom the camera, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let board_point = self.screen_to_board(screen);
        self.zoom = new_zoom;

        // Adjust pan so board_point stays under the screen point.
        let new_screen = self.board_to_screen(board_point);
        self.pan += Vec2::new(screen.x - new_screen.x, screen.y - new_screen.y);
    }

    /// Zoom from a scroll delta, scaled by gesture intensity.
    pub fn zoom_with_scroll(&mut self, screen: Point, scroll_delta_y: f64) {
        let factor = (-scroll_delta_y * WHEEL_ZOOM_INTENSITY).exp();
        self.zoom_at(screen, factor);
    }

    pub fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Fit the camera to show the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);

        let center = bounds.center();
        self.pan = Vec2::new(
            viewport.width / 2.0 - center.x * self.zoom,
            viewport.height / 2.0 - center.y * self.zoom,
        );
    }

    pub fn viewport_state(&self) -> ViewportState {
        ViewportState {
            zoom: self.zoom,
            pan: self.pan,
        }
    }

    pub fn apply_viewport_state(&mut self, state: ViewportState) {
        self.zoom = state.zoom.clamp(self.min_zoom, self.max_zoom);
        self.pan = state.pan;
    }
}

/// State captured at the start of a two-pointer (pinch) gesture.
///
/// Each update derives zoom and pan from the captured baseline rather than
/// accumulating per-event deltas, so dropped (rate-limited) events cannot
/// drift the transform.
#[derive(Debug, Clone, Copy)]
pub struct PinchState {
    start_distance: f64,
    start_centroid: Point,
    start_zoom: f64,
    start_pan: Vec2,
}

impl PinchState {
    /// Capture the gesture baseline from the two initial pointer positions.
    pub fn begin(camera: &Camera, a: Point, b: Point) -> Self {
        Self {
            start_distance: a.distance(b).max(1.0),
            start_centroid: midpoint(a, b),
            start_zoom: camera.zoom,
            start_pan: camera.pan,
        }
    }

    /// Apply the current pointer positions to the camera: scale from the
    /// distance ratio, translate from the centroid delta, both relative to
    /// the gesture start.
    pub fn apply(&self, camera: &mut Camera, a: Point, b: Point) {
        let distance = a.distance(b).max(1.0);
        let centroid = midpoint(a, b);
        let scale = distance / self.start_distance;

        let new_zoom = (self.start_zoom * scale).clamp(camera.min_zoom, camera.max_zoom);
        let applied_scale = new_zoom / self.start_zoom;

        // Keep the start centroid's board point under the current centroid.
        let translate = centroid - self.start_centroid;
        camera.zoom = new_zoom;
        camera.pan = Vec2::new(
            self.start_centroid.x + (self.start_pan.x - self.start_centroid.x) * applied_scale,
            self.start_centroid.y + (self.start_pan.y - self.start_centroid.y) * applied_scale,
        ) + translate;
    }
}

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.pan, Vec2::ZERO);
        assert!((camera.zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_board_with_pan() {
        let mut camera = Camera::new();
        camera.pan = Vec2::new(50.0, 100.0);
        let board = camera.screen_to_board(Point::new(100.0, 200.0));
        assert!((board.x - 50.0).abs() < f64::EPSILON);
        assert!((board.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_screen_to_board_with_zoom() {
        let mut camera = Camera::new();
        camera.zoom = 2.0;
        let board = camera.screen_to_board(Point::new(100.0, 200.0));
        assert!((board.x - 50.0).abs() < f64::EPSILON);
        assert!((board.y - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.pan = Vec2::new(30.0, -20.0);
        camera.zoom = 1.5;

        let original = Point::new(123.0, 456.0);
        let back = camera.board_to_screen(camera.screen_to_board(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_about_cursor_is_invariant() {
        // Zooming 1.0 -> 1.5 centered at (400, 300) leaves the board point
        // under the cursor unchanged.
        let mut camera = Camera::new();
        camera.pan = Vec2::new(17.0, -42.0);
        let cursor = Point::new(400.0, 300.0);

        let before = camera.screen_to_board(cursor);
        camera.zoom_at(cursor, 1.5);
        let after = camera.screen_to_board(cursor);

        assert!((camera.zoom - 1.5).abs() < f64::EPSILON);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 0.001);
        assert!((camera.zoom - camera.min_zoom).abs() < f64::EPSILON);

        camera.zoom = 1.0;
        camera.zoom_at(Point::ZERO, 1000.0);
        assert!((camera.zoom - camera.max_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tiny_zoom_delta_is_noop() {
        let mut camera = Camera::new();
        camera.pan = Vec2::new(5.0, 5.0);
        let pan_before = camera.pan;
        camera.zoom_at(Point::new(100.0, 100.0), 1.0);
        assert_eq!(camera.pan, pan_before);
    }

    #[test]
    fn test_pinch_scales_and_translates() {
        let mut camera = Camera::new();
        let a0 = Point::new(100.0, 300.0);
        let b0 = Point::new(300.0, 300.0);
        let pinch = PinchState::begin(&camera, a0, b0);

        // Spread the pointers to double the distance around the same
        // centroid: zoom doubles, centroid's board point stays put.
        let centroid = Point::new(200.0, 300.0);
        let board_before = camera.screen_to_board(centroid);
        pinch.apply(&mut camera, Point::new(0.0, 300.0), Point::new(400.0, 300.0));
        let board_after = camera.screen_to_board(centroid);

        assert!((camera.zoom - 2.0).abs() < 1e-9);
        assert!((board_before.x - board_after.x).abs() < 1e-9);
        assert!((board_before.y - board_after.y).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_translate_moves_pan() {
        let mut camera = Camera::new();
        let pinch = PinchState::begin(&camera, Point::new(100.0, 100.0), Point::new(200.0, 100.0));
        // Same distance, centroid moved +50 on x: pure pan.
        pinch.apply(&mut camera, Point::new(150.0, 100.0), Point::new(250.0, 100.0));
        assert!((camera.zoom - 1.0).abs() < 1e-9);
        assert!((camera.pan.x - 50.0).abs() < 1e-9);
        assert!(camera.pan.y.abs() < 1e-9);
    }

    #[test]
    fn test_fit_to_bounds() {
        let mut camera = Camera::new();
        camera.fit_to_bounds(
            Rect::new(0.0, 0.0, 400.0, 300.0),
            Size::new(800.0, 600.0),
            0.0,
        );
        assert!((camera.zoom - 2.0).abs() < f64::EPSILON);
        let center = camera.screen_to_board(Point::new(400.0, 300.0));
        assert!((center.x - 200.0).abs() < 1e-9);
        assert!((center.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_state_roundtrip() {
        let mut camera = Camera::new();
        camera.pan = Vec2::new(12.0, 34.0);
        camera.zoom = 3.0;
        let state = camera.viewport_state();

        let mut other = Camera::new();
        other.apply_viewport_state(state);
        assert_eq!(other.pan, camera.pan);
        assert!((other.zoom - camera.zoom).abs() < f64::EPSILON);
    }
}
