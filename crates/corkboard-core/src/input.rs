//! Input state management for mouse/touch/keyboard events.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Instant;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
///
/// Gesture meaning across the engine: `shift` multi-selects (and locks
/// aspect ratio during resize), `alt` enables alignment snapping, `ctrl`
/// turns scroll into zoom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer event type for unified mouse/touch handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
    Scroll { position: Point, delta: Vec2 },
}

/// Keyboard event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Double-click detection constants.
const DOUBLE_CLICK_TIME_MS: u128 = 500;
const DOUBLE_CLICK_DISTANCE: f64 = 5.0;

/// Tracks the current input state across frames, including the active
/// touch points that feed pinch gestures.
#[derive(Debug, Clone)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Previous pointer position for delta calculations.
    pub previous_pointer_position: Point,
    /// Currently pressed mouse buttons.
    pressed_buttons: HashSet<MouseButton>,
    /// Current modifier keys state.
    pub modifiers: Modifiers,
    /// Currently pressed keys.
    pressed_keys: HashSet<String>,
    /// Start position of the current press, if any.
    pub press_start: Option<Point>,
    /// Active touch points by pointer id (for pinch detection).
    touches: HashMap<u64, Point>,
    /// Last click time for double-click detection.
    last_click_time: Option<Instant>,
    /// Last click position for double-click detection.
    last_click_position: Option<Point>,
    /// Whether a double-click was detected by the latest press.
    double_click_detected: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            pointer_position: Point::ZERO,
            previous_pointer_position: Point::ZERO,
            pressed_buttons: HashSet::new(),
            modifiers: Modifiers::default(),
            pressed_keys: HashSet::new(),
            press_start: None,
            touches: HashMap::new(),
            last_click_time: None,
            last_click_position: None,
            double_click_detected: false,
        }
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.insert(button);

                if button == MouseButton::Left {
                    self.detect_double_click(position);
                    self.press_start = Some(position);
                }
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.remove(&button);
                if button == MouseButton::Left {
                    self.press_start = None;
                }
            }
            PointerEvent::Move { position } => {
                self.previous_pointer_position = self.pointer_position;
                self.pointer_position = position;
            }
            PointerEvent::Scroll { position, .. } => {
                self.pointer_position = position;
            }
        }
    }

    fn detect_double_click(&mut self, position: Point) {
        let now = Instant::now();
        self.double_click_detected = false;
        if let (Some(last_time), Some(last_pos)) = (self.last_click_time, self.last_click_position)
        {
            let elapsed = now.duration_since(last_time).as_millis();
            let distance = position.distance(last_pos);
            if elapsed < DOUBLE_CLICK_TIME_MS && distance < DOUBLE_CLICK_DISTANCE {
                self.double_click_detected = true;
                // Reset so a triple-click doesn't read as another double
                self.last_click_time = None;
                self.last_click_position = None;
                return;
            }
        }
        self.last_click_time = Some(now);
        self.last_click_position = Some(position);
    }

    /// Process a key event.
    pub fn handle_key_event(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Pressed(key) => {
                self.pressed_keys.insert(key);
            }
            KeyEvent::Released(key) => {
                self.pressed_keys.remove(&key);
            }
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }

    /// Whether the latest press completed a double-click.
    pub fn is_double_click(&self) -> bool {
        self.double_click_detected
    }

    /// Pointer movement since the previous move event.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }

    /// Distance travelled since the press began, if pressed.
    pub fn press_delta(&self) -> Option<Vec2> {
        self.press_start.map(|start| self.pointer_position - start)
    }

    // --- Touch tracking (pinch) ---

    pub fn touch_down(&mut self, id: u64, position: Point) {
        self.touches.insert(id, position);
    }

    pub fn touch_move(&mut self, id: u64, position: Point) {
        if let Some(p) = self.touches.get_mut(&id) {
            *p = position;
        }
    }

    pub fn touch_up(&mut self, id: u64) {
        self.touches.remove(&id);
    }

    /// The two active touch points when exactly two fingers are down, in
    /// stable (id) order.
    pub fn pinch_points(&self) -> Option<(Point, Point)> {
        if self.touches.len() != 2 {
            return None;
        }
        let mut entries: Vec<(&u64, &Point)> = self.touches.iter().collect();
        entries.sort_by_key(|(id, _)| **id);
        Some((*entries[0].1, *entries[1].1))
    }
}
