//! Pointer input for move gestures.

use crate::math::Axis;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Pointer travel (in root units) before a constrained drag picks its axis.
pub const DRAG_DIRECTION_THRESHOLD: f64 = 4.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer events a gesture is made of. Positions are in the root frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        button: MouseButton,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    /// The pointer re-entered the surface; `buttons` tells whether any button is still held.
    Enter { position: Point, buttons: bool },
}

/// Pointer tracking across one drag.
#[derive(Debug, Clone, Default)]
pub struct DragState {
    start: Option<Point>,
    previous: Point,
    current: Point,
    pressed: HashSet<MouseButton>,
    pub modifiers: Modifiers,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, position: Point, button: MouseButton, modifiers: Modifiers) {
        self.pressed.insert(button);
        self.modifiers = modifiers;
        if button == MouseButton::Left {
            self.start = Some(position);
            self.previous = position;
            self.current = position;
        }
    }

    pub fn move_to(&mut self, position: Point, modifiers: Modifiers) {
        self.previous = self.current;
        self.current = position;
        self.modifiers = modifiers;
    }

    pub fn release(&mut self, position: Point, button: MouseButton) {
        self.move_to(position, self.modifiers);
        self.pressed.remove(&button);
        if button == MouseButton::Left {
            self.start = None;
        }
    }

    /// Forget every held button, e.g. when the pointer comes back with none pressed.
    pub fn reset(&mut self) {
        self.pressed.clear();
        self.start = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.start.is_some()
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed.contains(&button)
    }

    pub fn position(&self) -> Point {
        self.current
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    /// Offset from the drag start, if dragging.
    pub fn drag_delta(&self) -> Option<Vec2> {
        self.start.map(|start| self.current - start)
    }

    /// Movement since the previous event.
    pub fn step_delta(&self) -> Vec2 {
        self.current - self.previous
    }

    /// The axis the drag mostly follows, once it has travelled far enough to tell.
    pub fn dominant_axis(&self) -> Option<Axis> {
        let delta = self.drag_delta()?;
        if delta.hypot() < DRAG_DIRECTION_THRESHOLD {
            return None;
        }
        Some(if delta.x.abs() >= delta.y.abs() { Axis::X } else { Axis::Y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_press() {
        let mut drag = DragState::new();
        drag.press(Point::new(100.0, 100.0), MouseButton::Left, Modifiers::default());
        assert!(drag.is_button_pressed(MouseButton::Left));
        assert!(!drag.is_button_pressed(MouseButton::Right));
        assert!(drag.is_dragging());
    }

    #[test]
    fn test_drag_tracking() {
        let mut drag = DragState::new();
        drag.press(Point::new(100.0, 100.0), MouseButton::Left, Modifiers::default());
        drag.move_to(Point::new(150.0, 120.0), Modifiers::default());
        drag.move_to(Point::new(160.0, 120.0), Modifiers::default());

        let delta = drag.drag_delta().unwrap();
        assert!((delta.x - 60.0).abs() < f64::EPSILON);
        assert!((delta.y - 20.0).abs() < f64::EPSILON);
        assert_eq!(drag.step_delta(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_release_ends_drag() {
        let mut drag = DragState::new();
        drag.press(Point::ZERO, MouseButton::Left, Modifiers::default());
        drag.release(Point::new(5.0, 5.0), MouseButton::Left);
        assert!(!drag.is_dragging());
        assert!(drag.drag_delta().is_none());
        assert_eq!(drag.position(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_dominant_axis() {
        let mut drag = DragState::new();
        drag.press(Point::ZERO, MouseButton::Left, Modifiers::default());
        drag.move_to(Point::new(1.0, 2.0), Modifiers::default());
        assert_eq!(drag.dominant_axis(), None);
        drag.move_to(Point::new(3.0, -9.0), Modifiers::default());
        assert_eq!(drag.dominant_axis(), Some(Axis::Y));
    }

    #[test]
    fn test_pointer_event_json() {
        let event: PointerEvent =
            serde_json::from_str(r#"{"type":"move","position":{"x":1.0,"y":2.0},"modifiers":{"shift":true}}"#)
                .unwrap();
        assert_eq!(
            event,
            PointerEvent::Move {
                position: Point::new(1.0, 2.0),
                modifiers: Modifiers {
                    shift: true,
                    ..Modifiers::default()
                },
            }
        );
    }
}
