//! Pointer/touch input and the gesture state machine.
//!
//! The router turns a raw stream of pointer events into drag, pan and
//! pinch gestures. It never mutates the scene or viewport itself; it returns
//! [`GestureAction`]s for the session to apply.

use crate::camera::Viewport;
use crate::scene::Scene;
use crate::shapes::DrawableId;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a contact point (mouse = 0, touches use their own ids).
pub type PointerId = u64;

/// Pointer event type for unified mouse/touch handling.
///
/// Positions are in screen coordinates of the canvas element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PointerEvent {
    Down { id: PointerId, position: Point },
    Move { id: PointerId, position: Point },
    Up { id: PointerId, position: Point },
    Cancel { id: PointerId },
}

/// Keyboard keys the composer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
}

/// Where keyboard focus currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyFocus {
    #[default]
    Canvas,
    /// A text-entry surface; editing keys belong to it.
    TextInput,
}

/// Advisory cursor feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorHint {
    #[default]
    Default,
    Grab,
    Grabbing,
}

/// The gesture currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// A selectable drawable follows the pointer.
    Dragging {
        id: DrawableId,
        pointer: PointerId,
        /// Screen position of the previous event, used to compute the delta.
        last: Point,
    },
    /// The zoomed-in canvas follows the pointer.
    Panning { pointer: PointerId, last: Point },
    /// Two contacts scale the viewport. Further contacts are ignored.
    Pinching {
        pointers: [PointerId; 2],
        baseline_distance: f64,
        baseline_zoom: f64,
    },
}

/// What the session should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    /// Change the active object (`None` deselects).
    Select(Option<DrawableId>),
    /// Translate a drawable by a canvas-space delta.
    MoveDrawable { id: DrawableId, delta: Vec2 },
    /// Shift the viewport pan by a screen-space delta.
    PanBy(Vec2),
    /// Request a new zoom factor (clamped by the viewport).
    SetZoom(f64),
}

/// Classifies pointer events into gestures.
#[derive(Debug, Clone, Default)]
pub struct GestureRouter {
    gesture: Gesture,
    /// Contacts currently down, keyed by pointer id.
    contacts: BTreeMap<PointerId, Point>,
}

impl GestureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    /// Number of contacts currently down.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Drop all contacts and return to idle.
    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
        self.contacts.clear();
    }

    /// Feed one pointer event through the state machine.
    pub fn handle(&mut self, event: PointerEvent, scene: &Scene, viewport: &Viewport) -> Vec<GestureAction> {
        match event {
            PointerEvent::Down { id, position } => self.pointer_down(id, position, scene, viewport),
            PointerEvent::Move { id, position } => self.pointer_move(id, position, viewport),
            PointerEvent::Up { id, .. } | PointerEvent::Cancel { id } => {
                self.pointer_up(id);
                Vec::new()
            }
        }
    }

    fn pointer_down(
        &mut self,
        id: PointerId,
        position: Point,
        scene: &Scene,
        viewport: &Viewport,
    ) -> Vec<GestureAction> {
        self.contacts.insert(id, position);

        if self.contacts.len() >= 2 {
            if matches!(self.gesture, Gesture::Pinching { .. }) {
                return Vec::new();
            }
            // A second contact always wins: whatever single-pointer gesture
            // was running is abandoned in favor of pinch tracking.
            let mut ids = self.contacts.keys().copied();
            self.gesture = match (ids.next(), ids.next()) {
                (Some(a), Some(b)) => match self.pinch_distance([a, b]) {
                    Some(distance) if distance > f64::EPSILON => Gesture::Pinching {
                        pointers: [a, b],
                        baseline_distance: distance,
                        baseline_zoom: viewport.zoom,
                    },
                    _ => Gesture::Idle,
                },
                _ => Gesture::Idle,
            };
            log::debug!("Pinch started with {} contacts", self.contacts.len());
            return Vec::new();
        }

        let canvas_point = viewport.screen_to_canvas(position);
        if let Some(hit) = scene.hit_test(canvas_point) {
            self.gesture = Gesture::Dragging {
                id: hit,
                pointer: id,
                last: position,
            };
            return vec![GestureAction::Select(Some(hit))];
        }

        self.gesture = if viewport.can_pan() {
            Gesture::Panning { pointer: id, last: position }
        } else {
            Gesture::Idle
        };
        vec![GestureAction::Select(None)]
    }

    fn pointer_move(&mut self, id: PointerId, position: Point, viewport: &Viewport) -> Vec<GestureAction> {
        if let Some(contact) = self.contacts.get_mut(&id) {
            *contact = position;
        } else {
            // Hover without a press.
            return Vec::new();
        }

        match self.gesture {
            Gesture::Idle => Vec::new(),
            Gesture::Panning { pointer, last } if pointer == id => {
                self.gesture = Gesture::Panning { pointer, last: position };
                vec![GestureAction::PanBy(position - last)]
            }
            Gesture::Dragging { id: target, pointer, last } if pointer == id => {
                self.gesture = Gesture::Dragging {
                    id: target,
                    pointer,
                    last: position,
                };
                // Screen deltas shrink by the zoom factor in canvas space.
                let delta = (position - last) / viewport.zoom;
                vec![GestureAction::MoveDrawable { id: target, delta }]
            }
            Gesture::Pinching {
                pointers,
                baseline_distance,
                baseline_zoom,
            } if pointers.contains(&id) => match self.pinch_distance(pointers) {
                Some(distance) => {
                    vec![GestureAction::SetZoom(pinch_zoom(baseline_zoom, baseline_distance, distance))]
                }
                None => Vec::new(),
            },
            Gesture::Panning { .. } | Gesture::Dragging { .. } | Gesture::Pinching { .. } => Vec::new(),
        }
    }

    fn pointer_up(&mut self, id: PointerId) {
        self.contacts.remove(&id);

        if self.contacts.is_empty() {
            self.gesture = Gesture::Idle;
            return;
        }

        match self.gesture {
            // Losing either pinch contact ends the pinch; neither panning nor
            // a pinch on the remaining contacts resumes mid-gesture.
            Gesture::Pinching { pointers, .. } if pointers.contains(&id) => self.gesture = Gesture::Idle,
            Gesture::Dragging { pointer, .. } | Gesture::Panning { pointer, .. } if pointer == id => {
                self.gesture = Gesture::Idle;
            }
            _ => {}
        }
    }

    fn pinch_distance(&self, [a, b]: [PointerId; 2]) -> Option<f64> {
        Some(self.contacts.get(&a)?.distance(*self.contacts.get(&b)?))
    }

    /// Cursor feedback for a hover position (screen coordinates).
    pub fn cursor(&self, hover: Point, scene: &Scene, viewport: &Viewport) -> CursorHint {
        if matches!(self.gesture, Gesture::Panning { .. }) {
            return CursorHint::Grabbing;
        }
        if viewport.can_pan() && scene.hit_test(viewport.screen_to_canvas(hover)).is_none() {
            return CursorHint::Grab;
        }
        CursorHint::Default
    }
}

/// Zoom implied by a pinch, before clamping.
pub fn pinch_zoom(baseline_zoom: f64, baseline_distance: f64, current_distance: f64) -> f64 {
    if baseline_distance <= f64::EPSILON {
        return baseline_zoom;
    }
    baseline_zoom * (current_distance / baseline_distance)
}
