//! Viewport module for zoom/pan transforms.
//!
//! The viewport zooms about the canvas center and then shifts by the pan
//! offset, so a pan of `±(dim·zoom − dim)/2` brings an edge of the zoomed
//! canvas exactly to the edge of the visible area.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Zoom factor that shows the canvas at its native size.
pub const IDENTITY_ZOOM: f64 = 1.0;

/// Viewport state for the live canvas display.
///
/// All operations are pure: they return the new state and leave `self`
/// untouched, so callers decide when to apply it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom factor.
    pub zoom: f64,
    /// Current pan offset in canvas pixels.
    pub pan: Vec2,
    /// Canvas dimensions the pan bounds are derived from.
    pub canvas_size: Size,
    /// Minimum allowed zoom factor.
    pub min_zoom: f64,
    /// Maximum allowed zoom factor.
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: IDENTITY_ZOOM,
            pan: Vec2::ZERO,
            canvas_size: Size::new(600.0, 500.0),
            min_zoom: 0.25,
            max_zoom: 3.0,
        }
    }
}

impl Viewport {
    /// Create an identity viewport for a canvas of the given size.
    ///
    /// Reversed bounds are swapped and non-finite or non-positive ones fall
    /// back to the defaults.
    pub fn new(canvas_size: Size, min_zoom: f64, max_zoom: f64) -> Self {
        let (min_zoom, max_zoom) = normalize_zoom_bounds(min_zoom, max_zoom);
        Self {
            zoom: IDENTITY_ZOOM,
            pan: Vec2::ZERO,
            canvas_size,
            min_zoom,
            max_zoom,
        }
    }

    /// Clamp the requested zoom and re-clamp the pan to the new bounds.
    #[must_use]
    pub fn set_zoom(self, requested: f64) -> Self {
        // NaN would slip through `clamp`.
        let requested = if requested.is_nan() { self.zoom } else { requested };
        let (min_zoom, max_zoom) = normalize_zoom_bounds(self.min_zoom, self.max_zoom);
        let zoom = requested.clamp(min_zoom, max_zoom);
        let pan = if zoom <= IDENTITY_ZOOM { Vec2::ZERO } else { self.pan };
        Self { zoom, pan, ..self }.clamp_pan()
    }

    /// Shift the pan offset. Ignored unless zoomed in.
    #[must_use]
    pub fn pan_by(self, delta: Vec2) -> Self {
        if self.zoom <= IDENTITY_ZOOM || !delta.is_finite() {
            return self;
        }
        Self {
            pan: self.pan + delta,
            ..self
        }
        .clamp_pan()
    }

    /// Reset to zoom 1 with no pan.
    #[must_use]
    pub fn to_identity(self) -> Self {
        Self {
            zoom: IDENTITY_ZOOM,
            pan: Vec2::ZERO,
            ..self
        }
    }

    /// Change the canvas dimensions, keeping zoom and re-clamping pan.
    #[must_use]
    pub fn with_canvas_size(self, canvas_size: Size) -> Self {
        Self {
            canvas_size,
            ..self
        }
        .clamp_pan()
    }

    /// Largest pan magnitude allowed on each axis at the current zoom.
    pub fn max_pan(&self) -> Vec2 {
        if self.zoom <= IDENTITY_ZOOM {
            return Vec2::ZERO;
        }
        Vec2::new(
            (self.canvas_size.width * self.zoom - self.canvas_size.width) / 2.0,
            (self.canvas_size.height * self.zoom - self.canvas_size.height) / 2.0,
        )
    }

    /// Whether the viewport is zoom 1 with no pan.
    pub fn is_identity(&self) -> bool {
        (self.zoom - IDENTITY_ZOOM).abs() < f64::EPSILON && self.pan == Vec2::ZERO
    }

    /// Whether the canvas is zoomed in far enough to pan.
    pub fn can_pan(&self) -> bool {
        self.zoom > IDENTITY_ZOOM
    }

    /// Zoom as a rounded percentage label, e.g. `"150%"`.
    pub fn zoom_label(&self) -> String {
        format!("{}%", (self.zoom * 100.0).round() as i64)
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts canvas coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        let center = Vec2::new(self.canvas_size.width / 2.0, self.canvas_size.height / 2.0);
        Affine::translate(center + self.pan) * Affine::scale(self.zoom) * Affine::translate(-center)
    }

    /// Get the inverse transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        self.transform().inverse()
    }

    /// Convert a screen point to canvas coordinates.
    pub fn screen_to_canvas(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a canvas point to screen coordinates.
    pub fn canvas_to_screen(&self, canvas_point: Point) -> Point {
        self.transform() * canvas_point
    }

    fn clamp_pan(self) -> Self {
        let max = self.max_pan();
        Self {
            pan: Vec2::new(
                self.pan.x.clamp(-max.x, max.x),
                self.pan.y.clamp(-max.y, max.y),
            ),
            ..self
        }
    }
}

/// Order the zoom bounds so `f64::clamp` cannot panic.
fn normalize_zoom_bounds(min_zoom: f64, max_zoom: f64) -> (f64, f64) {
    let fallback = Viewport::default();
    let valid = |zoom: f64| zoom.is_finite() && zoom > 0.0;
    let min_zoom = if valid(min_zoom) { min_zoom } else { fallback.min_zoom };
    let max_zoom = if valid(max_zoom) { max_zoom } else { fallback.max_zoom };
    if min_zoom <= max_zoom {
        (min_zoom, max_zoom)
    } else {
        (max_zoom, min_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(Size::new(600.0, 500.0), 0.25, 3.0)
    }

    #[test]
    fn test_default_viewport() {
        let vp = Viewport::default();
        assert!(vp.is_identity());
        assert_eq!(vp.zoom_label(), "100%");
    }

    #[test]
    fn test_set_zoom_clamps() {
        for requested in [-5.0, 0.0, 0.1, 0.25, 0.7, 1.0, 2.2, 3.0, 9.0, f64::INFINITY] {
            let vp = viewport().set_zoom(requested);
            assert!(vp.zoom >= 0.25 && vp.zoom <= 3.0);
            assert!((vp.zoom - requested.clamp(0.25, 3.0)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_reversed_zoom_bounds_are_swapped() {
        let vp = Viewport::new(Size::new(600.0, 500.0), 4.0, 3.0);
        assert!((vp.min_zoom - 3.0).abs() < f64::EPSILON);
        assert!((vp.max_zoom - 4.0).abs() < f64::EPSILON);
        assert!((vp.set_zoom(2.0).zoom - 3.0).abs() < f64::EPSILON);
        assert!((vp.set_zoom(9.0).zoom - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_zoom_bounds_fall_back() {
        let vp = Viewport::new(Size::new(600.0, 500.0), f64::NAN, -1.0);
        assert!((vp.set_zoom(0.1).zoom - 0.25).abs() < f64::EPSILON);
        assert!((vp.set_zoom(9.0).zoom - 3.0).abs() < f64::EPSILON);

        // Bounds written directly into the fields are checked too.
        let vp = Viewport {
            min_zoom: 5.0,
            max_zoom: f64::NAN,
            ..Viewport::default()
        };
        assert!((vp.set_zoom(1.0).zoom - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_zoom_is_idempotent() {
        let once = viewport().set_zoom(2.0).pan_by(Vec2::new(40.0, -30.0)).set_zoom(1.7);
        let twice = once.set_zoom(1.7);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_zoom_out_resets_pan() {
        let vp = viewport().set_zoom(2.5).pan_by(Vec2::new(100.0, 100.0));
        assert_ne!(vp.pan, Vec2::ZERO);
        for zoom in [1.0, 0.9, 0.25] {
            assert_eq!(vp.set_zoom(zoom).pan, Vec2::ZERO);
        }
    }

    #[test]
    fn test_pan_ignored_at_or_below_identity() {
        let vp = viewport().pan_by(Vec2::new(50.0, 50.0));
        assert_eq!(vp.pan, Vec2::ZERO);
        let vp = viewport().set_zoom(0.5).pan_by(Vec2::new(50.0, 50.0));
        assert_eq!(vp.pan, Vec2::ZERO);
    }

    #[test]
    fn test_pan_clamped_to_zoom_bounds() {
        let vp = viewport().set_zoom(2.5).pan_by(Vec2::new(1000.0, 1000.0));
        assert!((vp.pan.x - 450.0).abs() < 1e-9);
        assert!((vp.pan.y - 375.0).abs() < 1e-9);

        let vp = vp.pan_by(Vec2::new(-5000.0, -5000.0));
        assert!((vp.pan.x + 450.0).abs() < 1e-9);
        assert!((vp.pan.y + 375.0).abs() < 1e-9);
    }

    #[test]
    fn test_zooming_out_shrinks_pan() {
        let vp = viewport().set_zoom(3.0).pan_by(Vec2::new(600.0, 0.0));
        assert!((vp.pan.x - 600.0).abs() < 1e-9);
        let vp = vp.set_zoom(1.5);
        assert!((vp.pan.x - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_identity() {
        let vp = viewport().set_zoom(2.0).pan_by(Vec2::new(10.0, 20.0)).to_identity();
        assert!(vp.is_identity());
        assert_eq!(vp.transform(), Affine::IDENTITY);
    }

    #[test]
    fn test_transform_keeps_center_fixed() {
        let vp = viewport().set_zoom(2.0);
        let center = Point::new(300.0, 250.0);
        let screen = vp.canvas_to_screen(center);
        assert!((screen.x - 300.0).abs() < 1e-9);
        assert!((screen.y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_pan_covers_visible_area() {
        // At the pan limit the zoomed canvas edge lines up with the view edge.
        let vp = viewport().set_zoom(2.0).pan_by(Vec2::new(1e6, 1e6));
        let top_left = vp.canvas_to_screen(Point::ZERO);
        assert!(top_left.x.abs() < 1e-9);
        assert!(top_left.y.abs() < 1e-9);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let vp = viewport().set_zoom(1.5).pan_by(Vec2::new(30.0, -20.0));
        let original = Point::new(123.0, 456.0);
        let back = vp.canvas_to_screen(vp.screen_to_canvas(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_label_rounds() {
        assert_eq!(viewport().set_zoom(1.234).zoom_label(), "123%");
        assert_eq!(viewport().set_zoom(0.1).zoom_label(), "25%");
    }
}
