//! Renderer trait abstraction.

use kurbo::{Affine, Size};
use peniko::Color;
use swatcher_core::camera::Viewport;
use swatcher_core::scene::Scene;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Decode failed: {0}")]
    Decode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render.
pub struct RenderContext<'a> {
    /// The scene to render.
    pub scene: &'a Scene,
    /// Live zoom/pan applied to the whole surface.
    pub viewport: Viewport,
    /// Output pixels per canvas pixel.
    pub multiplier: f64,
    /// Color painted behind every drawable.
    pub background_color: Color,
    /// Whether to draw the outline and handles of the active object.
    pub show_selection: bool,
    /// Selection highlight color.
    pub selection_color: Color,
}

impl<'a> RenderContext<'a> {
    /// Create a context with an identity viewport sized to the scene.
    pub fn new(scene: &'a Scene) -> Self {
        let canvas_size = scene.canvas_size();
        Self {
            scene,
            viewport: Viewport {
                canvas_size,
                ..Viewport::default()
            },
            multiplier: 1.0,
            background_color: Color::WHITE,
            show_selection: false,
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
        }
    }

    /// Set the live viewport.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the resolution multiplier.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Toggle selection chrome.
    pub fn with_selection(mut self, show: bool) -> Self {
        self.show_selection = show;
        self
    }

    /// Output surface size in pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        let canvas = self.scene.canvas_size();
        (
            scaled_dimension(canvas.width, self.multiplier),
            scaled_dimension(canvas.height, self.multiplier),
        )
    }

    /// Canvas-to-surface transform: resolution multiplier, then viewport.
    pub fn surface_transform(&self) -> Affine {
        Affine::scale(self.multiplier) * self.viewport.transform()
    }

    /// Canvas size the context renders.
    pub fn canvas_size(&self) -> Size {
        self.scene.canvas_size()
    }
}

fn scaled_dimension(canvas: f64, multiplier: f64) -> u32 {
    (canvas * multiplier).round().max(1.0) as u32
}

/// Trait for rendering backends.
pub trait Renderer {
    /// What a render produces (a pixel buffer, a command list...).
    type Surface;

    /// Draw the scene in z-order onto a fresh surface.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Self::Surface>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_size_follows_multiplier() {
        let scene = Scene::new(Size::new(600.0, 500.0));
        let ctx = RenderContext::new(&scene).with_multiplier(2.0);
        assert_eq!(ctx.surface_size(), (1200, 1000));
        let ctx = RenderContext::new(&scene).with_multiplier(0.0);
        assert_eq!(ctx.surface_size(), (1, 1));
    }

    #[test]
    fn test_surface_transform() {
        let scene = Scene::new(Size::new(600.0, 500.0));
        let viewport = Viewport::new(scene.canvas_size(), 0.25, 3.0).set_zoom(2.0);
        let ctx = RenderContext::new(&scene).with_viewport(viewport).with_multiplier(2.0);
        let p = ctx.surface_transform() * kurbo::Point::new(300.0, 250.0);
        assert!((p.x - 600.0).abs() < 1e-9);
        assert!((p.y - 500.0).abs() < 1e-9);
    }
}
