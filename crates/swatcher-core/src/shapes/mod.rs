//! Drawable definitions for the composition.

mod color;
mod image;
mod text;

pub use color::Rgba;
pub use image::{ImageFormat, RasterImage};
pub use text::{FontStyle, FontWeight, LINE_HEIGHT, TextAlign, TextBlock, TextStyle};

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for drawables.
pub type DrawableId = Uuid;

/// Which point of the drawable `position` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Origin {
    #[default]
    TopLeft,
    Center,
}

/// Role of a drawable in the composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tag {
    Background,
    Overlay,
    UserText,
}

/// Placement of a drawable on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Anchor position in canvas coordinates.
    pub position: Point,
    pub origin: Origin,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in radians around the anchor.
    pub rotation: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            origin: Origin::TopLeft,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
        }
    }
}

impl Placement {
    /// Uniformly scaled placement at `position`.
    pub fn scaled(position: Point, origin: Origin, scale: f64) -> Self {
        Self {
            position,
            origin,
            scale_x: scale,
            scale_y: scale,
            rotation: 0.0,
        }
    }

    /// Transform from the drawable's local space (origin at its top-left,
    /// one unit per source pixel) to canvas coordinates.
    pub fn affine(&self, local: Size) -> Affine {
        let anchor = match self.origin {
            Origin::TopLeft => Vec2::ZERO,
            Origin::Center => Vec2::new(local.width / 2.0, local.height / 2.0),
        };
        Affine::translate(self.position.to_vec2())
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate(-anchor)
    }
}

/// Where a background gets its pixels from.
#[derive(Debug, Clone)]
pub enum BackgroundSource {
    /// Synthetic start-up background: a flat fill with a centered label.
    Placeholder {
        size: Size,
        fill: Rgba,
        label: String,
        label_color: Rgba,
        label_size: f64,
    },
    /// A loaded product photograph.
    Image(RasterImage),
}

/// Variant-specific payload of a drawable.
#[derive(Debug, Clone)]
pub enum DrawableKind {
    Background(BackgroundSource),
    OverlayImage(RasterImage),
    TextBlock(TextBlock),
}

/// A placeable element of the composition.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub(crate) id: DrawableId,
    pub placement: Placement,
    pub selectable: bool,
    pub kind: DrawableKind,
}

impl Drawable {
    /// Create a drawable with a fresh identifier.
    pub fn new(kind: DrawableKind, placement: Placement) -> Self {
        let selectable = !matches!(kind, DrawableKind::Background(_));
        Self {
            id: Uuid::new_v4(),
            placement,
            selectable,
            kind,
        }
    }

    pub fn id(&self) -> DrawableId {
        self.id
    }

    pub fn tag(&self) -> Tag {
        match self.kind {
            DrawableKind::Background(_) => Tag::Background,
            DrawableKind::OverlayImage(_) => Tag::Overlay,
            DrawableKind::TextBlock(_) => Tag::UserText,
        }
    }

    pub fn is_background(&self) -> bool {
        self.tag() == Tag::Background
    }

    /// Size of the drawable in its own unscaled space.
    pub fn local_size(&self) -> Size {
        match &self.kind {
            DrawableKind::Background(BackgroundSource::Placeholder { size, .. }) => *size,
            DrawableKind::Background(BackgroundSource::Image(image))
            | DrawableKind::OverlayImage(image) => image.size(),
            DrawableKind::TextBlock(text) => text.size(),
        }
    }

    /// Local-to-canvas transform.
    pub fn transform(&self) -> Affine {
        self.placement.affine(self.local_size())
    }

    /// Axis-aligned bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        let size = self.local_size();
        let affine = self.transform();
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(size.width, 0.0),
            Point::new(size.width, size.height),
            Point::new(0.0, size.height),
        ]
        .map(|corner| affine * corner);

        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Rect::new(min_x, min_y, max_x, max_y)
    }

    /// Check if a canvas point falls inside the transformed box.
    pub fn hit_test(&self, point: Point) -> bool {
        let affine = self.transform();
        if affine.determinant().abs() < f64::EPSILON {
            return false;
        }
        let local = affine.inverse() * point;
        let size = self.local_size();
        local.x >= 0.0 && local.y >= 0.0 && local.x <= size.width && local.y <= size.height
    }

    /// Move the drawable by a canvas-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.placement.position += delta;
    }

    pub fn as_text(&self) -> Option<&TextBlock> {
        match &self.kind {
            DrawableKind::TextBlock(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBlock> {
        match &mut self.kind {
            DrawableKind::TextBlock(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&RasterImage> {
        match &self.kind {
            DrawableKind::OverlayImage(image)
            | DrawableKind::Background(BackgroundSource::Image(image)) => Some(image),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(width: u32, height: u32, placement: Placement) -> Drawable {
        let image = RasterImage::solid(width, height, [0, 0, 0, 255]).unwrap();
        Drawable::new(DrawableKind::OverlayImage(image), placement)
    }

    #[test]
    fn test_background_is_not_selectable() {
        let image = RasterImage::solid(1, 1, [0; 4]).unwrap();
        let bg = Drawable::new(
            DrawableKind::Background(BackgroundSource::Image(image)),
            Placement::default(),
        );
        assert!(!bg.selectable);
        assert_eq!(bg.tag(), Tag::Background);

        let fg = overlay(1, 1, Placement::default());
        assert!(fg.selectable);
        assert_eq!(fg.tag(), Tag::Overlay);
    }

    #[test]
    fn test_center_origin_bounds() {
        let d = overlay(100, 50, Placement::scaled(Point::new(300.0, 250.0), Origin::Center, 2.0));
        let bounds = d.bounds();
        assert!((bounds.x0 - 200.0).abs() < 1e-9);
        assert!((bounds.y0 - 200.0).abs() < 1e-9);
        assert!((bounds.width() - 200.0).abs() < 1e-9);
        assert!((bounds.height() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_respects_rotation() {
        let mut placement = Placement::scaled(Point::new(100.0, 100.0), Origin::Center, 1.0);
        placement.rotation = std::f64::consts::FRAC_PI_2;
        let d = overlay(100, 10, placement);
        // Rotated a quarter turn, the thin bar now stands upright.
        assert!(d.hit_test(Point::new(100.0, 140.0)));
        assert!(!d.hit_test(Point::new(140.0, 100.0)));
    }

    #[test]
    fn test_translate() {
        let mut d = overlay(10, 10, Placement::default());
        d.translate(Vec2::new(5.0, -3.0));
        assert_eq!(d.placement.position, Point::new(5.0, -3.0));
        assert!(d.hit_test(Point::new(10.0, 2.0)));
        assert!(!d.hit_test(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_zero_scale_never_hits() {
        let d = overlay(10, 10, Placement::scaled(Point::ZERO, Origin::TopLeft, 0.0));
        assert!(!d.hit_test(Point::ZERO));
    }
}
