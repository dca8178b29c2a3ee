//! Scene graph: the ordered drawables of a composition and the active object.

use crate::error::{SceneError, SceneResult};
use crate::shapes::{
    BackgroundSource, Drawable, DrawableId, DrawableKind, Origin, Placement, RasterImage,
    TextBlock, TextStyle,
};
use kurbo::{Point, Size, Vec2};

/// Drawables in z-order (back to front) plus the single active object.
///
/// Index 0 holds the background when there is one; nothing else may be
/// tagged as a background.
#[derive(Debug, Clone)]
pub struct Scene {
    drawables: Vec<Drawable>,
    active: Option<DrawableId>,
    canvas_size: Size,
}

impl Scene {
    /// Create an empty scene for a canvas of the given size.
    pub fn new(canvas_size: Size) -> Self {
        Self {
            drawables: Vec::new(),
            active: None,
            canvas_size,
        }
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    /// Change the canvas dimensions. Drawables keep their placement.
    pub fn set_canvas_size(&mut self, size: Size) {
        self.canvas_size = size;
    }

    fn canvas_center(&self) -> Point {
        Point::new(self.canvas_size.width / 2.0, self.canvas_size.height / 2.0)
    }

    /// Replace the background with a new one at z-index 0.
    ///
    /// Images are fitted uniformly inside the canvas and centered; a
    /// placeholder is laid out at its own size from the top-left corner.
    pub fn set_background(&mut self, source: BackgroundSource) -> DrawableId {
        let placement = match &source {
            BackgroundSource::Placeholder { .. } => Placement::default(),
            BackgroundSource::Image(image) => self.fit_background(image),
        };
        self.drawables.retain(|d| !d.is_background());
        if self
            .active
            .is_some_and(|id| !self.drawables.iter().any(|d| d.id == id))
        {
            self.active = None;
        }
        let drawable = Drawable::new(DrawableKind::Background(source), placement);
        let id = drawable.id();
        self.drawables.insert(0, drawable);
        log::debug!("Background replaced with {id}");
        id
    }

    fn fit_background(&self, image: &RasterImage) -> Placement {
        let size = image.size();
        let scale = (self.canvas_size.width / size.width).min(self.canvas_size.height / size.height);
        let position = Point::new(
            (self.canvas_size.width - size.width * scale) / 2.0,
            (self.canvas_size.height - size.height * scale) / 2.0,
        );
        Placement::scaled(position, Origin::TopLeft, scale)
    }

    /// Add an overlay image on top, scaled down to fit `max_fraction` of each
    /// canvas dimension (never up), centered, and make it active.
    pub fn add_overlay(&mut self, image: RasterImage, max_fraction: f64) -> DrawableId {
        let size = image.size();
        let max_w = self.canvas_size.width * max_fraction;
        let max_h = self.canvas_size.height * max_fraction;
        let scale = (max_w / size.width).min(max_h / size.height).min(1.0);
        let placement = Placement::scaled(self.canvas_center(), Origin::Center, scale);
        self.push_active(Drawable::new(DrawableKind::OverlayImage(image), placement))
    }

    /// Add a centered text block on top and make it active.
    ///
    /// Blank content is rejected with [`SceneError::EmptyContent`].
    pub fn add_text(&mut self, content: &str, style: TextStyle) -> SceneResult<DrawableId> {
        let content = content.trim();
        if content.is_empty() {
            return Err(SceneError::EmptyContent);
        }
        let placement = Placement::scaled(self.canvas_center(), Origin::Center, 1.0);
        let text = TextBlock::new(content, style);
        Ok(self.push_active(Drawable::new(DrawableKind::TextBlock(text), placement)))
    }

    fn push_active(&mut self, drawable: Drawable) -> DrawableId {
        let id = drawable.id();
        self.drawables.push(drawable);
        self.active = Some(id);
        id
    }

    /// Remove the active object unless it is the background.
    pub fn remove_active(&mut self) -> SceneResult<Drawable> {
        let id = self.active.ok_or(SceneError::NoActiveTarget)?;
        let index = self
            .drawables
            .iter()
            .position(|d| d.id == id)
            .ok_or(SceneError::NoActiveTarget)?;
        if self.drawables[index].is_background() {
            return Err(SceneError::NoActiveTarget);
        }
        self.active = None;
        Ok(self.drawables.remove(index))
    }

    /// Select a drawable, or clear the selection with `None`.
    ///
    /// Only selectable drawables can become active.
    pub fn set_active(&mut self, id: Option<DrawableId>) -> SceneResult<()> {
        match id {
            None => {
                self.active = None;
                Ok(())
            }
            Some(id) => {
                let drawable = self
                    .get(id)
                    .ok_or_else(|| SceneError::InvalidInput(format!("unknown drawable {id}")))?;
                if !drawable.selectable {
                    return Err(SceneError::NoActiveTarget);
                }
                self.active = Some(id);
                Ok(())
            }
        }
    }

    pub fn active_id(&self) -> Option<DrawableId> {
        self.active
    }

    pub fn active(&self) -> Option<&Drawable> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Drawable> {
        let id = self.active?;
        self.get_mut(id)
    }

    /// Remove every drawable and clear the selection.
    pub fn clear(&mut self) {
        self.drawables.clear();
        self.active = None;
    }

    pub fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.iter().find(|d| d.id == id)
    }

    pub fn get_mut(&mut self, id: DrawableId) -> Option<&mut Drawable> {
        self.drawables.iter_mut().find(|d| d.id == id)
    }

    /// The background drawable, if any.
    pub fn background(&self) -> Option<&Drawable> {
        self.drawables.first().filter(|d| d.is_background())
    }

    /// Drawables in z-order (back to front).
    pub fn iter(&self) -> impl Iterator<Item = &Drawable> {
        self.drawables.iter()
    }

    /// Topmost selectable drawable containing a canvas point.
    pub fn hit_test(&self, point: Point) -> Option<DrawableId> {
        self.drawables
            .iter()
            .rev()
            .find(|d| d.selectable && d.hit_test(point))
            .map(|d| d.id)
    }

    /// Move a selectable drawable by a canvas-space delta.
    pub fn move_drawable(&mut self, id: DrawableId, delta: Vec2) -> SceneResult<()> {
        let drawable = self
            .get_mut(id)
            .ok_or_else(|| SceneError::InvalidInput(format!("unknown drawable {id}")))?;
        if !drawable.selectable {
            return Err(SceneError::NoActiveTarget);
        }
        drawable.translate(delta);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{FontStyle, FontWeight, Rgba, Tag, TextAlign};

    fn scene() -> Scene {
        Scene::new(Size::new(600.0, 500.0))
    }

    fn image(width: u32, height: u32) -> RasterImage {
        RasterImage::solid(width, height, [10, 20, 30, 255]).unwrap()
    }

    fn style() -> TextStyle {
        TextStyle {
            font_family: "Arial".to_string(),
            font_size: 24,
            fill: Rgba::black(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            underline: false,
            align: TextAlign::Left,
        }
    }

    fn placeholder() -> BackgroundSource {
        BackgroundSource::Placeholder {
            size: Size::new(600.0, 500.0),
            fill: Rgba::new(224, 224, 224, 255),
            label: "Upload".to_string(),
            label_color: Rgba::black(),
            label_size: 20.0,
        }
    }

    #[test]
    fn test_scene_creation() {
        let scene = scene();
        assert!(scene.is_empty());
        assert!(scene.active().is_none());
    }

    #[test]
    fn test_background_fits_and_centers() {
        for (w, h) in [(1200, 500), (300, 1000), (600, 500), (50, 50)] {
            let mut scene = scene();
            scene.set_background(BackgroundSource::Image(image(w, h)));
            let bounds = scene.background().unwrap().bounds();

            let fills_width = (bounds.width() - 600.0).abs() < 1e-9;
            let fills_height = (bounds.height() - 500.0).abs() < 1e-9;
            assert!(fills_width || fills_height, "{w}x{h} fills neither axis");
            assert!(bounds.width() <= 600.0 + 1e-9 && bounds.height() <= 500.0 + 1e-9);
            assert!((bounds.center().x - 300.0).abs() < 1e-9);
            assert!((bounds.center().y - 250.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_background_replaced_not_duplicated() {
        let mut scene = scene();
        scene.set_background(placeholder());
        scene.add_overlay(image(10, 10), 0.4);
        let new_bg = scene.set_background(BackgroundSource::Image(image(100, 100)));

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.iter().filter(|d| d.tag() == Tag::Background).count(), 1);
        assert_eq!(scene.iter().next().unwrap().id(), new_bg);
    }

    #[test]
    fn test_overlay_never_upscaled() {
        let mut scene = scene();
        let id = scene.add_overlay(image(20, 10), 0.4);
        let d = scene.get(id).unwrap();
        assert!((d.placement.scale_x - 1.0).abs() < f64::EPSILON);
        assert_eq!(scene.active_id(), Some(id));
    }

    #[test]
    fn test_overlay_fits_fraction() {
        for (w, h) in [(2000, 100), (100, 2000), (1000, 1000), (240, 200)] {
            let mut scene = scene();
            let id = scene.add_overlay(image(w, h), 0.4);
            let d = scene.get(id).unwrap();
            let bounds = d.bounds();
            assert!(d.placement.scale_x <= 1.0);
            assert!(bounds.width() <= 240.0 + 1e-9);
            assert!(bounds.height() <= 200.0 + 1e-9);
            assert!((bounds.center().x - 300.0).abs() < 1e-9);
            assert!((bounds.center().y - 250.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_add_text_rejects_blank() {
        let mut scene = scene();
        assert_eq!(scene.add_text("", style()), Err(SceneError::EmptyContent));
        assert_eq!(scene.add_text("   \n\t", style()), Err(SceneError::EmptyContent));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_add_text_trims_and_activates() {
        let mut scene = scene();
        let id = scene.add_text("  Hello \n", style()).unwrap();
        assert_eq!(scene.active_id(), Some(id));
        assert_eq!(scene.active().unwrap().as_text().unwrap().content, "Hello");
    }

    #[test]
    fn test_remove_active() {
        let mut scene = scene();
        scene.set_background(placeholder());
        let id = scene.add_overlay(image(10, 10), 0.4);
        let removed = scene.remove_active().unwrap();
        assert_eq!(removed.id(), id);
        assert_eq!(scene.len(), 1);
        assert!(scene.active().is_none());
        assert_eq!(scene.remove_active().unwrap_err(), SceneError::NoActiveTarget);
    }

    #[test]
    fn test_background_cannot_become_active() {
        let mut scene = scene();
        let bg = scene.set_background(placeholder());
        assert_eq!(scene.set_active(Some(bg)), Err(SceneError::NoActiveTarget));
        assert!(scene.active().is_none());
        assert!(scene.remove_active().is_err());
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut scene = scene();
        scene.set_background(placeholder());
        let lower = scene.add_overlay(image(100, 100), 0.4);
        let upper = scene.add_overlay(image(50, 50), 0.4);

        assert_eq!(scene.hit_test(Point::new(300.0, 250.0)), Some(upper));
        assert_eq!(scene.hit_test(Point::new(340.0, 290.0)), Some(lower));
        // Only the non-selectable background lies here.
        assert_eq!(scene.hit_test(Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn test_move_drawable() {
        let mut scene = scene();
        let bg = scene.set_background(placeholder());
        let id = scene.add_overlay(image(10, 10), 0.4);
        scene.move_drawable(id, Vec2::new(10.0, 20.0)).unwrap();
        assert_eq!(scene.get(id).unwrap().placement.position, Point::new(310.0, 270.0));
        assert!(scene.move_drawable(bg, Vec2::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn test_clear() {
        let mut scene = scene();
        scene.set_background(placeholder());
        scene.add_text("Hi", style()).unwrap();
        scene.clear();
        assert!(scene.is_empty());
        assert!(scene.active_id().is_none());
    }
}
