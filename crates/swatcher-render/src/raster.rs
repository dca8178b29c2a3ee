//! CPU raster renderer built on tiny-skia.

use crate::fonts::{DEFAULT_FAMILY, FontBook, TextLayout, TextOptions};
use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use kurbo::{Affine, Point, Size};
use peniko::Color;
use swatcher_core::shapes::{
    BackgroundSource, Drawable, DrawableKind, FontStyle, FontWeight, RasterImage, Rgba, TextAlign,
};
use tiny_skia::{
    FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

/// Handle size in screen pixels.
const HANDLE_SIZE: f32 = 8.0;

/// Renders scenes into premultiplied RGBA pixmaps.
#[derive(Clone)]
pub struct RasterRenderer {
    fonts: FontBook,
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self {
            fonts: FontBook::with_default_faces(),
        }
    }
}

impl RasterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    fn render_drawable(&self, pixmap: &mut Pixmap, drawable: &Drawable, surface: Affine) {
        match &drawable.kind {
            DrawableKind::Background(BackgroundSource::Placeholder {
                size,
                fill,
                label,
                label_color,
                label_size,
            }) => {
                let transform = surface * drawable.transform();
                self.render_placeholder(pixmap, *size, *fill, label, *label_color, *label_size, transform);
            }
            DrawableKind::Background(BackgroundSource::Image(image)) | DrawableKind::OverlayImage(image) => {
                render_image(pixmap, image, surface * drawable.transform());
            }
            DrawableKind::TextBlock(text) => {
                // Measure first so the placement anchor uses the real size.
                let Some(layout) = self.fonts.layout_block(text) else {
                    log::warn!("No font available for text block {}", drawable.id());
                    return;
                };
                render_text(pixmap, &layout, text.style.fill, surface * drawable.transform());
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_placeholder(
        &self,
        pixmap: &mut Pixmap,
        size: Size,
        fill: Rgba,
        label: &str,
        label_color: Rgba,
        label_size: f64,
        transform: Affine,
    ) {
        if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, size.width as f32, size.height as f32) {
            pixmap.fill_rect(rect, &solid_paint(fill), to_skia(transform), None);
        }

        let options = TextOptions {
            family: DEFAULT_FAMILY,
            font_size: label_size,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            align: TextAlign::Center,
            underline: false,
        };
        let Some(layout) = self.fonts.layout(label, &options) else {
            return;
        };
        let offset = Affine::translate((
            (size.width - layout.size.width) / 2.0,
            (size.height - layout.size.height) / 2.0,
        ));
        render_text(pixmap, &layout, label_color, transform * offset);
    }
}

impl Renderer for RasterRenderer {
    type Surface = Pixmap;

    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Pixmap> {
        let (width, height) = ctx.surface_size();
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| RendererError::Surface(format!("cannot allocate {width}x{height} surface")))?;
        pixmap.fill(skia_color(Rgba::from(ctx.background_color)));

        let surface = ctx.surface_transform();
        for drawable in ctx.scene.iter() {
            self.render_drawable(&mut pixmap, drawable, surface);
        }

        if ctx.show_selection {
            if let Some(active) = ctx.scene.active() {
                render_selection(&mut pixmap, active, surface, ctx.selection_color);
            }
        }
        Ok(pixmap)
    }
}

fn render_image(pixmap: &mut Pixmap, image: &RasterImage, transform: Affine) {
    let Some(source) = premultiplied_pixmap(image) else {
        log::warn!("Skipping image with invalid dimensions {image:?}");
        return;
    };
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, to_skia(transform), None);
}

fn render_text(pixmap: &mut Pixmap, layout: &TextLayout, fill: Rgba, transform: Affine) {
    let paint = solid_paint(fill);
    let skia_transform = to_skia(transform);
    let bold = layout.synthetic_bold_width();
    let stroke = Stroke {
        width: bold as f32,
        ..Stroke::default()
    };

    for path in layout.glyph_paths() {
        pixmap.fill_path(&path, &paint, FillRule::Winding, skia_transform, None);
        if bold > 0.0 {
            pixmap.stroke_path(&path, &paint, &stroke, skia_transform, None);
        }
    }
    for (x, y, w, h) in layout.underline_rects() {
        if let Some(rect) = tiny_skia::Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) {
            pixmap.fill_rect(rect, &paint, skia_transform, None);
        }
    }
}

/// Outline and corner handles of the active object, in surface space.
fn render_selection(pixmap: &mut Pixmap, drawable: &Drawable, surface: Affine, color: Color) {
    let size = drawable.local_size();
    let transform = surface * drawable.transform();
    let corners: Vec<Point> = [
        Point::new(0.0, 0.0),
        Point::new(size.width, 0.0),
        Point::new(size.width, size.height),
        Point::new(0.0, size.height),
    ]
    .into_iter()
    .map(|corner| transform * corner)
    .collect();

    let mut pb = PathBuilder::new();
    pb.move_to(corners[0].x as f32, corners[0].y as f32);
    for corner in &corners[1..] {
        pb.line_to(corner.x as f32, corner.y as f32);
    }
    pb.close();
    let paint = solid_paint(Rgba::from(color));
    if let Some(path) = pb.finish() {
        let stroke = Stroke {
            width: 1.5,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    let half = HANDLE_SIZE / 2.0;
    for corner in &corners {
        let Some(rect) =
            tiny_skia::Rect::from_xywh(corner.x as f32 - half, corner.y as f32 - half, HANDLE_SIZE, HANDLE_SIZE)
        else {
            continue;
        };
        pixmap.fill_rect(rect, &solid_paint(Rgba::white()), Transform::identity(), None);
        let outline = PathBuilder::from_rect(rect);
        pixmap.stroke_path(&outline, &paint, &Stroke::default(), Transform::identity(), None);
    }
}

/// Convert straight RGBA to a premultiplied pixmap.
fn premultiplied_pixmap(image: &RasterImage) -> Option<Pixmap> {
    let mut data = image.pixels().to_vec();
    for px in data.chunks_exact_mut(4) {
        let alpha = u16::from(px[3]);
        for channel in &mut px[..3] {
            *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, IntSize::from_wh(image.width(), image.height())?)
}

/// Straight RGBA bytes of a rendered pixmap.
pub fn demultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

fn to_skia(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn skia_color(color: Rgba) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn solid_paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}
