//! Font registry and text layout.
//!
//! Fonts are registered from bytes under a family name. Layout resolves a
//! face for the requested family, weight and style, falling back to the
//! regular face (with synthetic bold/italic) and then to the first
//! registered family. Glyphs are emitted as vector paths in the text
//! block's local space.
//!
//! DejaVu Sans (regular and bold) is embedded so text always renders, even
//! before any other font is registered.

use crate::renderer::{RenderResult, RendererError};
use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, PxScale, ScaleFont};
use kurbo::Size;
use std::collections::HashMap;
use swatcher_core::shapes::{FontStyle, FontWeight, LINE_HEIGHT, TextAlign, TextBlock};
use tiny_skia::{Path, PathBuilder};

/// Embedded DejaVu Sans faces
static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

/// Family name the embedded faces are registered under.
pub const DEFAULT_FAMILY: &str = "DejaVu Sans";

/// Horizontal shear applied for synthetic italics.
const SYNTHETIC_ITALIC_SKEW: f64 = 0.2;

/// Faces of one family, indexed by `(bold, italic)`.
#[derive(Clone, Default)]
struct FamilyFaces {
    faces: [Option<FontArc>; 4],
}

fn face_index(weight: FontWeight, style: FontStyle) -> usize {
    let bold = usize::from(weight == FontWeight::Bold);
    let italic = usize::from(style == FontStyle::Italic);
    bold * 2 + italic
}

/// A resolved face plus the effects needed to fake missing variants.
#[derive(Clone)]
pub struct Face {
    pub font: FontArc,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
}

/// Registered fonts, looked up by case-insensitive family name.
#[derive(Clone, Default)]
pub struct FontBook {
    families: HashMap<String, FamilyFaces>,
    /// Registration order, for the fallback family.
    order: Vec<String>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A book holding the embedded faces, which also serve as the fallback
    /// family.
    pub fn with_default_faces() -> Self {
        let mut book = Self::new();
        for (weight, data) in [(FontWeight::Normal, DEJAVU_SANS), (FontWeight::Bold, DEJAVU_SANS_BOLD)] {
            match FontArc::try_from_slice(data) {
                Ok(font) => book.insert(DEFAULT_FAMILY, weight, FontStyle::Normal, font),
                Err(e) => log::error!("Embedded font {DEFAULT_FAMILY} ({weight:?}) is unreadable: {e}"),
            }
        }
        book
    }

    /// Register a TrueType/OpenType face.
    pub fn register(
        &mut self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        data: Vec<u8>,
    ) -> RenderResult<()> {
        let font = FontArc::try_from_vec(data)
            .map_err(|e| RendererError::Decode(format!("font {family}: {e}")))?;
        self.insert(family, weight, style, font);
        Ok(())
    }

    fn insert(&mut self, family: &str, weight: FontWeight, style: FontStyle, font: FontArc) {
        let key = family.to_lowercase();
        if !self.families.contains_key(&key) {
            self.order.push(key.clone());
        }
        let faces = self.families.entry(key).or_default();
        faces.faces[face_index(weight, style)] = Some(font);
        log::debug!("Registered font {family} ({weight:?}, {style:?})");
    }

    /// Pick the face to draw `family` with.
    pub fn resolve(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<Face> {
        let faces = self.families.get(&family.to_lowercase()).or_else(|| {
            let fallback = self.order.first()?;
            log::debug!("Font family {family} not registered, using {fallback}");
            self.families.get(fallback)
        })?;

        let wanted = face_index(weight, style);
        let candidates = [
            wanted,
            face_index(FontWeight::Normal, style),
            face_index(weight, FontStyle::Normal),
            face_index(FontWeight::Normal, FontStyle::Normal),
        ];
        let (index, font) = candidates
            .into_iter()
            .chain(0..4)
            .find_map(|i| faces.faces[i].clone().map(|font| (i, font)))?;

        let has_bold = index & 2 != 0;
        let has_italic = index & 1 != 0;
        Some(Face {
            font,
            synthetic_bold: weight == FontWeight::Bold && !has_bold,
            synthetic_italic: style == FontStyle::Italic && !has_italic,
        })
    }

    /// Lay out a text block and record its measured size on it.
    pub fn layout_block(&self, text: &TextBlock) -> Option<TextLayout> {
        let style = &text.style;
        let layout = self.layout(
            &text.content,
            &TextOptions {
                family: &style.font_family,
                font_size: f64::from(style.font_size),
                weight: style.font_weight,
                style: style.font_style,
                align: style.align,
                underline: style.underline,
            },
        )?;
        text.set_cached_size(layout.size.width, layout.size.height);
        Some(layout)
    }

    /// Lay out free-standing text.
    pub fn layout(&self, content: &str, options: &TextOptions<'_>) -> Option<TextLayout> {
        let face = self.resolve(options.family, options.weight, options.style)?;
        let scaled = face.font.as_scaled(PxScale::from(options.font_size as f32));
        let line_height = options.font_size * LINE_HEIGHT;
        let ascent = f64::from(scaled.ascent());
        let descent = f64::from(scaled.descent());
        let half_leading = (line_height - (ascent - descent)) / 2.0;

        let mut lines: Vec<LineLayout> = content
            .split('\n')
            .enumerate()
            .map(|(index, line)| {
                let mut glyphs = Vec::new();
                let mut pen = 0.0;
                let mut previous: Option<GlyphId> = None;
                for c in line.chars() {
                    let id = face.font.glyph_id(c);
                    if let Some(prev) = previous {
                        pen += f64::from(scaled.kern(prev, id));
                    }
                    glyphs.push(PositionedGlyph { id, x: pen, ch: c });
                    pen += f64::from(scaled.h_advance(id));
                    previous = Some(id);
                }
                LineLayout {
                    baseline: index as f64 * line_height + half_leading + ascent,
                    x: 0.0,
                    width: pen,
                    glyphs,
                }
            })
            .collect();

        let width = lines.iter().map(|l| l.width).fold(0.0, f64::max).max(1.0);
        let last = lines.len().saturating_sub(1);
        for (index, line) in lines.iter_mut().enumerate() {
            match options.align {
                TextAlign::Left => {}
                TextAlign::Center => line.x = (width - line.width) / 2.0,
                TextAlign::Right => line.x = width - line.width,
                TextAlign::Justify if index != last => line.justify(width),
                TextAlign::Justify => {}
            }
        }

        Some(TextLayout {
            h_scale: f64::from(scaled.h_scale_factor()),
            v_scale: f64::from(scaled.v_scale_factor()),
            face,
            font_size: options.font_size,
            size: Size::new(width, (lines.len() as f64 * line_height).max(1.0)),
            underline: options.underline,
            lines,
        })
    }
}

/// What to lay out text with.
#[derive(Debug, Clone, Copy)]
pub struct TextOptions<'a> {
    pub family: &'a str,
    pub font_size: f64,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub align: TextAlign,
    pub underline: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PositionedGlyph {
    pub id: GlyphId,
    /// Pen position relative to the line start.
    pub x: f64,
    ch: char,
}

#[derive(Debug, Clone)]
pub struct LineLayout {
    /// Baseline offset from the top of the block.
    pub baseline: f64,
    /// Line start offset from the left of the block.
    pub x: f64,
    pub width: f64,
    pub glyphs: Vec<PositionedGlyph>,
}

impl LineLayout {
    /// Spread the slack evenly over the spaces of the line.
    fn justify(&mut self, target: f64) {
        let spaces = self.glyphs.iter().filter(|g| g.ch == ' ').count();
        if spaces == 0 {
            return;
        }
        let extra = (target - self.width) / spaces as f64;
        let mut shift = 0.0;
        for glyph in &mut self.glyphs {
            glyph.x += shift;
            if glyph.ch == ' ' {
                shift += extra;
            }
        }
        self.width = target;
    }
}

/// Positioned lines of one text block.
#[derive(Clone)]
pub struct TextLayout {
    pub face: Face,
    pub font_size: f64,
    /// Block size in local units.
    pub size: Size,
    pub underline: bool,
    pub lines: Vec<LineLayout>,
    h_scale: f64,
    v_scale: f64,
}

impl TextLayout {
    /// Glyph outlines in block-local space.
    pub fn glyph_paths(&self) -> Vec<Path> {
        let skew = if self.face.synthetic_italic { SYNTHETIC_ITALIC_SKEW } else { 0.0 };
        let mut paths = Vec::new();
        for line in &self.lines {
            for glyph in &line.glyphs {
                let Some(outline) = self.face.font.outline(glyph.id) else {
                    continue;
                };
                let origin_x = line.x + glyph.x;
                let map = |p: ab_glyph::Point| {
                    // Font units are y-up; lean the glyph about its baseline.
                    let rise = f64::from(p.y) * self.v_scale;
                    let x = origin_x + f64::from(p.x) * self.h_scale + rise * skew;
                    let y = line.baseline - rise;
                    (x as f32, y as f32)
                };
                if let Some(path) = outline_path(&outline.curves, map) {
                    paths.push(path);
                }
            }
        }
        paths
    }

    /// Underline rectangles `(x, y, width, height)` in block-local space.
    pub fn underline_rects(&self) -> Vec<(f64, f64, f64, f64)> {
        if !self.underline {
            return Vec::new();
        }
        let thickness = (self.font_size / 15.0).max(1.0);
        self.lines
            .iter()
            .filter(|line| line.width > 0.0)
            .map(|line| (line.x, line.baseline + self.font_size * 0.08, line.width, thickness))
            .collect()
    }

    /// Stroke width that fakes a bold face, zero when not needed.
    pub fn synthetic_bold_width(&self) -> f64 {
        if self.face.synthetic_bold {
            self.font_size * 0.04
        } else {
            0.0
        }
    }
}

fn outline_path(curves: &[OutlineCurve], map: impl Fn(ab_glyph::Point) -> (f32, f32)) -> Option<Path> {
    let mut pb = PathBuilder::new();
    let mut last: Option<ab_glyph::Point> = None;
    for curve in curves {
        let start = match curve {
            OutlineCurve::Line(p0, _) | OutlineCurve::Quad(p0, _, _) | OutlineCurve::Cubic(p0, _, _, _) => *p0,
        };
        if last != Some(start) {
            if last.is_some() {
                pb.close();
            }
            let (x, y) = map(start);
            pb.move_to(x, y);
        }
        let end = match curve {
            OutlineCurve::Line(_, p1) => {
                let (x, y) = map(*p1);
                pb.line_to(x, y);
                *p1
            }
            OutlineCurve::Quad(_, c, p2) => {
                let (cx, cy) = map(*c);
                let (x, y) = map(*p2);
                pb.quad_to(cx, cy, x, y);
                *p2
            }
            OutlineCurve::Cubic(_, c1, c2, p3) => {
                let (c1x, c1y) = map(*c1);
                let (c2x, c2y) = map(*c2);
                let (x, y) = map(*p3);
                pb.cubic_to(c1x, c1y, c2x, c2y, x, y);
                *p3
            }
        };
        last = Some(end);
    }
    if last.is_some() {
        pb.close();
    }
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use swatcher_core::shapes::{Rgba, TextStyle};

    fn book() -> FontBook {
        FontBook::with_default_faces()
    }

    fn options(family: &str) -> TextOptions<'_> {
        TextOptions {
            family,
            font_size: 20.0,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            align: TextAlign::Left,
            underline: false,
        }
    }

    fn style(align: TextAlign) -> TextStyle {
        TextStyle {
            font_family: "DejaVu Sans".to_string(),
            font_size: 40,
            fill: Rgba::black(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            underline: true,
            align,
        }
    }

    #[test]
    fn test_register_rejects_garbage() {
        let mut book = FontBook::new();
        assert!(book.register("Broken", FontWeight::Normal, FontStyle::Normal, vec![1, 2, 3]).is_err());
        assert!(book.resolve("Broken", FontWeight::Normal, FontStyle::Normal).is_none());
    }

    #[test]
    fn test_face_index() {
        assert_eq!(face_index(FontWeight::Normal, FontStyle::Normal), 0);
        assert_eq!(face_index(FontWeight::Normal, FontStyle::Italic), 1);
        assert_eq!(face_index(FontWeight::Bold, FontStyle::Normal), 2);
        assert_eq!(face_index(FontWeight::Bold, FontStyle::Italic), 3);
    }

    #[test]
    fn test_default_faces_are_embedded() {
        let book = book();
        let face = book.resolve(DEFAULT_FAMILY, FontWeight::Bold, FontStyle::Italic).unwrap();
        assert!(!face.synthetic_bold);
        assert!(face.synthetic_italic);

        // Unknown families fall back to the embedded one.
        let face = book.resolve("Arial", FontWeight::Normal, FontStyle::Normal).unwrap();
        assert!(!face.synthetic_bold);
        assert!(book.layout("Hello", &options("Arial")).is_some());
    }

    #[test]
    fn test_missing_variants_are_synthesized() {
        let mut book = FontBook::new();
        book.register("Plain", FontWeight::Normal, FontStyle::Normal, DEJAVU_SANS.to_vec())
            .unwrap();
        let face = book.resolve("plain", FontWeight::Bold, FontStyle::Italic).unwrap();
        assert!(face.synthetic_bold);
        assert!(face.synthetic_italic);
    }

    #[test]
    fn test_registered_family_extends_defaults() {
        let mut book = book();
        book.register("Arial", FontWeight::Normal, FontStyle::Normal, DEJAVU_SANS.to_vec())
            .unwrap();
        assert!(book.resolve("arial", FontWeight::Normal, FontStyle::Normal).is_some());
        let face = book.resolve(DEFAULT_FAMILY, FontWeight::Bold, FontStyle::Normal).unwrap();
        assert!(!face.synthetic_bold);
    }

    #[test]
    fn test_layout_measures_block() {
        let book = book();
        let text = TextBlock::new("Hello\nWorld wide", style(TextAlign::Left));
        let layout = book.layout_block(&text).unwrap();
        assert_eq!(layout.lines.len(), 2);
        assert!((layout.size.height - 2.0 * 40.0 * LINE_HEIGHT).abs() < 1e-6);
        assert!(layout.lines[1].width > layout.lines[0].width);
        assert!((layout.size.width - layout.lines[1].width).abs() < 1e-6);
        assert_eq!(text.cached_size(), Some((layout.size.width, layout.size.height)));
        assert!(!layout.glyph_paths().is_empty());
        assert_eq!(layout.underline_rects().len(), 2);
    }

    #[test]
    fn test_alignment_offsets() {
        let book = book();
        let right = book.layout_block(&TextBlock::new("Hi\nThere", style(TextAlign::Right))).unwrap();
        let short = &right.lines[0];
        assert!((short.x + short.width - right.size.width).abs() < 1e-6);

        let center = book.layout_block(&TextBlock::new("Hi\nThere", style(TextAlign::Center))).unwrap();
        let short = &center.lines[0];
        assert!((short.x * 2.0 + short.width - center.size.width).abs() < 1e-6);
    }

    #[test]
    fn test_justify_stretches_all_but_last_line() {
        let book = book();
        let layout = book
            .layout_block(&TextBlock::new("a b c\nlonger line here\nend", style(TextAlign::Justify)))
            .unwrap();
        assert!((layout.lines[0].width - layout.size.width).abs() < 1e-6);
        assert!(layout.lines[2].width < layout.size.width);
    }
}
