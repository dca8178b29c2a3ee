//! Styled text blocks.

use super::Rgba;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.16;

/// Font weight options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn toggled(self) -> Self {
        match self {
            FontWeight::Normal => FontWeight::Bold,
            FontWeight::Bold => FontWeight::Normal,
        }
    }
}

/// Font style options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    pub fn toggled(self) -> Self {
        match self {
            FontStyle::Normal => FontStyle::Italic,
            FontStyle::Italic => FontStyle::Normal,
        }
    }
}

/// Horizontal alignment of lines within a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Style attributes carried by a text block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: u32,
    pub fill: Rgba,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub underline: bool,
    pub align: TextAlign,
}

/// A block of user text.
#[derive(Debug)]
pub struct TextBlock {
    /// The text content, possibly multi-line.
    pub content: String,
    pub style: TextStyle,
    /// Layout size (width, height) measured by the renderer.
    /// If None, approximate bounds are used.
    cached_size: RwLock<Option<(f64, f64)>>,
}

impl Clone for TextBlock {
    fn clone(&self) -> Self {
        Self {
            content: self.content.clone(),
            style: self.style.clone(),
            cached_size: RwLock::new(self.cached_size()),
        }
    }
}

impl TextBlock {
    pub fn new(content: impl Into<String>, style: TextStyle) -> Self {
        Self {
            content: content.into(),
            style,
            cached_size: RwLock::new(None),
        }
    }

    /// Record the measured layout size.
    /// Uses interior mutability so this can be called during rendering.
    pub fn set_cached_size(&self, width: f64, height: f64) {
        if let Ok(mut cache) = self.cached_size.write() {
            *cache = Some((width, height));
        }
    }

    pub fn cached_size(&self) -> Option<(f64, f64)> {
        self.cached_size.read().ok().and_then(|guard| *guard)
    }

    /// Clear the measured size (call when layout-affecting style changes).
    pub fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.cached_size.write() {
            *cache = None;
        }
    }

    /// Lines of the content, always at least one.
    pub fn lines(&self) -> Vec<&str> {
        self.content.split('\n').collect()
    }

    /// Layout size: measured if available, approximated otherwise.
    pub fn size(&self) -> kurbo::Size {
        let (width, height) = self
            .cached_size()
            .unwrap_or_else(|| (self.approximate_width(), self.approximate_height()));
        kurbo::Size::new(width.max(1.0), height.max(1.0))
    }

    fn approximate_width(&self) -> f64 {
        let max_line_len = self
            .lines()
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let char_width_factor = match self.style.font_weight {
            FontWeight::Normal => 0.55,
            FontWeight::Bold => 0.6,
        };
        max_line_len as f64 * self.style.font_size as f64 * char_width_factor
    }

    fn approximate_height(&self) -> f64 {
        self.lines().len() as f64 * self.style.font_size as f64 * LINE_HEIGHT
    }
}
