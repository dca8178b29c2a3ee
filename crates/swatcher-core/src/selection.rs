//! Text style controls and their binding to the active object.

use crate::scene::Scene;
use crate::shapes::{FontStyle, FontWeight, Rgba, TextAlign, TextStyle};
use serde::{Deserialize, Serialize};

/// A single style attribute change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "attr", content = "value", rename_all = "snake_case")]
pub enum StyleAttr {
    FontFamily(String),
    /// Font size in pixels. Not bounded.
    FontSize(u32),
    Fill(Rgba),
    Weight(FontWeight),
    Style(FontStyle),
    Underline(bool),
    Align(TextAlign),
}

impl StyleAttr {
    /// Write this attribute into a style.
    pub fn apply_to(&self, style: &mut TextStyle) {
        match self {
            StyleAttr::FontFamily(family) => style.font_family = family.clone(),
            StyleAttr::FontSize(size) => style.font_size = *size,
            StyleAttr::Fill(fill) => style.fill = *fill,
            StyleAttr::Weight(weight) => style.font_weight = *weight,
            StyleAttr::Style(font_style) => style.font_style = *font_style,
            StyleAttr::Underline(underline) => style.underline = *underline,
            StyleAttr::Align(align) => style.align = *align,
        }
    }
}

/// Owns the current style shown by the controls.
///
/// The current style is what new text blocks are created with. Style edits
/// update it first, then reach the active text block if there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleController {
    current: TextStyle,
    defaults: TextStyle,
}

impl StyleController {
    pub fn new(defaults: TextStyle) -> Self {
        Self {
            current: defaults.clone(),
            defaults,
        }
    }

    /// Style the controls currently display.
    pub fn current(&self) -> &TextStyle {
        &self.current
    }

    /// Restore the controls to their start-up values.
    pub fn reset(&mut self) {
        self.current = self.defaults.clone();
    }

    /// Apply an attribute to the controls and to the active text block.
    ///
    /// Returns `true` if a text block in the scene changed.
    pub fn apply_style(&mut self, scene: &mut Scene, attr: StyleAttr) -> bool {
        attr.apply_to(&mut self.current);

        let Some(text) = scene.active_mut().and_then(|d| d.as_text_mut()) else {
            log::debug!("Style change {attr:?} has no active text block");
            return false;
        };
        attr.apply_to(&mut text.style);
        text.invalidate_cache();
        true
    }

    pub fn toggle_bold(&mut self, scene: &mut Scene) -> bool {
        let weight = self.current.font_weight.toggled();
        self.apply_style(scene, StyleAttr::Weight(weight))
    }

    pub fn toggle_italic(&mut self, scene: &mut Scene) -> bool {
        let style = self.current.font_style.toggled();
        self.apply_style(scene, StyleAttr::Style(style))
    }

    pub fn toggle_underline(&mut self, scene: &mut Scene) -> bool {
        let underline = !self.current.underline;
        self.apply_style(scene, StyleAttr::Underline(underline))
    }

    /// Pull the active text block's attributes back into the controls.
    ///
    /// Family, size, fill, weight, style and underline are read; alignment is
    /// left as is. Other drawables leave the controls untouched.
    pub fn sync_controls_from_active(&mut self, scene: &Scene) -> bool {
        let Some(text) = scene.active().and_then(|d| d.as_text()) else {
            return false;
        };
        let style = &text.style;
        self.current.font_family = style.font_family.clone();
        self.current.font_size = style.font_size;
        self.current.fill = style.fill;
        self.current.font_weight = style.font_weight;
        self.current.font_style = style.font_style;
        self.current.underline = style.underline;
        true
    }
}
