//! Session configuration.

use crate::shapes::{FontStyle, FontWeight, Rgba, TextAlign, TextStyle};
use serde::{Deserialize, Serialize};

/// Tunables for a composition session.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwatcherConfig {
    /// Upper bound for the canvas width in pixels.
    pub max_canvas_width: f64,
    /// Upper bound for the canvas height in pixels.
    pub max_canvas_height: f64,
    /// Space reserved around the canvas inside its hosting area.
    pub area_padding: f64,
    /// Color painted behind every drawable.
    pub canvas_color: Rgba,
    /// Smallest allowed zoom factor.
    pub min_zoom: f64,
    /// Largest allowed zoom factor.
    pub max_zoom: f64,
    /// Zoom change applied by the zoom in/out buttons.
    pub zoom_step: f64,
    /// Fraction of each canvas dimension an overlay may occupy when added.
    pub overlay_max_fraction: f64,
    /// Fill of the placeholder background.
    pub placeholder_fill: Rgba,
    /// Label drawn on the placeholder background.
    pub placeholder_label: String,
    /// Color of the placeholder label.
    pub placeholder_label_color: Rgba,
    /// Font size of the placeholder label.
    pub placeholder_label_size: f64,
    /// Style used for new text blocks until the user changes it.
    pub default_text_style: TextStyle,
    /// Resolution multiplier used by save and download.
    pub export_multiplier: f64,
    /// JPEG quality factor (1..=100) used by download.
    pub jpeg_quality: u8,
    /// Quiet period before a resize request takes effect.
    pub resize_debounce_ms: u64,
}

impl Default for SwatcherConfig {
    fn default() -> Self {
        Self {
            max_canvas_width: 600.0,
            max_canvas_height: 500.0,
            area_padding: 40.0,
            canvas_color: Rgba::white(),
            min_zoom: 0.25,
            max_zoom: 3.0,
            zoom_step: 0.1,
            overlay_max_fraction: 0.4,
            placeholder_fill: Rgba::new(0xe0, 0xe0, 0xe0, 255),
            placeholder_label: "Upload a Product Image".to_string(),
            placeholder_label_color: Rgba::new(0x8c, 0x8b, 0x8b, 255),
            placeholder_label_size: 20.0,
            default_text_style: TextStyle {
                font_family: "Arial".to_string(),
                font_size: 24,
                fill: Rgba::black(),
                font_weight: FontWeight::Normal,
                font_style: FontStyle::Normal,
                underline: false,
                align: TextAlign::Left,
            },
            export_multiplier: 2.0,
            jpeg_quality: 95,
            resize_debounce_ms: 200,
        }
    }
}

impl SwatcherConfig {
    /// Canvas size that fits a hosting area of the given size.
    pub fn canvas_size_for_area(&self, area: kurbo::Size) -> kurbo::Size {
        kurbo::Size::new(
            (area.width - self.area_padding).min(self.max_canvas_width).max(1.0),
            (area.height - self.area_padding).min(self.max_canvas_height).max(1.0),
        )
    }

    /// Canvas size used before any area measurement is known.
    pub fn initial_canvas_size(&self) -> kurbo::Size {
        kurbo::Size::new(self.max_canvas_width, self.max_canvas_height)
    }

    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
