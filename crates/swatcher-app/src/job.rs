//! Composition job files.
//!
//! A job is a JSON document listing the steps a user would take in the
//! composer: loading images, adding text, styling, gestures, exports.

use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use swatcher_core::input::{Key, KeyFocus, PointerEvent};
use swatcher_core::selection::StyleAttr;
use swatcher_core::shapes::{FontStyle, FontWeight};
use swatcher_core::SwatcherConfig;

/// A complete job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    /// Session configuration; omitted fields take their defaults.
    pub config: SwatcherConfig,
    /// Fonts to register before any step runs.
    pub fonts: Vec<FontFile>,
    pub steps: Vec<Step>,
}

impl Job {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A font face on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontFile {
    pub family: String,
    #[serde(default)]
    pub weight: FontWeight,
    #[serde(default)]
    pub style: FontStyle,
    pub path: PathBuf,
}

/// Where an image comes from. Paths are relative to the job file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Path { path: PathBuf },
    DataUrl { data_url: String },
}

/// Output encoding requested by an export step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
}

/// One user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Background {
        #[serde(flatten)]
        source: ImageRef,
    },
    Overlay {
        #[serde(flatten)]
        source: ImageRef,
    },
    ReaddOverlay {
        index: usize,
    },
    Text {
        content: String,
    },
    Style {
        #[serde(flatten)]
        attr: StyleAttr,
    },
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    Delete,
    Key {
        key: Key,
        #[serde(default)]
        focus: KeyFocus,
    },
    Pointer {
        event: PointerEvent,
    },
    Zoom {
        value: f64,
    },
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Pan {
        delta: Vec2,
    },
    Resize {
        width: f64,
        height: f64,
    },
    Reset {
        #[serde(default)]
        confirm: bool,
    },
    /// Flatten the scene and write the PNG.
    Save {
        path: PathBuf,
    },
    /// Write a JPEG under `dir` with a generated file name.
    Download {
        #[serde(default)]
        dir: PathBuf,
    },
    Export {
        path: PathBuf,
        format: OutputFormat,
        #[serde(default)]
        multiplier: Option<f64>,
        #[serde(default)]
        quality: Option<u8>,
    },
    /// Write the live view (viewport and selection chrome included) as PNG.
    Preview {
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use swatcher_core::shapes::Rgba;

    #[test]
    fn test_parse_job() {
        let job = Job::from_json(
            r##"{
                "config": { "jpeg_quality": 80 },
                "fonts": [{ "family": "Arial", "path": "arial.ttf" }],
                "steps": [
                    { "op": "background", "path": "bg.png" },
                    { "op": "overlay", "data_url": "data:image/png;base64,AAAA" },
                    { "op": "text", "content": "Hello" },
                    { "op": "style", "attr": "fill", "value": "#ff0000" },
                    { "op": "toggle_bold" },
                    { "op": "key", "key": "Delete" },
                    { "op": "pointer", "event": { "type": "down", "id": 0, "position": { "x": 3.0, "y": 4.0 } } },
                    { "op": "pan", "delta": { "x": 10.0, "y": -5.0 } },
                    { "op": "reset", "confirm": true },
                    { "op": "export", "path": "out.jpg", "format": "jpeg", "quality": 70 }
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(job.config.jpeg_quality, 80);
        assert_eq!(job.fonts[0].weight, FontWeight::Normal);
        assert_eq!(job.steps.len(), 10);
        assert!(matches!(&job.steps[0], Step::Background { source: ImageRef::Path { .. } }));
        assert!(matches!(&job.steps[1], Step::Overlay { source: ImageRef::DataUrl { .. } }));
        assert!(matches!(&job.steps[3], Step::Style { attr: StyleAttr::Fill(c) } if *c == Rgba::new(255, 0, 0, 255)));
        assert!(matches!(&job.steps[5], Step::Key { key: Key::Delete, focus: KeyFocus::Canvas }));
        assert!(matches!(
            &job.steps[6],
            Step::Pointer { event: PointerEvent::Down { id: 0, position } } if *position == Point::new(3.0, 4.0)
        ));
        assert!(matches!(&job.steps[8], Step::Reset { confirm: true }));
        assert!(matches!(
            &job.steps[9],
            Step::Export { format: OutputFormat::Jpeg, quality: Some(70), multiplier: None, .. }
        ));
    }

    #[test]
    fn test_empty_job() {
        let job = Job::from_json("{}").unwrap();
        assert!(job.steps.is_empty());
        assert_eq!(job.config, SwatcherConfig::default());
    }
}
