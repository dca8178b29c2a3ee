//! Export of compositions to encoded images.
//!
//! Exports always render with an identity viewport and no selection chrome,
//! so the live zoom/pan never leaks into the output.

use crate::raster::{RasterRenderer, demultiplied_rgba};
use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use ::image::ExtendedColorType;
use ::image::codecs::jpeg::JpegEncoder;
use peniko::Color;
use std::time::{SystemTime, UNIX_EPOCH};
use swatcher_core::scene::Scene;
use swatcher_core::session::Session;
use swatcher_core::shapes::{DrawableId, RasterImage};

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Lossless.
    Png,
    /// Lossy, with a quality factor in `1..=100`.
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg { .. } => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// Encoded export plus its pixel dimensions.
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// Render `scene` at `multiplier`× its canvas size and encode it.
pub fn export(
    renderer: &mut RasterRenderer,
    scene: &Scene,
    background: Color,
    format: ExportFormat,
    multiplier: f64,
) -> RenderResult<ExportedImage> {
    let ctx = RenderContext::new(scene)
        .with_multiplier(multiplier)
        .with_background(background)
        .with_selection(false);
    let pixmap = renderer.render(&ctx)?;
    let (width, height) = (pixmap.width(), pixmap.height());
    let rgba = demultiplied_rgba(&pixmap);

    let bytes = match format {
        ExportFormat::Png => encode_png(&rgba, width, height)?,
        ExportFormat::Jpeg { quality } => encode_jpeg(&rgba, width, height, quality)?,
    };
    log::info!(
        "Exported {width}x{height} {} ({} bytes)",
        format.mime_type(),
        bytes.len()
    );
    Ok(ExportedImage {
        format,
        width,
        height,
        bytes,
    })
}

/// Export a session's scene with its configured canvas color.
pub fn export_session(
    renderer: &mut RasterRenderer,
    session: &Session,
    format: ExportFormat,
    multiplier: f64,
) -> RenderResult<ExportedImage> {
    let background = Color::from(session.config().canvas_color);
    export(renderer, session.scene(), background, format, multiplier)
}

/// Save: export PNG at the configured multiplier and collapse the scene into
/// one background made from it.
pub fn flatten(renderer: &mut RasterRenderer, session: &mut Session) -> RenderResult<(ExportedImage, DrawableId)> {
    let multiplier = session.config().export_multiplier;
    let exported = export_session(renderer, session, ExportFormat::Png, multiplier)?;
    let image = RasterImage::decode(&exported.bytes).map_err(|e| RendererError::Decode(e.to_string()))?;
    let id = session.replace_with_flattened(image);
    Ok((exported, id))
}

/// Download: export JPEG at the configured quality and multiplier, leaving
/// the scene untouched. Returns the suggested file name with the image.
pub fn download(renderer: &mut RasterRenderer, session: &Session) -> RenderResult<(String, ExportedImage)> {
    let config = session.config();
    let format = ExportFormat::Jpeg {
        quality: config.jpeg_quality,
    };
    let exported = export_session(renderer, session, format, config.export_multiplier)?;
    Ok((download_file_name(SystemTime::now()), exported))
}

/// `product-swatcher-<unix millis>.jpg`
pub fn download_file_name(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("product-swatcher-{millis}.jpg")
}

/// Encode straight RGBA8 pixels as PNG.
pub fn encode_png(rgba_data: &[u8], width: u32, height: u32) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().map_err(|e| {
            log::error!("Failed to write PNG header: {e:?}");
            RendererError::Encode(e.to_string())
        })?;
        writer.write_image_data(rgba_data).map_err(|e| {
            log::error!("Failed to write PNG data: {e:?}");
            RendererError::Encode(e.to_string())
        })?;
    }
    Ok(png_data)
}

/// Encode straight RGBA8 pixels as JPEG. Alpha is dropped.
pub fn encode_jpeg(rgba_data: &[u8], width: u32, height: u32, quality: u8) -> RenderResult<Vec<u8>> {
    let rgb: Vec<u8> = rgba_data
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let mut jpeg_data = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_data, quality.clamp(1, 100))
        .encode(&rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| {
            log::error!("Failed to encode JPEG: {e:?}");
            RendererError::Encode(e.to_string())
        })?;
    Ok(jpeg_data)
}
