//! Decoded raster images for backgrounds and overlays.

use crate::error::LoadError;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::fmt;
use std::sync::Arc;

/// Encoded image format, detected from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// A decoded image: straight RGBA8 pixels, row-major.
///
/// Pixel storage is shared, so cloning is cheap and a source can back any
/// number of overlays.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl RasterImage {
    /// Wrap raw RGBA8 pixels. Returns `None` for empty or mis-sized buffers.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// A single-color image, mostly useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Option<Self> {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self::from_rgba(width, height, pixels)
    }

    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(data: &[u8]) -> Result<Self, LoadError> {
        let format = ImageFormat::from_magic_bytes(data)
            .ok_or_else(|| LoadError::NotAnImage("unrecognized signature".to_string()))?;
        let decoded = ::image::load_from_memory(data)
            .map_err(|e| LoadError::Decode(format!("{}: {e}", format.mime_type())))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
            .ok_or_else(|| LoadError::Decode("image has no pixels".to_string()))
    }

    /// Decode a `data:image/...;base64,` URL.
    pub fn from_data_url(url: &str) -> Result<Self, LoadError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| LoadError::DataUrl("missing data: scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| LoadError::DataUrl("missing payload separator".to_string()))?;
        let mime = header.split(';').next().unwrap_or_default();
        if !mime.starts_with("image/") {
            return Err(LoadError::NotAnImage(mime.to_string()));
        }
        if !header.ends_with(";base64") {
            return Err(LoadError::DataUrl("only base64 payloads are supported".to_string()));
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| LoadError::DataUrl(e.to_string()))?;
        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size in pixels as floating point.
    pub fn size(&self) -> kurbo::Size {
        kurbo::Size::new(self.width as f64, self.height as f64)
    }

    /// Straight RGBA8 pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([200, 10, 10, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ImageFormat::from_magic_bytes(&png_bytes(1, 1)), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a"), None);
        assert_eq!(ImageFormat::from_magic_bytes(&[0x89]), None);
    }

    #[test]
    fn test_decode_png() {
        let img = RasterImage::decode(&png_bytes(3, 2)).unwrap();
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(&img.pixels()[0..4], &[200, 10, 10, 255]);
    }

    #[test]
    fn test_decode_rejects_text() {
        let err = RasterImage::decode(b"hello, world").unwrap_err();
        assert!(matches!(err, LoadError::NotAnImage(_)));
    }

    #[test]
    fn test_data_url() {
        let url = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes(4, 4)));
        let img = RasterImage::from_data_url(&url).unwrap();
        assert_eq!(img.size(), kurbo::Size::new(4.0, 4.0));

        let err = RasterImage::from_data_url("data:text/plain;base64,aGk=").unwrap_err();
        assert!(matches!(err, LoadError::NotAnImage(_)));
        assert!(RasterImage::from_data_url("https://example.com/a.png").is_err());
    }

    #[test]
    fn test_from_rgba_validates_length() {
        assert!(RasterImage::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(RasterImage::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(RasterImage::from_rgba(0, 2, Vec::new()).is_none());
    }
}
