//! Product Swatcher Render Library
//!
//! Renderer abstraction, a CPU raster implementation and the export
//! encoders. Text is laid out with registered fonts; without any, text is
//! skipped and everything else still renders.

pub mod export;
pub mod fonts;
mod raster;
mod renderer;

pub use export::{ExportFormat, ExportedImage, download, download_file_name, export, export_session, flatten};
pub use fonts::{FontBook, TextLayout, TextOptions};
pub use raster::{RasterRenderer, demultiplied_rgba};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
