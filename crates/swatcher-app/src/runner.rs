//! Replays a job against a session.

use crate::AppError;
use crate::job::{ImageRef, Job, OutputFormat, Step};
use kurbo::Size;
use std::path::{Path, PathBuf};
use std::time::Instant;
use swatcher_core::loader::ImageSource;
use swatcher_core::session::{Session, SessionEvent};
use swatcher_render::{
    ExportFormat, RasterRenderer, RenderContext, Renderer, demultiplied_rgba, export_session,
};

/// What a finished job produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Files written, in order.
    pub outputs: Vec<PathBuf>,
    /// Drawables left in the scene.
    pub drawables: usize,
    /// Final session revision.
    pub revision: u64,
}

/// Owns the session and renderer for one job.
pub struct JobRunner {
    session: Session,
    renderer: RasterRenderer,
    base_dir: PathBuf,
    outputs: Vec<PathBuf>,
}

impl JobRunner {
    /// Create a runner and register the job's fonts.
    pub fn new(job: &Job, base_dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_dir = base_dir.into();
        let mut renderer = RasterRenderer::new();
        for font in &job.fonts {
            let path = base_dir.join(&font.path);
            let data = std::fs::read(&path).map_err(|source| AppError::Io { path, source })?;
            renderer
                .fonts_mut()
                .register(&font.family, font.weight, font.style, data)?;
        }
        Ok(Self {
            session: Session::new(job.config.clone()),
            renderer,
            base_dir,
            outputs: Vec::new(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run every step in order.
    pub async fn run(mut self, job: &Job) -> Result<RunReport, AppError> {
        for (index, step) in job.steps.iter().enumerate() {
            log::debug!("Step {index}: {step:?}");
            self.run_step(step).await?;
        }
        Ok(RunReport {
            outputs: self.outputs,
            drawables: self.session.scene().len(),
            revision: self.session.revision(),
        })
    }

    pub async fn run_step(&mut self, step: &Step) -> Result<(), AppError> {
        match step {
            Step::Background { source } => {
                let source = self.image_source(source)?;
                let load = self.session.begin_background_load(source);
                let completion = load.resolve().await;
                self.session.apply_load(completion);
            }
            Step::Overlay { source } => {
                let source = self.image_source(source)?;
                let load = self.session.begin_overlay_load(source);
                let completion = load.resolve().await;
                self.session.apply_load(completion);
            }
            Step::ReaddOverlay { index } => {
                self.session.re_add_overlay(*index);
            }
            Step::Text { content } => {
                self.session.add_text(content);
            }
            Step::Style { attr } => self.session.apply_style(attr.clone()),
            Step::ToggleBold => self.session.toggle_bold(),
            Step::ToggleItalic => self.session.toggle_italic(),
            Step::ToggleUnderline => self.session.toggle_underline(),
            Step::Delete => {
                self.session.remove_active();
            }
            Step::Key { key, focus } => {
                self.session.handle_key(*key, *focus);
            }
            Step::Pointer { event } => self.session.handle_pointer(*event),
            Step::Zoom { value } => self.session.set_zoom(*value),
            Step::ZoomIn => self.session.zoom_in(),
            Step::ZoomOut => self.session.zoom_out(),
            Step::ZoomReset => self.session.zoom_reset(),
            Step::Pan { delta } => self.session.pan_by(*delta),
            Step::Resize { width, height } => {
                // Replayed jobs have no event loop; let the quiet period pass.
                let now = Instant::now();
                self.session.request_resize(Size::new(*width, *height), now);
                let quiet = std::time::Duration::from_millis(self.session.config().resize_debounce_ms);
                self.session.poll_resize(now + quiet);
            }
            Step::Reset { confirm } => {
                let confirm = *confirm;
                self.session.reset(|| confirm);
            }
            Step::Save { path } => {
                let (exported, _) = swatcher_render::flatten(&mut self.renderer, &mut self.session)?;
                self.write(path, &exported.bytes)?;
            }
            Step::Download { dir } => {
                let (name, exported) = swatcher_render::download(&mut self.renderer, &self.session)?;
                self.write(&dir.join(name), &exported.bytes)?;
            }
            Step::Export {
                path,
                format,
                multiplier,
                quality,
            } => {
                let config = self.session.config();
                let format = match format {
                    OutputFormat::Png => ExportFormat::Png,
                    OutputFormat::Jpeg => ExportFormat::Jpeg {
                        quality: quality.unwrap_or(config.jpeg_quality),
                    },
                };
                let multiplier = multiplier.unwrap_or(config.export_multiplier);
                let exported = export_session(&mut self.renderer, &self.session, format, multiplier)?;
                self.write(path, &exported.bytes)?;
            }
            Step::Preview { path } => {
                let ctx = RenderContext::new(self.session.scene())
                    .with_viewport(*self.session.viewport())
                    .with_background(self.session.config().canvas_color.into())
                    .with_selection(true);
                let pixmap = self.renderer.render(&ctx)?;
                let png = swatcher_render::export::encode_png(
                    &demultiplied_rgba(&pixmap),
                    pixmap.width(),
                    pixmap.height(),
                )?;
                self.write(path, &png)?;
            }
        }

        for event in self.session.take_events() {
            match event {
                SessionEvent::SelectionChanged(id) => log::debug!("Selection changed: {id:?}"),
                SessionEvent::CursorChanged(cursor) => log::debug!("Cursor: {cursor:?}"),
                SessionEvent::RenderRequested => {}
            }
        }
        Ok(())
    }

    fn image_source(&self, image: &ImageRef) -> Result<ImageSource, AppError> {
        match image {
            ImageRef::Path { path } => {
                let path = self.base_dir.join(path);
                let bytes = std::fs::read(&path).map_err(|source| AppError::Io { path, source })?;
                Ok(ImageSource::Bytes(bytes))
            }
            ImageRef::DataUrl { data_url } => Ok(ImageSource::DataUrl(data_url.clone())),
        }
    }

    fn write(&mut self, path: &Path, bytes: &[u8]) -> Result<(), AppError> {
        let path = self.base_dir.join(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| AppError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, bytes).map_err(|source| AppError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("Wrote {}", path.display());
        self.outputs.push(path);
        Ok(())
    }
}

/// Load a job file and run it. Relative paths resolve against its directory.
pub async fn run_job_file(path: &Path) -> Result<RunReport, AppError> {
    let json = std::fs::read_to_string(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let job = Job::from_json(&json)?;
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    JobRunner::new(&job, base_dir)?.run(&job).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use swatcher_core::shapes::{ImageFormat, RasterImage, Tag};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, rgba: [u8; 4]) {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba(rgba));
        img.save(dir.join(name)).unwrap();
    }

    fn run(dir: &Path, json: &str) -> Result<RunReport, AppError> {
        let job_path = dir.join("job.json");
        std::fs::write(&job_path, json).unwrap();
        pollster::block_on(run_job_file(&job_path))
    }

    #[test]
    fn test_compose_and_export() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "bg.png", 300, 250, [0, 0, 255, 255]);
        write_png(dir.path(), "logo.png", 40, 40, [255, 0, 0, 255]);

        let report = run(
            dir.path(),
            r#"{
                "steps": [
                    { "op": "background", "path": "bg.png" },
                    { "op": "overlay", "path": "logo.png" },
                    { "op": "text", "content": "Hello" },
                    { "op": "zoom", "value": 2.5 },
                    { "op": "pan", "delta": { "x": 1000.0, "y": 1000.0 } },
                    { "op": "export", "path": "out/final.png", "format": "png" },
                    { "op": "export", "path": "out/final.jpg", "format": "jpeg", "multiplier": 1.0 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(report.drawables, 3);
        assert_eq!(report.outputs.len(), 2);
        let png = std::fs::read(dir.path().join("out/final.png")).unwrap();
        let image = RasterImage::decode(&png).unwrap();
        assert_eq!((image.width(), image.height()), (1200, 1000));
        // The zoomed, panned viewport does not leak into the export. The
        // overlay covers canvas 280..320 x 230..270; the text sits below 236.
        let corner = ((462 * 1200 + 566) * 4) as usize;
        assert_eq!(&image.pixels()[corner..corner + 4], &[255, 0, 0, 255]);
        let text_row = ((500 * 1200) * 4) as usize..((501 * 1200) * 4) as usize;
        assert!(image.pixels()[text_row].chunks_exact(4).any(|p| p[0] < 100 && p[2] < 100));

        let jpg = std::fs::read(dir.path().join("out/final.jpg")).unwrap();
        assert_eq!(ImageFormat::from_magic_bytes(&jpg), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_save_flattens_and_download_names_file() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "bg.png", 60, 50, [0, 200, 0, 255]);

        let json = r#"{
            "steps": [
                { "op": "background", "path": "bg.png" },
                { "op": "text", "content": "Flatten me" },
                { "op": "save", "path": "saved.png" },
                { "op": "download", "dir": "downloads" }
            ]
        }"#;
        let job = Job::from_json(json).unwrap();
        let mut runner = JobRunner::new(&job, dir.path()).unwrap();
        for step in &job.steps {
            pollster::block_on(runner.run_step(step)).unwrap();
        }

        let scene = runner.session().scene();
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.iter().next().map(|d| d.tag()), Some(Tag::Background));

        let downloads: Vec<_> = std::fs::read_dir(dir.path().join("downloads"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(downloads.len(), 1);
        assert!(downloads[0].starts_with("product-swatcher-"));
        assert!(downloads[0].ends_with(".jpg"));
    }

    #[test]
    fn test_non_image_upload_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
        let report = run(
            dir.path(),
            r#"{ "steps": [
                { "op": "overlay", "path": "notes.txt" },
                { "op": "text", "content": "   " },
                { "op": "delete" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(report.drawables, 1);
    }

    #[test]
    fn test_reset_and_resize() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "logo.png", 10, 10, [1, 2, 3, 255]);
        let report = run(
            dir.path(),
            r#"{ "steps": [
                { "op": "overlay", "path": "logo.png" },
                { "op": "reset", "confirm": false },
                { "op": "readd_overlay", "index": 0 },
                { "op": "resize", "width": 440.0, "height": 340.0 },
                { "op": "preview", "path": "preview.png" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(report.drawables, 3);

        let preview = RasterImage::decode(&std::fs::read(dir.path().join("preview.png")).unwrap()).unwrap();
        assert_eq!((preview.width(), preview.height()), (400, 300));

        let report = run(
            dir.path(),
            r#"{ "steps": [
                { "op": "overlay", "path": "logo.png" },
                { "op": "reset", "confirm": true },
                { "op": "readd_overlay", "index": 0 }
            ] }"#,
        )
        .unwrap();
        assert_eq!(report.drawables, 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(dir.path(), r#"{ "steps": [{ "op": "background", "path": "nope.png" }] }"#).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }

    #[test]
    fn test_invalid_job() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(dir.path(), r#"{ "steps": [{ "op": "fly" }] }"#).unwrap_err();
        assert!(matches!(err, AppError::Job(_)));
    }
}
