//! Application state for one composition session.
//!
//! A [`Session`] owns the scene, the viewport and every controller that acts
//! on them. Hosts call its operations from their event handlers and drain
//! [`SessionEvent`]s to know when to redraw or refresh their controls.
//!
//! Requests that cannot be carried out (blank text, nothing selected, a file
//! that is not an image) are logged and ignored; no operation here fails.

use crate::camera::Viewport;
use crate::config::SwatcherConfig;
use crate::input::{CursorHint, GestureAction, GestureRouter, Key, KeyFocus, PointerEvent};
use crate::loader::{ImageSource, LoadCompletion, LoadSlot, LoadTracker, PendingLoad};
use crate::resize::ResizeDebouncer;
use crate::scene::Scene;
use crate::selection::{StyleAttr, StyleController};
use crate::shapes::{BackgroundSource, Drawable, DrawableId, DrawableKind, RasterImage, TextStyle};
use kurbo::{Point, Size, Vec2};
use std::time::{Duration, Instant};

/// Notifications for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The active object changed. Style controls should be refreshed.
    SelectionChanged(Option<DrawableId>),
    /// Something visible changed.
    RenderRequested,
    /// The advisory cursor changed.
    CursorChanged(CursorHint),
}

/// One composition session.
#[derive(Debug)]
pub struct Session {
    config: SwatcherConfig,
    scene: Scene,
    viewport: Viewport,
    router: GestureRouter,
    styles: StyleController,
    loads: LoadTracker,
    /// Uploaded overlay sources, oldest first.
    overlay_history: Vec<RasterImage>,
    resize: ResizeDebouncer,
    cursor: CursorHint,
    events: Vec<SessionEvent>,
    revision: u64,
}

impl Session {
    /// Start a session with the placeholder background in place.
    pub fn new(config: SwatcherConfig) -> Self {
        let canvas_size = config.initial_canvas_size();
        let mut session = Self {
            scene: Scene::new(canvas_size),
            viewport: Viewport::new(canvas_size, config.min_zoom, config.max_zoom),
            router: GestureRouter::new(),
            styles: StyleController::new(config.default_text_style.clone()),
            loads: LoadTracker::new(),
            overlay_history: Vec::new(),
            resize: ResizeDebouncer::new(Duration::from_millis(config.resize_debounce_ms)),
            cursor: CursorHint::Default,
            events: Vec::new(),
            revision: 0,
            config,
        };
        session.install_placeholder();
        session
    }

    pub fn config(&self) -> &SwatcherConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn canvas_size(&self) -> Size {
        self.scene.canvas_size()
    }

    /// Style shown by the controls and used for new text.
    pub fn current_style(&self) -> &TextStyle {
        self.styles.current()
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    /// Counts visible mutations.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn active(&self) -> Option<&Drawable> {
        self.scene.active()
    }

    pub fn overlay_history(&self) -> &[RasterImage] {
        &self.overlay_history
    }

    /// Drain queued notifications.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn request_render(&mut self) {
        self.revision += 1;
        if !self.events.contains(&SessionEvent::RenderRequested) {
            self.events.push(SessionEvent::RenderRequested);
        }
    }

    /// Emit a selection change if the active object differs from `before`.
    fn notify_selection(&mut self, before: Option<DrawableId>) {
        let after = self.scene.active_id();
        if after == before {
            return;
        }
        self.styles.sync_controls_from_active(&self.scene);
        self.events.push(SessionEvent::SelectionChanged(after));
    }

    fn set_cursor(&mut self, cursor: CursorHint) {
        if self.cursor != cursor {
            self.cursor = cursor;
            self.events.push(SessionEvent::CursorChanged(cursor));
        }
    }

    fn install_placeholder(&mut self) {
        let source = BackgroundSource::Placeholder {
            size: self.scene.canvas_size(),
            fill: self.config.placeholder_fill,
            label: self.config.placeholder_label.clone(),
            label_color: self.config.placeholder_label_color,
            label_size: self.config.placeholder_label_size,
        };
        self.scene.set_background(source);
    }

    fn has_placeholder(&self) -> bool {
        matches!(
            self.scene.background().map(|d| &d.kind),
            Some(DrawableKind::Background(BackgroundSource::Placeholder { .. }))
        )
    }

    // --- Viewport ---

    pub fn set_zoom(&mut self, zoom: f64) {
        self.apply_viewport(self.viewport.set_zoom(zoom));
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.viewport.zoom + self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.viewport.zoom - self.config.zoom_step);
    }

    pub fn zoom_reset(&mut self) {
        self.set_zoom(1.0);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.apply_viewport(self.viewport.pan_by(delta));
    }

    pub fn zoom_label(&self) -> String {
        self.viewport.zoom_label()
    }

    fn apply_viewport(&mut self, viewport: Viewport) {
        if viewport != self.viewport {
            self.viewport = viewport;
            self.request_render();
        }
    }

    // --- Images ---

    /// Start loading a new background. Supersedes any background still
    /// loading.
    pub fn begin_background_load(&mut self, source: ImageSource) -> PendingLoad {
        PendingLoad::decode(self.loads.begin_background(), source)
    }

    /// Start loading a new overlay.
    pub fn begin_overlay_load(&mut self, source: ImageSource) -> PendingLoad {
        PendingLoad::decode(self.loads.begin_overlay(), source)
    }

    /// Apply a finished load. Stale or failed loads are dropped.
    ///
    /// Returns the new drawable's id when the load was applied.
    pub fn apply_load(&mut self, completion: LoadCompletion) -> Option<DrawableId> {
        if !self.loads.finish(&completion.ticket) {
            log::warn!("Discarding stale load {:?}", completion.ticket);
            return None;
        }
        let image = match completion.result {
            Ok(image) => image,
            Err(err) => {
                log::debug!("Ignoring failed load {:?}: {err}", completion.ticket);
                return None;
            }
        };
        match completion.ticket.slot {
            LoadSlot::Background => Some(self.place_background(image)),
            LoadSlot::Overlay(_) => Some(self.add_overlay_image(image)),
        }
    }

    /// Replace the background immediately.
    pub fn set_background_image(&mut self, image: RasterImage) -> DrawableId {
        self.loads.supersede_background();
        self.place_background(image)
    }

    fn place_background(&mut self, image: RasterImage) -> DrawableId {
        let before = self.scene.active_id();
        log::info!("Setting background {}x{}", image.width(), image.height());
        let id = self.scene.set_background(BackgroundSource::Image(image));
        self.notify_selection(before);
        self.request_render();
        id
    }

    /// Add an overlay and remember its source for re-adding.
    pub fn add_overlay_image(&mut self, image: RasterImage) -> DrawableId {
        self.overlay_history.push(image.clone());
        self.place_overlay(image)
    }

    /// Add another copy of a previously uploaded overlay.
    pub fn re_add_overlay(&mut self, index: usize) -> Option<DrawableId> {
        let Some(image) = self.overlay_history.get(index).cloned() else {
            log::debug!("No overlay at history index {index}");
            return None;
        };
        Some(self.place_overlay(image))
    }

    fn place_overlay(&mut self, image: RasterImage) -> DrawableId {
        let before = self.scene.active_id();
        let id = self.scene.add_overlay(image, self.config.overlay_max_fraction);
        self.notify_selection(before);
        self.request_render();
        id
    }

    // --- Text and selection ---

    /// Add a text block with the current style. Blank content is ignored.
    pub fn add_text(&mut self, content: &str) -> Option<DrawableId> {
        let before = self.scene.active_id();
        match self.scene.add_text(content, self.styles.current().clone()) {
            Ok(id) => {
                self.notify_selection(before);
                self.request_render();
                Some(id)
            }
            Err(err) => {
                log::debug!("Ignoring text request: {err}");
                None
            }
        }
    }

    /// Delete the active object. The background is never deleted.
    pub fn remove_active(&mut self) -> bool {
        let before = self.scene.active_id();
        match self.scene.remove_active() {
            Ok(removed) => {
                log::debug!("Removed {:?} {}", removed.tag(), removed.id());
                self.notify_selection(before);
                self.request_render();
                true
            }
            Err(err) => {
                log::debug!("Ignoring delete request: {err}");
                false
            }
        }
    }

    /// Change the active object, or deselect with `None`.
    pub fn set_active(&mut self, id: Option<DrawableId>) -> bool {
        let before = self.scene.active_id();
        if let Err(err) = self.scene.set_active(id) {
            log::debug!("Ignoring selection request: {err}");
            return false;
        }
        if self.scene.active_id() != before {
            self.notify_selection(before);
            self.request_render();
        }
        true
    }

    pub fn apply_style(&mut self, attr: StyleAttr) {
        if self.styles.apply_style(&mut self.scene, attr) {
            self.request_render();
        }
    }

    pub fn toggle_bold(&mut self) {
        if self.styles.toggle_bold(&mut self.scene) {
            self.request_render();
        }
    }

    pub fn toggle_italic(&mut self) {
        if self.styles.toggle_italic(&mut self.scene) {
            self.request_render();
        }
    }

    pub fn toggle_underline(&mut self) {
        if self.styles.toggle_underline(&mut self.scene) {
            self.request_render();
        }
    }

    // --- Input ---

    /// Route a pointer event through the gesture router.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let actions = self.router.handle(event, &self.scene, &self.viewport);
        for action in actions {
            match action {
                GestureAction::Select(id) => {
                    self.set_active(id);
                }
                GestureAction::MoveDrawable { id, delta } => match self.scene.move_drawable(id, delta) {
                    Ok(()) => self.request_render(),
                    Err(err) => log::debug!("Ignoring drag: {err}"),
                },
                GestureAction::PanBy(delta) => self.pan_by(delta),
                GestureAction::SetZoom(zoom) => self.set_zoom(zoom),
            }
        }

        let position = match event {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position, .. }
            | PointerEvent::Up { position, .. } => position,
            PointerEvent::Cancel { .. } => return,
        };
        self.update_cursor(position);
    }

    /// Recompute the cursor for a hover position.
    pub fn update_cursor(&mut self, hover: Point) {
        let cursor = self.router.cursor(hover, &self.scene, &self.viewport);
        self.set_cursor(cursor);
    }

    /// Handle a key press. Returns `true` if the key was consumed.
    pub fn handle_key(&mut self, key: Key, focus: KeyFocus) -> bool {
        if focus == KeyFocus::TextInput {
            return false;
        }
        match key {
            Key::Delete | Key::Backspace => self.remove_active(),
            Key::Escape => self.scene.active_id().is_some() && self.set_active(None),
        }
    }

    // --- Lifecycle ---

    /// Discard the composition after the host confirms.
    ///
    /// Everything returns to its start-up state: empty overlay history,
    /// identity viewport, default style controls, placeholder background.
    pub fn reset(&mut self, confirm: impl FnOnce() -> bool) -> bool {
        if !confirm() {
            return false;
        }
        let before = self.scene.active_id();
        self.loads.invalidate_all();
        self.resize.cancel();
        self.scene.clear();
        self.overlay_history.clear();
        self.viewport = self.viewport.to_identity();
        self.router.reset();
        self.styles.reset();
        self.install_placeholder();
        if before.is_some() {
            self.events.push(SessionEvent::SelectionChanged(None));
        }
        self.set_cursor(CursorHint::Default);
        self.request_render();
        log::info!("Session reset");
        true
    }

    /// Collapse the scene into a single background made from `flattened`,
    /// usually the session's own export.
    pub fn replace_with_flattened(&mut self, flattened: RasterImage) -> DrawableId {
        let before = self.scene.active_id();
        self.scene.clear();
        self.router.reset();
        self.loads.supersede_background();
        let id = self.scene.set_background(BackgroundSource::Image(flattened));
        self.notify_selection(before);
        self.request_render();
        log::info!("Scene flattened into {id}");
        id
    }

    /// Record the size of the area hosting the canvas. Takes effect after
    /// the debounce period, see [`Session::poll_resize`].
    pub fn request_resize(&mut self, area: Size, now: Instant) {
        self.resize.request(area, now);
    }

    /// Apply a pending resize whose quiet period has elapsed.
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        let Some(area) = self.resize.poll(now) else {
            return false;
        };
        let size = self.config.canvas_size_for_area(area);
        if size == self.scene.canvas_size() {
            return false;
        }
        log::info!("Resizing canvas to {}x{}", size.width, size.height);
        let placeholder = self.has_placeholder();
        self.scene.set_canvas_size(size);
        self.viewport = self.viewport.with_canvas_size(size);
        if placeholder {
            self.install_placeholder();
        }
        self.request_render();
        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SwatcherConfig::default())
    }
}
