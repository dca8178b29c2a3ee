//! Asynchronous image loads and stale-completion tracking.
//!
//! Every load is tagged with a generation when it starts. A completion is
//! only applied if its slot still expects that generation; newer requests for
//! the same slot, or a scene reset, make older completions stale.

use crate::error::LoadError;
use crate::shapes::RasterImage;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// An image handed to the composer by the upload surface or the catalog.
#[derive(Clone)]
pub enum ImageSource {
    /// Encoded PNG, JPEG or WebP bytes.
    Bytes(Vec<u8>),
    /// A `data:image/...;base64,` URL.
    DataUrl(String),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ImageSource::DataUrl(url) => write!(f, "DataUrl({} chars)", url.len()),
        }
    }
}

impl ImageSource {
    /// Decode the source into pixels.
    pub fn decode(self) -> Result<RasterImage, LoadError> {
        match self {
            ImageSource::Bytes(bytes) => RasterImage::decode(&bytes),
            ImageSource::DataUrl(url) => RasterImage::from_data_url(&url),
        }
    }
}

/// Where a completed load lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadSlot {
    /// The single background; a newer request supersedes older ones.
    Background,
    /// One overlay request; each gets its own slot.
    Overlay(u64),
}

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub slot: LoadSlot,
    pub generation: u64,
}

/// Bookkeeping for in-flight loads.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    /// Last generation handed out. Never reused.
    generation: u64,
    next_overlay: u64,
    /// Generation each slot currently expects.
    pending: HashMap<LoadSlot, u64>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a background load, superseding any pending one.
    pub fn begin_background(&mut self) -> LoadTicket {
        self.begin(LoadSlot::Background)
    }

    /// Start an overlay load in a fresh slot.
    pub fn begin_overlay(&mut self) -> LoadTicket {
        self.next_overlay += 1;
        self.begin(LoadSlot::Overlay(self.next_overlay))
    }

    fn begin(&mut self, slot: LoadSlot) -> LoadTicket {
        self.generation += 1;
        self.pending.insert(slot, self.generation);
        LoadTicket {
            slot,
            generation: self.generation,
        }
    }

    /// Whether a ticket would still be applied.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.pending.get(&ticket.slot) == Some(&ticket.generation)
    }

    /// Consume a ticket. Returns `false` for stale or already finished loads.
    pub fn finish(&mut self, ticket: &LoadTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.pending.remove(&ticket.slot);
        true
    }

    /// Supersede the background slot without starting a load, e.g. when a
    /// background is set synchronously.
    pub fn supersede_background(&mut self) {
        self.pending.remove(&LoadSlot::Background);
    }

    /// Make every in-flight load stale.
    pub fn invalidate_all(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("Invalidating {} pending loads", self.pending.len());
        }
        self.pending.clear();
    }
}

/// Result of a finished load, ready to hand back to the session.
#[derive(Debug)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub result: Result<RasterImage, LoadError>,
}

/// A load in flight. Await [`PendingLoad::resolve`] on any executor and pass
/// the completion back to the session.
pub struct PendingLoad {
    ticket: LoadTicket,
    future: BoxFuture<'static, Result<RasterImage, LoadError>>,
}

impl fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

impl PendingLoad {
    /// Decode `source` when polled.
    pub fn decode(ticket: LoadTicket, source: ImageSource) -> Self {
        Self::from_future(ticket, async move { source.decode() })
    }

    /// Wrap a host-provided future, e.g. a network fetch followed by decode.
    pub fn from_future<F>(ticket: LoadTicket, future: F) -> Self
    where
        F: Future<Output = Result<RasterImage, LoadError>> + 'static,
    {
        Self {
            ticket,
            future: Box::pin(future),
        }
    }

    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub async fn resolve(self) -> LoadCompletion {
        let result = self.future.await;
        LoadCompletion {
            ticket: self.ticket,
            result,
        }
    }
}
