//! Debounced canvas resizing.

use kurbo::Size;
use std::time::{Duration, Instant};

/// Collapses bursts of resize signals into one action fired after a quiet
/// period since the last signal.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    quiet_period: Duration,
    /// Latest requested area size and when it was requested.
    pending: Option<(Size, Instant)>,
}

impl ResizeDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
        }
    }

    /// Record a resize signal, restarting the quiet period.
    pub fn request(&mut self, area: Size, now: Instant) {
        self.pending = Some((area, now));
    }

    /// Return the latest area size once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Size> {
        let (area, requested_at) = self.pending?;
        if now.saturating_duration_since(requested_at) < self.quiet_period {
            return None;
        }
        self.pending = None;
        Some(area)
    }

    /// Drop any pending resize.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
