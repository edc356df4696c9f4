//! Notifications emitted by a render pass.
//!
//! Consumers subscribe by handing the coordinator an [`EventSink`]. Per-backend
//! events arrive in completion order, not backend order; key them by backend.

use image::RgbaImage;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::diff::DiffStats;
use vdiff_config::Backend;

/// Where a ready raster came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Served from the render cache without running the backend.
    Cached,
    /// Produced by a render task during this pass.
    Rendered,
}

#[derive(Debug, Clone)]
pub enum RenderEvent {
    /// One backend's raster (possibly a placeholder) is available.
    ImageReady {
        backend: Backend,
        image: Arc<RgbaImage>,
        source: ImageSource,
        placeholder: bool,
    },
    /// Every backend of the pass has reported. Sent exactly once per pass,
    /// after all `ImageReady` events.
    AllRendered { document: PathBuf },
    /// Diff raster of one backend against the reference.
    DiffReady {
        backend: Backend,
        image: Arc<RgbaImage>,
        stats: DiffStats,
    },
    /// Every diff of the pass has reported. Curated suite only.
    AllDiffed { document: PathBuf },
}

/// Receiver of [`RenderEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: RenderEvent);
}

impl EventSink for mpsc::UnboundedSender<RenderEvent> {
    fn emit(&self, event: RenderEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: RenderEvent) {}
}

/// Sink that records events in arrival order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<RenderEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<RenderEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: RenderEvent) {
        self.events.lock().push(event);
    }
}
