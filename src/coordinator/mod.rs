//! Render pass orchestration.
//!
//! A pass takes one document through every enabled backend:
//!
//! 1. estimate the document size and derive the crop target
//! 2. serve cache hits immediately (curated suite only)
//! 3. render the rest concurrently on a bounded worker pool
//! 4. write fresh external renders back to the cache (curated suite only)
//! 5. signal completion, then diff every backend against the reference
//!    (curated suite only)
//!
//! Only one pass may run at a time per coordinator; a second call while a
//! pass is active fails with [`CoordinatorError::Busy`].

pub mod diff;

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::cache::RenderCache;
use crate::diff::DiffResult;
use crate::error::CoordinatorError;
use crate::events::{EventSink, ImageSource, RenderEvent};
use crate::raster::RasterSize;
use crate::renderer::{BackendRenderer, RenderRequest, RenderResult};
use crate::svg_size;
use crate::task_group::TaskGroup;
use vdiff_config::{Backend, RenderSettings};
use vdiff_process::ProcessRunner;

pub use diff::DiffCoordinator;

/// Where the coordinator is within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Rendering,
    AllRendered,
    DiffPending,
}

/// Everything a finished pass produced.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub document: PathBuf,
    /// Crop target derived from the document's nominal size.
    pub image_size: RasterSize,
    pub renders: BTreeMap<Backend, RenderResult>,
    /// Empty for the ad-hoc corpus.
    pub diffs: BTreeMap<Backend, DiffResult>,
    /// Render tasks handed to the worker pool.
    pub dispatched: usize,
    /// Backends served from the cache.
    pub cache_hits: usize,
}

/// Resets the coordinator to `Idle` when a pass ends, however it ends.
struct PassGuard<'a> {
    state: &'a Mutex<CoordinatorState>,
}

impl PassGuard<'_> {
    fn set(&self, state: CoordinatorState) {
        *self.state.lock() = state;
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = CoordinatorState::Idle;
    }
}

pub struct RenderCoordinator {
    cache: Arc<dyn RenderCache>,
    runner: Arc<dyn ProcessRunner>,
    state: Mutex<CoordinatorState>,
}

impl RenderCoordinator {
    pub fn new(cache: Arc<dyn RenderCache>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            cache,
            runner,
            state: Mutex::new(CoordinatorState::Idle),
        }
    }

    pub fn state(&self) -> CoordinatorState {
        *self.state.lock()
    }

    /// Run one pass for `document` with a frozen `settings` snapshot.
    ///
    /// Events are delivered to `sink` as they happen. Every enabled backend
    /// yields exactly one `ImageReady` (a failed backend yields a
    /// placeholder), followed by one `AllRendered`. For the curated suite the
    /// diffs follow, closed by one `AllDiffed`.
    ///
    /// # Errors
    /// [`CoordinatorError::Busy`] if a pass is already running, and
    /// [`CoordinatorError::WorkDir`] if the working directory cannot be created.
    ///
    /// # Panics
    /// Panics if the curated suite lacks a reference image for `document`.
    pub async fn render(
        &self,
        document: &Path,
        settings: &RenderSettings,
        sink: &dyn EventSink,
    ) -> Result<RenderOutcome, CoordinatorError> {
        {
            let mut state = self.state.lock();
            if *state != CoordinatorState::Idle {
                return Err(CoordinatorError::Busy);
            }
            *state = CoordinatorState::Rendering;
        }
        let pass = PassGuard { state: &self.state };

        std::fs::create_dir_all(&settings.work_dir).map_err(|source| {
            CoordinatorError::WorkDir {
                path: settings.work_dir.clone(),
                source,
            }
        })?;

        let image_size = svg_size::target_size(svg_size::estimate(document), settings.view_size);
        log::info!(
            "Rendering {:?} at {} (view {}px, {:?} suite)",
            document,
            image_size,
            settings.view_size,
            settings.suite
        );

        let curated = settings.is_curated();
        let request = |backend: Backend, rasterizer: PathBuf| RenderRequest {
            backend,
            document: document.to_path_buf(),
            view_size: settings.view_size,
            rasterizer,
            image_size,
        };

        let mut renders: BTreeMap<Backend, RenderResult> = BTreeMap::new();
        let mut requests = Vec::new();
        let mut cache_hits = 0;

        // The ad-hoc corpus has no reference images to compare against.
        if curated {
            requests.push(request(Backend::Reference, PathBuf::new()));
        }

        for invocation in &settings.backends {
            if curated && let Some(image) = self.cache.get(invocation.backend, document) {
                log::debug!("{} served from cache", invocation.backend.stable_name());
                let result = RenderResult::rendered(invocation.backend, image);
                sink.emit(RenderEvent::ImageReady {
                    backend: invocation.backend,
                    image: Arc::clone(result.image()),
                    source: ImageSource::Cached,
                    placeholder: false,
                });
                renders.insert(invocation.backend, result);
                cache_hits += 1;
                continue;
            }
            requests.push(request(invocation.backend, invocation.path.clone()));
        }

        let renderer = BackendRenderer::new(Arc::clone(&self.runner), settings);
        let permits = Arc::new(Semaphore::new(settings.workers.max(1)));
        let mut group = TaskGroup::new(permits);
        for request in requests {
            let renderer = renderer.clone();
            group.spawn(move || renderer.render(&request));
        }
        let dispatched = group.submitted();

        while let Some((_, result)) = group.next().await {
            let backend = result.backend;
            let image = Arc::clone(result.image());
            let placeholder = result.is_placeholder();
            renders.insert(backend, result);

            sink.emit(RenderEvent::ImageReady {
                backend,
                image: Arc::clone(&image),
                source: ImageSource::Rendered,
                placeholder,
            });

            if curated
                && !backend.is_reference()
                && let Err(e) = self.cache.put(backend, document, &image)
            {
                log::warn!("Failed to cache {} render: {}", backend.stable_name(), e);
            }
        }

        pass.set(CoordinatorState::AllRendered);
        sink.emit(RenderEvent::AllRendered {
            document: document.to_path_buf(),
        });

        let mut diffs = BTreeMap::new();
        if curated && let Some(reference) = renders.get(&Backend::Reference) {
            pass.set(CoordinatorState::DiffPending);
            let candidates = renders
                .iter()
                .filter(|(backend, _)| !backend.is_reference())
                .map(|(backend, result)| (*backend, Arc::clone(result.image())))
                .collect();
            diffs = DiffCoordinator::new(settings.workers)
                .run(document, Arc::clone(reference.image()), candidates, sink)
                .await;
        }

        Ok(RenderOutcome {
            document: document.to_path_buf(),
            image_size,
            renders,
            diffs,
            dispatched,
            cache_hits,
        })
    }
}
