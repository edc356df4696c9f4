//! Fans diff computation out over the rendered backends.

use image::RgbaImage;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::diff::{DiffResult, diff_images};
use crate::events::{EventSink, RenderEvent};
use crate::task_group::TaskGroup;
use vdiff_config::Backend;

/// One diff per candidate against a shared reference, run concurrently.
pub struct DiffCoordinator {
    workers: usize,
}

impl DiffCoordinator {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Diff every candidate against `reference`.
    ///
    /// Emits `DiffReady` per backend as each diff finishes, then a single
    /// `AllDiffed`. Reference entries among the candidates are skipped.
    pub async fn run(
        &self,
        document: &Path,
        reference: Arc<RgbaImage>,
        candidates: Vec<(Backend, Arc<RgbaImage>)>,
        sink: &dyn EventSink,
    ) -> BTreeMap<Backend, DiffResult> {
        let mut group = TaskGroup::with_workers(self.workers);
        for (backend, candidate) in candidates {
            if backend.is_reference() {
                continue;
            }
            let reference = Arc::clone(&reference);
            group.spawn(move || diff_images(backend, &reference, &candidate));
        }
        log::debug!("Dispatched {} diffs for {:?}", group.submitted(), document);

        let mut diffs = BTreeMap::new();
        while let Some((_, result)) = group.next().await {
            log::info!(
                "{}: {:.2}% of pixels differ",
                result.backend.display_name(),
                result.stats.percent()
            );
            sink.emit(RenderEvent::DiffReady {
                backend: result.backend,
                image: Arc::clone(&result.image),
                stats: result.stats,
            });
            diffs.insert(result.backend, result);
        }

        sink.emit(RenderEvent::AllDiffed {
            document: document.to_path_buf(),
        });
        diffs
    }
}
