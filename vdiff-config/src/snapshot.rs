//! Immutable per-pass view of the settings.
//!
//! A render pass receives a [`RenderSettings`] by reference and keeps it for
//! the whole pass, so edits to [`Settings`] made while documents are being
//! rendered only take effect on the next pass.

use crate::backend::Backend;
use crate::settings::Settings;
use crate::types::TestSuite;
use std::path::PathBuf;

/// One enabled external backend and the rasterizer it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInvocation {
    pub backend: Backend,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub suite: TestSuite,
    /// Effective (already scaled) square view size in pixels.
    pub view_size: u32,
    /// Enabled external backends, in declaration order.
    pub backends: Vec<BackendInvocation>,
    pub work_dir: PathBuf,
    /// Worker pool size, always at least 1.
    pub workers: usize,
    pub java_program: String,
}

impl RenderSettings {
    /// A snapshot with no external backends enabled.
    pub fn new(suite: TestSuite, view_size: u32, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            suite,
            view_size: view_size.max(1),
            backends: Vec::new(),
            work_dir: work_dir.into(),
            workers: default_workers(),
            java_program: crate::defaults::java_program(),
        }
    }

    /// Enable `backend` with the given rasterizer entry point.
    ///
    /// The reference backend is not an external program and is ignored here.
    pub fn with_backend(mut self, backend: Backend, path: impl Into<PathBuf>) -> Self {
        if backend.is_reference() {
            return self;
        }
        let path = path.into();
        match self.backends.iter_mut().find(|b| b.backend == backend) {
            Some(existing) => existing.path = path,
            None => {
                self.backends.push(BackendInvocation { backend, path });
                self.backends.sort_by_key(|b| b.backend);
            }
        }
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_java_program(mut self, program: impl Into<String>) -> Self {
        self.java_program = program.into();
        self
    }

    pub fn is_curated(&self) -> bool {
        self.suite.is_curated()
    }

    pub fn invocation(&self, backend: Backend) -> Option<&BackendInvocation> {
        self.backends.iter().find(|b| b.backend == backend)
    }
}

impl Settings {
    /// Freeze the current settings for one render pass.
    pub fn snapshot(&self) -> RenderSettings {
        let backends = self
            .backends
            .iter()
            .filter(|(backend, cfg)| !backend.is_reference() && cfg.enabled)
            .map(|(backend, cfg)| BackendInvocation {
                backend: *backend,
                path: cfg.path.clone(),
            })
            .collect();

        RenderSettings {
            suite: self.test_suite,
            view_size: self.effective_view_size(),
            backends,
            work_dir: self.work_dir.clone(),
            workers: if self.workers == 0 {
                default_workers()
            } else {
                self.workers
            },
            java_program: self.java_program.clone(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
