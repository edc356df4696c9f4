//! Per-backend rendering.
//!
//! [`BackendRenderer::render`] is the failure boundary of the pipeline: it
//! always returns a [`RenderResult`]. Recoverable failures (missing or corrupt
//! output, a rasterizer that cannot be run) come back as a placeholder raster
//! carrying the error text instead of an error value.

mod external;
pub mod placeholder;
mod reference;

use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;

use crate::raster::RasterSize;
use vdiff_config::{Backend, RenderSettings};
use vdiff_process::ProcessRunner;

/// Everything one backend needs to render one document.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub backend: Backend,
    pub document: PathBuf,
    /// Edge of the square the rasterizer is asked to fill.
    pub view_size: u32,
    /// Rasterizer entry point; empty for the reference backend.
    pub rasterizer: PathBuf,
    /// Size the output is cropped to.
    pub image_size: RasterSize,
}

/// Pixels produced for one backend.
#[derive(Debug, Clone)]
pub enum Raster {
    Rendered(Arc<RgbaImage>),
    /// Stand-in image showing why the backend failed.
    Placeholder {
        image: Arc<RgbaImage>,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct RenderResult {
    pub backend: Backend,
    pub raster: Raster,
}

impl RenderResult {
    pub fn rendered(backend: Backend, image: RgbaImage) -> Self {
        Self {
            backend,
            raster: Raster::Rendered(Arc::new(image)),
        }
    }

    pub fn image(&self) -> &Arc<RgbaImage> {
        match &self.raster {
            Raster::Rendered(image) | Raster::Placeholder { image, .. } => image,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.raster, Raster::Placeholder { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.raster {
            Raster::Placeholder { message, .. } => Some(message),
            Raster::Rendered(_) => None,
        }
    }
}

/// Renders requests for any backend.
///
/// Cheap to clone; each worker task gets its own copy.
#[derive(Clone)]
pub struct BackendRenderer {
    runner: Arc<dyn ProcessRunner>,
    java_program: String,
    work_dir: PathBuf,
}

impl BackendRenderer {
    pub fn new(runner: Arc<dyn ProcessRunner>, settings: &RenderSettings) -> Self {
        Self {
            runner,
            java_program: settings.java_program.clone(),
            work_dir: settings.work_dir.clone(),
        }
    }

    /// Render `request`, substituting a placeholder on failure.
    ///
    /// # Panics
    /// Panics if the reference image for a document does not exist; that is a
    /// broken test suite, not a rendering failure.
    pub fn render(&self, request: &RenderRequest) -> RenderResult {
        let outcome = match request.backend {
            Backend::Reference => reference::render(request),
            Backend::Batik | Backend::Jsvg | Backend::SvgSalamander | Backend::EchoSvg => {
                external::render(self, request)
            }
        };

        match outcome {
            Ok(image) => RenderResult::rendered(request.backend, image),
            Err(e) => {
                let message = e.to_string();
                log::error!(
                    "{} failed on {:?}: {}",
                    request.backend.stable_name(),
                    request.document,
                    message
                );
                RenderResult {
                    backend: request.backend,
                    raster: Raster::Placeholder {
                        image: Arc::new(placeholder::render(&message, request.view_size)),
                        message,
                    },
                }
            }
        }
    }
}
