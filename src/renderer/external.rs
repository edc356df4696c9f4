//! Java rasterizer backends (Batik, JSVG, SVGSalamander, EchoSVG).
//!
//! Every backend is a runnable jar taking `<width> <height> <input> <output>`.

use image::RgbaImage;
use std::path::Path;
use tempfile::{NamedTempFile, TempPath};

use super::{BackendRenderer, RenderRequest};
use crate::error::RenderError;
use crate::raster::{self, RasterSize};
use vdiff_config::Backend;

/// Fresh, uniquely named output file for one render of `backend` inside
/// `work_dir`. The file is removed when the returned path is dropped.
pub(super) fn temp_output(work_dir: &Path, backend: Backend) -> Result<TempPath, RenderError> {
    tempfile::Builder::new()
        .prefix(&format!("{}-", backend.stable_name()))
        .suffix(".png")
        .tempfile_in(work_dir)
        .map(NamedTempFile::into_temp_path)
        .map_err(|source| RenderError::Io {
            path: work_dir.to_path_buf(),
            source,
        })
}

/// Arguments passed to the Java runtime.
pub(super) fn arguments(request: &RenderRequest, output: &Path) -> Vec<String> {
    vec![
        "-Djava.awt.headless=true".to_string(),
        "-jar".to_string(),
        request.rasterizer.to_string_lossy().into_owned(),
        request.view_size.to_string(),
        request.view_size.to_string(),
        request.document.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
    ]
}

pub(super) fn render(
    renderer: &BackendRenderer,
    request: &RenderRequest,
) -> Result<RgbaImage, RenderError> {
    let backend = request.backend;
    let output = temp_output(&renderer.work_dir, backend)?;

    let text = renderer
        .runner
        .run(&renderer.java_program, &arguments(request, &output))?;

    if let Some(marker) = backend.success_marker()
        && !text.contains(marker)
    {
        log::warn!("{}: {}", backend.stable_name(), text.trim_end());
    }

    let image = load_and_remove(output)?;

    // The rasterizers always fill the whole square, whatever the document's
    // aspect ratio.
    if !request.image_size.is_empty() && request.image_size != RasterSize::of(&image) {
        raster::ensure_allocatable(request.image_size)?;
        return Ok(raster::center_crop_vertical(&image, request.image_size));
    }
    Ok(image)
}

/// Decode the rasterizer output, then delete it whether or not it decoded.
fn load_and_remove(output: TempPath) -> Result<RgbaImage, RenderError> {
    let loaded = raster::load_rgba(&output).map(|img| img.to_rgba8());
    let path = output.to_path_buf();
    if let Err(e) = output.close() {
        log::warn!("Failed to remove temporary output {:?}: {}", path, e);
    }
    loaded
}
