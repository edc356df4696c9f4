//! Writing a finished pass to disk.
//!
//! Files are named after the document stem and the backend's stable name:
//! `rect-01.batik.png` for a render and `rect-01.batik.diff.png` for its diff
//! against the reference.

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};

use crate::coordinator::RenderOutcome;
use vdiff_config::Backend;

fn document_stem(document: &Path) -> String {
    document
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

pub fn render_path(out_dir: &Path, document: &Path, backend: Backend) -> PathBuf {
    out_dir.join(format!(
        "{}.{}.png",
        document_stem(document),
        backend.stable_name()
    ))
}

pub fn diff_path(out_dir: &Path, document: &Path, backend: Backend) -> PathBuf {
    out_dir.join(format!(
        "{}.{}.diff.png",
        document_stem(document),
        backend.stable_name()
    ))
}

fn write_png(path: &Path, image: &RgbaImage) -> Result<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write {:?}", path))
}

/// Write every render and diff of `outcome` into `out_dir`, returning the
/// written paths in backend order.
pub fn write_outcome(out_dir: &Path, outcome: &RenderOutcome) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    let mut written = Vec::new();
    for (backend, result) in &outcome.renders {
        let path = render_path(out_dir, &outcome.document, *backend);
        write_png(&path, result.image())?;
        written.push(path);

        if let Some(diff) = outcome.diffs.get(backend) {
            let path = diff_path(out_dir, &outcome.document, *backend);
            write_png(&path, &diff.image)?;
            written.push(path);
        }
    }

    log::info!("Wrote {} images to {:?}", written.len(), out_dir);
    Ok(written)
}
