//! Persistent store of previously rendered rasters.
//!
//! Entries are keyed by backend and the document's path only. A document that
//! changes on disk without moving keeps serving its old raster until the cache
//! is cleared.

use image::{ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};

use crate::error::CacheError;
use vdiff_config::Backend;

/// Keyed raster store consulted by the render coordinator.
///
/// Only the coordinator calls into a cache, from its own aggregation loop;
/// implementations never see concurrent calls from render workers.
pub trait RenderCache: Send + Sync {
    /// Previously stored raster for `backend` rendering `document`, if any.
    fn get(&self, backend: Backend, document: &Path) -> Option<RgbaImage>;

    /// Store `image` as the result of `backend` rendering `document`.
    fn put(&self, backend: Backend, document: &Path, image: &RgbaImage) -> Result<(), CacheError>;
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl RenderCache for NoCache {
    fn get(&self, _backend: Backend, _document: &Path) -> Option<RgbaImage> {
        None
    }

    fn put(
        &self,
        _backend: Backend,
        _document: &Path,
        _image: &RgbaImage,
    ) -> Result<(), CacheError> {
        Ok(())
    }
}

/// PNG-per-entry cache under a directory.
///
/// File names are `<backend>_<escaped document path>.png`.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache rooted in the `cache` subdirectory of a working directory.
    pub fn in_work_dir(work_dir: &Path) -> Self {
        Self::new(work_dir.join("cache"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the entry for (`backend`, `document`).
    pub fn entry_path(&self, backend: Backend, document: &Path) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.png",
            backend.stable_name(),
            escape_path(document)
        ))
    }

    /// Remove every entry. Returns how many files were deleted.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(CacheError::Clear {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "png") {
                std::fs::remove_file(&path).map_err(|source| CacheError::Clear {
                    path: path.clone(),
                    source,
                })?;
                removed += 1;
            }
        }
        log::info!("Cleared {} cached rasters from {:?}", removed, self.dir);
        Ok(removed)
    }
}

impl RenderCache for DiskCache {
    fn get(&self, backend: Backend, document: &Path) -> Option<RgbaImage> {
        let path = self.entry_path(backend, document);
        if !path.exists() {
            return None;
        }
        match image::open(&path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                log::debug!("Ignoring unreadable cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    fn put(&self, backend: Backend, document: &Path, image: &RgbaImage) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.entry_path(backend, document);
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| CacheError::Write { path, source })
    }
}

/// Turn a path into a single file-name component.
///
/// Bytes outside `[A-Za-z0-9.-]` become `_XX` (uppercase hex), so the mapping
/// is injective and the result is safe on every filesystem.
pub fn escape_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{byte:02X}"));
        }
    }
    out
}
