//! Typed error types for the vdiff render engine.
//!
//! [`RenderError`] never leaves a backend renderer: the per-backend boundary
//! in [`crate::renderer`] turns it into a placeholder raster. The other types
//! are returned to callers of the cache and the coordinator.

use std::path::PathBuf;
use thiserror::Error;

use crate::raster::RasterSize;
use vdiff_process::ProcessError;

/// Failure inside a single backend render.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The rasterizer output (or reference image) is missing or cannot be decoded.
    #[error("Invalid image: {}", path.display())]
    InvalidImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The external rasterizer could not be run to completion.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The document asks for a raster too large to allocate.
    #[error("Image too large: {size} exceeds {limit} bytes")]
    TooLarge { size: RasterSize, limit: u64 },

    /// The temporary output file could not be created.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reading or writing the persistent render cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache entry '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to clear cache directory '{}': {source}", path.display())]
    Clear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a render pass refuses to start.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A previous pass has not emitted its completion signal yet.
    #[error("A render pass is already in progress")]
    Busy,

    /// The working directory for rasterizer output is missing and cannot be created.
    #[error("Working directory '{}' is unavailable: {source}", path.display())]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
