//! Per-pixel comparison of a backend raster against the reference.

use image::{Rgba, RgbaImage};
use std::sync::Arc;

use crate::raster::{self, RasterSize};
use vdiff_config::Backend;

/// Pixels farther apart than this (Euclidean RGB distance) differ.
pub const DISTANCE_THRESHOLD: u32 = 5;

/// Marks a pixel that differs, or that could not be compared.
pub const DIFF_DIFFERENT: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Marks a pixel that matches within the threshold.
pub const DIFF_SAME: Rgba<u8> = Rgba([255, 255, 255, 255]);

const WHITE: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffStats {
    pub width: u32,
    pub height: u32,
    /// Pixels painted [`DIFF_DIFFERENT`], including any area outside the
    /// overlap of the two inputs.
    pub differing_pixels: u64,
}

impl DiffStats {
    pub fn total_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Share of differing pixels in percent.
    pub fn percent(&self) -> f64 {
        match self.total_pixels() {
            0 => 0.0,
            total => self.differing_pixels as f64 * 100.0 / total as f64,
        }
    }

    pub fn is_identical(&self) -> bool {
        self.differing_pixels == 0
    }
}

#[derive(Debug, Clone)]
pub struct DiffResult {
    pub backend: Backend,
    pub image: Arc<RgbaImage>,
    pub stats: DiffStats,
}

/// Integer Euclidean distance between the RGB channels of two pixels.
pub fn color_distance(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    let d = |x: u8, y: u8| {
        let v = x as i32 - y as i32;
        (v * v) as u32
    };
    let sum = d(a[0], b[0]) + d(a[1], b[1]) + d(a[2], b[2]);
    (sum as f64).sqrt() as u32
}

/// Compare `candidate` (rendered by `backend`) against `reference`.
///
/// The output has the reference's size. It starts fully
/// [`DIFF_DIFFERENT`] and only the overlapping rectangle of the two inputs is
/// compared, so when the sizes disagree everything outside the overlap stays
/// marked as different.
pub fn diff_images(backend: Backend, reference: &RgbaImage, candidate: &RgbaImage) -> DiffResult {
    let ref_size = RasterSize::of(reference);
    let cand_size = RasterSize::of(candidate);
    if ref_size != cand_size {
        log::warn!(
            "Images size mismatch: {} != {} Reference vs {}",
            ref_size,
            cand_size,
            backend.display_name()
        );
    }

    let width = ref_size.width.min(cand_size.width);
    let height = ref_size.height.min(cand_size.height);

    let reference = raster::flatten(reference, WHITE);
    let candidate = raster::flatten(candidate, WHITE);

    let mut out = RgbaImage::from_pixel(ref_size.width, ref_size.height, DIFF_DIFFERENT);
    for y in 0..height {
        for x in 0..width {
            let a = *reference.get_pixel(x, y);
            let b = *candidate.get_pixel(x, y);
            let mark = if color_distance(a, b) > DISTANCE_THRESHOLD {
                DIFF_DIFFERENT
            } else {
                DIFF_SAME
            };
            out.put_pixel(x, y, mark);
        }
    }

    let differing_pixels = out.pixels().filter(|p| **p == DIFF_DIFFERENT).count() as u64;
    DiffResult {
        backend,
        stats: DiffStats {
            width: ref_size.width,
            height: ref_size.height,
            differing_pixels,
        },
        image: Arc::new(out),
    }
}
