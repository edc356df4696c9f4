//! Raster helpers shared by the backend renderers and the diff engine.

use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;

use crate::error::RenderError;

/// Width and height of a raster in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

impl RasterSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    pub fn of(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// A size with no pixels in it.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for RasterSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Largest RGBA raster the pipeline will allocate, in bytes (256 MiB).
pub const MAX_RASTER_BYTES: u64 = 256 * 1024 * 1024;

/// Refuse sizes whose RGBA buffer would exceed [`MAX_RASTER_BYTES`].
pub fn ensure_allocatable(size: RasterSize) -> Result<(), RenderError> {
    let bytes = size.width as u64 * size.height as u64 * 4;
    if bytes > MAX_RASTER_BYTES {
        return Err(RenderError::TooLarge {
            size,
            limit: MAX_RASTER_BYTES,
        });
    }
    Ok(())
}

/// Decode an image file into RGBA8.
pub fn load_rgba(path: &Path) -> Result<DynamicImage, RenderError> {
    image::open(path).map_err(|source| RenderError::InvalidImage {
        path: path.to_path_buf(),
        source,
    })
}

/// Largest size with `size`'s aspect ratio that fits inside `bounds`.
///
/// Integer arithmetic throughout, so a raster that already fits exactly is
/// reported at its own size.
pub fn fit_within(size: RasterSize, bounds: RasterSize) -> RasterSize {
    if size.is_empty() {
        return bounds;
    }
    let (w, h) = (size.width as u64, size.height as u64);
    let (bw, bh) = (bounds.width as u64, bounds.height as u64);

    let scaled_w = bh * w / h;
    if scaled_w <= bw {
        RasterSize::new(scaled_w as u32, bounds.height)
    } else {
        RasterSize::new(bounds.width, (bw * h / w) as u32)
    }
}

/// Scale `image` to fit inside a `size`×`size` square, preserving aspect ratio.
///
/// Images that already fit exactly are returned untouched.
pub fn scale_to_square(image: DynamicImage, size: u32) -> DynamicImage {
    let native = RasterSize::new(image.width(), image.height());
    let target = RasterSize::square(size);
    if native == target {
        return image;
    }
    let fitted = fit_within(native, target);
    if fitted == native {
        return image;
    }
    image.resize_exact(fitted.width, fitted.height, FilterType::Lanczos3)
}

/// Copy a `width`×`height` rectangle whose top-left corner is at (`x`, `y`).
///
/// The rectangle may extend past the source; pixels with no source
/// counterpart are fully transparent.
pub fn copy_rect(image: &RgbaImage, x: i64, y: i64, width: u32, height: u32) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    for dy in 0..height {
        let sy = y + dy as i64;
        if sy < 0 || sy >= image.height() as i64 {
            continue;
        }
        for dx in 0..width {
            let sx = x + dx as i64;
            if sx < 0 || sx >= image.width() as i64 {
                continue;
            }
            out.put_pixel(dx, dy, *image.get_pixel(sx as u32, sy as u32));
        }
    }
    out
}

/// Crop a square rasterizer output vertically around its centre.
///
/// External rasterizers always produce a full view-size square; documents
/// with a different aspect ratio are cut down to `target`, keeping the left
/// edge fixed.
pub fn center_crop_vertical(image: &RgbaImage, target: RasterSize) -> RgbaImage {
    let offset = (image.height() as i64 - target.height as i64) / 2;
    copy_rect(image, 0, offset, target.width, target.height)
}

/// Composite `image` over an opaque `background`.
///
/// The result has alpha 255 everywhere, so transparency alone can never
/// register as a difference.
pub fn flatten(image: &RgbaImage, background: [u8; 3]) -> RgbaImage {
    let mut out = RgbaImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        let [r, g, b, a] = src.0;
        let a = a as u32;
        let blend = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        *dst = Rgba([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
            255,
        ]);
    }
    out
}
