//! Ground-truth backend: the PNG stored next to each document.

use image::RgbaImage;
use std::path::{Path, PathBuf};

use super::RenderRequest;
use crate::error::RenderError;
use crate::raster;

/// `<dir>/<stem>.png` for a document at `<dir>/<stem>.svg`.
pub(super) fn reference_path(document: &Path) -> PathBuf {
    document.with_extension("png")
}

pub(super) fn render(request: &RenderRequest) -> Result<RgbaImage, RenderError> {
    let path = reference_path(&request.document);
    assert!(
        path.exists(),
        "reference image {} is missing; the test suite is incomplete",
        path.display()
    );

    let image = raster::load_rgba(&path)?;
    Ok(raster::scale_to_square(image, request.view_size).to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_sits_beside_document() {
        assert_eq!(
            reference_path(Path::new("/suite/shapes/rect-01.svg")),
            PathBuf::from("/suite/shapes/rect-01.png")
        );
    }
}
