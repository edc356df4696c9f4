//! Nominal document size from the root element's `width`, `height` and
//! `viewBox` attributes.
//!
//! Only the root element is read; the rest of the document is never parsed.
//! No unit handling: `100px` or `50%` count as unparseable.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::raster::RasterSize;

/// Size a document declares for itself, in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NominalSize {
    pub width: f64,
    pub height: f64,
}

/// Read the nominal size of the document at `path`.
///
/// Returns `None` if the file cannot be opened, has no root element, the root
/// is not `<svg>`, or its attributes do not yield a size.
pub fn estimate(path: &Path) -> Option<NominalSize> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::debug!("Cannot open {:?} for size estimation: {}", path, e);
            return None;
        }
    };
    read_root(&mut Reader::from_reader(BufReader::new(file)))
}

/// Same as [`estimate`] for an in-memory document.
pub fn estimate_str(text: &str) -> Option<NominalSize> {
    read_root(&mut Reader::from_str(text))
}

fn read_root<R: BufRead>(reader: &mut Reader<R>) -> Option<NominalSize> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return size_from_root(&e),
            Ok(Event::End(_)) | Ok(Event::Eof) => return None,
            Ok(_) => {}
            Err(e) => {
                log::debug!("Malformed document prologue: {}", e);
                return None;
            }
        }
        buf.clear();
    }
}

fn size_from_root(root: &BytesStart<'_>) -> Option<NominalSize> {
    if root.local_name().as_ref() != b"svg" {
        return None;
    }

    let mut view_box = None;
    let mut width = None;
    let mut height = None;
    for attr in root.attributes().flatten() {
        let slot = match attr.key.local_name().as_ref() {
            b"viewBox" => &mut view_box,
            b"width" => &mut width,
            b"height" => &mut height,
            _ => continue,
        };
        *slot = attr.unescape_value().ok().map(|v| v.into_owned());
    }

    let view_box = parse_view_box(view_box.as_deref().unwrap_or(""))?;
    let width = match width.as_deref() {
        Some(w) if !w.is_empty() => parse_number(w)?,
        _ => view_box[2],
    };
    let height = match height.as_deref() {
        Some(h) if !h.is_empty() => parse_number(h)?,
        _ => view_box[3],
    };

    Some(NominalSize { width, height })
}

/// Split on single spaces into exactly four numbers.
fn parse_view_box(text: &str) -> Option<[f64; 4]> {
    let parts: Vec<&str> = text.split(' ').collect();
    if parts.len() != 4 {
        return None;
    }
    let mut values = [0.0; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = parse_number(part)?;
    }
    Some(values)
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Raster size a document should be rendered at for a square view of
/// `view_size` pixels.
///
/// The nominal size is truncated to whole pixels; an unknown or degenerate
/// size falls back to the full square. The result is scaled so its width
/// equals `view_size`.
pub fn target_size(nominal: Option<NominalSize>, view_size: u32) -> RasterSize {
    let (w, h) = nominal
        .map(|n| (n.width as i64, n.height as i64))
        .filter(|(w, h)| *w > 0 && *h > 0)
        .unwrap_or((view_size as i64, view_size as i64));

    let factor = view_size as f64 / w as f64;
    RasterSize::new(
        (w as f64 * factor).round() as u32,
        (h as f64 * factor).round() as u32,
    )
}
