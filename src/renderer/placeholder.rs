//! Error-bearing stand-in raster for a failed backend.
//!
//! The message is laid out as a small SVG (word-wrapped `<tspan>` lines at the
//! top-left) and rasterized with resvg, so the operator sees the failure in
//! the same slot the render would have occupied.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia;
use resvg::usvg;
use std::sync::Arc;

const BACKGROUND: [u8; 4] = [0xF4, 0xF4, 0xF4, 0xFF];
const FRAME: [u8; 4] = [0xC0, 0x30, 0x30, 0xFF];
const FONT_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = 15.0;
const MARGIN: f32 = 4.0;
/// Average advance of a sans-serif glyph relative to the font size.
const AVERAGE_ADVANCE: f32 = 0.55;

/// Lazily-loaded system font database for placeholder text.
///
/// Loading system fonts is slow, so it happens once per process.
static FONTDB: std::sync::LazyLock<Arc<usvg::fontdb::Database>> =
    std::sync::LazyLock::new(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("Loaded {} font faces for placeholder text", db.len());
        Arc::new(db)
    });

/// A `size`×`size` light canvas with `message` written on it.
///
/// A thin frame is always drawn, so the result is never a uniform canvas even
/// when no fonts are available.
pub fn render(message: &str, size: u32) -> RgbaImage {
    let size = size.max(1);
    match rasterize(&build_svg(message, size), size) {
        Some(image) => image,
        None => {
            log::warn!("Placeholder text rasterization failed; drawing frame only");
            framed_canvas(size)
        }
    }
}

fn rasterize(svg: &str, size: u32) -> Option<RgbaImage> {
    let opts = usvg::Options {
        fontdb: FONTDB.clone(),
        ..Default::default()
    };
    let tree = match usvg::Tree::from_str(svg, &opts) {
        Ok(t) => t,
        Err(e) => {
            log::debug!("Placeholder SVG parse failed: {e}");
            return None;
        }
    };

    let mut pixmap = tiny_skia::Pixmap::new(size, size)?;
    let [r, g, b, a] = BACKGROUND;
    pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // The background is opaque, so premultiplied and straight alpha agree.
    RgbaImage::from_raw(size, size, pixmap.take())
}

fn build_svg(message: &str, size: u32) -> String {
    let usable_width = size as f32 - 2.0 * MARGIN;
    let max_chars = ((usable_width / (FONT_SIZE * AVERAGE_ADVANCE)) as usize).max(1);
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\" \
         viewBox=\"0 0 {size} {size}\">\
         <rect x=\"0.5\" y=\"0.5\" width=\"{inner}\" height=\"{inner}\" fill=\"none\" \
         stroke=\"{frame}\" stroke-width=\"1\"/>\
         <text font-family=\"sans-serif\" font-size=\"{FONT_SIZE}\" fill=\"#202020\">",
        inner = size as f32 - 1.0,
        frame = hex(FRAME),
    );
    for (i, line) in wrap(message, max_chars).iter().enumerate() {
        let y = MARGIN + FONT_SIZE + i as f32 * LINE_HEIGHT;
        if y > size as f32 {
            break;
        }
        svg.push_str(&format!(
            "<tspan x=\"{MARGIN}\" y=\"{y}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    svg.push_str("</text></svg>");
    svg
}

/// Greedy word wrap; words longer than a line are split.
pub(crate) fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..max_chars).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

fn hex(c: [u8; 4]) -> String {
    format!("#{:02X}{:02X}{:02X}", c[0], c[1], c[2])
}

fn framed_canvas(size: u32) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(size, size, Rgba(BACKGROUND));
    let last = size - 1;
    for i in 0..size {
        for (x, y) in [(i, 0), (i, last), (0, i), (last, i)] {
            image.put_pixel(x, y, Rgba(FRAME));
        }
    }
    image
}
