//! Registered font faces and text rasterization for text layers.
//!
//! Fonts are supplied by the host as raw bytes (TTF/OTF) and parsed with
//! `fontdue`. Lookup falls back from an exact (family, weight, style) match to
//! any face of the family, then to the first registered face, so a document
//! referencing an unknown family still renders readable text.

#[cfg(test)]
#[path = "fonts_test.rs"]
mod fonts_test;

use fontdue::{Font, FontSettings};
use tiny_skia::{Pixmap, PremultipliedColorU8};

use crate::consts::{LINE_HEIGHT_FACTOR, MAX_FONT_SIZE};
use crate::doc::{Color, FontStyle, FontWeight, TextAlign, TextPayload};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FontError {
    #[error("font parse failed for {family}: {reason}")]
    Parse { family: String, reason: String },
}

struct Face {
    family: String,
    weight: FontWeight,
    style: FontStyle,
    font: Font,
}

/// Collection of parsed font faces.
#[derive(Default)]
pub struct FontBook {
    faces: Vec<Face>,
}

impl FontBook {
    #[must_use]
    pub fn new() -> Self {
        Self { faces: Vec::new() }
    }

    /// Parse and register a face. A later registration of the same
    /// (family, weight, style) replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`FontError::Parse`] when the bytes are not a usable font.
    pub fn register(
        &mut self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        bytes: &[u8],
    ) -> Result<(), FontError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|reason| FontError::Parse { family: family.to_owned(), reason: reason.to_owned() })?;
        self.faces
            .retain(|f| !(f.family.eq_ignore_ascii_case(family) && f.weight == weight && f.style == style));
        self.faces.push(Face { family: family.to_owned(), weight, style, font });
        Ok(())
    }

    /// Resolve the best available face for a request.
    #[must_use]
    pub fn resolve(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<&Font> {
        let same_family = |f: &&Face| f.family.eq_ignore_ascii_case(family);
        self.faces
            .iter()
            .filter(same_family)
            .find(|f| f.weight == weight && f.style == style)
            .or_else(|| self.faces.iter().find(same_family))
            .or_else(|| self.faces.first())
            .map(|f| &f.font)
    }

    /// Registered family names in registration order, without duplicates.
    #[must_use]
    pub fn families(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for face in &self.faces {
            if !out.iter().any(|f| f.eq_ignore_ascii_case(&face.family)) {
                out.push(&face.family);
            }
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook").field("faces", &self.faces.len()).finish()
    }
}

// =============================================================
// Layout
// =============================================================

/// Split text into display lines on `\n` (a trailing `\r` is dropped).
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect()
}

/// Horizontal start of a line of width `line_w` inside a block of `block_w`.
#[must_use]
pub fn align_offset(align: TextAlign, block_w: f32, line_w: f32) -> f32 {
    match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => (block_w - line_w) / 2.0,
        TextAlign::Right => block_w - line_w,
    }
}

/// Advance width of a single line at `px`.
#[must_use]
pub fn measure(font: &Font, line: &str, px: f32) -> f32 {
    line.chars().map(|ch| font.metrics(ch, px).advance_width).sum()
}

/// Rasterize a text payload into a pixmap anchored at the top-left of the
/// layer frame.
///
/// The block is `box_width` wide (or as wide as the longest line when the box
/// has no width) and one line height per line tall, cut off at `box_height`
/// when the box has a height. Font sizes above [`MAX_FONT_SIZE`] are clamped.
/// Returns `None` for an unusable font size or empty text.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn rasterize_text(font: &Font, payload: &TextPayload, box_width: f64, box_height: f64) -> Option<Pixmap> {
    if !(payload.font_size.is_finite() && payload.font_size > 0.0) || payload.text.is_empty() {
        return None;
    }
    let px = payload.font_size.min(MAX_FONT_SIZE) as f32;
    let line_height = px * LINE_HEIGHT_FACTOR as f32;
    let ascent = font
        .horizontal_line_metrics(px)
        .map_or(px * 0.8, |m| m.ascent);

    let lines = split_lines(&payload.text);
    let widths: Vec<f32> = lines.iter().map(|l| measure(font, l, px)).collect();
    let block_w = if box_width > 0.0 {
        box_width as f32
    } else {
        widths.iter().copied().fold(0.0, f32::max)
    };
    let width = (block_w.ceil() as u32).max(1);
    let mut block_h = line_height * lines.len() as f32;
    if box_height > 0.0 {
        block_h = block_h.min(box_height as f32);
    }
    let height = (block_h.ceil() as u32).max(1);
    let mut pixmap = Pixmap::new(width, height)?;

    for (i, (line, line_w)) in lines.iter().zip(&widths).enumerate() {
        let top = line_height * i as f32;
        if top >= height as f32 {
            break;
        }
        let baseline = top + ascent;
        let mut pen = align_offset(payload.align, width as f32, *line_w);
        for ch in line.chars() {
            let (metrics, coverage) = font.rasterize(ch, px);
            let gx = (pen + metrics.xmin as f32).round() as i32;
            let gy = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;
            blit_coverage(&mut pixmap, gx, gy, metrics.width, &coverage, payload.color);
            pen += metrics.advance_width;
        }
    }
    Some(pixmap)
}

/// Source-over blend a glyph coverage mask tinted with `color`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn blit_coverage(pixmap: &mut Pixmap, gx: i32, gy: i32, glyph_w: usize, coverage: &[u8], color: Color) {
    if glyph_w == 0 {
        return;
    }
    let (pw, ph) = (pixmap.width() as i32, pixmap.height() as i32);
    let pixels = pixmap.pixels_mut();
    for (row, line) in coverage.chunks_exact(glyph_w).enumerate() {
        let y = gy + row as i32;
        if y < 0 || y >= ph {
            continue;
        }
        for (col, &c) in line.iter().enumerate() {
            let x = gx + col as i32;
            if c == 0 || x < 0 || x >= pw {
                continue;
            }
            let sa = f32::from(c) / 255.0 * f32::from(color.a) / 255.0;
            let idx = (y * pw + x) as usize;
            let dst = pixels[idx];
            let keep = 1.0 - sa;
            let blend = |s: u8, d: u8| (f32::from(s) * sa + f32::from(d) * keep).round().min(255.0) as u8;
            let a = (sa * 255.0 + f32::from(dst.alpha()) * keep).round().min(255.0) as u8;
            let r = blend(color.r, dst.red()).min(a);
            let g = blend(color.g, dst.green()).min(a);
            let b = blend(color.b, dst.blue()).min(a);
            if let Some(out) = PremultipliedColorU8::from_rgba(r, g, b, a) {
                pixels[idx] = out;
            }
        }
    }
}
