//! Export: encodes the rendered composite as PNG or JPEG.
//!
//! Exports always cover the full surface at its native pixel size. PNG keeps
//! alpha; JPEG has none, so the composite is flattened over white first.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage, RgbaImage};
use tiny_skia::Pixmap;

use crate::consts::DEFAULT_JPEG_QUALITY;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("image encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("surface buffer does not match {width}x{height}")]
    Buffer { width: u32, height: u32 },
    #[error("unknown export format: {0}")]
    UnknownFormat(String),
}

/// Output encoding. `quality` is 1..=100 and is clamped on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg { quality: u8 },
}

impl ExportFormat {
    /// Lossy export at the default quality.
    #[must_use]
    pub fn jpeg() -> Self {
        Self::Jpeg { quality: DEFAULT_JPEG_QUALITY }
    }

    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }

    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::jpeg()),
            other => Err(ExportError::UnknownFormat(other.to_owned())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("png"),
            Self::Jpeg { quality } => write!(f, "jpeg(q={quality})"),
        }
    }
}

/// Encode the full surface in `format`.
///
/// # Errors
///
/// Returns [`ExportError`] if the encoder fails.
pub fn export(surface: &Pixmap, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Png => encode_png(&to_rgba_image(surface)?),
        ExportFormat::Jpeg { quality } => encode_jpeg(&flatten_over_white(surface)?, quality),
    }
}

/// Straight (non-premultiplied) RGBA8 pixels of the surface, row-major.
#[must_use]
pub fn export_rgba(surface: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(surface.data().len());
    for px in surface.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

pub(crate) fn to_rgba_image(surface: &Pixmap) -> Result<RgbaImage, ExportError> {
    let (width, height) = (surface.width(), surface.height());
    RgbaImage::from_raw(width, height, export_rgba(surface)).ok_or(ExportError::Buffer { width, height })
}

pub(crate) fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
    Ok(out)
}

pub(crate) fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    img.write_with_encoder(encoder)?;
    Ok(out)
}

pub(crate) fn flatten_over_white(surface: &Pixmap) -> Result<RgbImage, ExportError> {
    let (width, height) = (surface.width(), surface.height());
    let mut rgb = Vec::with_capacity((width as usize) * (height as usize) * 3);
    for px in surface.pixels() {
        // Premultiplied source over opaque white: c + 255 * (1 - a).
        let under = 255 - px.alpha();
        rgb.extend_from_slice(&[
            px.red().saturating_add(under),
            px.green().saturating_add(under),
            px.blue().saturating_add(under),
        ]);
    }
    RgbImage::from_raw(width, height, rgb).ok_or(ExportError::Buffer { width, height })
}
