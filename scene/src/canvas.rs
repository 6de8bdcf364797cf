//! Document size and the named preset catalog.

#[cfg(test)]
#[path = "canvas_test.rs"]
mod canvas_test;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanvasError {
    #[error("invalid canvas size {width}x{height}: both sides must be positive")]
    InvalidSize { width: u32, height: u32 },
    #[error("unknown canvas preset: {0}")]
    UnknownPreset(String),
}

/// Document dimensions in pixels. Both sides are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasSize {
    width: u32,
    height: u32,
}

impl CanvasSize {
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidSize`] when either side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidSize { width, height });
        }
        Ok(Self { width, height })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width as a document-space coordinate.
    #[must_use]
    pub fn width_f(&self) -> f64 {
        f64::from(self.width)
    }

    /// Height as a document-space coordinate.
    #[must_use]
    pub fn height_f(&self) -> f64 {
        f64::from(self.height)
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self { width: 1080, height: 1080 }
    }
}

/// A named entry in the preset catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasPreset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl CanvasPreset {
    #[must_use]
    pub fn size(&self) -> CanvasSize {
        CanvasSize { width: self.width, height: self.height }
    }
}

/// Fixed catalog of document sizes.
pub const PRESETS: &[CanvasPreset] = &[
    CanvasPreset { name: "Instagram Post", width: 1080, height: 1080 },
    CanvasPreset { name: "Instagram Story", width: 1080, height: 1920 },
    CanvasPreset { name: "Facebook Post", width: 1200, height: 630 },
    CanvasPreset { name: "Twitter Post", width: 1600, height: 900 },
    CanvasPreset { name: "LinkedIn Post", width: 1200, height: 627 },
    CanvasPreset { name: "YouTube Thumbnail", width: 1280, height: 720 },
    CanvasPreset { name: "Web Banner", width: 1920, height: 600 },
    CanvasPreset { name: "Presentation", width: 1920, height: 1080 },
    CanvasPreset { name: "A4 Print", width: 2480, height: 3508 },
];

/// Look up a preset by name, ignoring ASCII case.
///
/// # Errors
///
/// Returns [`CanvasError::UnknownPreset`] when no entry matches.
pub fn preset(name: &str) -> Result<&'static CanvasPreset, CanvasError> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| CanvasError::UnknownPreset(name.to_owned()))
}
