//! Brand kit: reusable colors, font names, and logo assets.
//!
//! The kit is a side-table the session reads from when placing new layers.
//! Nothing in the engine writes to it.

#[cfg(test)]
#[path = "brand_test.rs"]
mod brand_test;

use crate::doc::Color;

/// A named raster asset (logo, watermark, ...) kept as encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandAsset {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandKit {
    pub colors: Vec<Color>,
    pub fonts: Vec<String>,
    pub logos: Vec<BrandAsset>,
}

impl BrandKit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.colors.push(color);
        self
    }

    #[must_use]
    pub fn with_font(mut self, family: impl Into<String>) -> Self {
        self.fonts.push(family.into());
        self
    }

    #[must_use]
    pub fn with_logo(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.logos.push(BrandAsset { name: name.into(), bytes });
        self
    }

    /// First brand color; used as the fill of new shapes.
    #[must_use]
    pub fn primary_color(&self) -> Option<Color> {
        self.colors.first().copied()
    }

    /// Second brand color, else the first; used for new text.
    #[must_use]
    pub fn accent_color(&self) -> Option<Color> {
        self.colors.get(1).or_else(|| self.colors.first()).copied()
    }

    #[must_use]
    pub fn primary_font(&self) -> Option<&str> {
        self.fonts.first().map(String::as_str)
    }

    /// Look up a logo by exact name.
    #[must_use]
    pub fn logo(&self, name: &str) -> Option<&BrandAsset> {
        self.logos.iter().find(|l| l.name == name)
    }
}
