//! Decoded raster assets referenced by image layers.
//!
//! Image layers carry only a `src` key; the pixels live here as premultiplied
//! `tiny_skia` pixmaps. Import decodes and validates bytes up front, so a layer
//! is never created for data that failed to decode or decoded to nothing.

#[cfg(test)]
#[path = "assets_test.rs"]
mod assets_test;

use std::collections::HashMap;

use tiny_skia::Pixmap;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("decoded image is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("failed to allocate {width}x{height} pixmap")]
    Allocation { width: u32, height: u32 },
}

/// Result of a successful import: the asset key and its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedImage {
    pub src: String,
    pub width: u32,
    pub height: u32,
}

/// In-memory store of decoded assets keyed by `src`.
#[derive(Debug, Default)]
pub struct AssetStore {
    assets: HashMap<String, Pixmap>,
}

impl AssetStore {
    #[must_use]
    pub fn new() -> Self {
        Self { assets: HashMap::new() }
    }

    /// Decode arbitrary image bytes and store them under a fresh key.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError`] when the bytes are not a supported image or
    /// decode to zero pixels. The store is unchanged on error.
    pub fn import(&mut self, bytes: &[u8]) -> Result<ImportedImage, AssetError> {
        let pixmap = decode(bytes)?;
        Ok(self.insert(pixmap))
    }

    /// Store an already-decoded pixmap under a fresh key.
    pub fn insert(&mut self, pixmap: Pixmap) -> ImportedImage {
        let src = format!("asset:{}", Uuid::new_v4());
        let imported = ImportedImage { src: src.clone(), width: pixmap.width(), height: pixmap.height() };
        self.assets.insert(src, pixmap);
        imported
    }

    #[must_use]
    pub fn get(&self, src: &str) -> Option<&Pixmap> {
        self.assets.get(src)
    }

    #[must_use]
    pub fn contains(&self, src: &str) -> bool {
        self.assets.contains_key(src)
    }

    pub fn remove(&mut self, src: &str) -> Option<Pixmap> {
        self.assets.remove(src)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Decode image bytes (PNG or JPEG) into a premultiplied pixmap.
///
/// # Errors
///
/// See [`AssetStore::import`].
pub fn decode(bytes: &[u8]) -> Result<Pixmap, AssetError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    pixmap_from_rgba(width, height, rgba.into_raw())
}

/// Build a premultiplied pixmap from straight RGBA8 data.
///
/// # Errors
///
/// Returns [`AssetError::Empty`] for zero dimensions or a buffer of the wrong
/// length, and [`AssetError::Allocation`] if the pixmap cannot be created.
pub fn pixmap_from_rgba(width: u32, height: u32, mut rgba: Vec<u8>) -> Result<Pixmap, AssetError> {
    let expected = u64::from(width) * u64::from(height) * 4;
    if width == 0 || height == 0 || rgba.len() as u64 != expected {
        return Err(AssetError::Empty { width, height });
    }
    premultiply_in_place(&mut rgba);
    let mut pixmap = Pixmap::new(width, height).ok_or(AssetError::Allocation { width, height })?;
    pixmap.data_mut().copy_from_slice(&rgba);
    Ok(pixmap)
}

#[allow(clippy::cast_possible_truncation)]
fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}
