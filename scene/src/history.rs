//! Version history — append-only thumbnails of the rendered composite.
//!
//! DESIGN
//! ======
//! A snapshot captures the *rendered surface*, not the layer list, so history
//! is for visual review only. There is no restore: rebuilding a document from
//! an entry would need the full layer state, which is never recorded here.
//! Entries are independent of later edits; deleting a layer never alters a
//! thumbnail that was already taken.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::time::{SystemTime, UNIX_EPOCH};

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, RgbaImage};
use tiny_skia::Pixmap;
use uuid::Uuid;

use crate::consts::{THUMBNAIL_MAX_SIDE, THUMBNAIL_QUALITY};
use crate::export::{self, ExportError};

/// One captured version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEntry {
    pub id: Uuid,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    /// JPEG-encoded thumbnail.
    pub thumbnail: Vec<u8>,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// Sequential label, `"Version N"`.
    pub description: String,
}

/// Newest-first list of captured versions.
#[derive(Debug, Default)]
pub struct VersionStore {
    entries: Vec<VersionEntry>,
    taken: u64,
}

impl VersionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a thumbnail of `surface` and prepend it to the history.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if the thumbnail cannot be encoded; the history
    /// is unchanged in that case.
    pub fn snapshot(&mut self, surface: &Pixmap) -> Result<&VersionEntry, ExportError> {
        let full = export::to_rgba_image(surface)?;
        let (tw, th) = thumbnail_size(surface.width(), surface.height());
        let small = imageops::resize(&full, tw, th, FilterType::Triangle);
        let thumbnail = export::encode_jpeg(&flatten(&small), THUMBNAIL_QUALITY)?;

        self.taken += 1;
        self.entries.insert(
            0,
            VersionEntry {
                id: Uuid::new_v4(),
                ts: now_ms(),
                thumbnail,
                thumbnail_width: tw,
                thumbnail_height: th,
                description: format!("Version {}", self.taken),
            },
        );
        Ok(&self.entries[0])
    }

    /// All entries, newest first.
    #[must_use]
    pub fn list(&self) -> &[VersionEntry] {
        &self.entries
    }

    #[must_use]
    pub fn latest(&self) -> Option<&VersionEntry> {
        self.entries.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scale so the longest side is at most [`THUMBNAIL_MAX_SIDE`]; never upscale.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn thumbnail_size(width: u32, height: u32) -> (u32, u32) {
    let longest = width.max(height).max(1);
    if longest <= THUMBNAIL_MAX_SIDE {
        return (width.max(1), height.max(1));
    }
    let scale = f64::from(THUMBNAIL_MAX_SIDE) / f64::from(longest);
    let w = (f64::from(width) * scale).round() as u32;
    let h = (f64::from(height) * scale).round() as u32;
    (w.max(1), h.max(1))
}

/// Straight-alpha RGBA over opaque white.
#[allow(clippy::cast_possible_truncation)]
fn flatten(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let a = u16::from(a);
        let over = |c: u8| ((u16::from(c) * a + 255 * (255 - a) + 127) / 255) as u8;
        Rgb([over(r), over(g), over(b)])
    })
}

fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}
