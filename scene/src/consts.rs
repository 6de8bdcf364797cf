//! Shared numeric constants for the scene crate.

// ── Layer store ─────────────────────────────────────────────────

/// Offset applied to both axes when a layer is duplicated.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Suffix appended to the name of a duplicated layer.
pub const COPY_SUFFIX: &str = " copy";

// ── Tool placement ──────────────────────────────────────────────

/// Default shape edge as a fraction of the smaller canvas side.
pub const SHAPE_FRACTION: f64 = 0.4;

/// Default bounding-box height of a newly placed line.
pub const LINE_BOX_HEIGHT: f64 = 10.0;

/// Default text box width as a fraction of the canvas width.
pub const TEXT_WIDTH_FRACTION: f64 = 0.8;

/// Default font size for new text layers, in pixels.
pub const DEFAULT_FONT_SIZE: f64 = 48.0;

/// Line height as a multiple of font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

// ── Selection UI ────────────────────────────────────────────────

/// Selection outline dash segment length in pixels.
pub const SELECTION_DASH_PX: f32 = 6.0;

/// Selection outline stroke width in pixels.
pub const SELECTION_STROKE_PX: f32 = 2.0;

// ── History / export ────────────────────────────────────────────

/// Longest side of a version thumbnail, in pixels.
pub const THUMBNAIL_MAX_SIDE: u32 = 240;

/// JPEG quality used for version thumbnails.
pub const THUMBNAIL_QUALITY: u8 = 70;

/// Default quality for lossy export.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

// ── Text ────────────────────────────────────────────────────────

/// Largest font size rasterized; larger requests render at this size.
pub const MAX_FONT_SIZE: f64 = 1024.0;
