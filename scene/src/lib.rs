//! Layered scene-composition engine for the design studio.
//!
//! A document is an ordered stack of transformable layers (images, text,
//! shapes, AI-generated imagery). This crate owns the full lifecycle of that
//! stack: mutating it, rendering it deterministically to a raster surface,
//! hit-testing pointer input against it, capturing thumbnail history, and
//! exporting the composite. Image generation is consumed through the
//! [`generate::ImageGenerator`] trait and reconciled back into the document
//! by request token.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Document session: the single entry point for mutations |
//! | [`doc`] | Layer types, payload variants, and the ordered [`doc::LayerStore`] |
//! | [`geom`] | Points, bounds, rotation/opacity normalization, layer transforms |
//! | [`canvas`] | Document size and the named preset catalog |
//! | [`render`] | Back-to-front render pipeline onto a `tiny_skia::Pixmap` |
//! | [`hit`] | Top-most visible, unlocked layer under a point |
//! | [`assets`] | Decoded raster assets keyed by `src` |
//! | [`fonts`] | Registered font faces and text line layout |
//! | [`brand`] | Brand kit side-table (colors, fonts, logos) |
//! | [`history`] | Append-only thumbnail snapshots |
//! | [`export`] | PNG/JPEG encoding of the composite |
//! | [`generate`] | Generation bridge and HTTP image-generation clients |
//! | [`consts`] | Shared numeric constants |

pub mod assets;
pub mod brand;
pub mod canvas;
pub mod consts;
pub mod doc;
pub mod export;
pub mod fonts;
pub mod generate;
pub mod geom;
pub mod hit;
pub mod history;
pub mod render;
pub mod session;
