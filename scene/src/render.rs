//! Rendering: composites the layer stack onto a raster surface.
//!
//! This module is the only place that paints pixels. It receives read-only
//! views of the layer store, assets and fonts and produces a fresh
//! `tiny_skia::Pixmap`; it does not mutate any document state.
//!
//! Every call is a full redraw: clear to the background, walk the store
//! back-to-front (so topmost layers occlude), then overlay the selection
//! outline. There is no dirty-region tracking.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use tiny_skia::{
    FillRule, FilterQuality, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, StrokeDash, Transform,
};
use tracing::warn;

use crate::assets::AssetStore;
use crate::canvas::CanvasSize;
use crate::consts::{SELECTION_DASH_PX, SELECTION_STROKE_PX};
use crate::doc::{Color, ImagePayload, Layer, LayerId, LayerStore, Payload, ShapeKind, ShapePayload, TextPayload};
use crate::fonts::{self, FontBook};
use crate::geom::{Bounds, clamp_opacity, layer_transform};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to allocate {width}x{height} surface")]
    Allocation { width: u32, height: u32 },
}

/// Read-only view of everything a render pass needs.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub layers: &'a LayerStore,
    pub canvas: CanvasSize,
    pub selection: Option<LayerId>,
    pub assets: &'a AssetStore,
    pub fonts: &'a FontBook,
}

/// Presentation settings that are not part of the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub background: Color,
    pub selection_color: Color,
    pub selection_width: f32,
    pub selection_dash: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            selection_color: Color::rgb(0x1E, 0x90, 0xFF),
            selection_width: SELECTION_STROKE_PX,
            selection_dash: SELECTION_DASH_PX,
        }
    }
}

/// Draw the full scene: visible layers bottom-first, then the selection.
///
/// # Errors
///
/// Returns [`RenderError::Allocation`] if the surface cannot be created.
pub fn render(input: &RenderInput<'_>, options: &RenderOptions) -> Result<Pixmap, RenderError> {
    let (width, height) = (input.canvas.width(), input.canvas.height());
    let mut surface = Pixmap::new(width, height).ok_or(RenderError::Allocation { width, height })?;
    surface.fill(options.background.to_skia());

    // Stored order is topmost-first; paint in reverse so the top occludes.
    for layer in input.layers.iter().rev() {
        if layer.visible {
            draw_layer(&mut surface, layer, input);
        }
    }

    if let Some(layer) = input.selection.and_then(|id| input.layers.get(&id)) {
        draw_selection(&mut surface, layer.bounds(), options);
    }

    Ok(surface)
}

// =============================================================
// Layer dispatch
// =============================================================

#[allow(clippy::cast_possible_truncation)]
fn draw_layer(surface: &mut Pixmap, layer: &Layer, input: &RenderInput<'_>) {
    let opacity = clamp_opacity(layer.opacity) as f32;
    if opacity <= 0.0 {
        return;
    }
    let transform = layer_transform(layer.bounds(), layer.rotation);

    match &layer.payload {
        Payload::Image(image) => draw_image(surface, layer, image, input.assets, transform, opacity),
        Payload::Text(text) => draw_text(surface, layer, text, input.fonts, transform, opacity),
        Payload::Shape(shape) => draw_shape(surface, layer, shape, transform, opacity),
    }
}

// =============================================================
// Shapes
// =============================================================

#[allow(clippy::cast_possible_truncation)]
fn draw_shape(surface: &mut Pixmap, layer: &Layer, shape: &ShapePayload, transform: Transform, opacity: f32) {
    let (w, h) = (layer.width as f32, layer.height as f32);

    if shape.shape == ShapeKind::Line {
        // Single horizontal stroke at vertical center; fill is ignored.
        if w <= 0.0 {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(0.0, h / 2.0);
        pb.line_to(w, h / 2.0);
        let Some(path) = pb.finish() else {
            return;
        };
        let width = if shape.stroke_width > 0.0 { shape.stroke_width as f32 } else { 1.0 };
        stroke_path(surface, &path, shape.stroke, width, transform, opacity);
        return;
    }

    if layer.bounds().is_empty() {
        return;
    }
    let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) else {
        return;
    };
    let path = match shape.shape {
        ShapeKind::Circle => match PathBuilder::from_oval(rect) {
            Some(path) => path,
            None => return,
        },
        _ => PathBuilder::from_rect(rect),
    };

    surface.fill_path(&path, &paint(shape.fill, opacity), FillRule::Winding, transform, None);
    if shape.stroke_width > 0.0 {
        stroke_path(surface, &path, shape.stroke, shape.stroke_width as f32, transform, opacity);
    }
}

// =============================================================
// Images
// =============================================================

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn draw_image(
    surface: &mut Pixmap,
    layer: &Layer,
    image: &ImagePayload,
    assets: &AssetStore,
    transform: Transform,
    opacity: f32,
) {
    if layer.bounds().is_empty() {
        return;
    }
    let Some(src) = assets.get(&image.src) else {
        warn!(layer_id = %layer.id, src = %image.src, "image asset missing; layer skipped");
        return;
    };
    let sx = layer.width as f32 / src.width() as f32;
    let sy = layer.height as f32 / src.height() as f32;
    surface.draw_pixmap(0, 0, src.as_ref(), &pixmap_paint(opacity), transform.pre_scale(sx, sy), None);
}

// =============================================================
// Text
// =============================================================

fn draw_text(
    surface: &mut Pixmap,
    layer: &Layer,
    text: &TextPayload,
    fonts: &FontBook,
    transform: Transform,
    opacity: f32,
) {
    let Some(font) = fonts.resolve(&text.font_family, text.weight, text.style) else {
        warn!(layer_id = %layer.id, family = %text.font_family, "no font registered; text layer skipped");
        return;
    };
    let Some(block) = fonts::rasterize_text(font, text, layer.width, layer.height) else {
        return;
    };
    surface.draw_pixmap(0, 0, block.as_ref(), &pixmap_paint(opacity), transform, None);
}

// =============================================================
// Selection UI
// =============================================================

/// Dashed outline around the axis-aligned bounds. Rotation is ignored, to
/// match what the hit-tester considers the layer's footprint.
#[allow(clippy::cast_possible_truncation)]
fn draw_selection(surface: &mut Pixmap, bounds: Bounds, options: &RenderOptions) {
    let Some(rect) = Rect::from_xywh(bounds.x as f32, bounds.y as f32, bounds.width as f32, bounds.height as f32)
    else {
        return;
    };
    let path = PathBuilder::from_rect(rect);
    let mut stroke = Stroke { width: options.selection_width, ..Stroke::default() };
    stroke.dash = StrokeDash::new(vec![options.selection_dash, options.selection_dash], 0.0);
    surface.stroke_path(&path, &paint(options.selection_color, 1.0), &stroke, Transform::identity(), None);
}

// =============================================================
// Helpers
// =============================================================

fn paint(color: Color, opacity: f32) -> Paint<'static> {
    let mut c = color.to_skia();
    c.apply_opacity(opacity);
    let mut paint = Paint::default();
    paint.set_color(c);
    paint.anti_alias = true;
    paint
}

fn pixmap_paint(opacity: f32) -> PixmapPaint {
    PixmapPaint { opacity, quality: FilterQuality::Bilinear, ..PixmapPaint::default() }
}

fn stroke_path(surface: &mut Pixmap, path: &Path, color: Color, width: f32, transform: Transform, opacity: f32) {
    let stroke = Stroke { width, ..Stroke::default() };
    surface.stroke_path(path, &paint(color, opacity), &stroke, transform, None);
}
