//! Session — the document and every operation that mutates it.
//!
//! DESIGN
//! ======
//! A `Session` owns one document: the layer store, canvas size, selection,
//! decoded assets, registered fonts, brand kit and version history. Every
//! mutation goes through a method here and ends with a full re-render, so
//! [`Session::surface`] always reflects the current state.
//!
//! Generation is the only asynchronous path. Requests are dispatched through
//! a [`GenerationBridge`] and reconciled later by [`Session::apply_generations`]
//! or [`Session::next_generation`]; the store is only touched from those
//! calls, never from a background task.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tiny_skia::Pixmap;
use tracing::{debug, error, info, warn};

use crate::assets::{AssetError, AssetStore, ImportedImage};
use crate::brand::BrandKit;
use crate::canvas::{self, CanvasError, CanvasSize};
use crate::consts::{DEFAULT_FONT_SIZE, LINE_BOX_HEIGHT, LINE_HEIGHT_FACTOR, SHAPE_FRACTION, TEXT_WIDTH_FRACTION};
use crate::doc::{
    Color, Direction, FontStyle, FontWeight, ImagePayload, Layer, LayerId, LayerPatch, LayerStore, Payload, ShapeKind,
    ShapePayload, TextAlign, TextPayload,
};
use crate::export::{self, ExportError, ExportFormat};
use crate::fonts::{FontBook, FontError};
use crate::generate::{
    AspectRatio, Completion, GenerationBridge, GenerationError, GenerationRequest, GenerationTarget, ImageGenerator,
    RequestToken,
};
use crate::geom::{Bounds, Point};
use crate::history::{VersionEntry, VersionStore};
use crate::hit;
use crate::render::{self, RenderError, RenderInput, RenderOptions};

/// Fill for new shapes when the brand kit has no colors.
const DEFAULT_SHAPE_FILL: Color = Color::rgb(0x3B, 0x82, 0xF6);

/// Family requested by new text when neither brand nor font book names one.
const FALLBACK_FONT_FAMILY: &str = "sans-serif";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("no image generator configured")]
    NoGenerator,
    #[error("selected layer is not a generated image")]
    NotIterable,
    #[error("unknown brand logo: {0}")]
    UnknownLogo(String),
}

/// How a finished generation request was reconciled with the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A new full-bleed image layer was added and selected.
    Added { token: RequestToken, id: LayerId },
    /// An existing image layer's content was swapped in place.
    Replaced { token: RequestToken, id: LayerId },
    /// The request failed; the document is unchanged.
    Failed { token: RequestToken },
    /// The target layer no longer exists; the result was dropped.
    Discarded { token: RequestToken },
}

pub struct Session {
    layers: LayerStore,
    canvas: CanvasSize,
    selection: Option<LayerId>,
    assets: AssetStore,
    fonts: FontBook,
    brand: BrandKit,
    versions: VersionStore,
    options: RenderOptions,
    surface: Option<Pixmap>,
    generation: Option<GenerationBridge>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CanvasSize::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        let mut session = Self {
            layers: LayerStore::new(),
            canvas,
            selection: None,
            assets: AssetStore::new(),
            fonts: FontBook::new(),
            brand: BrandKit::new(),
            versions: VersionStore::new(),
            options: RenderOptions::default(),
            surface: None,
            generation: None,
        };
        session.refresh();
        session
    }

    /// Attach the image-generation capability.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.set_generator(generator);
        self
    }

    /// Replace the generation capability. In-flight requests are cancelled.
    pub fn set_generator(&mut self, generator: Arc<dyn ImageGenerator>) {
        self.generation = Some(GenerationBridge::new(generator));
    }

    #[must_use]
    pub fn with_brand(mut self, brand: BrandKit) -> Self {
        self.brand = brand;
        self
    }

    pub fn set_brand(&mut self, brand: BrandKit) {
        self.brand = brand;
    }

    #[must_use]
    pub fn brand(&self) -> &BrandKit {
        &self.brand
    }

    /// Register a font face for text layers.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Font`] if the bytes are not a usable font.
    pub fn register_font(
        &mut self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        bytes: &[u8],
    ) -> Result<(), SessionError> {
        self.fonts.register(family, weight, style, bytes)?;
        info!(%family, "font registered");
        self.refresh();
        Ok(())
    }

    pub fn set_render_options(&mut self, options: RenderOptions) {
        self.options = options;
        self.refresh();
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    #[must_use]
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    #[must_use]
    pub fn selection(&self) -> Option<LayerId> {
        self.selection
    }

    #[must_use]
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// The last rendered composite. `None` only if rendering failed.
    #[must_use]
    pub fn surface(&self) -> Option<&Pixmap> {
        self.surface.as_ref()
    }

    /// Captured versions, newest first.
    #[must_use]
    pub fn versions(&self) -> &[VersionEntry] {
        self.versions.list()
    }

    // =========================================================================
    // LAYER OPERATIONS
    // =========================================================================

    /// Insert a prepared layer at the top of the stack.
    pub fn add_layer(&mut self, layer: Layer) -> LayerId {
        let kind = layer.kind();
        let id = self.layers.add(layer);
        info!(%id, ?kind, "layer added");
        self.refresh();
        id
    }

    /// Place a shape with default geometry, centered on the canvas.
    pub fn add_shape(&mut self, shape: ShapeKind) -> LayerId {
        let (cw, ch) = (self.canvas.width_f(), self.canvas.height_f());
        let side = cw.min(ch) * SHAPE_FRACTION;
        let height = if shape == ShapeKind::Line { LINE_BOX_HEIGHT } else { side };
        let fill = self.brand.primary_color().unwrap_or(DEFAULT_SHAPE_FILL);
        let payload = ShapePayload {
            shape,
            fill,
            stroke: Color::BLACK,
            stroke_width: if shape == ShapeKind::Line { 2.0 } else { 0.0 },
        };
        let name = match shape {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Circle => "Circle",
            ShapeKind::Line => "Line",
        };
        self.add_layer(Layer::new(name, Bounds::centered(side, height, cw, ch), Payload::Shape(payload)))
    }

    /// Place a text block with default geometry, centered on the canvas.
    pub fn add_text(&mut self, text: impl Into<String>) -> LayerId {
        let text = text.into();
        let (cw, ch) = (self.canvas.width_f(), self.canvas.height_f());
        let font_family = self
            .brand
            .primary_font()
            .map(str::to_string)
            .or_else(|| self.fonts.families().first().map(|f| (*f).to_string()))
            .unwrap_or_else(|| FALLBACK_FONT_FAMILY.to_string());
        let color = self.brand.accent_color().unwrap_or(Color::BLACK);
        let line_count = text.lines().count().max(1);
        #[allow(clippy::cast_precision_loss)]
        let height = DEFAULT_FONT_SIZE * LINE_HEIGHT_FACTOR * line_count as f64;
        let payload = TextPayload {
            text: text.clone(),
            font_family,
            font_size: DEFAULT_FONT_SIZE,
            weight: FontWeight::Normal,
            style: FontStyle::Normal,
            color,
            align: TextAlign::Center,
        };
        let bounds = Bounds::centered(cw * TEXT_WIDTH_FRACTION, height, cw, ch);
        self.add_layer(Layer::new(text_layer_name(&text), bounds, Payload::Text(payload)))
    }

    /// Decode uploaded image bytes and place them scaled to fit the canvas.
    ///
    /// Decoding completes before the layer is inserted, so the layer never
    /// carries placeholder geometry.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Asset`] if the bytes cannot be decoded; the
    /// document is unchanged.
    pub fn import_image(&mut self, name: impl Into<String>, bytes: &[u8]) -> Result<LayerId, SessionError> {
        let imported = self.assets.import(bytes)?;
        let bounds = fit_within(&imported, self.canvas);
        let payload = ImagePayload {
            src: imported.src,
            original_width: imported.width,
            original_height: imported.height,
            prompt: None,
        };
        Ok(self.add_layer(Layer::new(name, bounds, Payload::Image(payload))))
    }

    /// Import a named logo from the brand kit.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownLogo`] if the kit has no such logo, or
    /// [`SessionError::Asset`] if it does not decode.
    pub fn add_logo(&mut self, name: &str) -> Result<LayerId, SessionError> {
        let bytes = self
            .brand
            .logo(name)
            .map(|logo| logo.bytes.clone())
            .ok_or_else(|| SessionError::UnknownLogo(name.to_string()))?;
        self.import_image(name, &bytes)
    }

    /// Shallow-merge `patch` into a layer. Returns `false` for an unknown id
    /// or a payload of the wrong kind.
    pub fn update(&mut self, id: &LayerId, patch: &LayerPatch) -> bool {
        let applied = self.layers.update(id, patch);
        if applied {
            debug!(%id, "layer updated");
            self.refresh();
        } else {
            debug!(%id, "layer update ignored");
        }
        applied
    }

    /// Remove a layer, clearing the selection if it pointed at it.
    pub fn delete(&mut self, id: &LayerId) -> Option<Layer> {
        let removed = self.layers.delete(id)?;
        if self.selection == Some(*id) {
            self.selection = None;
        }
        if let Payload::Image(image) = &removed.payload {
            self.release_asset(&image.src);
        }
        info!(%id, "layer deleted");
        self.refresh();
        Some(removed)
    }

    pub fn reorder(&mut self, id: &LayerId, direction: Direction) -> bool {
        let moved = self.layers.reorder(id, direction);
        if moved {
            debug!(%id, ?direction, "layer reordered");
            self.refresh();
        }
        moved
    }

    pub fn duplicate(&mut self, id: &LayerId) -> Option<LayerId> {
        let copy = self.layers.duplicate(id)?;
        info!(source = %id, %copy, "layer duplicated");
        self.refresh();
        Some(copy)
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Select a layer by id, or clear with `None`. Unknown ids clear.
    pub fn select(&mut self, id: Option<LayerId>) {
        let next = id.filter(|id| self.layers.get(id).is_some());
        if next != self.selection {
            self.selection = next;
            self.refresh();
        }
    }

    /// Select whatever is under `point`, clearing the selection on a miss.
    pub fn pointer_down(&mut self, point: Point) -> Option<LayerId> {
        let hit = hit::hit_test(&self.layers, point);
        self.select(hit);
        hit
    }

    // =========================================================================
    // CANVAS
    // =========================================================================

    /// Change the document size. Layers keep their coordinates.
    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        info!(width = canvas.width(), height = canvas.height(), "canvas resized");
        self.canvas = canvas;
        self.refresh();
    }

    /// Apply a named preset from the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Canvas`] for an unknown preset name.
    pub fn set_preset(&mut self, name: &str) -> Result<CanvasSize, SessionError> {
        let size = canvas::preset(name)?.size();
        self.set_canvas(size);
        Ok(size)
    }

    // =========================================================================
    // HISTORY & EXPORT
    // =========================================================================

    /// Capture the current surface as a new version.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be rendered or encoded.
    pub fn snapshot(&mut self) -> Result<&VersionEntry, SessionError> {
        let surface = self.clean_surface()?;
        let entry = self.versions.snapshot(&surface)?;
        info!(id = %entry.id, description = %entry.description, "version captured");
        Ok(entry)
    }

    /// Encode the composite at native canvas size, without the selection
    /// outline.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be rendered or encoded.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, SessionError> {
        let surface = self.clean_surface()?;
        let bytes = export::export(&surface, format)?;
        info!(%format, bytes = bytes.len(), "document exported");
        Ok(bytes)
    }

    /// Straight-alpha RGBA pixels of the composite, for clipboard hosts.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be rendered.
    pub fn export_rgba(&self) -> Result<Vec<u8>, SessionError> {
        let surface = self.clean_surface()?;
        Ok(export::export_rgba(&surface))
    }

    // =========================================================================
    // GENERATION
    // =========================================================================

    /// Request a new full-bleed image layer from `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoGenerator`] without a configured generator,
    /// or a generation error if no async runtime is available.
    pub fn generate(&mut self, prompt: &str, aspect_ratio: AspectRatio) -> Result<RequestToken, SessionError> {
        self.dispatch(GenerationRequest {
            prompt: prompt.to_string(),
            aspect_ratio,
            target: GenerationTarget::NewLayer,
        })
    }

    /// Regenerate the selected image with `modifier` appended to its prompt.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotIterable`] unless an image layer with a
    /// recorded prompt is selected.
    pub fn iterate(&mut self, modifier: &str) -> Result<RequestToken, SessionError> {
        let layer = self
            .selection
            .and_then(|id| self.layers.get(&id))
            .ok_or(SessionError::NotIterable)?;
        let Payload::Image(image) = &layer.payload else {
            return Err(SessionError::NotIterable);
        };
        let base = image.prompt.as_deref().ok_or(SessionError::NotIterable)?;
        let modifier = modifier.trim();
        let prompt = if modifier.is_empty() { base.to_string() } else { format!("{base}, {modifier}") };
        let aspect_ratio = AspectRatio::closest(layer.width, layer.height);
        let target = GenerationTarget::Replace(layer.id);
        self.dispatch(GenerationRequest { prompt, aspect_ratio, target })
    }

    /// Apply every finished generation without waiting.
    pub fn apply_generations(&mut self) -> Vec<GenerationOutcome> {
        let mut outcomes = Vec::new();
        while let Some(completion) = self.generation.as_mut().and_then(GenerationBridge::try_next) {
            outcomes.push(self.reconcile(completion));
        }
        outcomes
    }

    /// Wait for the next generation to finish and apply it. `None` when
    /// nothing is pending.
    pub async fn next_generation(&mut self) -> Option<GenerationOutcome> {
        let completion = self.generation.as_mut()?.next().await?;
        Some(self.reconcile(completion))
    }

    /// Number of generation requests still in flight.
    #[must_use]
    pub fn pending_generations(&self) -> usize {
        self.generation.as_ref().map_or(0, GenerationBridge::pending_count)
    }

    fn dispatch(&mut self, request: GenerationRequest) -> Result<RequestToken, SessionError> {
        let bridge = self.generation.as_mut().ok_or(SessionError::NoGenerator)?;
        Ok(bridge.dispatch(request)?)
    }

    fn reconcile(&mut self, completion: Completion) -> GenerationOutcome {
        let Completion { token, request, result } = completion;
        let imported = result.and_then(|bytes| {
            self.assets
                .import(&bytes)
                .map_err(|e| GenerationError::Decode(e.to_string()))
        });
        let imported = match imported {
            Ok(imported) => imported,
            Err(e) => {
                error!(token, error = %e, "generation failed");
                return GenerationOutcome::Failed { token };
            }
        };
        let payload = ImagePayload {
            src: imported.src.clone(),
            original_width: imported.width,
            original_height: imported.height,
            prompt: Some(request.prompt.clone()),
        };

        match request.target {
            GenerationTarget::NewLayer => {
                let bounds = Bounds::new(0.0, 0.0, self.canvas.width_f(), self.canvas.height_f());
                let layer = Layer::new(generated_layer_name(&request.prompt), bounds, Payload::Image(payload));
                let id = self.layers.add(layer);
                self.selection = Some(id);
                info!(token, %id, "generated layer added");
                self.refresh();
                GenerationOutcome::Added { token, id }
            }
            GenerationTarget::Replace(id) => {
                let previous = match self.layers.get(&id).map(|l| &l.payload) {
                    Some(Payload::Image(old)) => old.src.clone(),
                    _ => {
                        self.assets.remove(&imported.src);
                        warn!(token, %id, "generation target gone; result discarded");
                        return GenerationOutcome::Discarded { token };
                    }
                };
                let patch = LayerPatch { payload: Some(Payload::Image(payload)), ..Default::default() };
                self.layers.update(&id, &patch);
                self.release_asset(&previous);
                info!(token, %id, "generated image replaced");
                self.refresh();
                GenerationOutcome::Replaced { token, id }
            }
        }
    }

    /// Drop a decoded asset once no layer references it.
    fn release_asset(&mut self, src: &str) {
        let in_use = self
            .layers
            .iter()
            .any(|l| matches!(&l.payload, Payload::Image(p) if p.src == src));
        if !in_use && self.assets.remove(src).is_some() {
            debug!(%src, "asset released");
        }
    }

    // =========================================================================
    // RENDER
    // =========================================================================

    fn input(&self, selection: Option<LayerId>) -> RenderInput<'_> {
        RenderInput {
            layers: &self.layers,
            canvas: self.canvas,
            selection,
            assets: &self.assets,
            fonts: &self.fonts,
        }
    }

    /// Re-render after a mutation. A failed render leaves no surface.
    fn refresh(&mut self) {
        match render::render(&self.input(self.selection), &self.options) {
            Ok(surface) => self.surface = Some(surface),
            Err(e) => {
                error!(error = %e, "render failed");
                self.surface = None;
            }
        }
    }

    /// Render without the selection outline, for output.
    fn clean_surface(&self) -> Result<Pixmap, SessionError> {
        Ok(render::render(&self.input(None), &self.options)?)
    }
}

/// Scale an imported image down (never up) to fit the canvas, centered.
fn fit_within(image: &ImportedImage, canvas: CanvasSize) -> Bounds {
    let (cw, ch) = (canvas.width_f(), canvas.height_f());
    let (iw, ih) = (f64::from(image.width), f64::from(image.height));
    let scale = (cw / iw).min(ch / ih).min(1.0);
    Bounds::centered(iw * scale, ih * scale, cw, ch)
}

fn text_layer_name(text: &str) -> String {
    let first = text.lines().next().unwrap_or("").trim();
    if first.is_empty() {
        return "Text".to_string();
    }
    first.chars().take(24).collect()
}

fn generated_layer_name(prompt: &str) -> String {
    let short: String = prompt.trim().chars().take(24).collect();
    if short.is_empty() { "Generated image".to_string() } else { short }
}
