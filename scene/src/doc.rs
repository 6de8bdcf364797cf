//! Document model: layers, their payload variants, and the ordered store.
//!
//! A [`Layer`] is the atomic document entity. Its visual content is a tagged
//! [`Payload`] (image, text, or shape); the layer's [`LayerKind`] is derived
//! from the payload, so the two can never disagree. [`LayerPatch`] is a sparse
//! update applied by [`LayerStore::update`].
//!
//! [`LayerStore`] owns every layer of a document. Its sequence order *is* the
//! z-order: index 0 is the topmost layer, the last index the bottommost. The
//! renderer walks it back-to-front and the hit-tester front-to-back, so both
//! always agree on stacking.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{COPY_SUFFIX, DUPLICATE_OFFSET};
use crate::geom::Bounds;

/// Unique identifier for a layer.
pub type LayerId = Uuid;

// =============================================================
// Color
// =============================================================

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color: {0:?}")]
pub struct ColorParseError(pub String);

/// Straight (non-premultiplied) RGBA color. Serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to a `tiny_skia` color.
    #[must_use]
    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Parse `#RGB`, `#RRGGBB`, or `#RRGGBBAA` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ColorParseError(s.to_owned());
        let hex = s.trim().trim_start_matches('#');
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..=i], 16)
                .map(|n| n * 17)
                .map_err(|_| err())
        };
        match hex.len() {
            3 => Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

// =============================================================
// Payload variants
// =============================================================

/// The kind of a layer, derived from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Image,
    Text,
    Shape,
}

/// Raster content. `src` is a key into the session's asset store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub src: String,
    pub original_width: u32,
    pub original_height: u32,
    /// Prompt that produced this image, when it was AI-generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPayload {
    pub text: String,
    pub font_family: String,
    /// Font size in pixels.
    pub font_size: f64,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub color: Color,
    pub align: TextAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Fills the full bounding box.
    Rectangle,
    /// Ellipse inscribed within the bounding box.
    Circle,
    /// Single horizontal stroke at the vertical center; fill is ignored.
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapePayload {
    pub shape: ShapeKind,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

/// Variant-specific content of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Image(ImagePayload),
    Text(TextPayload),
    Shape(ShapePayload),
}

impl Payload {
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Image(_) => LayerKind::Image,
            Self::Text(_) => LayerKind::Text,
            Self::Shape(_) => LayerKind::Shape,
        }
    }
}

// =============================================================
// Layer
// =============================================================

/// One visual element of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    /// Display label; not unique.
    pub name: String,
    /// Hidden layers are neither rendered nor hit-tested.
    pub visible: bool,
    /// Locked layers render but are excluded from hit-testing.
    pub locked: bool,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise rotation in degrees around the box center; may be un-normalized.
    pub rotation: f64,
    /// Clamped to `[0, 1]` at render time.
    pub opacity: f64,
    pub payload: Payload,
}

impl Layer {
    /// Create a visible, unlocked, un-rotated, opaque layer with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, bounds: Bounds, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            visible: true,
            locked: false,
            x: finite_or(bounds.x, 0.0),
            y: finite_or(bounds.y, 0.0),
            width: finite_or(bounds.width, 0.0).max(0.0),
            height: finite_or(bounds.height, 0.0).max(0.0),
            rotation: 0.0,
            opacity: 1.0,
            payload,
        }
    }

    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.payload.kind()
    }

    /// The un-rotated axis-aligned bounding box.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

/// Sparse update for a layer. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Replacement payload; must be the same variant as the layer's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl LayerPatch {
    /// Patch that only moves the layer.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }

    /// Shallow-merge into `layer`. Returns `false` (and changes nothing) when
    /// the patch carries a payload of a different kind.
    fn apply_to(&self, layer: &mut Layer) -> bool {
        if let Some(payload) = &self.payload {
            if payload.kind() != layer.kind() {
                return false;
            }
        }
        if let Some(name) = &self.name {
            layer.name.clone_from(name);
        }
        if let Some(v) = self.visible {
            layer.visible = v;
        }
        if let Some(l) = self.locked {
            layer.locked = l;
        }
        // Non-finite geometry is dropped field by field.
        if let Some(x) = self.x.filter(|v| v.is_finite()) {
            layer.x = x;
        }
        if let Some(y) = self.y.filter(|v| v.is_finite()) {
            layer.y = y;
        }
        if let Some(w) = self.width.filter(|v| v.is_finite()) {
            layer.width = w.max(0.0);
        }
        if let Some(h) = self.height.filter(|v| v.is_finite()) {
            layer.height = h.max(0.0);
        }
        if let Some(r) = self.rotation.filter(|v| v.is_finite()) {
            layer.rotation = r;
        }
        if let Some(o) = self.opacity.filter(|v| !v.is_nan()) {
            layer.opacity = o;
        }
        if let Some(payload) = &self.payload {
            layer.payload = payload.clone();
        }
        true
    }
}

// =============================================================
// LayerStore
// =============================================================

/// Direction for [`LayerStore::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the top of the stack (index 0).
    Up,
    /// Toward the bottom of the stack.
    Down,
}

/// Ordered collection of layers. Index 0 is the topmost layer.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    layers: Vec<Layer>,
}

impl LayerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Insert a layer at the top of the stack and return its id.
    ///
    /// If the incoming id is already present, the layer is given a fresh one
    /// so ids stay unique.
    pub fn add(&mut self, mut layer: Layer) -> LayerId {
        while self.index_of(&layer.id).is_some() {
            layer.id = Uuid::new_v4();
        }
        let id = layer.id;
        self.layers.insert(0, layer);
        id
    }

    /// Apply a partial update. Returns `false` if the layer doesn't exist or
    /// the patch was rejected.
    pub fn update(&mut self, id: &LayerId, patch: &LayerPatch) -> bool {
        let Some(layer) = self.get_mut(id) else {
            return false;
        };
        patch.apply_to(layer)
    }

    /// Remove a layer by id, returning it if it was present.
    pub fn delete(&mut self, id: &LayerId) -> Option<Layer> {
        let idx = self.index_of(id)?;
        Some(self.layers.remove(idx))
    }

    /// Swap a layer with its neighbor in `direction`. Returns `false` at either
    /// boundary or when the id is unknown.
    pub fn reorder(&mut self, id: &LayerId, direction: Direction) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let other = match direction {
            Direction::Up if idx > 0 => idx - 1,
            Direction::Down if idx + 1 < self.layers.len() => idx + 1,
            _ => return false,
        };
        self.layers.swap(idx, other);
        true
    }

    /// Clone a layer with a new id, offset by (+20, +20), inserted topmost.
    pub fn duplicate(&mut self, id: &LayerId) -> Option<LayerId> {
        let source = self.get(id)?;
        let mut copy = source.clone();
        copy.id = Uuid::new_v4();
        copy.name = format!("{}{COPY_SUFFIX}", source.name);
        copy.x += DUPLICATE_OFFSET;
        copy.y += DUPLICATE_OFFSET;
        Some(self.add(copy))
    }

    /// Return a reference to a layer by id.
    #[must_use]
    pub fn get(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == *id)
    }

    pub(crate) fn get_mut(&mut self, id: &LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == *id)
    }

    /// Position of a layer in the stack (0 = topmost).
    #[must_use]
    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == *id)
    }

    /// Layers in stored order, topmost first.
    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    /// Ids in stored order, topmost first.
    #[must_use]
    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|l| l.id).collect()
    }

    /// Number of layers currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if the store contains no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<'a> IntoIterator for &'a LayerStore {
    type Item = &'a Layer;
    type IntoIter = std::slice::Iter<'a, Layer>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
