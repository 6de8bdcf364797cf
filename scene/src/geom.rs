//! Geometry helpers shared by rendering and hit-testing.
//!
//! Layers live in document space: `(x, y)` is the top-left of the un-rotated
//! bounding box and rotation is applied around the box center. The renderer
//! uses [`layer_transform`] to map a layer-local frame `(0..width, 0..height)`
//! into document space; the hit-tester deliberately ignores rotation and uses
//! [`Bounds::contains`] on the axis-aligned box.

#[cfg(test)]
#[path = "geom_test.rs"]
mod geom_test;

use serde::{Deserialize, Serialize};
use tiny_skia::Transform;

/// A point in document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in document space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Box of `width` x `height` centered inside a `container_w` x `container_h` area.
    #[must_use]
    pub fn centered(width: f64, height: f64, container_w: f64, container_h: f64) -> Self {
        Self { x: (container_w - width) / 2.0, y: (container_h - height) / 2.0, width, height }
    }

    /// Inclusive containment test on all four edges.
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.x + self.width && pt.y >= self.y && pt.y <= self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point { x: self.x + self.width / 2.0, y: self.y + self.height / 2.0 }
    }

    /// `true` when the box encloses no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Map any rotation in degrees into `[0, 360)`. Non-finite input maps to 0.
#[must_use]
pub fn normalize_rotation(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}

/// Clamp an opacity into `[0, 1]`. NaN is treated as fully opaque.
#[must_use]
pub fn clamp_opacity(v: f64) -> f64 {
    if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) }
}

/// Transform from a layer-local frame to document space.
///
/// The local frame has its origin at the layer's top-left corner and spans
/// `(0..width, 0..height)`. Rotation is applied around the box center.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn layer_transform(bounds: Bounds, rotation_deg: f64) -> Transform {
    let c = bounds.center();
    let half_w = (bounds.width / 2.0) as f32;
    let half_h = (bounds.height / 2.0) as f32;
    Transform::from_translate(c.x as f32, c.y as f32)
        .pre_concat(Transform::from_rotate(normalize_rotation(rotation_deg) as f32))
        .pre_translate(-half_w, -half_h)
}
