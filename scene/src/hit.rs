//! Hit-testing: which layer, if any, occupies a document-space point.
//!
//! Walks the store topmost-first, the reverse of paint order, and returns the
//! first visible, unlocked layer whose un-rotated bounding box contains the
//! point. Rotation is ignored on purpose; the selection outline is drawn
//! axis-aligned for the same reason, so what you click is what gets outlined.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::doc::{LayerId, LayerStore};
use crate::geom::Point;

/// Test which layer (if any) is under `pt`.
#[must_use]
pub fn hit_test(layers: &LayerStore, pt: Point) -> Option<LayerId> {
    layers
        .iter()
        .filter(|l| l.visible && !l.locked)
        .find(|l| l.bounds().contains(pt))
        .map(|l| l.id)
}
