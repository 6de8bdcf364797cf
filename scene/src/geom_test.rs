#![allow(clippy::float_cmp)]

use super::*;

fn map(t: Transform, x: f32, y: f32) -> (f32, f32) {
    (t.sx * x + t.kx * y + t.tx, t.ky * x + t.sy * y + t.ty)
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

// =============================================================
// Bounds
// =============================================================

#[test]
fn contains_interior_and_edges() {
    let b = Bounds::new(10.0, 20.0, 100.0, 50.0);
    assert!(b.contains(Point::new(50.0, 40.0)));
    assert!(b.contains(Point::new(10.0, 20.0)));
    assert!(b.contains(Point::new(110.0, 70.0)));
}

#[test]
fn contains_rejects_outside() {
    let b = Bounds::new(10.0, 20.0, 100.0, 50.0);
    assert!(!b.contains(Point::new(9.9, 40.0)));
    assert!(!b.contains(Point::new(50.0, 70.1)));
    assert!(!b.contains(Point::new(-5.0, -5.0)));
}

#[test]
fn centered_box_inside_container() {
    let b = Bounds::centered(200.0, 100.0, 1000.0, 500.0);
    assert_eq!(b, Bounds::new(400.0, 200.0, 200.0, 100.0));
    assert_eq!(b.center(), Point::new(500.0, 250.0));
}

#[test]
fn empty_when_zero_extent() {
    assert!(Bounds::new(0.0, 0.0, 0.0, 10.0).is_empty());
    assert!(Bounds::new(0.0, 0.0, 10.0, 0.0).is_empty());
    assert!(!Bounds::new(0.0, 0.0, 1.0, 1.0).is_empty());
}

// =============================================================
// Normalization
// =============================================================

#[test]
fn rotation_normalizes_into_range() {
    assert_eq!(normalize_rotation(0.0), 0.0);
    assert_eq!(normalize_rotation(360.0), 0.0);
    assert_eq!(normalize_rotation(450.0), 90.0);
    assert_eq!(normalize_rotation(-90.0), 270.0);
    assert_eq!(normalize_rotation(-720.0), 0.0);
}

#[test]
fn rotation_non_finite_is_zero() {
    assert_eq!(normalize_rotation(f64::NAN), 0.0);
    assert_eq!(normalize_rotation(f64::INFINITY), 0.0);
}

#[test]
fn opacity_clamps() {
    assert_eq!(clamp_opacity(1.5), 1.0);
    assert_eq!(clamp_opacity(-0.2), 0.0);
    assert_eq!(clamp_opacity(0.25), 0.25);
    assert_eq!(clamp_opacity(f64::NAN), 1.0);
}

// =============================================================
// layer_transform
// =============================================================

#[test]
fn unrotated_transform_is_translation() {
    let t = layer_transform(Bounds::new(100.0, 125.0, 100.0, 50.0), 0.0);
    let (x, y) = map(t, 0.0, 0.0);
    assert!(approx(x, 100.0) && approx(y, 125.0));
    let (x, y) = map(t, 100.0, 50.0);
    assert!(approx(x, 200.0) && approx(y, 175.0));
}

#[test]
fn rotation_pivots_around_center() {
    let t = layer_transform(Bounds::new(100.0, 125.0, 100.0, 50.0), 90.0);
    // Center stays put.
    let (cx, cy) = map(t, 50.0, 25.0);
    assert!(approx(cx, 150.0) && approx(cy, 150.0));
    // Local top-left swings clockwise around the center.
    let (x, y) = map(t, 0.0, 0.0);
    assert!(approx(x, 175.0) && approx(y, 100.0));
}

#[test]
fn unnormalized_rotation_matches_normalized() {
    let b = Bounds::new(0.0, 0.0, 40.0, 20.0);
    let a = layer_transform(b, -270.0);
    let c = layer_transform(b, 90.0);
    let (ax, ay) = map(a, 3.0, 7.0);
    let (cx, cy) = map(c, 3.0, 7.0);
    assert!(approx(ax, cx) && approx(ay, cy));
}
