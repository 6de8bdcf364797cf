use super::*;
use crate::assets::pixmap_from_rgba;
use crate::doc::{FontStyle, FontWeight, LayerPatch, TextAlign};

// =============================================================
// Helpers
// =============================================================

const RED: Color = Color::rgb(255, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

struct Fixture {
    store: LayerStore,
    assets: AssetStore,
    fonts: FontBook,
    canvas: CanvasSize,
    selection: Option<LayerId>,
}

impl Fixture {
    fn new(width: u32, height: u32) -> Self {
        Self {
            store: LayerStore::new(),
            assets: AssetStore::new(),
            fonts: FontBook::new(),
            canvas: CanvasSize::new(width, height).unwrap(),
            selection: None,
        }
    }

    fn shape(&mut self, kind: ShapeKind, bounds: Bounds, fill: Color) -> LayerId {
        let payload = ShapePayload { shape: kind, fill, stroke: Color::BLACK, stroke_width: 0.0 };
        self.store.add(Layer::new("shape", bounds, Payload::Shape(payload)))
    }

    fn render(&self) -> Pixmap {
        let input = RenderInput {
            layers: &self.store,
            canvas: self.canvas,
            selection: self.selection,
            assets: &self.assets,
            fonts: &self.fonts,
        };
        render(&input, &RenderOptions::default()).unwrap()
    }
}

fn rgba(p: &Pixmap, x: u32, y: u32) -> (u8, u8, u8, u8) {
    let c = p.pixel(x, y).unwrap().demultiply();
    (c.red(), c.green(), c.blue(), c.alpha())
}

fn is_white(p: &Pixmap, x: u32, y: u32) -> bool {
    rgba(p, x, y) == (255, 255, 255, 255)
}

// =============================================================
// Surface basics
// =============================================================

#[test]
fn empty_document_is_background() {
    let fx = Fixture::new(16, 8);
    let surface = fx.render();
    assert_eq!((surface.width(), surface.height()), (16, 8));
    assert!(surface.pixels().iter().all(|p| p.demultiply() == tiny_skia::ColorU8::from_rgba(255, 255, 255, 255)));
}

#[test]
fn custom_background_is_used() {
    let fx = Fixture::new(4, 4);
    let input = RenderInput {
        layers: &fx.store,
        canvas: fx.canvas,
        selection: None,
        assets: &fx.assets,
        fonts: &fx.fonts,
    };
    let options = RenderOptions { background: Color::rgb(10, 20, 30), ..RenderOptions::default() };
    let surface = render(&input, &options).unwrap();
    assert_eq!(rgba(&surface, 2, 2), (10, 20, 30, 255));
}

// =============================================================
// Ordering
// =============================================================

#[test]
fn topmost_layer_wins_overlap() {
    let mut fx = Fixture::new(400, 400);
    fx.shape(ShapeKind::Rectangle, Bounds::new(100.0, 100.0, 200.0, 200.0), RED);
    fx.shape(ShapeKind::Circle, Bounds::new(150.0, 150.0, 200.0, 200.0), BLUE);
    let surface = fx.render();
    assert_eq!(rgba(&surface, 250, 250), (0, 0, 255, 255));
    // Rect corner lies outside the inscribed circle.
    assert_eq!(rgba(&surface, 110, 110), (255, 0, 0, 255));
}

#[test]
fn reorder_changes_overlap_winner() {
    let mut fx = Fixture::new(400, 400);
    fx.shape(ShapeKind::Rectangle, Bounds::new(100.0, 100.0, 200.0, 200.0), RED);
    let circle = fx.shape(ShapeKind::Circle, Bounds::new(150.0, 150.0, 200.0, 200.0), BLUE);
    fx.store.reorder(&circle, crate::doc::Direction::Down);
    let surface = fx.render();
    assert_eq!(rgba(&surface, 250, 250), (255, 0, 0, 255));
}

#[test]
fn hidden_layers_are_skipped() {
    let mut fx = Fixture::new(100, 100);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(0.0, 0.0, 100.0, 100.0), RED);
    fx.store.update(&id, &LayerPatch { visible: Some(false), ..Default::default() });
    assert!(is_white(&fx.render(), 50, 50));
}

#[test]
fn locked_layers_still_render() {
    let mut fx = Fixture::new(100, 100);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(0.0, 0.0, 100.0, 100.0), RED);
    fx.store.update(&id, &LayerPatch { locked: Some(true), ..Default::default() });
    assert_eq!(rgba(&fx.render(), 50, 50), (255, 0, 0, 255));
}

// =============================================================
// Opacity / rotation
// =============================================================

#[test]
fn opacity_above_one_matches_one() {
    let mut fx = Fixture::new(64, 64);
    let id = fx.shape(ShapeKind::Circle, Bounds::new(8.0, 8.0, 40.0, 40.0), RED);
    fx.store.update(&id, &LayerPatch { opacity: Some(1.0), ..Default::default() });
    let at_one = fx.render();
    fx.store.update(&id, &LayerPatch { opacity: Some(1.5), ..Default::default() });
    let above = fx.render();
    assert_eq!(at_one.data(), above.data());
}

#[test]
fn half_opacity_blends_with_background() {
    let mut fx = Fixture::new(20, 20);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(0.0, 0.0, 20.0, 20.0), RED);
    fx.store.update(&id, &LayerPatch { opacity: Some(0.5), ..Default::default() });
    let (r, g, b, a) = rgba(&fx.render(), 10, 10);
    assert_eq!((r, a), (255, 255));
    assert!((120..=135).contains(&g), "g = {g}");
    assert_eq!(g, b);
}

#[test]
fn zero_or_negative_opacity_draws_nothing() {
    let mut fx = Fixture::new(20, 20);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(0.0, 0.0, 20.0, 20.0), RED);
    fx.store.update(&id, &LayerPatch { opacity: Some(-1.0), ..Default::default() });
    assert!(is_white(&fx.render(), 10, 10));
}

#[test]
fn rotation_turns_bar_around_center() {
    let mut fx = Fixture::new(100, 100);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(0.0, 40.0, 100.0, 20.0), RED);
    let flat = fx.render();
    assert_eq!(rgba(&flat, 5, 50), (255, 0, 0, 255));
    assert!(is_white(&flat, 50, 5));

    fx.store.update(&id, &LayerPatch { rotation: Some(90.0), ..Default::default() });
    let turned = fx.render();
    assert_eq!(rgba(&turned, 50, 5), (255, 0, 0, 255));
    assert!(is_white(&turned, 5, 50));
}

#[test]
fn unnormalized_rotation_renders_like_normalized() {
    let mut fx = Fixture::new(80, 80);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(10.0, 30.0, 60.0, 20.0), RED);
    fx.store.update(&id, &LayerPatch { rotation: Some(45.0), ..Default::default() });
    let a = fx.render();
    fx.store.update(&id, &LayerPatch { rotation: Some(-315.0), ..Default::default() });
    let b = fx.render();
    assert_eq!(a.data(), b.data());
}

// =============================================================
// Shape variants
// =============================================================

#[test]
fn rectangle_stroke_only_when_width_positive() {
    let mut fx = Fixture::new(100, 100);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(20.0, 20.0, 60.0, 60.0), RED);
    assert_eq!(rgba(&fx.render(), 20, 50), (255, 0, 0, 255));

    let stroked = ShapePayload { shape: ShapeKind::Rectangle, fill: RED, stroke: BLUE, stroke_width: 6.0 };
    fx.store.update(&id, &LayerPatch { payload: Some(Payload::Shape(stroked)), ..Default::default() });
    assert_eq!(rgba(&fx.render(), 20, 50), (0, 0, 255, 255));
}

#[test]
fn line_draws_center_stroke_and_ignores_fill() {
    let mut fx = Fixture::new(100, 100);
    let payload = ShapePayload { shape: ShapeKind::Line, fill: RED, stroke: Color::BLACK, stroke_width: 4.0 };
    fx.store.add(Layer::new("line", Bounds::new(10.0, 40.0, 80.0, 20.0), Payload::Shape(payload)));
    let surface = fx.render();
    assert_eq!(rgba(&surface, 50, 49), (0, 0, 0, 255));
    assert!(is_white(&surface, 50, 42));
    assert!(is_white(&surface, 50, 57));
}

#[test]
fn zero_area_shapes_draw_nothing() {
    let mut fx = Fixture::new(50, 50);
    fx.shape(ShapeKind::Rectangle, Bounds::new(10.0, 10.0, 0.0, 30.0), RED);
    fx.shape(ShapeKind::Circle, Bounds::new(10.0, 10.0, 30.0, 0.0), RED);
    let surface = fx.render();
    assert!(surface.pixels().iter().all(|p| p.red() == 255 && p.green() == 255));
}

// =============================================================
// Images / text
// =============================================================

#[test]
fn image_is_scaled_into_layer_box() {
    let mut fx = Fixture::new(60, 60);
    let green = pixmap_from_rgba(2, 2, [0, 255, 0, 255].repeat(4)).unwrap();
    let imported = fx.assets.insert(green);
    let payload = ImagePayload { src: imported.src, original_width: 2, original_height: 2, prompt: None };
    fx.store.add(Layer::new("img", Bounds::new(10.0, 10.0, 40.0, 40.0), Payload::Image(payload)));
    let surface = fx.render();
    let (r, g, _, _) = rgba(&surface, 30, 30);
    assert!(g > 200 && r < 50, "got {:?}", rgba(&surface, 30, 30));
    assert!(is_white(&surface, 5, 5));
    assert!(is_white(&surface, 55, 55));
}

#[test]
fn missing_asset_is_skipped() {
    let mut fx = Fixture::new(20, 20);
    let payload = ImagePayload { src: "asset:gone".into(), original_width: 1, original_height: 1, prompt: None };
    fx.store.add(Layer::new("img", Bounds::new(0.0, 0.0, 20.0, 20.0), Payload::Image(payload)));
    assert!(is_white(&fx.render(), 10, 10));
}

#[test]
fn text_without_fonts_is_skipped() {
    let mut fx = Fixture::new(40, 40);
    let payload = TextPayload {
        text: "Hello".into(),
        font_family: "Inter".into(),
        font_size: 24.0,
        weight: FontWeight::Bold,
        style: FontStyle::Normal,
        color: Color::BLACK,
        align: TextAlign::Center,
    };
    fx.store.add(Layer::new("text", Bounds::new(0.0, 0.0, 40.0, 40.0), Payload::Text(payload)));
    let surface = fx.render();
    assert!(surface.pixels().iter().all(|p| p.red() == 255));
}

const DEJAVU_SANS: &[u8] = include_bytes!("../tests/fixtures/DejaVuSans.ttf");

fn with_dejavu(mut fx: Fixture) -> Fixture {
    fx.fonts
        .register("DejaVu Sans", FontWeight::Normal, FontStyle::Normal, DEJAVU_SANS)
        .unwrap();
    fx
}

fn add_text(fx: &mut Fixture, bounds: Bounds, align: TextAlign, rotation: f64) -> LayerId {
    let payload = TextPayload {
        text: "Hi".into(),
        font_family: "DejaVu Sans".into(),
        font_size: 40.0,
        weight: FontWeight::Normal,
        style: FontStyle::Normal,
        color: Color::BLACK,
        align,
    };
    let mut layer = Layer::new("text", bounds, Payload::Text(payload));
    layer.rotation = rotation;
    fx.store.add(layer)
}

/// First inked row, last inked row, and mean inked column of dark pixels.
#[allow(clippy::cast_precision_loss)]
fn ink(p: &Pixmap) -> (u32, u32, f64) {
    let (mut first, mut last, mut sum, mut count) = (u32::MAX, 0, 0.0, 0_u32);
    for y in 0..p.height() {
        for x in 0..p.width() {
            if rgba(p, x, y).0 < 128 {
                first = first.min(y);
                last = last.max(y);
                sum += f64::from(x);
                count += 1;
            }
        }
    }
    assert!(count > 0, "no ink rendered");
    (first, last, sum / f64::from(count))
}

#[test]
fn text_is_anchored_at_top_of_frame() {
    let mut fx = with_dejavu(Fixture::new(300, 100));
    add_text(&mut fx, Bounds::new(0.0, 10.0, 300.0, 80.0), TextAlign::Left, 0.0);
    let (first, last, _) = ink(&fx.render());
    assert!((10..=30).contains(&first), "first inked row {first}");
    assert!(last <= 60, "last inked row {last}");
}

#[test]
fn text_alignment_moves_ink_horizontally() {
    let centroid = |align| {
        let mut fx = with_dejavu(Fixture::new(300, 100));
        add_text(&mut fx, Bounds::new(0.0, 10.0, 300.0, 80.0), align, 0.0);
        ink(&fx.render()).2
    };
    let left = centroid(TextAlign::Left);
    let center = centroid(TextAlign::Center);
    let right = centroid(TextAlign::Right);
    assert!(left < 60.0, "left centroid {left}");
    assert!((130.0..170.0).contains(&center), "center centroid {center}");
    assert!(right > 240.0, "right centroid {right}");
}

#[test]
fn rotated_text_turns_around_box_center() {
    let mut fx = with_dejavu(Fixture::new(300, 100));
    add_text(&mut fx, Bounds::new(0.0, 10.0, 300.0, 80.0), TextAlign::Left, 180.0);
    let (first, _, centroid) = ink(&fx.render());
    assert!(first >= 50, "first inked row {first}");
    assert!(centroid > 240.0, "centroid {centroid}");
}

#[test]
fn text_is_clipped_to_layer_height() {
    let mut fx = with_dejavu(Fixture::new(300, 100));
    let payload = TextPayload {
        text: "A\nB\nC".into(),
        font_family: "DejaVu Sans".into(),
        font_size: 40.0,
        weight: FontWeight::Normal,
        style: FontStyle::Normal,
        color: Color::BLACK,
        align: TextAlign::Left,
    };
    fx.store.add(Layer::new("text", Bounds::new(0.0, 0.0, 300.0, 40.0), Payload::Text(payload)));
    let (_, last, _) = ink(&fx.render());
    assert!(last < 40, "last inked row {last}");
}

// =============================================================
// Selection
// =============================================================

#[test]
fn selection_outline_is_drawn_on_bounds() {
    let mut fx = Fixture::new(100, 100);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(20.0, 20.0, 60.0, 60.0), Color::TRANSPARENT);
    assert!(is_white(&fx.render(), 22, 20));

    fx.selection = Some(id);
    let (r, g, b, _) = rgba(&fx.render(), 22, 20);
    assert_eq!((r, g, b), (0x1E, 0x90, 0xFF));
}

#[test]
fn selection_outline_ignores_rotation() {
    let mut fx = Fixture::new(100, 100);
    let id = fx.shape(ShapeKind::Rectangle, Bounds::new(20.0, 20.0, 60.0, 60.0), Color::TRANSPARENT);
    fx.store.update(&id, &LayerPatch { rotation: Some(30.0), ..Default::default() });
    fx.selection = Some(id);
    let (r, _, b, _) = rgba(&fx.render(), 22, 20);
    assert_eq!((r, b), (0x1E, 0xFF));
}

#[test]
fn stale_selection_is_ignored() {
    let mut fx = Fixture::new(30, 30);
    fx.selection = Some(uuid::Uuid::new_v4());
    assert!(fx.render().pixels().iter().all(|p| p.red() == 255));
}
