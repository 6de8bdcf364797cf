#![allow(clippy::float_cmp)]

use super::*;

#[test]
fn empty_book_resolves_nothing() {
    let book = FontBook::new();
    assert!(book.is_empty());
    assert!(book.resolve("Inter", FontWeight::Normal, FontStyle::Normal).is_none());
    assert!(book.families().is_empty());
}

#[test]
fn register_rejects_non_font_bytes() {
    let mut book = FontBook::new();
    let err = book
        .register("Broken", FontWeight::Bold, FontStyle::Normal, b"not a font")
        .unwrap_err();
    let FontError::Parse { family, .. } = err;
    assert_eq!(family, "Broken");
    assert!(book.is_empty());
}

#[test]
fn split_lines_keeps_empty_lines() {
    assert_eq!(split_lines("a\n\nb"), vec!["a", "", "b"]);
    assert_eq!(split_lines("one\r\ntwo"), vec!["one", "two"]);
    assert_eq!(split_lines("single"), vec!["single"]);
}

#[test]
fn align_offset_positions_lines() {
    assert_eq!(align_offset(TextAlign::Left, 200.0, 50.0), 0.0);
    assert_eq!(align_offset(TextAlign::Center, 200.0, 50.0), 75.0);
    assert_eq!(align_offset(TextAlign::Right, 200.0, 50.0), 150.0);
}

#[test]
fn blit_blends_over_transparent() {
    let mut pixmap = Pixmap::new(3, 1).unwrap();
    blit_coverage(&mut pixmap, 1, 0, 1, &[255], Color::rgb(255, 0, 0));
    let px = pixmap.pixel(1, 0).unwrap();
    assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 0, 0, 255));
    assert_eq!(pixmap.pixel(0, 0).unwrap().alpha(), 0);
}

#[test]
fn blit_clips_outside_pixmap() {
    let mut pixmap = Pixmap::new(2, 2).unwrap();
    blit_coverage(&mut pixmap, -1, -1, 2, &[255, 255, 255, 255], Color::BLACK);
    assert_eq!(pixmap.pixel(0, 0).unwrap().alpha(), 255);
    assert_eq!(pixmap.pixel(1, 1).unwrap().alpha(), 0);
}

// =============================================================
// Real glyphs
// =============================================================

const DEJAVU_SANS: &[u8] = include_bytes!("../tests/fixtures/DejaVuSans.ttf");

fn dejavu() -> Font {
    Font::from_bytes(DEJAVU_SANS, FontSettings::default()).unwrap()
}

fn text(body: &str, font_size: f64, align: TextAlign) -> TextPayload {
    TextPayload {
        text: body.into(),
        font_family: "DejaVu Sans".into(),
        font_size,
        weight: FontWeight::Normal,
        style: FontStyle::Normal,
        color: Color::BLACK,
        align,
    }
}

/// First and last rows that carry any ink.
fn ink_rows(pixmap: &Pixmap) -> Option<(u32, u32)> {
    let w = pixmap.width();
    let rows: Vec<u32> = (0..pixmap.height())
        .filter(|&y| (0..w).any(|x| pixmap.pixel(x, y).unwrap().alpha() > 0))
        .collect();
    Some((*rows.first()?, *rows.last()?))
}

#[test]
fn register_real_font_resolves_by_family() {
    let mut book = FontBook::new();
    book.register("DejaVu Sans", FontWeight::Normal, FontStyle::Normal, DEJAVU_SANS)
        .unwrap();
    assert_eq!(book.families(), vec!["DejaVu Sans"]);
    assert!(book.resolve("dejavu sans", FontWeight::Bold, FontStyle::Italic).is_some());
    assert!(book.resolve("Inter", FontWeight::Normal, FontStyle::Normal).is_some());
}

#[test]
fn measure_grows_with_text() {
    let font = dejavu();
    let short = measure(&font, "Hi", 40.0);
    let long = measure(&font, "Hi there", 40.0);
    assert!(short > 20.0);
    assert!(long > short);
}

#[test]
fn rasterized_block_is_top_anchored() {
    let font = dejavu();
    let block = rasterize_text(&font, &text("Hello", 40.0, TextAlign::Left), 200.0, 200.0).unwrap();
    assert_eq!(block.width(), 200);
    assert_eq!(block.height(), 48);
    let (first, last) = ink_rows(&block).unwrap();
    assert!(first < 15, "first inked row {first}");
    assert!(last > 25, "last inked row {last}");
}

#[test]
fn each_line_adds_a_line_height() {
    let font = dejavu();
    let block = rasterize_text(&font, &text("one\ntwo", 40.0, TextAlign::Left), 200.0, 0.0).unwrap();
    assert_eq!(block.height(), 96);
    let (_, last) = ink_rows(&block).unwrap();
    assert!(last > 48, "second line should ink below the first line height");
}

#[test]
fn block_height_is_capped_at_the_box() {
    let font = dejavu();
    let block = rasterize_text(&font, &text("a\nb\nc\nd", 40.0, TextAlign::Left), 100.0, 60.0).unwrap();
    assert_eq!((block.width(), block.height()), (100, 60));
}

#[test]
fn oversized_font_is_clamped() {
    let font = dejavu();
    let block = rasterize_text(&font, &text("W", 1.0e5, TextAlign::Left), 50.0, 0.0).unwrap();
    assert!(f64::from(block.height()) <= crate::consts::MAX_FONT_SIZE * LINE_HEIGHT_FACTOR + 1.0);
}

#[test]
fn unusable_font_size_renders_nothing() {
    let font = dejavu();
    assert!(rasterize_text(&font, &text("x", 0.0, TextAlign::Left), 50.0, 50.0).is_none());
    assert!(rasterize_text(&font, &text("x", f64::NAN, TextAlign::Left), 50.0, 50.0).is_none());
    assert!(rasterize_text(&font, &text("", 20.0, TextAlign::Left), 50.0, 50.0).is_none());
}
