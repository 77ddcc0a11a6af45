//! Font selection and aligned text rendering.
//!
//! Glyphs are rasterized by embedded-graphics mono fonts (`mono`) and
//! `ProFont` (`profont`). `font_size` picks the largest font whose nominal
//! size does not exceed the request, or the smallest font if none fits.
//!
//! # Ink Alignment
//!
//! Mono font cells carry blank rows and columns around the glyphs (descender
//! space, inter-character gaps). Aligning on cell metrics would put visibly
//! off-center text on a 40 px tall display, so single-line text is aligned on
//! its *ink box*, measured by rasterizing into an offscreen bounds tracker first.
//!
//! | Alignment | x of ink box |
//! |-----------|--------------|
//! | left | `padding` |
//! | center | `padding + (content_w - ink_w) / 2`, clamped to ≥ `padding` |
//! | right | `w - padding - ink_w`, clamped to ≥ `padding` |

use std::convert::Infallible;

use embedded_graphics::mono_font::ascii::{
    FONT_4X6,
    FONT_5X7,
    FONT_5X8,
    FONT_6X9,
    FONT_6X10,
    FONT_6X12,
    FONT_6X13,
    FONT_7X14,
    FONT_9X15,
    FONT_9X18,
    FONT_10X20,
};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};
use profont::{
    PROFONT_7_POINT,
    PROFONT_9_POINT,
    PROFONT_10_POINT,
    PROFONT_12_POINT,
    PROFONT_14_POINT,
    PROFONT_18_POINT,
    PROFONT_24_POINT,
};

use crate::config::{FontFamily, HorizontalAlign, VerticalAlign};

// =============================================================================
// Fonts
// =============================================================================

/// ProFont faces by nominal point size, ascending.
const PROFONT_SIZES: [(u32, &MonoFont<'static>); 7] = [
    (7, &PROFONT_7_POINT),
    (9, &PROFONT_9_POINT),
    (10, &PROFONT_10_POINT),
    (12, &PROFONT_12_POINT),
    (14, &PROFONT_14_POINT),
    (18, &PROFONT_18_POINT),
    (24, &PROFONT_24_POINT),
];

/// Built-in ASCII faces by glyph cell height, ascending.
const MONO_SIZES: [(u32, &MonoFont<'static>); 11] = [
    (6, &FONT_4X6),
    (7, &FONT_5X7),
    (8, &FONT_5X8),
    (9, &FONT_6X9),
    (10, &FONT_6X10),
    (12, &FONT_6X12),
    (13, &FONT_6X13),
    (14, &FONT_7X14),
    (15, &FONT_9X15),
    (18, &FONT_9X18),
    (20, &FONT_10X20),
];

/// Resolve a font family and nominal size to a concrete face.
pub fn resolve_font(family: FontFamily, size: u32) -> &'static MonoFont<'static> {
    let table: &[(u32, &'static MonoFont<'static>)] = match family {
        FontFamily::Profont => &PROFONT_SIZES,
        FontFamily::Mono => &MONO_SIZES,
    };
    table
        .iter()
        .rev()
        .find(|(nominal, _)| *nominal <= size)
        .or_else(|| table.first())
        .map_or(&PROFONT_10_POINT, |(_, font)| *font)
}

/// Pick an intensity that contrasts with `background`.
#[inline]
pub const fn contrast_color(background: u8) -> u8 {
    if background > 128 { 0 } else { 255 }
}

// =============================================================================
// Text Options
// =============================================================================

/// Font and placement shared by every text-rendering widget.
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    pub font: &'static MonoFont<'static>,
    pub horizontal_align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
    pub padding: u32,
}

impl TextOptions {
    pub fn new(
        family: FontFamily,
        size: u32,
        horizontal_align: HorizontalAlign,
        vertical_align: VerticalAlign,
        padding: u32,
    ) -> Self {
        Self {
            font: resolve_font(family, size),
            horizontal_align,
            vertical_align,
            padding,
        }
    }

    /// Tile area left after reserving `padding` on every edge.
    pub fn content_area(&self, width: u32, height: u32) -> Rectangle {
        let pad = self.padding;
        let offset = i32::try_from(pad).unwrap_or(i32::MAX);
        Rectangle::new(
            Point::new(offset, offset),
            Size::new(width.saturating_sub(pad.saturating_mul(2)), height.saturating_sub(pad.saturating_mul(2))),
        )
    }

    /// Height of one text line in cell metrics.
    #[inline]
    pub const fn line_height(&self) -> u32 {
        self.font.character_size.height
    }
}

// =============================================================================
// Ink Measurement
// =============================================================================

/// Draw target that only records where foreground pixels land.
struct InkBounds {
    min: Point,
    max: Point,
    any: bool,
}

impl InkBounds {
    const fn new() -> Self {
        Self {
            min: Point::new(i32::MAX, i32::MAX),
            max: Point::new(i32::MIN, i32::MIN),
            any: false,
        }
    }

    fn rectangle(&self) -> Option<Rectangle> {
        self.any.then(|| Rectangle::with_corners(self.min, self.max))
    }
}

impl OriginDimensions for InkBounds {
    fn size(&self) -> Size {
        Size::new(u16::MAX as u32, u16::MAX as u32)
    }
}

impl DrawTarget for InkBounds {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, _) in pixels {
            self.min = self.min.component_min(point);
            self.max = self.max.component_max(point);
            self.any = true;
        }
        Ok(())
    }
}

/// Ink box of `text` drawn with its top-left cell corner at the origin.
///
/// `None` for empty or all-blank text.
pub fn measure(text: &str, font: &MonoFont<'_>) -> Option<Rectangle> {
    let mut bounds = InkBounds::new();
    Text::with_baseline(text, Point::zero(), MonoTextStyle::new(font, Gray8::WHITE), Baseline::Top)
        .draw(&mut bounds)
        .ok();
    bounds.rectangle()
}

fn align_start(start: i32, available: u32, used: u32, align: HorizontalAlign) -> i32 {
    let slack = available.saturating_sub(used) as i32;
    start
        + match align {
            HorizontalAlign::Left => 0,
            HorizontalAlign::Center => slack / 2,
            HorizontalAlign::Right => slack,
        }
}

fn align_top(start: i32, available: u32, used: u32, align: VerticalAlign) -> i32 {
    let slack = available.saturating_sub(used) as i32;
    start
        + match align {
            VerticalAlign::Top => 0,
            VerticalAlign::Center => slack / 2,
            VerticalAlign::Bottom => slack,
        }
}

// =============================================================================
// Drawing
// =============================================================================

fn draw_at<D>(target: &mut D, text: &str, font: &MonoFont<'_>, color: u8, origin: Point)
where
    D: DrawTarget<Color = Gray8>,
{
    Text::with_baseline(text, origin, MonoTextStyle::new(font, Gray8::new(color)), Baseline::Top)
        .draw(target)
        .ok();
}

/// Draw one line of text aligned by its ink box inside `area`.
pub fn draw_aligned<D>(target: &mut D, text: &str, color: u8, options: &TextOptions, area: Rectangle)
where
    D: DrawTarget<Color = Gray8>,
{
    let Some(ink) = measure(text, options.font) else {
        return;
    };
    let x = align_start(area.top_left.x, area.size.width, ink.size.width, options.horizontal_align);
    let y = align_top(area.top_left.y, area.size.height, ink.size.height, options.vertical_align);
    draw_at(target, text, options.font, color, Point::new(x, y) - ink.top_left);
}

/// Draw stacked lines, each with its own color.
///
/// The block is aligned vertically as a whole using cell line height, and
/// each line is aligned horizontally on its own ink width.
pub fn draw_lines<D>(target: &mut D, lines: &[(&str, u8)], spacing: u32, options: &TextOptions, area: Rectangle)
where
    D: DrawTarget<Color = Gray8>,
{
    if lines.is_empty() {
        return;
    }
    let line_h = options.line_height();
    let block_h = line_h * lines.len() as u32 + spacing * (lines.len() as u32 - 1);
    let mut y = align_top(area.top_left.y, area.size.height, block_h, options.vertical_align);

    for (text, color) in lines {
        if let Some(ink) = measure(text, options.font) {
            let x = align_start(area.top_left.x, area.size.width, ink.size.width, options.horizontal_align);
            draw_at(target, text, options.font, *color, Point::new(x - ink.top_left.x, y));
        }
        y += (line_h + spacing) as i32;
    }
}

/// Draw `items` left to right as one aligned row separated by `spacing`.
///
/// Empty items are skipped entirely, including their spacing.
pub fn draw_row<D>(target: &mut D, items: &[(&str, u8)], spacing: u32, options: &TextOptions, area: Rectangle)
where
    D: DrawTarget<Color = Gray8>,
{
    let measured: Vec<(Rectangle, &str, u8)> = items
        .iter()
        .filter_map(|&(text, color)| measure(text, options.font).map(|ink| (ink, text, color)))
        .collect();
    if measured.is_empty() {
        return;
    }

    let total_w = measured.iter().map(|(ink, ..)| ink.size.width).sum::<u32>() + spacing * (measured.len() as u32 - 1);
    let line_h = options.line_height();
    let mut x = align_start(area.top_left.x, area.size.width, total_w, options.horizontal_align);
    let y = align_top(area.top_left.y, area.size.height, line_h, options.vertical_align);

    for (ink, text, color) in measured {
        draw_at(target, text, options.font, color, Point::new(x - ink.top_left.x, y));
        x += (ink.size.width + spacing) as i32;
    }
}

/// Draw `cells` in a near-square grid, each centered in its cell.
///
/// `cols = round(sqrt(n))`, `rows = ceil(n / cols)`.
pub fn draw_grid<D>(target: &mut D, cells: &[&str], color: u8, font: &'static MonoFont<'static>, area: Rectangle)
where
    D: DrawTarget<Color = Gray8>,
{
    if cells.is_empty() {
        return;
    }
    let (cols, rows) = grid_shape(cells.len());
    let cell_w = area.size.width / cols;
    let cell_h = area.size.height / rows;
    let options = TextOptions {
        font,
        horizontal_align: HorizontalAlign::Center,
        vertical_align: VerticalAlign::Center,
        padding: 0,
    };

    for (i, text) in cells.iter().enumerate() {
        let (col, row) = (i as u32 % cols, i as u32 / cols);
        let cell = Rectangle::new(
            area.top_left + Point::new((col * cell_w) as i32, (row * cell_h) as i32),
            Size::new(cell_w, cell_h),
        );
        draw_aligned(target, text, color, &options, cell);
    }
}

/// Columns and rows for a grid of `n` cells.
pub fn grid_shape(n: usize) -> (u32, u32) {
    let cols = ((n as f32).sqrt().round() as u32).max(1);
    let rows = (n as u32).div_ceil(cols).max(1);
    (cols, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;

    // -------------------------------------------------------------------------
    // Fonts
    // -------------------------------------------------------------------------

    #[test]
    fn test_resolve_font_picks_largest_fitting() {
        let font = resolve_font(FontFamily::Profont, 13);
        assert_eq!(font.character_size, PROFONT_12_POINT.character_size, "13pt should resolve to 12pt");

        let font = resolve_font(FontFamily::Mono, 10);
        assert_eq!(font.character_size, FONT_6X10.character_size);
    }

    #[test]
    fn test_resolve_font_falls_back_to_smallest() {
        let font = resolve_font(FontFamily::Profont, 1);
        assert_eq!(font.character_size, PROFONT_7_POINT.character_size);
    }

    #[test]
    fn test_resolve_font_caps_at_largest() {
        let font = resolve_font(FontFamily::Mono, 99);
        assert_eq!(font.character_size, FONT_10X20.character_size);
    }

    #[test]
    fn test_contrast_color() {
        assert_eq!(contrast_color(0), 255);
        assert_eq!(contrast_color(128), 255);
        assert_eq!(contrast_color(129), 0);
    }

    // -------------------------------------------------------------------------
    // Measurement
    // -------------------------------------------------------------------------

    #[test]
    fn test_measure_empty_text() {
        assert!(measure("", &FONT_6X10).is_none());
        assert!(measure("   ", &FONT_6X10).is_none(), "Spaces have no ink");
    }

    #[test]
    fn test_measure_is_within_cell_box() {
        let ink = measure("12:34", &PROFONT_14_POINT).unwrap();
        let font = &PROFONT_14_POINT;
        let cell_w = 5 * font.character_size.width + 4 * font.character_spacing;

        assert!(ink.top_left.x >= 0 && ink.top_left.y >= 0);
        assert!(ink.size.width <= cell_w, "Ink should fit in the cell width");
        assert!(ink.size.height <= PROFONT_14_POINT.character_size.height);
    }

    #[test]
    fn test_grid_shape() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(4), (2, 2));
        assert_eq!(grid_shape(6), (2, 3));
        assert_eq!(grid_shape(8), (3, 3));
    }

    // -------------------------------------------------------------------------
    // Alignment
    // -------------------------------------------------------------------------

    fn options(h: HorizontalAlign, v: VerticalAlign, padding: u32) -> TextOptions {
        TextOptions::new(FontFamily::Mono, 10, h, v, padding)
    }

    #[test]
    fn test_content_area_with_huge_padding() {
        let opts = options(HorizontalAlign::Left, VerticalAlign::Top, 3_000_000_000);
        let area = opts.content_area(128, 40);
        assert_eq!(area.size, Size::zero(), "Oversized padding leaves no room instead of overflowing");
    }

    #[test]
    fn test_draw_aligned_centered() {
        let mut tile = Tile::new(60, 30, 0);
        let opts = options(HorizontalAlign::Center, VerticalAlign::Center, 0);
        draw_aligned(&mut tile, "88", 255, &opts, opts.content_area(60, 30));

        let (x0, y0, x1, y1) = tile.foreground_bounds().unwrap();
        let (left, right) = (x0 as i32, 59 - x1 as i32);
        let (top, bottom) = (y0 as i32, 29 - y1 as i32);
        assert!((left - right).abs() <= 1, "Horizontal margins {left} vs {right}");
        assert!((top - bottom).abs() <= 1, "Vertical margins {top} vs {bottom}");
    }

    #[test]
    fn test_draw_aligned_top_left_honors_padding() {
        let mut tile = Tile::new(60, 30, 0);
        let opts = options(HorizontalAlign::Left, VerticalAlign::Top, 3);
        draw_aligned(&mut tile, "7", 255, &opts, opts.content_area(60, 30));

        let (x0, y0, ..) = tile.foreground_bounds().unwrap();
        assert_eq!((x0, y0), (3, 3), "Ink should start at (padding, padding)");
    }

    #[test]
    fn test_draw_aligned_bottom_right() {
        let mut tile = Tile::new(60, 30, 0);
        let opts = options(HorizontalAlign::Right, VerticalAlign::Bottom, 2);
        draw_aligned(&mut tile, "1", 255, &opts, opts.content_area(60, 30));

        let (.., x1, y1) = tile.foreground_bounds().unwrap();
        assert_eq!((x1, y1), (57, 27), "Ink should end at the padded edge");
    }

    #[test]
    fn test_draw_aligned_wide_text_clamps_to_left() {
        let mut tile = Tile::new(10, 12, 0);
        let opts = options(HorizontalAlign::Right, VerticalAlign::Top, 0);
        draw_aligned(&mut tile, "WWWWWW", 255, &opts, opts.content_area(10, 12));

        let (x0, ..) = tile.foreground_bounds().unwrap();
        assert_eq!(x0, 0, "Overflowing text should start at the content edge");
    }

    #[test]
    fn test_draw_lines_uses_line_colors() {
        let mut tile = Tile::new(40, 30, 0);
        let opts = options(HorizontalAlign::Left, VerticalAlign::Top, 0);
        draw_lines(&mut tile, &[("A", 200), ("B", 100)], 2, &opts, opts.content_area(40, 30));

        let line_h = opts.line_height();
        let first_line_px = (0..line_h)
            .flat_map(|y| (0..40).map(move |x| (x, y)))
            .filter(|&(x, y)| tile.is_foreground(x, y))
            .filter_map(|(x, y)| tile.pixel(x, y))
            .collect::<Vec<_>>();
        assert!(!first_line_px.is_empty() && first_line_px.iter().all(|&v| v == 200), "First line in its own color");

        let second_line_px = (line_h + 2..2 * line_h + 2)
            .flat_map(|y| (0..40).map(move |x| (x, y)))
            .filter(|&(x, y)| tile.is_foreground(x, y))
            .filter_map(|(x, y)| tile.pixel(x, y))
            .collect::<Vec<_>>();
        assert!(!second_line_px.is_empty() && second_line_px.iter().all(|&v| v == 100), "Second line in its own color");
    }

    #[test]
    fn test_draw_row_skips_empty_items() {
        let mut with_gap = Tile::new(80, 12, 0);
        let mut without = Tile::new(80, 12, 0);
        let opts = options(HorizontalAlign::Left, VerticalAlign::Top, 0);
        let area = opts.content_area(80, 12);

        draw_row(&mut with_gap, &[("A", 255), ("", 255), ("B", 255)], 3, &opts, area);
        draw_row(&mut without, &[("A", 255), ("B", 255)], 3, &opts, area);

        assert_eq!(with_gap, without, "Empty indicators must not leave gaps");
    }

    #[test]
    fn test_draw_grid_places_every_cell() {
        let mut tile = Tile::new(64, 40, 0);
        draw_grid(&mut tile, &["1", "2", "3", "4"], 255, &FONT_6X10, Rectangle::new(Point::zero(), Size::new(64, 40)));

        for (cx, cy) in [(0, 0), (32, 0), (0, 20), (32, 20)] {
            let has_ink = (cy..cy + 20).any(|y| (cx..cx + 32).any(|x| tile.is_foreground(x, y)));
            assert!(has_ink, "Cell at ({cx},{cy}) should contain text");
        }
    }
}
