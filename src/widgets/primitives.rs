//! Low-level drawing primitives shared across metric widgets.
//!
//! # Bars
//!
//! A bar fills `round(extent * fraction)` pixels of its area, where
//! `fraction` is clamped to `[0, 1]`. Horizontal bars grow from the left,
//! vertical bars grow from the bottom. With `bordered` set, a 1 px outline is
//! drawn around the area and the fill is inset by one pixel.
//!
//! # Graphs
//!
//! Graphs plot a [`History`] window right-aligned: the newest sample always
//! sits on the right edge, and a partially filled history leaves the left
//! part empty instead of stretching.
//!
//! ```text
//! x(i) = left + round((capacity - len + i) * (width - 1) / (capacity - 1))
//! y(v) = bottom - round(fraction(v) * (height - 1))
//! ```

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, StrokeAlignment};

use crate::history::History;

/// `value / ceiling`, clamped to `[0, 1]`. Non-positive ceilings yield 0.
#[inline]
pub fn fraction(value: f32, ceiling: f32) -> f32 {
    if ceiling <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / ceiling).clamp(0.0, 1.0)
}

fn fill_rect<D>(target: &mut D, top_left: Point, size: Size, color: u8)
where
    D: DrawTarget<Color = Gray8>,
{
    if size.width == 0 || size.height == 0 {
        return;
    }
    Rectangle::new(top_left, size)
        .into_styled(PrimitiveStyle::with_fill(Gray8::new(color)))
        .draw(target)
        .ok();
}

fn outline<D>(target: &mut D, area: Rectangle, color: u8)
where
    D: DrawTarget<Color = Gray8>,
{
    let style = PrimitiveStyleBuilder::new()
        .stroke_color(Gray8::new(color))
        .stroke_width(1)
        .stroke_alignment(StrokeAlignment::Inside)
        .build();
    area.into_styled(style).draw(target).ok();
}

/// Area left for the fill once an optional outline is drawn.
fn bar_inner<D>(target: &mut D, area: Rectangle, color: u8, bordered: bool) -> Rectangle
where
    D: DrawTarget<Color = Gray8>,
{
    if !bordered {
        return area;
    }
    outline(target, area, color);
    Rectangle::new(
        area.top_left + Point::new(1, 1),
        Size::new(area.size.width.saturating_sub(2), area.size.height.saturating_sub(2)),
    )
}

/// Draw a left-to-right bar filled to `fraction`.
pub fn draw_bar_horizontal<D>(target: &mut D, area: Rectangle, fraction: f32, color: u8, bordered: bool)
where
    D: DrawTarget<Color = Gray8>,
{
    let inner = bar_inner(target, area, color, bordered);
    let fill_w = (inner.size.width as f32 * fraction.clamp(0.0, 1.0)).round() as u32;
    fill_rect(target, inner.top_left, Size::new(fill_w, inner.size.height), color);
}

/// Draw a bottom-to-top bar filled to `fraction`.
pub fn draw_bar_vertical<D>(target: &mut D, area: Rectangle, fraction: f32, color: u8, bordered: bool)
where
    D: DrawTarget<Color = Gray8>,
{
    let inner = bar_inner(target, area, color, bordered);
    let fill_h = (inner.size.height as f32 * fraction.clamp(0.0, 1.0)).round() as u32;
    let top = inner.top_left.y + (inner.size.height - fill_h) as i32;
    fill_rect(target, Point::new(inner.top_left.x, top), Size::new(inner.size.width, fill_h), color);
}

/// Split `area` into `n` equal slices separated by `margin` pixels.
///
/// Slices run left to right when `horizontal_split` is set, otherwise top to
/// bottom. The last slice absorbs rounding leftovers.
pub fn split_area(area: Rectangle, n: usize, margin: u32, horizontal_split: bool) -> Vec<Rectangle> {
    if n == 0 {
        return Vec::new();
    }
    let n32 = n as u32;
    let extent = if horizontal_split { area.size.width } else { area.size.height };
    let usable = extent.saturating_sub(margin * (n32 - 1));
    let slice = usable / n32;

    (0..n32)
        .map(|i| {
            let offset = i * (slice + margin);
            let len = if i == n32 - 1 { usable - slice * (n32 - 1) } else { slice };
            if horizontal_split {
                Rectangle::new(area.top_left + Point::new(offset as i32, 0), Size::new(len, area.size.height))
            } else {
                Rectangle::new(area.top_left + Point::new(0, offset as i32), Size::new(area.size.width, len))
            }
        })
        .collect()
}

/// Screen points for a history window plotted in `area`.
pub fn graph_points(area: Rectangle, history: &History, ceiling: f32) -> Vec<Point> {
    let len = history.len();
    if len == 0 || area.size.width == 0 || area.size.height == 0 {
        return Vec::new();
    }
    let capacity = history.capacity();
    let offset = capacity - len;
    let span_x = (area.size.width - 1) as f32;
    let span_y = (area.size.height - 1) as f32;
    let bottom = area.top_left.y + area.size.height as i32 - 1;

    history
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let x = if capacity > 1 {
                ((offset + i) as f32 * span_x / (capacity - 1) as f32).round() as i32
            } else {
                span_x as i32
            };
            let y = bottom - (fraction(value, ceiling) * span_y).round() as i32;
            Point::new(area.top_left.x + x, y)
        })
        .collect()
}

/// Plot `history` as a polyline, optionally filling the area below it.
pub fn draw_graph<D>(target: &mut D, area: Rectangle, history: &History, ceiling: f32, color: u8, fill: Option<u8>)
where
    D: DrawTarget<Color = Gray8>,
{
    let points = graph_points(area, history, ceiling);
    let bottom = area.top_left.y + area.size.height as i32 - 1;

    if let Some(fill_color) = fill {
        let fill_style = PrimitiveStyle::with_stroke(Gray8::new(fill_color), 1);
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let dx = b.x - a.x;
            for x in a.x..=b.x {
                let y = if dx == 0 {
                    a.y.min(b.y)
                } else {
                    a.y + ((b.y - a.y) as f32 * (x - a.x) as f32 / dx as f32).round() as i32
                };
                if y < bottom {
                    Line::new(Point::new(x, y + 1), Point::new(x, bottom))
                        .into_styled(fill_style)
                        .draw(target)
                        .ok();
                }
            }
        }
    }

    let line_style = PrimitiveStyle::with_stroke(Gray8::new(color), 1);
    match points.as_slice() {
        [] => {}
        [single] => {
            Pixel(*single, Gray8::new(color)).draw(target).ok();
        }
        _ => {
            for pair in points.windows(2) {
                Line::new(pair[0], pair[1]).into_styled(line_style).draw(target).ok();
            }
        }
    }
}
