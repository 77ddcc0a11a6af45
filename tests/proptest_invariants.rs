//! Property-based invariant tests for layout placement, sample history and
//! canvas compositing.
//!
//! 1. Widgets with a non-positive width or height are rejected.
//! 2. Placed widgets come out sorted by ascending z-order.
//! 3. Every enabled widget is either placed or rejected, never both.
//! 4. A history keeps exactly the most recent `capacity` samples.
//! 5. An opaque blit at any in-bounds origin reads back unchanged and leaves
//!    every canvas pixel outside the tile rect untouched.
//! 6. The higher z-order widget wins where two widgets overlap.
//! 7. A fully transparent background leaves the canvas untouched.

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use proptest::prelude::*;
use steelclock::canvas::Canvas;
use steelclock::config::{MemoryProperties, WidgetProperties, WidgetSpec};
use steelclock::history::History;
use steelclock::layout::{Layout, LayoutEngine, Rect, Style};
use steelclock::tile::Tile;

// ── Helpers ─────────────────────────────────────────────────────────────

fn spec(id: usize, rect: Rect) -> WidgetSpec {
    WidgetSpec::new(
        format!("memory_{id}"),
        rect,
        WidgetProperties::Memory(MemoryProperties::default()),
    )
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-20i32..140, -20i32..60, -5i32..80, -5i32..50, -10i32..10)
        .prop_map(|(x, y, w, h, z)| Rect::new(x, y, w, h).with_z(z))
}

fn filled_tile(width: u32, height: u32, pixels: &[u8]) -> Tile {
    let mut tile = Tile::new(width, height, 0);
    let points = (0..height).flat_map(|y| (0..width).map(move |x| (x, y)));
    let drawn = points.zip(pixels.iter()).map(|((x, y), &value)| {
        Pixel(Point::new(x as i32, y as i32), Gray8::new(value))
    });
    let _ = tile.draw_iter(drawn);
    tile
}

fn solid_tile(width: u32, height: u32, value: u8) -> Tile {
    filled_tile(width, height, &vec![value; (width * height) as usize])
}

// ═════════════════════════════════════════════════════════════════════════
// Layout
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn test_non_positive_size_is_rejected(rect in rect_strategy()) {
        let engine = LayoutEngine::new(Layout::basic(128, 40));
        let placement = engine.place(&[spec(0, rect)]);

        if rect.w <= 0 || rect.h <= 0 {
            prop_assert!(placement.placed.is_empty(), "{:?} must not be placed", rect);
            prop_assert_eq!(placement.rejected.len(), 1);
        }
    }

    #[test]
    fn test_placed_widgets_are_in_z_order(rects in prop::collection::vec(rect_strategy(), 0..12)) {
        let specs: Vec<_> = rects.iter().enumerate().map(|(i, &rect)| spec(i, rect)).collect();
        let placement = LayoutEngine::new(Layout::basic(128, 40)).place(&specs);

        for pair in placement.placed.windows(2) {
            prop_assert!(
                pair[0].rect().z_order <= pair[1].rect().z_order,
                "z-order not ascending: {} then {}",
                pair[0].rect(),
                pair[1].rect()
            );
        }
    }

    #[test]
    fn test_every_widget_is_classified_once(rects in prop::collection::vec(rect_strategy(), 0..12)) {
        let specs: Vec<_> = rects.iter().enumerate().map(|(i, &rect)| spec(i, rect)).collect();
        let placement = LayoutEngine::new(Layout::basic(128, 40)).place(&specs);

        prop_assert_eq!(placement.placed.len() + placement.rejected.len(), specs.len());
        for placed in &placement.placed {
            prop_assert!(
                placement.rejected.iter().all(|r| r.id != placed.spec.id),
                "{} both placed and rejected",
                placed.spec.id
            );
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// History
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn test_history_keeps_most_recent(capacity in 1usize..40, extra in 0usize..40) {
        let mut history = History::new(capacity);
        let total = capacity + extra;
        for i in 0..total {
            history.push(i as f32);
        }

        prop_assert_eq!(history.len(), capacity);
        let kept: Vec<f32> = history.iter().collect();
        let expected: Vec<f32> = (extra..total).map(|i| i as f32).collect();
        prop_assert_eq!(kept, expected);
        prop_assert_eq!(history.latest(), Some((total - 1) as f32));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// Compositing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn test_opaque_blit_round_trips(
        (width, height, pixels) in (1u32..24, 1u32..16).prop_flat_map(|(w, h)| {
            (Just(w), Just(h), prop::collection::vec(any::<u8>(), (w * h) as usize))
        }),
        (extra_w, extra_h, x, y) in (0u32..40, 0u32..24).prop_flat_map(|(ew, eh)| {
            (Just(ew), Just(eh), 0..=ew, 0..=eh)
        }),
        existing in any::<u8>(),
    ) {
        let (canvas_w, canvas_h) = (width + extra_w, height + extra_h);
        let tile = filled_tile(width, height, &pixels);
        let mut canvas = Canvas::new(canvas_w, canvas_h, existing);
        canvas.blit(&tile, Point::new(x as i32, y as i32), &Style::default());

        let frame = canvas.extract_viewport(x as i32, y as i32, width, height).unwrap();
        prop_assert_eq!(frame.pixels(), pixels.as_slice());

        let rect = Rect::new(x as i32, y as i32, width as i32, height as i32);
        for cy in 0..canvas_h {
            for cx in 0..canvas_w {
                if !rect.intersects(cx as i32, cy as i32, 1, 1) {
                    prop_assert_eq!(
                        canvas.pixel(cx, cy),
                        Some(existing),
                        "({}, {}) outside {} changed",
                        cx,
                        cy,
                        rect
                    );
                }
            }
        }
    }

    #[test]
    fn test_higher_z_wins_overlap(low in 1u8..=255, high in 1u8..=255, offset in 0i32..8) {
        let mut canvas = Canvas::new(32, 16, 0);
        let mut layers = [
            (Rect::new(offset, 0, 16, 16).with_z(5), high),
            (Rect::new(0, 0, 16, 16).with_z(-1), low),
        ];
        layers.sort_by_key(|(rect, _)| rect.z_order);
        for (rect, value) in layers {
            canvas.blit(&solid_tile(16, 16, value), Point::new(rect.x, rect.y), &Style::default());
        }

        prop_assert_eq!(canvas.pixel(offset as u32, 0), Some(high));
        prop_assert_eq!(canvas.pixel(15, 15), Some(high), "Overlap belongs to the top layer");
        if offset > 0 {
            prop_assert_eq!(canvas.pixel(0, 0), Some(low), "Uncovered part of the low layer remains");
        }
    }

    #[test]
    fn test_transparent_background_keeps_canvas(existing in any::<u8>(), background in any::<u8>()) {
        let mut canvas = Canvas::new(8, 8, existing);
        let style = Style {
            background_opacity: 0,
            ..Style::default()
        };
        canvas.blit(&Tile::new(8, 8, background), Point::zero(), &style);

        prop_assert!(canvas.pixels().iter().all(|&p| p == existing));
    }
}
