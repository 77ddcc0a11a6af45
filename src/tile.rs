//! Widget tiles and the single-writer/single-reader tile handoff.
//!
//! A [`Tile`] is a widget-sized intensity grid. Every pixel is either
//! *background* (the widget's style color, blended at the style opacity when
//! composited) or *foreground* (text, bars and graph lines, always composited
//! at full opacity). Widgets draw into a fresh tile through the
//! embedded-graphics [`DrawTarget`] impl, and any pixel they touch becomes
//! foreground.
//!
//! # Publication
//!
//! ```text
//! widget thread                         compositor thread
//! ─────────────                         ─────────────────
//! render Tile (owned, mutable)
//! slot.publish(tile) ── lock, swap ──►  slot.snapshot() ── lock, clone Arc
//!                                       blit (no lock held)
//! ```
//!
//! The mutex only guards an `Arc` swap. Rendering, sampling and blitting all
//! happen outside it, so the compositor never observes a half-drawn tile.

use std::convert::Infallible;
use std::sync::Arc;

use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::*;
use parking_lot::Mutex;

// =============================================================================
// Tile
// =============================================================================

/// Rendered widget bitmap. Dimensions never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    foreground: Vec<bool>,
}

impl Tile {
    /// Create a tile filled with `background`, with no foreground pixels.
    pub fn new(width: u32, height: u32, background: u8) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![background; len],
            foreground: vec![false; len],
        }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Intensity at `(x, y)`, or `None` outside the tile.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        (x < self.width && y < self.height).then(|| self.pixels[self.index(x, y)])
    }

    /// Whether `(x, y)` was drawn by the widget (as opposed to background fill).
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.foreground[self.index(x, y)]
    }

    /// Number of foreground pixels.
    pub fn foreground_count(&self) -> usize {
        self.foreground.iter().filter(|&&f| f).count()
    }

    /// Bounding box of all foreground pixels as `(min_x, min_y, max_x, max_y)`.
    pub fn foreground_bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.foreground[self.index(x, y)] {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    /// Iterate rows of `(intensity, is_foreground)` pairs, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = impl Iterator<Item = (u8, bool)> + '_> + '_ {
        let w = self.width as usize;
        self.pixels
            .chunks(w.max(1))
            .zip(self.foreground.chunks(w.max(1)))
            .map(|(px, fg)| px.iter().copied().zip(fg.iter().copied()))
    }
}

impl OriginDimensions for Tile {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Tile {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x >= self.width || y >= self.height {
                continue;
            }
            let idx = self.index(x, y);
            self.pixels[idx] = color.luma();
            self.foreground[idx] = true;
        }
        Ok(())
    }
}

// =============================================================================
// Tile Slot
// =============================================================================

struct Published {
    tile: Arc<Tile>,
    generation: u64,
}

/// Latest published tile of one widget.
///
/// The generation counter increments on every publish so the compositor can
/// tell whether anything changed since its previous frame.
pub struct TileSlot {
    inner: Mutex<Published>,
}

impl TileSlot {
    pub fn new(initial: Tile) -> Self {
        Self {
            inner: Mutex::new(Published {
                tile: Arc::new(initial),
                generation: 0,
            }),
        }
    }

    /// Replace the published tile. Returns the new generation.
    pub fn publish(&self, tile: impl Into<Arc<Tile>>) -> u64 {
        let tile = tile.into();
        let mut inner = self.inner.lock();
        inner.tile = tile;
        inner.generation += 1;
        inner.generation
    }

    /// Current tile and its generation.
    pub fn snapshot(&self) -> (Arc<Tile>, u64) {
        let inner = self.inner.lock();
        (Arc::clone(&inner.tile), inner.generation)
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }
}
