//! Canvas and output frames.
//!
//! The [`Canvas`] is the virtual drawing surface: one byte of intensity per
//! cell (0 = black, 255 = white), possibly larger than the physical display.
//! It is owned by the compositor and re-created whenever a configuration is
//! (re)loaded.
//!
//! # Blending
//!
//! Background pixels of a tile blend against the canvas with the widget's
//! `background_opacity`:
//!
//! ```text
//! result = (existing * (255 - opacity) + tile * opacity) / 255   (integer floor)
//! ```
//!
//! Foreground pixels (anything the widget drew) replace the canvas cell.
//! Opacity 255 is an exact copy and opacity 0 leaves the canvas untouched.

use std::convert::Infallible;

use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle, StrokeAlignment};

use crate::error::OutOfBounds;
use crate::layout::{Rect, Style};
use crate::tile::Tile;

/// Alpha-blend one background pixel over the existing canvas value.
#[inline]
pub const fn blend(existing: u8, pixel: u8, opacity: u8) -> u8 {
    let op = opacity as u32;
    ((existing as u32 * (255 - op) + pixel as u32 * op) / 255) as u8
}

// =============================================================================
// Canvas
// =============================================================================

/// Virtual drawing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; width as usize * height as usize],
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

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        (x < self.width && y < self.height).then(|| self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Reset every cell to `background`.
    pub fn clear(&mut self, background: u8) {
        self.pixels.fill(background);
    }

    /// Composite `tile` with its top-left corner at `origin`.
    ///
    /// Cells falling outside the canvas are dropped. Callers establish
    /// z-order by blitting lower widgets first.
    pub fn blit(&mut self, tile: &Tile, origin: Point, style: &Style) {
        let opacity = style.background_opacity;
        for (ty, row) in tile.rows().enumerate() {
            let cy = origin.y as i64 + ty as i64;
            if cy < 0 || cy >= self.height as i64 {
                continue;
            }
            let row_start = cy as usize * self.width as usize;
            for (tx, (value, foreground)) in row.enumerate() {
                let cx = origin.x as i64 + tx as i64;
                if cx < 0 || cx >= self.width as i64 {
                    continue;
                }
                let cell = &mut self.pixels[row_start + cx as usize];
                *cell = if foreground { value } else { blend(*cell, value, opacity) };
            }
        }
    }

    /// Paint a 1 px outline along the inside edges of `rect`.
    pub fn draw_border(&mut self, rect: Rect, color: u8) {
        if !rect.has_area() {
            return;
        }
        let style = PrimitiveStyleBuilder::new()
            .stroke_color(Gray8::new(color))
            .stroke_width(1)
            .stroke_alignment(StrokeAlignment::Inside)
            .build();
        Rectangle::new(Point::new(rect.x, rect.y), Size::new(rect.w as u32, rect.h as u32))
            .into_styled(style)
            .draw(self)
            .ok();
    }

    /// Copy out a `w × h` region at `(x, y)`.
    ///
    /// Fails when the region is not fully inside the canvas; see
    /// [`Self::extract_viewport_clamped`] for the recovering variant.
    pub fn extract_viewport(&self, x: i32, y: i32, w: u32, h: u32) -> Result<Frame, OutOfBounds> {
        let inside = x >= 0
            && y >= 0
            && x as i64 + w as i64 <= self.width as i64
            && y as i64 + h as i64 <= self.height as i64;
        if !inside {
            return Err(OutOfBounds {
                x,
                y,
                w,
                h,
                canvas_w: self.width,
                canvas_h: self.height,
            });
        }

        let mut pixels = Vec::with_capacity(w as usize * h as usize);
        for row in y as u32..y as u32 + h {
            let start = row as usize * self.width as usize + x as usize;
            pixels.extend_from_slice(&self.pixels[start..start + w as usize]);
        }
        Ok(Frame::from_pixels(w, h, pixels))
    }

    /// Like [`Self::extract_viewport`] but shifts the origin back inside the
    /// canvas. A region larger than the canvas is cropped to it, with the
    /// missing cells filled with `fill`.
    pub fn extract_viewport_clamped(&self, x: i32, y: i32, w: u32, h: u32, fill: u8) -> Frame {
        let max_x = self.width.saturating_sub(w) as i32;
        let max_y = self.height.saturating_sub(h) as i32;
        let (x, y) = (x.clamp(0, max_x), y.clamp(0, max_y));

        let mut frame = Frame::new(w, h, fill);
        let copy_w = w.min(self.width);
        let copy_h = h.min(self.height);
        for row in 0..copy_h {
            let src = (y as usize + row as usize) * self.width as usize + x as usize;
            let dst = row as usize * w as usize;
            frame.pixels[dst..dst + copy_w as usize].copy_from_slice(&self.pixels[src..src + copy_w as usize]);
        }
        frame
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Canvas {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 && (point.x as u32) < self.width && (point.y as u32) < self.height {
                self.pixels[point.y as usize * self.width as usize + point.x as usize] = color.luma();
            }
        }
        Ok(())
    }
}

// =============================================================================
// Frame
// =============================================================================

/// Physical-display-sized intensity bitmap handed to a transport.
///
/// Row-major, origin at the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// Intensity at or above which a pixel is lit in 1 bpp output.
pub const LIT_THRESHOLD: u8 = 128;

impl Frame {
    pub fn new(width: u32, height: u32, fill: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    pub(crate) fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        Self { width, height, pixels }
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        (x < self.width && y < self.height).then(|| self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Pack into 1 bit per pixel, rows in order, MSB first.
    ///
    /// Bits run continuously across row boundaries, so the output is
    /// `ceil(width * height / 8)` bytes (640 bytes for 128x40).
    pub fn pack_1bpp(&self) -> Vec<u8> {
        let mut packed = vec![0u8; self.pixels.len().div_ceil(8)];
        for (i, &value) in self.pixels.iter().enumerate() {
            if value >= LIT_THRESHOLD {
                packed[i / 8] |= 0x80 >> (i % 8);
            }
        }
        packed
    }
}
