//! Layout model and placement of widgets onto the canvas.
//!
//! # Modes
//!
//! | Mode | Canvas size | Viewport |
//! |------|-------------|----------|
//! | `basic` | display size | whole canvas |
//! | `viewport` | `virtual_width × virtual_height` (≥ display) | display-sized window at a static origin |
//!
//! # Placement Rules
//!
//! - `w ≤ 0` or `h ≤ 0` → rejected
//! - rect entirely outside the canvas → rejected
//! - rect partially outside → accepted, clipped during blit (logged once here)
//! - disabled widgets → neither placed nor rejected
//!
//! Placed widgets are sorted ascending by `z_order` with a stable sort, so
//! ties keep configuration order and compositing is deterministic.

use std::fmt;

use tracing::warn;

use crate::config::WidgetSpec;
use crate::error::{ConfigError, OutOfBounds};

// =============================================================================
// Geometry
// =============================================================================

/// Widget rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub z_order: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h, z_order: 0 }
    }

    #[must_use]
    pub const fn with_z(mut self, z_order: i32) -> Self {
        self.z_order = z_order;
        self
    }

    #[inline]
    pub const fn right(&self) -> i64 {
        self.x as i64 + self.w as i64
    }

    #[inline]
    pub const fn bottom(&self) -> i64 {
        self.y as i64 + self.h as i64
    }

    #[inline]
    pub const fn has_area(&self) -> bool {
        self.w > 0 && self.h > 0
    }

    /// Whether any pixel of the rect lies inside `width × height` at the origin.
    pub const fn intersects(&self, x: i32, y: i32, width: u32, height: u32) -> bool {
        let (ox, oy) = (x as i64, y as i64);
        self.has_area()
            && self.right() > ox
            && self.bottom() > oy
            && (self.x as i64) < ox + width as i64
            && (self.y as i64) < oy + height as i64
    }

    /// Whether the rect lies fully inside a `width × height` canvas.
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && self.right() <= width as i64 && self.bottom() <= height as i64
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@({},{}) z={}", self.w, self.h, self.x, self.y, self.z_order)
    }
}

/// Widget background and border styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub background_color: u8,
    pub border: bool,
    pub border_color: u8,
    /// 0 = background fully transparent, 255 = fully opaque.
    pub background_opacity: u8,
}

impl Style {
    pub const fn new() -> Self {
        Self {
            background_color: 0,
            border: false,
            border_color: 255,
            background_opacity: 255,
        }
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Basic,
    Viewport,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::Viewport => "viewport",
        })
    }
}

/// Physical-display-sized window into the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Move the origin so the window lies inside a `canvas_w × canvas_h` canvas.
    ///
    /// Windows larger than the canvas are pinned to the origin.
    #[must_use]
    pub fn clamped_to(self, canvas_w: u32, canvas_h: u32) -> Self {
        let max_x = canvas_w.saturating_sub(self.width) as i32;
        let max_y = canvas_h.saturating_sub(self.height) as i32;
        Self {
            x: self.x.clamp(0, max_x),
            y: self.y.clamp(0, max_y),
            ..self
        }
    }

    pub const fn contains(&self, canvas_w: u32, canvas_h: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x as i64 + self.width as i64 <= canvas_w as i64
            && self.y as i64 + self.height as i64 <= canvas_h as i64
    }

    pub const fn out_of_bounds(&self, canvas_w: u32, canvas_h: u32) -> OutOfBounds {
        OutOfBounds {
            x: self.x,
            y: self.y,
            w: self.width,
            h: self.height,
            canvas_w,
            canvas_h,
        }
    }
}

/// Resolved layout of one running configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub mode: LayoutMode,
    pub virtual_width: u32,
    pub virtual_height: u32,
    pub viewport: Viewport,
}

impl Layout {
    /// Basic mode: canvas and viewport both equal the display.
    pub const fn basic(display_width: u32, display_height: u32) -> Self {
        Self {
            mode: LayoutMode::Basic,
            virtual_width: display_width,
            virtual_height: display_height,
            viewport: Viewport {
                x: 0,
                y: 0,
                width: display_width,
                height: display_height,
            },
        }
    }

    /// Viewport mode with a canvas at least as large as the display.
    ///
    /// The origin is clamped so the viewport never leaves the canvas.
    pub fn viewport(
        display_width: u32,
        display_height: u32,
        virtual_width: u32,
        virtual_height: u32,
        origin: (i32, i32),
    ) -> Result<Self, ConfigError> {
        if virtual_width < display_width || virtual_height < display_height {
            return Err(ConfigError::InvalidLayout(format!(
                "virtual canvas {virtual_width}x{virtual_height} is smaller than the display {display_width}x{display_height}"
            )));
        }
        let requested = Viewport {
            x: origin.0,
            y: origin.1,
            width: display_width,
            height: display_height,
        };
        let viewport = requested.clamped_to(virtual_width, virtual_height);
        if viewport != requested {
            warn!(
                requested_x = origin.0,
                requested_y = origin.1,
                x = viewport.x,
                y = viewport.y,
                "viewport origin clamped into the canvas"
            );
        }
        Ok(Self {
            mode: LayoutMode::Viewport,
            virtual_width,
            virtual_height,
            viewport,
        })
    }

    #[inline]
    pub const fn canvas_size(&self) -> (u32, u32) {
        (self.virtual_width, self.virtual_height)
    }
}

// =============================================================================
// Layout Engine
// =============================================================================

/// A widget accepted for compositing.
#[derive(Debug, Clone)]
pub struct PlacedWidget {
    pub spec: WidgetSpec,
    /// Position in the configuration array.
    pub config_index: usize,
    /// Rect extends past the canvas and is clipped during blit.
    pub clipped: bool,
}

impl PlacedWidget {
    #[inline]
    pub const fn rect(&self) -> Rect {
        self.spec.rect
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NonPositiveSize,
    OutsideCanvas,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NonPositiveSize => "width and height must be positive",
            Self::OutsideCanvas => "rect lies entirely outside the canvas",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Rejection {
    pub id: String,
    pub rect: Rect,
    pub reason: RejectReason,
}

/// Result of placing a widget list.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    /// Accepted enabled widgets, z-order ascending.
    pub placed: Vec<PlacedWidget>,
    pub rejected: Vec<Rejection>,
}

impl Placement {
    /// Turn any rejection into a configuration error.
    pub fn into_result(self) -> Result<Vec<PlacedWidget>, ConfigError> {
        match self.rejected.into_iter().next() {
            Some(rejection) => Err(ConfigError::InvalidGeometry {
                id: rejection.id,
                reason: format!("{} ({})", rejection.reason, rejection.rect),
            }),
            None => Ok(self.placed),
        }
    }
}

/// Validates widget geometry against a [`Layout`] and orders widgets for compositing.
pub struct LayoutEngine {
    layout: Layout,
}

impl LayoutEngine {
    pub const fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Classify every enabled widget as placed or rejected.
    pub fn place(&self, specs: &[WidgetSpec]) -> Placement {
        let (canvas_w, canvas_h) = self.layout.canvas_size();
        let mut placement = Placement::default();

        for (config_index, spec) in specs.iter().enumerate() {
            if !spec.enabled {
                continue;
            }
            let rect = spec.rect;
            let reason = if !rect.has_area() {
                Some(RejectReason::NonPositiveSize)
            } else if !rect.intersects(0, 0, canvas_w, canvas_h) {
                Some(RejectReason::OutsideCanvas)
            } else {
                None
            };

            if let Some(reason) = reason {
                placement.rejected.push(Rejection {
                    id: spec.id.clone(),
                    rect,
                    reason,
                });
                continue;
            }

            let clipped = !rect.fits_within(canvas_w, canvas_h);
            if clipped {
                let bounds = OutOfBounds {
                    x: rect.x,
                    y: rect.y,
                    w: rect.w as u32,
                    h: rect.h as u32,
                    canvas_w,
                    canvas_h,
                };
                warn!(widget = %spec.id, "{bounds}; widget will be clipped");
            }
            placement.placed.push(PlacedWidget {
                spec: spec.clone(),
                config_index,
                clipped,
            });
        }

        placement.placed.sort_by_key(|placed| placed.spec.rect.z_order);
        placement
    }

    /// [`Self::place`], failing on the first rejected widget.
    pub fn resolve(&self, specs: &[WidgetSpec]) -> Result<Vec<PlacedWidget>, ConfigError> {
        self.place(specs).into_result()
    }
}
