//! Shared machinery for the two-series throughput widgets (network, disk).
//!
//! Probes report cumulative byte counters. [`RateMeter`] turns consecutive
//! readings into bytes per second using the widget's own sample instants;
//! the first reading and any counter regression (interface reset, wrap)
//! produce a rate of zero.
//!
//! Both series are always rendered together:
//!
//! | Mode | Layout |
//! |------|--------|
//! | text | two stacked lines, 2 px apart |
//! | bar_horizontal | primary bar on top, secondary below |
//! | bar_vertical | primary bar left, secondary right |
//! | graph | primary polyline with fill, secondary polyline on top |

use std::time::Instant;

use super::primitives::{draw_bar_horizontal, draw_bar_vertical, draw_graph, fraction, split_area};
use super::text::{TextOptions, draw_lines};
use crate::config::{Ceiling, DisplayMode};
use crate::history::History;
use crate::tile::Tile;

/// Gap between the two text lines.
const LINE_SPACING: u32 = 2;

/// Converts cumulative counters into per-second rates.
#[derive(Debug, Default)]
pub struct RateMeter {
    previous: Option<([u64; 2], Instant)>,
}

impl RateMeter {
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Feed a counter pair, returning the rates since the previous one.
    pub fn update(&mut self, counters: [u64; 2], now: Instant) -> [f64; 2] {
        let rates = match self.previous {
            Some((prev, at)) => {
                let elapsed = now.saturating_duration_since(at).as_secs_f64();
                if elapsed > 0.0 {
                    [0, 1].map(|i| counters[i].saturating_sub(prev[i]) as f64 / elapsed)
                } else {
                    [0.0; 2]
                }
            }
            None => [0.0; 2],
        };
        self.previous = Some((counters, now));
        rates
    }
}

/// Two rate histories in bytes per second.
#[derive(Debug, Clone)]
pub struct DualSeries {
    pub primary: History,
    pub secondary: History,
}

impl DualSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            primary: History::new(capacity),
            secondary: History::new(capacity),
        }
    }

    pub fn push(&mut self, rates: [f64; 2]) {
        self.primary.push(rates[0] as f32);
        self.secondary.push(rates[1] as f32);
    }

    /// Latest rates, zero before the first sample.
    pub fn latest(&self) -> [f32; 2] {
        [
            self.primary.latest().unwrap_or(0.0),
            self.secondary.latest().unwrap_or(0.0),
        ]
    }

    /// Bar and graph ceiling in bytes per second.
    ///
    /// Fixed ceilings are multiplied by `bytes_per_unit`; auto ceilings use
    /// the larger window maximum, never below `floor`.
    pub fn ceiling(&self, ceiling: Ceiling, bytes_per_unit: f32, floor: f32) -> f32 {
        match ceiling {
            Ceiling::Fixed(value) => value * bytes_per_unit,
            Ceiling::Auto => self.primary.auto_ceiling(floor).max(self.secondary.auto_ceiling(floor)),
        }
    }
}

/// Rendering settings for a [`DualSeries`].
pub struct DualStyle<'a> {
    pub mode: DisplayMode,
    pub options: &'a TextOptions,
    pub colors: [u8; 2],
    pub bar_border: bool,
    pub bar_margin: u32,
    /// Scale ceiling in bytes per second.
    pub ceiling: f32,
}

/// Render both series. `labels` are only used in text mode.
pub fn render_dual(tile: &mut Tile, series: &DualSeries, style: &DualStyle<'_>, labels: [&str; 2]) {
    let area = style.options.content_area(tile.width(), tile.height());
    let latest = series.latest();
    let [primary, secondary] = style.colors;

    match style.mode {
        DisplayMode::Text => {
            draw_lines(tile, &[(labels[0], primary), (labels[1], secondary)], LINE_SPACING, style.options, area);
        }
        DisplayMode::BarHorizontal | DisplayMode::BarVertical => {
            let vertical = style.mode == DisplayMode::BarVertical;
            let slices = split_area(area, 2, style.bar_margin, vertical);
            for ((slice, value), color) in slices.into_iter().zip(latest).zip(style.colors) {
                let filled = fraction(value, style.ceiling);
                if vertical {
                    draw_bar_vertical(tile, slice, filled, color, style.bar_border);
                } else {
                    draw_bar_horizontal(tile, slice, filled, color, style.bar_border);
                }
            }
        }
        DisplayMode::Graph => {
            draw_graph(tile, area, &series.primary, style.ceiling, primary, Some(primary / 3));
            draw_graph(tile, area, &series.secondary, style.ceiling, secondary, None);
        }
    }
}
