//! CPU usage widget.
//!
//! With `per_core` unset the widget behaves like the memory gauge over the
//! total usage. With `per_core` set, each core gets its own value:
//!
//! | Mode | Per-core layout |
//! |------|-----------------|
//! | text | near-square grid of `NN%` cells |
//! | bar_horizontal | one bar per row, `bar_margin` apart |
//! | bar_vertical | one bar per column, `bar_margin` apart |
//! | graph | overlaid polylines, no fill |

use super::primitives::{draw_bar_horizontal, draw_bar_vertical, draw_graph, fraction, split_area};
use super::text::{TextOptions, draw_grid};
use super::{percent_text, render_percent};
use crate::config::{CpuProperties, DisplayMode};
use crate::error::MetricError;
use crate::history::History;
use crate::sources::SystemProbe;
use crate::tile::Tile;

pub struct CpuWidget {
    properties: CpuProperties,
    options: TextOptions,
    total: History,
    per_core: Vec<History>,
}

impl CpuWidget {
    pub fn new(properties: CpuProperties) -> Self {
        Self {
            options: properties.text_options(),
            total: History::new(properties.history_length),
            per_core: Vec::new(),
            properties,
        }
    }

    pub const fn properties(&self) -> &CpuProperties {
        &self.properties
    }

    pub const fn total(&self) -> &History {
        &self.total
    }

    pub fn cores(&self) -> &[History] {
        &self.per_core
    }

    pub fn sample(&mut self, probe: &mut dyn SystemProbe) -> Result<(), MetricError> {
        let sample = probe.cpu()?;
        self.total.push(sample.total);

        if !self.properties.per_core {
            return Ok(());
        }
        let shown = match self.properties.max_cores {
            0 => sample.per_core.len(),
            max => sample.per_core.len().min(max),
        };
        // Hot-plugged cores change the series count, old windows no longer line up.
        if self.per_core.len() != shown {
            self.per_core = (0..shown).map(|_| History::new(self.properties.history_length)).collect();
        }
        for (history, usage) in self.per_core.iter_mut().zip(&sample.per_core) {
            history.push(*usage);
        }
        Ok(())
    }

    pub fn render(&self, tile: &mut Tile) {
        let p = &self.properties;
        if !p.per_core {
            render_percent(tile, p.display_mode, &self.options, &self.total, p.fill_color, p.bar_border);
            return;
        }
        if self.per_core.is_empty() {
            return;
        }

        let area = self.options.content_area(tile.width(), tile.height());
        let latest = |history: &History| history.latest().unwrap_or(0.0);
        match p.display_mode {
            DisplayMode::Text => {
                let labels: Vec<_> = self.per_core.iter().map(|h| percent_text(latest(h))).collect();
                let cells: Vec<&str> = labels.iter().map(|s| s.as_str()).collect();
                draw_grid(tile, &cells, p.fill_color, self.options.font, area);
            }
            DisplayMode::BarHorizontal => {
                let slices = split_area(area, self.per_core.len(), p.bar_margin, false);
                for (slice, history) in slices.into_iter().zip(&self.per_core) {
                    let level = fraction(latest(history), 100.0);
                    draw_bar_horizontal(tile, slice, level, p.fill_color, p.bar_border);
                }
            }
            DisplayMode::BarVertical => {
                let slices = split_area(area, self.per_core.len(), p.bar_margin, true);
                for (slice, history) in slices.into_iter().zip(&self.per_core) {
                    let level = fraction(latest(history), 100.0);
                    draw_bar_vertical(tile, slice, level, p.fill_color, p.bar_border);
                }
            }
            DisplayMode::Graph => {
                for history in &self.per_core {
                    draw_graph(tile, area, history, 100.0, p.fill_color, None);
                }
            }
        }
    }
}
