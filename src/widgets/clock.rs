//! Clock widget: local time rendered through a strftime pattern.

use core::fmt::Write;

use heapless::String;

use super::Tick;
use super::text::{TextOptions, contrast_color, draw_aligned};
use crate::config::ClockProperties;
use crate::error::MetricError;
use crate::tile::Tile;

/// Longest formatted clock text.
const CLOCK_TEXT_CAPACITY: usize = 64;

pub struct ClockWidget {
    properties: ClockProperties,
    options: TextOptions,
    color: u8,
    text: String<CLOCK_TEXT_CAPACITY>,
}

impl ClockWidget {
    pub fn new(properties: ClockProperties, background: u8) -> Self {
        let color = properties.color.unwrap_or(contrast_color(background));
        Self {
            options: properties.text_options(),
            properties,
            color,
            text: String::new(),
        }
    }

    pub const fn properties(&self) -> &ClockProperties {
        &self.properties
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sample(&mut self, tick: &Tick) -> Result<(), MetricError> {
        let mut text = String::new();
        write!(text, "{}", tick.wall.format(&self.properties.format)).map_err(|_| {
            MetricError::unavailable(
                "clock",
                format!("`{}` does not fit in {CLOCK_TEXT_CAPACITY} bytes", self.properties.format),
            )
        })?;
        self.text = text;
        Ok(())
    }

    pub fn render(&self, tile: &mut Tile) {
        let area = self.options.content_area(tile.width(), tile.height());
        draw_aligned(tile, &self.text, self.color, &self.options, area);
    }
}
