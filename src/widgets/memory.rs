//! Memory usage widget.

use super::render_percent;
use super::text::TextOptions;
use crate::config::MemoryProperties;
use crate::error::MetricError;
use crate::history::History;
use crate::sources::SystemProbe;
use crate::tile::Tile;

pub struct MemoryWidget {
    properties: MemoryProperties,
    options: TextOptions,
    history: History,
}

impl MemoryWidget {
    pub fn new(properties: MemoryProperties) -> Self {
        Self {
            options: properties.text_options(),
            history: History::new(properties.history_length),
            properties,
        }
    }

    pub const fn properties(&self) -> &MemoryProperties {
        &self.properties
    }

    pub const fn history(&self) -> &History {
        &self.history
    }

    pub fn sample(&mut self, probe: &mut dyn SystemProbe) -> Result<(), MetricError> {
        let used = probe.memory()?;
        self.history.push(used);
        Ok(())
    }

    pub fn render(&self, tile: &mut Tile) {
        let p = &self.properties;
        render_percent(tile, p.display_mode, &self.options, &self.history, p.fill_color, p.bar_border);
    }
}
