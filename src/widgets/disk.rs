//! Disk throughput widget (read/write).

use core::fmt::Write;
use std::time::Instant;

use heapless::String;

use super::text::TextOptions;
use super::throughput::{DualSeries, DualStyle, RateMeter, render_dual};
use crate::config::{Ceiling, DiskProperties};
use crate::error::{ConfigError, MetricError};
use crate::sources::SystemProbe;
use crate::tile::Tile;

const BYTES_PER_MB: f32 = 1024.0 * 1024.0;

pub struct DiskWidget {
    properties: DiskProperties,
    options: TextOptions,
    ceiling: Ceiling,
    meter: RateMeter,
    series: DualSeries,
}

impl DiskWidget {
    pub fn new(properties: DiskProperties, id: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            options: properties.text_options(),
            ceiling: properties.ceiling(id)?,
            meter: RateMeter::new(),
            series: DualSeries::new(properties.history_length),
            properties,
        })
    }

    pub const fn properties(&self) -> &DiskProperties {
        &self.properties
    }

    /// Read and write rate histories in bytes per second.
    pub const fn series(&self) -> &DualSeries {
        &self.series
    }

    pub fn sample(&mut self, probe: &mut dyn SystemProbe, now: Instant) -> Result<(), MetricError> {
        let counters = probe.disk(self.properties.disk_name.as_deref())?;
        let rates = self.meter.update([counters.read_bytes, counters.written_bytes], now);
        self.series.push(rates);
        Ok(())
    }

    pub fn render(&self, tile: &mut Tile) {
        let p = &self.properties;
        let [read, write] = self.series.latest();
        let read_label = label("R:", read);
        let write_label = label("W:", write);
        let style = DualStyle {
            mode: p.display_mode,
            options: &self.options,
            colors: [p.read_color, p.write_color],
            bar_border: p.bar_border,
            bar_margin: p.bar_margin,
            // Auto-scaling never goes below 1 MB/s.
            ceiling: self.series.ceiling(self.ceiling, BYTES_PER_MB, BYTES_PER_MB),
        };
        render_dual(tile, &self.series, &style, [&read_label, &write_label]);
    }
}

/// Human-readable rate with a `G`/`M`/`K` suffix.
fn label(prefix: &str, bytes_per_sec: f32) -> String<24> {
    let mb = bytes_per_sec / BYTES_PER_MB;
    let mut s = String::new();
    let _ = if mb >= 1000.0 {
        write!(s, "{prefix}{:.1}G", mb / 1024.0)
    } else if mb >= 1.0 {
        write!(s, "{prefix}{mb:.1}M")
    } else {
        write!(s, "{prefix}{:.0}K", bytes_per_sec / 1024.0)
    };
    s
}
