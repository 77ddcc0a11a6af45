//! Widget variants and their shared rendering contract.
//!
//! The variant set is closed: [`Widget`] is an enum over one state struct per
//! widget type, dispatched through three operations:
//!
//! | Operation | Does |
//! |-----------|------|
//! | [`Widget::preferred_update_interval`] | widget-declared cadence |
//! | [`Widget::sample`] | read the data source, advance history buffers |
//! | [`Widget::render`] | draw current state into a fresh [`Tile`] |
//!
//! A widget never touches the canvas or another widget's state. Sampling
//! failures leave the widget state untouched, so the scheduler can keep the
//! last good tile on screen.
//!
//! # Display Modes
//!
//! Metric widgets (CPU, memory, network, disk) support `text`,
//! `bar_horizontal`, `bar_vertical` and `graph`. Every mode keeps its
//! history updated, so switching modes or auto-scaling always has data.

pub mod clock;
pub mod cpu;
pub mod disk;
pub mod keyboard;
pub mod memory;
pub mod network;
pub mod primitives;
pub mod text;
pub mod throughput;

use core::fmt::Write;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use heapless::String;

pub use self::clock::ClockWidget;
pub use self::cpu::CpuWidget;
pub use self::disk::DiskWidget;
pub use self::keyboard::KeyboardWidget;
pub use self::memory::MemoryWidget;
pub use self::network::NetworkWidget;
use self::primitives::{draw_bar_horizontal, draw_bar_vertical, draw_graph, fraction};
use self::text::{TextOptions, draw_aligned};
use crate::config::{DisplayMode, WidgetProperties, WidgetSpec};
use crate::error::{ConfigError, MetricError};
use crate::history::History;
use crate::sources::SystemProbe;
use crate::tile::Tile;

/// Sampling instant handed to widgets.
///
/// Carries both a monotonic instant (rate computations) and wall-clock time
/// (the clock widget), captured together.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub instant: Instant,
    pub wall: DateTime<Local>,
}

impl Tick {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Local::now(),
        }
    }

    pub const fn at(instant: Instant, wall: DateTime<Local>) -> Self {
        Self { instant, wall }
    }
}

// =============================================================================
// Widget
// =============================================================================

pub enum Widget {
    Clock(ClockWidget),
    Cpu(CpuWidget),
    Memory(MemoryWidget),
    Network(NetworkWidget),
    Disk(DiskWidget),
    Keyboard(KeyboardWidget),
}

impl Widget {
    /// Build the widget state for `spec`.
    pub fn init(spec: &WidgetSpec) -> Result<Self, ConfigError> {
        let background = spec.style.background_color;
        Ok(match &spec.properties {
            WidgetProperties::Clock(p) => Self::Clock(ClockWidget::new(p.clone(), background)),
            WidgetProperties::Cpu(p) => Self::Cpu(CpuWidget::new(p.clone())),
            WidgetProperties::Memory(p) => Self::Memory(MemoryWidget::new(p.clone())),
            WidgetProperties::Network(p) => Self::Network(NetworkWidget::new(p.clone(), &spec.id)?),
            WidgetProperties::Disk(p) => Self::Disk(DiskWidget::new(p.clone(), &spec.id)?),
            WidgetProperties::Keyboard(p) => Self::Keyboard(KeyboardWidget::new(p.clone())),
        })
    }

    pub fn preferred_update_interval(&self) -> Duration {
        match self {
            Self::Clock(w) => w.properties().update_interval(),
            Self::Cpu(w) => w.properties().update_interval(),
            Self::Memory(w) => w.properties().update_interval(),
            Self::Network(w) => w.properties().update_interval(),
            Self::Disk(w) => w.properties().update_interval(),
            Self::Keyboard(w) => w.properties().update_interval(),
        }
    }

    /// Read the data source and advance widget state.
    pub fn sample(&mut self, probe: &mut dyn SystemProbe, tick: &Tick) -> Result<(), MetricError> {
        match self {
            Self::Clock(w) => w.sample(tick),
            Self::Cpu(w) => w.sample(probe),
            Self::Memory(w) => w.sample(probe),
            Self::Network(w) => w.sample(probe, tick.instant),
            Self::Disk(w) => w.sample(probe, tick.instant),
            Self::Keyboard(w) => w.sample(probe),
        }
    }

    /// Draw the current state. `tile` arrives filled with the background.
    pub fn render(&self, tile: &mut Tile) {
        match self {
            Self::Clock(w) => w.render(tile),
            Self::Cpu(w) => w.render(tile),
            Self::Memory(w) => w.render(tile),
            Self::Network(w) => w.render(tile),
            Self::Disk(w) => w.render(tile),
            Self::Keyboard(w) => w.render(tile),
        }
    }
}

// =============================================================================
// Shared Percentage Gauge
// =============================================================================

/// `"NN%"` label for a percentage.
pub(crate) fn percent_text(value: f32) -> String<8> {
    let mut s = String::new();
    let _ = write!(s, "{:.0}%", value.clamp(0.0, 100.0));
    s
}

/// Render a single 0-100 % series in any display mode.
pub(crate) fn render_percent(
    tile: &mut Tile,
    mode: DisplayMode,
    options: &TextOptions,
    history: &History,
    color: u8,
    bordered: bool,
) {
    let area = options.content_area(tile.width(), tile.height());
    let value = history.latest().unwrap_or(0.0);
    match mode {
        DisplayMode::Text => draw_aligned(tile, &percent_text(value), color, options, area),
        DisplayMode::BarHorizontal => draw_bar_horizontal(tile, area, fraction(value, 100.0), color, bordered),
        DisplayMode::BarVertical => draw_bar_vertical(tile, area, fraction(value, 100.0), color, bordered),
        DisplayMode::Graph => draw_graph(tile, area, history, 100.0, color, Some(color / 2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClockProperties, KeyboardProperties, MemoryProperties};
    use crate::layout::Rect;

    #[test]
    fn test_percent_text() {
        assert_eq!(percent_text(42.4).as_str(), "42%");
        assert_eq!(percent_text(99.6).as_str(), "100%");
        assert_eq!(percent_text(-3.0).as_str(), "0%");
    }

    #[test]
    fn test_init_dispatches_by_properties() {
        let spec = WidgetSpec::new("m", Rect::new(0, 0, 10, 10), WidgetProperties::Memory(MemoryProperties::default()));
        assert!(matches!(Widget::init(&spec).unwrap(), Widget::Memory(_)));

        let spec = WidgetSpec::new("k", Rect::new(0, 0, 10, 10), WidgetProperties::Keyboard(KeyboardProperties::default()));
        assert!(matches!(Widget::init(&spec).unwrap(), Widget::Keyboard(_)));
    }

    #[test]
    fn test_preferred_update_interval_comes_from_properties() {
        let props = ClockProperties {
            update_interval: 60.0,
            ..ClockProperties::default()
        };
        let spec = WidgetSpec::new("date", Rect::new(0, 0, 10, 10), WidgetProperties::Clock(props));

        let widget = Widget::init(&spec).unwrap();
        assert_eq!(widget.preferred_update_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_render_percent_bar_uses_latest_sample() {
        let mut history = History::new(4);
        history.push(10.0);
        history.push(50.0);
        let options = TextOptions::new(Default::default(), 10, Default::default(), Default::default(), 0);
        let mut tile = Tile::new(20, 4, 0);

        render_percent(&mut tile, DisplayMode::BarHorizontal, &options, &history, 255, false);
        assert_eq!(tile.foreground_count(), 10 * 4, "Half of a 20 px bar, 4 rows");
    }
}
