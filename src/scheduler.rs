//! Per-widget scheduling units.
//!
//! Every enabled widget runs in its own [`WidgetRuntime`], driven by its own
//! thread. A unit wakes at least once per compositor period, re-evaluates
//! whether its widget is due ([`WidgetRuntime::poll`]), and only then samples
//! and renders:
//!
//! ```text
//!   ┌──────┐  now - last_update ≥ interval  ┌─────┐  sample + render  ┌───────────┐
//!   │ Idle │ ─────────────────────────────► │ Due │ ────────────────► │ Rendering │
//!   └──────┘                                └─────┘                   └───────────┘
//!      ▲                                                                    │
//!      └──────────── publish tile (or keep the last one), last_update = now ┘
//! ```
//!
//! # Failure Handling
//!
//! A [`MetricError`](crate::error::MetricError) leaves the widget state and
//! the published tile untouched. The first failure of an outage logs a
//! warning, recovery logs once at info level, and everything in between is
//! silent. The failed attempt still counts as an update, so an unavailable
//! source is retried at the widget's own cadence rather than every tick.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, info_span, trace, warn};

use crate::config::WidgetSpec;
use crate::error::ConfigError;
use crate::shutdown::Shutdown;
use crate::sources::SystemProbe;
use crate::tile::{Tile, TileSlot};
use crate::widgets::{Tick, Widget};

/// Shortest sleep between two ticks of one unit.
const MIN_WAIT: Duration = Duration::from_millis(5);

/// Scheduling state of one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Idle,
    Due,
    Rendering,
}

/// Result of one scheduler tick for one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Interval not elapsed yet; the published tile is reused.
    Skipped,
    /// A new tile was published with this generation.
    Rendered(u64),
    /// The data source failed; the last good tile stays published.
    Stale,
}

/// Mutable state owned by one scheduling unit.
pub struct WidgetRuntime {
    id: String,
    widget: Widget,
    probe: Box<dyn SystemProbe>,
    width: u32,
    height: u32,
    background: u8,
    interval: Duration,
    last_update: Option<Instant>,
    state: UnitState,
    in_outage: bool,
    slot: Arc<TileSlot>,
}

impl WidgetRuntime {
    /// Initialise the widget and its tile slot.
    ///
    /// The slot starts out holding a blank background tile, so the
    /// compositor has something to draw before the first update.
    pub fn new(spec: &WidgetSpec, probe: Box<dyn SystemProbe>) -> Result<Self, ConfigError> {
        let widget = Widget::init(spec)?;
        let (width, height) = (spec.rect.w.max(1) as u32, spec.rect.h.max(1) as u32);
        let background = spec.style.background_color;

        Ok(Self {
            id: spec.id.clone(),
            interval: widget.preferred_update_interval(),
            widget,
            probe,
            width,
            height,
            background,
            last_update: None,
            slot: Arc::new(TileSlot::new(Tile::new(width, height, background))),
            state: UnitState::Idle,
            in_outage: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Shared handle read by the compositor.
    pub fn slot(&self) -> Arc<TileSlot> {
        Arc::clone(&self.slot)
    }

    pub const fn state(&self) -> UnitState {
        self.state
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub const fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    /// A widget that never updated is always due.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_update
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Time left until the widget becomes due.
    pub fn until_due(&self, now: Instant) -> Duration {
        self.last_update.map_or(Duration::ZERO, |last| {
            (last + self.interval).saturating_duration_since(now)
        })
    }

    /// Move an idle unit to `Due` once its interval has elapsed.
    ///
    /// A unit that is already `Due` stays due until the next [`tick`](Self::tick).
    pub fn poll(&mut self, now: Instant) -> UnitState {
        if self.state == UnitState::Idle && self.is_due(now) {
            trace!(widget = %self.id, "idle -> due");
            self.state = UnitState::Due;
        }
        self.state
    }

    /// Re-evaluate due-ness and update the widget if needed.
    pub fn tick(&mut self, tick: &Tick) -> TickOutcome {
        if self.poll(tick.instant) != UnitState::Due {
            return TickOutcome::Skipped;
        }

        trace!(widget = %self.id, "due -> rendering");
        self.state = UnitState::Rendering;
        let outcome = match self.widget.sample(self.probe.as_mut(), tick) {
            Ok(()) => {
                if self.in_outage {
                    info!(widget = %self.id, "data source recovered");
                    self.in_outage = false;
                }
                let mut tile = Tile::new(self.width, self.height, self.background);
                self.widget.render(&mut tile);
                let generation = self.slot.publish(Arc::new(tile));
                trace!(widget = %self.id, generation, "tile published");
                TickOutcome::Rendered(generation)
            }
            Err(err) => {
                if !self.in_outage {
                    warn!(widget = %self.id, error = %err, "metric unavailable, keeping last tile");
                    self.in_outage = true;
                }
                TickOutcome::Stale
            }
        };
        self.last_update = Some(tick.instant);
        trace!(widget = %self.id, ?outcome, "rendering -> idle");
        self.state = UnitState::Idle;
        outcome
    }

    /// Drive the unit until shutdown is requested.
    ///
    /// The unit wakes at least every `tick_period`, so a shutdown request or
    /// a due widget is noticed within one compositor period.
    pub fn run(mut self, shutdown: &Shutdown, tick_period: Duration) {
        let span = info_span!("widget", id = %self.id);
        let _enter = span.enter();
        debug!(interval_ms = self.interval.as_millis() as u64, "unit started");

        while !shutdown.is_requested() {
            self.tick(&Tick::now());
            let wait = self.until_due(Instant::now()).clamp(MIN_WAIT, tick_period.max(MIN_WAIT));
            if shutdown.wait_timeout(wait) {
                break;
            }
        }
        debug!("unit stopped");
    }
}

/// Start `runtime` on its own named thread.
pub fn spawn_unit(runtime: WidgetRuntime, shutdown: Shutdown, tick_period: Duration) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("widget-{}", runtime.id))
        .spawn(move || runtime.run(&shutdown, tick_period))
}
