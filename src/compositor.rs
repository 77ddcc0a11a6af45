//! Frame composition and paced delivery.
//!
//! On every tick the compositor:
//!
//! 1. snapshots every widget's published tile (no lock held afterwards),
//! 2. clears the canvas to the display background,
//! 3. blits the tiles in ascending z-order, drawing each widget's border
//!    right after its content,
//! 4. extracts the physical viewport and hands it to the transport, unless
//!    nothing changed since the last successful delivery.
//!
//! Widgets whose rect does not touch the viewport are skipped, since none
//! of their pixels can reach the frame.
//!
//! # Pacing
//!
//! Deadlines advance by one period per frame. A loop that falls more than a
//! full period behind (suspended process, slow transport) resynchronizes to
//! `now + period` instead of bursting out the missed frames.

use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_graphics::prelude::Point;
use tracing::{debug, info, info_span, trace, warn};

use crate::canvas::{Canvas, Frame};
use crate::error::{Chain, TransportError};
use crate::layout::{Rect, Style, Viewport};
use crate::shutdown::Shutdown;
use crate::stats::{FrameStats, STATS_LOG_INTERVAL};
use crate::tile::TileSlot;
use crate::transport::Transport;

/// Minimum time between two transport failure log lines.
pub const TRANSPORT_LOG_WINDOW: Duration = Duration::from_secs(5);

/// One widget as seen by the compositor.
#[derive(Clone)]
pub struct Layer {
    pub id: String,
    pub rect: Rect,
    pub style: Style,
    pub slot: Arc<TileSlot>,
}

/// What happened to the frame of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Delivered,
    /// No tile changed since the last delivered frame.
    Deduplicated,
    /// The transport failed; the next tick delivers again.
    Failed,
    /// Shutdown was requested after composing; nothing was sent.
    Abandoned,
}

// =============================================================================
// Transport Error Throttle
// =============================================================================

/// Logs transport failures at most once per window.
#[derive(Debug)]
struct FailureLog {
    window: Duration,
    last_logged: Option<Instant>,
    suppressed: u64,
    failing: bool,
}

impl FailureLog {
    const fn new(window: Duration) -> Self {
        Self {
            window,
            last_logged: None,
            suppressed: 0,
            failing: false,
        }
    }

    fn failure(&mut self, now: Instant, err: &TransportError) {
        self.failing = true;
        let due = self
            .last_logged
            .is_none_or(|last| now.saturating_duration_since(last) >= self.window);
        if due {
            warn!(error = %Chain(err), suppressed = self.suppressed, "frame delivery failed");
            self.last_logged = Some(now);
            self.suppressed = 0;
        } else {
            self.suppressed += 1;
        }
    }

    fn success(&mut self) {
        if self.failing {
            info!(suppressed = self.suppressed, "frame delivery recovered");
            self.failing = false;
            self.suppressed = 0;
            self.last_logged = None;
        }
    }
}

// =============================================================================
// Compositor
// =============================================================================

pub struct Compositor {
    canvas: Canvas,
    background: u8,
    viewport: Viewport,
    layers: Vec<Layer>,
    dedup: bool,
    /// Slot generations of the last successfully delivered frame.
    delivered: Option<Vec<u64>>,
    stats: FrameStats,
    failures: FailureLog,
}

impl Compositor {
    /// `layers` must already be in ascending z-order.
    pub fn new(canvas_size: (u32, u32), background: u8, viewport: Viewport, layers: Vec<Layer>) -> Self {
        Self {
            canvas: Canvas::new(canvas_size.0, canvas_size.1, background),
            background,
            viewport,
            layers,
            dedup: true,
            delivered: None,
            stats: FrameStats::new(),
            failures: FailureLog::new(TRANSPORT_LOG_WINDOW),
        }
    }

    #[must_use]
    pub const fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub const fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Compose the current tiles onto the canvas.
    ///
    /// Returns the slot generations the canvas was built from.
    pub fn compose(&mut self) -> Vec<u64> {
        let started = Instant::now();
        let v = self.viewport;
        let snapshots: Vec<_> = self.layers.iter().map(|layer| layer.slot.snapshot()).collect();

        self.canvas.clear(self.background);
        for (layer, (tile, _)) in self.layers.iter().zip(&snapshots) {
            if !layer.rect.intersects(v.x, v.y, v.width, v.height) {
                trace!(layer = %layer.id, "outside the viewport, skipped");
                continue;
            }
            self.canvas.blit(tile, Point::new(layer.rect.x, layer.rect.y), &layer.style);
            if layer.style.border {
                self.canvas.draw_border(layer.rect, layer.style.border_color);
            }
        }

        self.stats.record_compose(started.elapsed());
        snapshots.into_iter().map(|(_, generation)| generation).collect()
    }

    /// Physical frame from the current canvas.
    pub fn frame(&self) -> Frame {
        let v = self.viewport;
        self.canvas
            .extract_viewport(v.x, v.y, v.width, v.height)
            .unwrap_or_else(|err| {
                debug!(error = %err, "viewport outside the canvas, clamping");
                self.canvas.extract_viewport_clamped(v.x, v.y, v.width, v.height, self.background)
            })
    }

    /// Compose and, if anything changed, deliver one frame.
    pub fn tick(&mut self, transport: &mut dyn Transport, shutdown: &Shutdown) -> FrameOutcome {
        let generations = self.compose();

        if self.dedup && self.delivered.as_ref() == Some(&generations) {
            self.stats.inc_deduplicated();
            return FrameOutcome::Deduplicated;
        }
        if shutdown.is_requested() {
            return FrameOutcome::Abandoned;
        }

        let frame = self.frame();
        match transport.send(&frame) {
            Ok(()) => {
                self.stats.inc_delivered();
                self.failures.success();
                self.delivered = Some(generations);
                FrameOutcome::Delivered
            }
            Err(err) => {
                self.stats.inc_transport_errors();
                self.failures.failure(Instant::now(), &err);
                self.delivered = None;
                FrameOutcome::Failed
            }
        }
    }

    /// Run the paced compositor loop until shutdown is requested.
    pub fn run(mut self, transport: &mut dyn Transport, shutdown: &Shutdown, period: Duration) -> FrameStats {
        let span = info_span!("compositor");
        let _enter = span.enter();
        info!(
            layers = self.layers.len(),
            period_ms = period.as_millis() as u64,
            canvas_w = self.canvas.width(),
            canvas_h = self.canvas.height(),
            "compositor started"
        );

        let mut next_frame = Instant::now();
        let mut last_stats = Instant::now();
        loop {
            let now = Instant::now();
            let stopping = if next_frame > now {
                shutdown.wait_timeout(next_frame - now)
            } else {
                shutdown.is_requested()
            };
            if stopping {
                break;
            }

            self.tick(transport, shutdown);

            next_frame += period;
            let now = Instant::now();
            if now > next_frame + period {
                debug!(behind_ms = (now - next_frame).as_millis() as u64, "compositor fell behind, resyncing");
                next_frame = now + period;
            }
            if now.saturating_duration_since(last_stats) >= STATS_LOG_INTERVAL {
                self.stats.log_debug();
                last_stats = now;
            }
        }

        self.stats.log_final();
        self.stats
    }
}
