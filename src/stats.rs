//! Compositor statistics.
//!
//! Tracks compose timing (min/max/exponential moving average) and delivery
//! counters. The compositor logs a summary at debug level every
//! [`STATS_LOG_INTERVAL`] and once at info level on shutdown.

use core::fmt::Write;
use std::time::{Duration, Instant};

use heapless::String;
use tracing::{debug, info};

/// Period between debug-level summaries.
pub const STATS_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// Frame counters and compose timing for one engine run.
#[derive(Debug, Clone)]
pub struct FrameStats {
    /// Frames composed onto the canvas.
    pub composed: u64,
    /// Frames accepted by the transport.
    pub delivered: u64,
    /// Frames skipped because no tile changed.
    pub deduplicated: u64,
    /// Failed deliveries.
    pub transport_errors: u64,

    /// Last compose time.
    pub compose_time_us: u32,
    pub compose_time_min_us: u32,
    pub compose_time_max_us: u32,
    compose_time_avg_us: f32,

    start_time: Instant,
}

impl FrameStats {
    /// Exponential moving average alpha.
    const EMA_ALPHA: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            composed: 0,
            delivered: 0,
            deduplicated: 0,
            transport_errors: 0,
            compose_time_us: 0,
            compose_time_min_us: u32::MAX,
            compose_time_max_us: 0,
            compose_time_avg_us: 0.0,
            start_time: Instant::now(),
        }
    }

    /// Record one composed frame.
    pub fn record_compose(&mut self, elapsed: Duration) {
        let us = u32::try_from(elapsed.as_micros()).unwrap_or(u32::MAX);
        self.compose_time_us = us;
        self.compose_time_min_us = self.compose_time_min_us.min(us);
        self.compose_time_max_us = self.compose_time_max_us.max(us);

        if self.composed == 0 {
            self.compose_time_avg_us = us as f32;
        } else {
            self.compose_time_avg_us =
                Self::EMA_ALPHA.mul_add(us as f32, (1.0 - Self::EMA_ALPHA) * self.compose_time_avg_us);
        }
        self.composed += 1;
    }

    #[inline]
    pub const fn inc_delivered(&mut self) {
        self.delivered += 1;
    }

    #[inline]
    pub const fn inc_deduplicated(&mut self) {
        self.deduplicated += 1;
    }

    #[inline]
    pub const fn inc_transport_errors(&mut self) {
        self.transport_errors += 1;
    }

    #[inline]
    pub const fn compose_time_avg_us(&self) -> u32 {
        self.compose_time_avg_us as u32
    }

    /// Smallest compose time seen, 0 before the first frame.
    #[inline]
    pub const fn compose_time_min_us(&self) -> u32 {
        if self.composed == 0 { 0 } else { self.compose_time_min_us }
    }

    #[inline]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Uptime as `HH:MM:SS`.
    pub fn uptime_string(&self) -> String<12> {
        let secs = self.uptime().as_secs();
        let mut s = String::new();
        let _ = write!(s, "{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60);
        s
    }

    /// Periodic summary.
    pub fn log_debug(&self) {
        debug!(
            uptime = %self.uptime_string(),
            composed = self.composed,
            delivered = self.delivered,
            deduplicated = self.deduplicated,
            transport_errors = self.transport_errors,
            compose_min_us = self.compose_time_min_us(),
            compose_avg_us = self.compose_time_avg_us(),
            compose_max_us = self.compose_time_max_us,
            "compositor statistics"
        );
    }

    /// Final summary on shutdown.
    pub fn log_final(&self) {
        info!(
            uptime = %self.uptime_string(),
            composed = self.composed,
            delivered = self.delivered,
            deduplicated = self.deduplicated,
            transport_errors = self.transport_errors,
            compose_avg_us = self.compose_time_avg_us(),
            compose_max_us = self.compose_time_max_us,
            "compositor stopped"
        );
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats() {
        let stats = FrameStats::new();
        assert_eq!(stats.composed, 0);
        assert_eq!(stats.compose_time_min_us(), 0, "No frames yet");
        assert_eq!(stats.compose_time_max_us, 0);
    }

    #[test]
    fn test_compose_min_max() {
        let mut stats = FrameStats::new();
        stats.record_compose(Duration::from_micros(2000));
        stats.record_compose(Duration::from_micros(1500));
        stats.record_compose(Duration::from_micros(2500));

        assert_eq!(stats.composed, 3);
        assert_eq!(stats.compose_time_us, 2500);
        assert_eq!(stats.compose_time_min_us(), 1500);
        assert_eq!(stats.compose_time_max_us, 2500);
    }

    #[test]
    fn test_compose_average_starts_at_first_frame() {
        let mut stats = FrameStats::new();
        stats.record_compose(Duration::from_micros(1000));
        assert_eq!(stats.compose_time_avg_us(), 1000);

        stats.record_compose(Duration::from_micros(2000));
        let avg = stats.compose_time_avg_us();
        assert!((1099..=1100).contains(&avg), "EMA moves 10% towards the new sample, got {avg}");
    }

    #[test]
    fn test_counters() {
        let mut stats = FrameStats::new();
        stats.inc_delivered();
        stats.inc_deduplicated();
        stats.inc_deduplicated();
        stats.inc_transport_errors();

        assert_eq!((stats.delivered, stats.deduplicated, stats.transport_errors), (1, 2, 1));
    }

    #[test]
    fn test_uptime_string_format() {
        let stats = FrameStats::new();
        let uptime = stats.uptime_string();
        assert_eq!(uptime.len(), 8);
        assert!(uptime.starts_with("00:00:"), "Fresh stats should report zero hours/minutes");
    }
}
