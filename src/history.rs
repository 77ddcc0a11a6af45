//! Fixed-capacity sample history for graph and auto-scaled bar modes.
//!
//! Each metric widget keeps one [`History`] per plotted series. Samples are
//! kept in insertion order; once the buffer is full the oldest sample is
//! dropped for every new one (FIFO, no growth).
//!
//! # Auto-Scaling
//!
//! Widgets configured with a negative ceiling (`max_speed_mbps = -1`) scale
//! against [`History::auto_ceiling`] of the current window, floored (at
//! [`AUTO_SCALE_FLOOR`] for network rates) so an idle link does not blow tiny
//! values up to full height.

use std::collections::VecDeque;

/// Default number of samples kept per series.
pub const DEFAULT_HISTORY_LENGTH: usize = 30;

/// Upper bound on `history_length`.
pub const MAX_HISTORY_LENGTH: usize = 4096;

/// Lowest ceiling used when auto-scaling against an idle history.
pub const AUTO_SCALE_FLOOR: f32 = 1.0;

/// Bounded FIFO of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl History {
    /// Create an empty history, capacity clamped to `1..=MAX_HISTORY_LENGTH`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_LENGTH);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, value: f32) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    /// Samples oldest first.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    /// Largest sample in the window, or `None` when empty.
    pub fn max(&self) -> Option<f32> {
        self.samples.iter().copied().reduce(f32::max)
    }

    /// Ceiling to scale against: the window maximum, at least `floor`.
    pub fn auto_ceiling(&self, floor: f32) -> f32 {
        self.max().unwrap_or(0.0).max(floor)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LENGTH)
    }
}
