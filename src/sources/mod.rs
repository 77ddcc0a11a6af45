//! Widget data sources.
//!
//! Every scheduling unit owns its own [`SystemProbe`], so a slow refresh
//! in one widget (disk counters on a busy system) never stalls another.
//! Probes are created through a [`ProbeFactory`], which lets tests swap in
//! scripted fakes.
//!
//! Network and disk probes report *cumulative* byte counters; widgets turn
//! them into rates using their own sample timestamps.

pub mod keyboard;
pub mod system;

use std::sync::Arc;

pub use self::keyboard::LedLockKeys;
pub use self::system::SysinfoProbe;
use crate::config::WidgetKind;
use crate::error::MetricError;

/// CPU utilisation in percent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuSample {
    pub total: f32,
    pub per_core: Vec<f32>,
}

/// Cumulative network byte counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Cumulative disk byte counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskCounters {
    pub read_bytes: u64,
    pub written_bytes: u64,
}

/// Lock key states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockKeys {
    pub caps: bool,
    pub num: bool,
    pub scroll: bool,
}

/// Point-in-time system readings.
///
/// Every method defaults to [`MetricError::Unavailable`], so a probe only
/// implements what it can actually measure.
pub trait SystemProbe: Send {
    fn cpu(&mut self) -> Result<CpuSample, MetricError> {
        Err(MetricError::unavailable("cpu", "not supported by this probe"))
    }

    /// Used memory in percent.
    fn memory(&mut self) -> Result<f32, MetricError> {
        Err(MetricError::unavailable("memory", "not supported by this probe"))
    }

    /// Counters for `interface`, or summed over all non-loopback interfaces.
    fn network(&mut self, interface: Option<&str>) -> Result<NetCounters, MetricError> {
        let _ = interface;
        Err(MetricError::unavailable("network", "not supported by this probe"))
    }

    /// Counters for `disk`, or the first disk reported.
    fn disk(&mut self, disk: Option<&str>) -> Result<DiskCounters, MetricError> {
        let _ = disk;
        Err(MetricError::unavailable("disk", "not supported by this probe"))
    }

    fn lock_keys(&mut self) -> Result<LockKeys, MetricError> {
        Err(MetricError::unavailable("lock keys", "not supported by this probe"))
    }
}

/// Creates one probe per widget unit.
pub type ProbeFactory = Arc<dyn Fn(WidgetKind) -> Box<dyn SystemProbe> + Send + Sync>;

/// Factory backed by the host system.
pub fn system_probe_factory() -> ProbeFactory {
    Arc::new(|kind| Box::new(SysinfoProbe::for_kind(kind)) as Box<dyn SystemProbe>)
}

/// Probe for widgets that need no external samples (the clock).
#[derive(Debug, Default)]
pub struct NoProbe;

impl SystemProbe for NoProbe {}
