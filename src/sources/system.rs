//! Host metrics through `sysinfo`.

use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, Networks, RefreshKind, System};

use super::{CpuSample, DiskCounters, LedLockKeys, LockKeys, NetCounters, SystemProbe};
use crate::config::WidgetKind;
use crate::error::MetricError;

/// Interfaces excluded from the all-interfaces sum.
fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0") || name.starts_with("Loopback")
}

/// [`SystemProbe`] over `sysinfo`, refreshing only what its widget reads.
pub struct SysinfoProbe {
    system: System,
    networks: Option<Networks>,
    disks: Option<Disks>,
    leds: LedLockKeys,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            networks: None,
            disks: None,
            leds: LedLockKeys::default(),
        }
    }

    /// Probe pre-warmed for one widget type.
    ///
    /// CPU usage is a delta between two refreshes, so the first refresh
    /// happens here rather than on the first tick.
    pub fn for_kind(kind: WidgetKind) -> Self {
        let mut probe = Self::new();
        match kind {
            WidgetKind::Cpu => {
                probe.system = System::new_with_specifics(RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()));
            }
            WidgetKind::Memory => {
                probe.system =
                    System::new_with_specifics(RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()));
            }
            WidgetKind::Network => probe.networks = Some(Networks::new_with_refreshed_list()),
            WidgetKind::Disk => probe.disks = Some(Disks::new_with_refreshed_list()),
            WidgetKind::Clock | WidgetKind::Keyboard => {}
        }
        probe
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn cpu(&mut self) -> Result<CpuSample, MetricError> {
        self.system.refresh_cpu_usage();
        let cpus = self.system.cpus();
        if cpus.is_empty() {
            return Err(MetricError::unavailable("cpu", "no processors reported"));
        }
        Ok(CpuSample {
            total: self.system.global_cpu_usage(),
            per_core: cpus.iter().map(sysinfo::Cpu::cpu_usage).collect(),
        })
    }

    fn memory(&mut self) -> Result<f32, MetricError> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return Err(MetricError::unavailable("memory", "total memory reported as zero"));
        }
        Ok(self.system.used_memory() as f32 / total as f32 * 100.0)
    }

    fn network(&mut self, interface: Option<&str>) -> Result<NetCounters, MetricError> {
        let networks = self.networks.get_or_insert_with(Networks::new_with_refreshed_list);
        networks.refresh(true);

        match interface {
            Some(name) => networks
                .get(name)
                .map(|data| NetCounters {
                    rx_bytes: data.total_received(),
                    tx_bytes: data.total_transmitted(),
                })
                .ok_or_else(|| MetricError::NotFound {
                    kind: "network interface",
                    name: name.to_owned(),
                }),
            None => Ok(networks
                .iter()
                .filter(|(name, _)| !is_loopback(name))
                .fold(NetCounters::default(), |acc, (_, data)| NetCounters {
                    rx_bytes: acc.rx_bytes.saturating_add(data.total_received()),
                    tx_bytes: acc.tx_bytes.saturating_add(data.total_transmitted()),
                })),
        }
    }

    fn disk(&mut self, disk: Option<&str>) -> Result<DiskCounters, MetricError> {
        let disks = self.disks.get_or_insert_with(Disks::new_with_refreshed_list);
        disks.refresh(true);

        let found = match disk {
            Some(name) => disks.list().iter().find(|d| d.name().to_string_lossy() == name),
            None => disks.list().first(),
        };
        let found = found.ok_or_else(|| match disk {
            Some(name) => MetricError::NotFound {
                kind: "disk",
                name: name.to_owned(),
            },
            None => MetricError::unavailable("disk", "no disks reported"),
        })?;

        let usage = found.usage();
        Ok(DiskCounters {
            read_bytes: usage.total_read_bytes,
            written_bytes: usage.total_written_bytes,
        })
    }

    fn lock_keys(&mut self) -> Result<LockKeys, MetricError> {
        self.leds.read()
    }
}
