//! Network throughput widget (RX/TX).

use core::fmt::Write;
use std::time::Instant;

use heapless::String;

use super::text::TextOptions;
use super::throughput::{DualSeries, DualStyle, RateMeter, render_dual};
use crate::config::{Ceiling, NetworkProperties, SpeedUnit};
use crate::error::{ConfigError, MetricError};
use crate::history::AUTO_SCALE_FLOOR;
use crate::sources::SystemProbe;
use crate::tile::Tile;

/// Bytes per second in one Mbit/s.
const BYTES_PER_MBIT: f32 = 1024.0 * 1024.0 / 8.0;

pub struct NetworkWidget {
    properties: NetworkProperties,
    options: TextOptions,
    ceiling: Ceiling,
    meter: RateMeter,
    series: DualSeries,
}

impl NetworkWidget {
    pub fn new(properties: NetworkProperties, id: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            options: properties.text_options(),
            ceiling: properties.ceiling(id)?,
            meter: RateMeter::new(),
            series: DualSeries::new(properties.history_length),
            properties,
        })
    }

    pub const fn properties(&self) -> &NetworkProperties {
        &self.properties
    }

    /// RX and TX rate histories in bytes per second.
    pub const fn series(&self) -> &DualSeries {
        &self.series
    }

    pub fn sample(&mut self, probe: &mut dyn SystemProbe, now: Instant) -> Result<(), MetricError> {
        let counters = probe.network(self.properties.interface.as_deref())?;
        let rates = self.meter.update([counters.rx_bytes, counters.tx_bytes], now);
        self.series.push(rates);
        Ok(())
    }

    pub fn render(&self, tile: &mut Tile) {
        let p = &self.properties;
        let [rx, tx] = self.series.latest();
        let rx_label = label("RX:", p.speed_unit, rx);
        let tx_label = label("TX:", p.speed_unit, tx);
        let style = DualStyle {
            mode: p.display_mode,
            options: &self.options,
            colors: [p.rx_color, p.tx_color],
            bar_border: p.bar_border,
            bar_margin: p.bar_margin,
            ceiling: self.series.ceiling(self.ceiling, BYTES_PER_MBIT, AUTO_SCALE_FLOOR),
        };
        render_dual(tile, &self.series, &style, [&rx_label, &tx_label]);
    }
}

/// `prefix` followed by the rate in `unit`, with unit-dependent precision.
fn label(prefix: &str, unit: SpeedUnit, bytes_per_sec: f32) -> String<24> {
    let value = unit.convert(f64::from(bytes_per_sec));
    let mut s = String::new();
    let _ = match unit {
        SpeedUnit::Bps | SpeedUnit::Kbps => write!(s, "{prefix}{value:.0}"),
        SpeedUnit::Mbps => write!(s, "{prefix}{value:.1}"),
        SpeedUnit::Gbps => write!(s, "{prefix}{value:.2}"),
    };
    s
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::DisplayMode;
    use crate::sources::NetCounters;

    struct Counters {
        interface: &'static str,
        total: NetCounters,
    }

    impl SystemProbe for Counters {
        fn network(&mut self, interface: Option<&str>) -> Result<NetCounters, MetricError> {
            match interface {
                Some(name) if name != self.interface => Err(MetricError::NotFound {
                    kind: "network interface",
                    name: name.to_owned(),
                }),
                _ => Ok(self.total),
            }
        }
    }

    fn probe(rx: u64, tx: u64) -> Counters {
        Counters {
            interface: "eth0",
            total: NetCounters { rx_bytes: rx, tx_bytes: tx },
        }
    }

    #[test]
    fn test_label_precision() {
        assert_eq!(label("RX:", SpeedUnit::Kbps, 1280.0).as_str(), "RX:10");
        assert_eq!(label("TX:", SpeedUnit::Mbps, 196_608.0).as_str(), "TX:1.5");
        assert_eq!(label("RX:", SpeedUnit::Gbps, 0.0).as_str(), "RX:0.00");
    }

    #[test]
    fn test_rates_from_counters() {
        let mut widget = NetworkWidget::new(NetworkProperties::default(), "net").unwrap();
        let start = Instant::now();
        widget.sample(&mut probe(1000, 0), start).unwrap();
        widget.sample(&mut probe(3048, 1024), start + Duration::from_secs(1)).unwrap();

        assert_eq!(widget.series().latest(), [2048.0, 1024.0]);
        assert_eq!(widget.series().primary.len(), 2, "First sample recorded as zero");
    }

    #[test]
    fn test_missing_interface_is_error() {
        let props = NetworkProperties {
            interface: Some("wlan9".to_owned()),
            ..NetworkProperties::default()
        };
        let mut widget = NetworkWidget::new(props, "net").unwrap();

        let err = widget.sample(&mut probe(1, 1), Instant::now()).unwrap_err();
        assert!(matches!(err, MetricError::NotFound { .. }));
        assert!(widget.series().primary.is_empty(), "No sample recorded on failure");
    }

    #[test]
    fn test_fixed_ceiling_in_mbit() {
        let props = NetworkProperties {
            display_mode: DisplayMode::BarHorizontal,
            max_speed_mbps: 1.0,
            bar_margin: 0,
            ..NetworkProperties::default()
        };
        let mut widget = NetworkWidget::new(props, "net").unwrap();
        let start = Instant::now();
        widget.sample(&mut probe(0, 0), start).unwrap();
        // 64 KiB/s is half of 1 Mbit/s.
        widget.sample(&mut probe(65_536, 0), start + Duration::from_secs(1)).unwrap();
        let mut tile = Tile::new(40, 10, 0);
        widget.render(&mut tile);

        assert!(tile.is_foreground(19, 0) && !tile.is_foreground(20, 0), "RX bar half full");
        assert!(!tile.is_foreground(0, 9), "Idle TX bar empty");
    }

    #[test]
    fn test_invalid_ceiling_rejected() {
        let props = NetworkProperties {
            max_speed_mbps: 0.0,
            ..NetworkProperties::default()
        };
        assert!(NetworkWidget::new(props, "net").is_err());
    }
}
