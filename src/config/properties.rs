//! Typed per-widget `properties` blocks.
//!
//! Each widget type has its own struct, parsed with `deny_unknown_fields`, so
//! a typo such as `"fil_color"` fails at load time instead of being silently
//! ignored. All structs share the text/update fields generated by
//! [`widget_properties!`].
//!
//! # Shared Fields
//!
//! | Field | Default | Meaning |
//! |-------|---------|---------|
//! | `update_interval` | `1.0` | seconds between samples, at least `0.01` |
//! | `font` | `profont` | `profont` or `mono` |
//! | `font_size` | `10` | nominal point size, nearest smaller font wins |
//! | `horizontal_align` | `center` | `left`, `center`, `right` |
//! | `vertical_align` | `center` | `top`, `center`, `bottom` |
//! | `padding` | `0` | pixels reserved on every edge, at most 4096 |

use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use tracing::warn;

use super::MAX_CANVAS_SIDE;
use crate::error::ConfigError;
use crate::history::{DEFAULT_HISTORY_LENGTH, MAX_HISTORY_LENGTH};
use crate::widgets::text::TextOptions;

pub const DEFAULT_UPDATE_INTERVAL: f64 = 1.0;
/// Shortest widget cadence in seconds; shorter values are raised to it.
pub const MIN_UPDATE_INTERVAL: f64 = 0.01;
pub const DEFAULT_FONT_SIZE: u32 = 10;

// =============================================================================
// Shared Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    #[default]
    #[serde(alias = "ProFont")]
    Profont,
    /// embedded-graphics built-in ASCII fonts.
    Mono,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

/// How a metric widget presents its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Text,
    BarHorizontal,
    BarVertical,
    Graph,
}

/// Unit for network throughput text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    Bps,
    #[default]
    Kbps,
    Mbps,
    Gbps,
}

impl SpeedUnit {
    /// Convert a byte rate into this unit (binary multiples of bits).
    pub fn convert(self, bytes_per_sec: f64) -> f64 {
        let bits = bytes_per_sec * 8.0;
        match self {
            Self::Bps => bits,
            Self::Kbps => bits / 1024.0,
            Self::Mbps => bits / (1024.0 * 1024.0),
            Self::Gbps => bits / (1024.0 * 1024.0 * 1024.0),
        }
    }
}

/// Scale ceiling for bars and graphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ceiling {
    /// Scale against the largest sample in the history window.
    Auto,
    Fixed(f32),
}

// =============================================================================
// Property Structs
// =============================================================================

macro_rules! widget_properties {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty = $default:expr ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Deserialize)]
        #[serde(default, deny_unknown_fields)]
        pub struct $name {
            pub update_interval: f64,
            pub font: FontFamily,
            pub font_size: u32,
            pub horizontal_align: HorizontalAlign,
            pub vertical_align: VerticalAlign,
            pub padding: u32,
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    update_interval: DEFAULT_UPDATE_INTERVAL,
                    font: FontFamily::default(),
                    font_size: DEFAULT_FONT_SIZE,
                    horizontal_align: HorizontalAlign::default(),
                    vertical_align: VerticalAlign::default(),
                    padding: 0,
                    $( $field: $default, )*
                }
            }
        }

        impl $name {
            /// Widget-declared cadence, never below [`MIN_UPDATE_INTERVAL`].
            pub fn update_interval(&self) -> Duration {
                Duration::try_from_secs_f64(self.update_interval.max(MIN_UPDATE_INTERVAL))
                    .unwrap_or(Duration::from_secs_f64(DEFAULT_UPDATE_INTERVAL))
            }

            pub fn text_options(&self) -> TextOptions {
                TextOptions::new(self.font, self.font_size, self.horizontal_align, self.vertical_align, self.padding)
            }

            fn validate_common(&self, id: &str) -> Result<(), ConfigError> {
                if !self.update_interval.is_finite() || self.update_interval <= 0.0 {
                    return Err(invalid(id, "update_interval", "must be a positive number of seconds"));
                }
                if self.update_interval < MIN_UPDATE_INTERVAL {
                    warn!(
                        widget = id,
                        requested = self.update_interval,
                        applied = MIN_UPDATE_INTERVAL,
                        "update_interval below the minimum, raising"
                    );
                }
                if self.padding > MAX_CANVAS_SIDE {
                    return Err(invalid(id, "padding", format!("must not exceed {MAX_CANVAS_SIDE} px")));
                }
                Ok(())
            }
        }
    };
}

widget_properties! {
    /// Clock widget.
    pub struct ClockProperties {
        /// strftime-style pattern.
        pub format: String = String::from("%H:%M:%S"),
        /// Text intensity. Defaults to the contrast of the background.
        pub color: Option<u8> = None,
    }
}

widget_properties! {
    /// CPU usage widget.
    pub struct CpuProperties {
        pub display_mode: DisplayMode = DisplayMode::Text,
        pub per_core: bool = false,
        /// Limit on cores shown with `per_core`; 0 shows all.
        pub max_cores: usize = 0,
        pub fill_color: u8 = 255,
        pub bar_border: bool = false,
        /// Gap between per-core bars.
        pub bar_margin: u32 = 1,
        pub history_length: usize = DEFAULT_HISTORY_LENGTH,
    }
}

widget_properties! {
    /// Memory usage widget.
    pub struct MemoryProperties {
        pub display_mode: DisplayMode = DisplayMode::Text,
        pub fill_color: u8 = 255,
        pub bar_border: bool = false,
        pub history_length: usize = DEFAULT_HISTORY_LENGTH,
    }
}

widget_properties! {
    /// Network throughput widget.
    pub struct NetworkProperties {
        /// Interface name; `None` sums every non-loopback interface.
        pub interface: Option<String> = None,
        pub display_mode: DisplayMode = DisplayMode::Text,
        /// Scale ceiling in Mbit/s; negative means auto-scale.
        pub max_speed_mbps: f64 = 100.0,
        /// Force auto-scaling regardless of `max_speed_mbps`.
        pub dynamic_scaling: bool = false,
        pub speed_unit: SpeedUnit = SpeedUnit::Kbps,
        pub rx_color: u8 = 255,
        pub tx_color: u8 = 128,
        pub bar_border: bool = false,
        pub bar_margin: u32 = 1,
        pub history_length: usize = DEFAULT_HISTORY_LENGTH,
    }
}

widget_properties! {
    /// Disk throughput widget.
    pub struct DiskProperties {
        /// Disk name; `None` uses the first disk reported.
        pub disk_name: Option<String> = None,
        pub display_mode: DisplayMode = DisplayMode::Text,
        /// Scale ceiling in MB/s; negative means auto-scale.
        pub max_speed_mbps: f64 = -1.0,
        pub read_color: u8 = 255,
        pub write_color: u8 = 200,
        pub bar_border: bool = false,
        pub bar_margin: u32 = 1,
        pub history_length: usize = DEFAULT_HISTORY_LENGTH,
    }
}

widget_properties! {
    /// Caps/Num/Scroll lock indicators.
    pub struct KeyboardProperties {
        /// Horizontal gap between indicators.
        pub spacing: u32 = 3,
        pub caps_lock_on: String = String::from("CAPS"),
        pub caps_lock_off: String = String::new(),
        pub num_lock_on: String = String::from("NUM"),
        pub num_lock_off: String = String::new(),
        pub scroll_lock_on: String = String::from("SCR"),
        pub scroll_lock_off: String = String::new(),
        pub indicator_color_on: u8 = 255,
        pub indicator_color_off: u8 = 80,
    }
}

fn invalid(id: &str, field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        id: id.to_owned(),
        field,
        reason: reason.into(),
    }
}

fn validate_history(id: &str, history_length: usize) -> Result<(), ConfigError> {
    if history_length < 2 {
        return Err(invalid(id, "history_length", "must be at least 2"));
    }
    if history_length > MAX_HISTORY_LENGTH {
        return Err(invalid(id, "history_length", format!("must not exceed {MAX_HISTORY_LENGTH}")));
    }
    Ok(())
}

fn ceiling_from_mbps(id: &str, max_speed_mbps: f64) -> Result<Ceiling, ConfigError> {
    if !max_speed_mbps.is_finite() || max_speed_mbps == 0.0 {
        return Err(invalid(id, "max_speed_mbps", "must be positive, or negative for auto-scaling"));
    }
    Ok(if max_speed_mbps < 0.0 {
        Ceiling::Auto
    } else {
        Ceiling::Fixed(max_speed_mbps as f32)
    })
}

impl ClockProperties {
    pub fn validate(&self, id: &str) -> Result<(), ConfigError> {
        self.validate_common(id)?;
        if self.format.is_empty() {
            return Err(invalid(id, "format", "must not be empty"));
        }
        if StrftimeItems::new(&self.format).any(|item| matches!(item, Item::Error)) {
            return Err(invalid(id, "format", format!("`{}` is not a valid time format", self.format)));
        }
        Ok(())
    }
}

impl CpuProperties {
    pub fn validate(&self, id: &str) -> Result<(), ConfigError> {
        self.validate_common(id)?;
        validate_history(id, self.history_length)
    }
}

impl MemoryProperties {
    pub fn validate(&self, id: &str) -> Result<(), ConfigError> {
        self.validate_common(id)?;
        validate_history(id, self.history_length)
    }
}

impl NetworkProperties {
    pub fn validate(&self, id: &str) -> Result<(), ConfigError> {
        self.validate_common(id)?;
        validate_history(id, self.history_length)?;
        self.ceiling(id).map(|_| ())
    }

    /// Ceiling in Mbit/s.
    pub fn ceiling(&self, id: &str) -> Result<Ceiling, ConfigError> {
        if self.dynamic_scaling {
            return Ok(Ceiling::Auto);
        }
        ceiling_from_mbps(id, self.max_speed_mbps)
    }
}

impl DiskProperties {
    pub fn validate(&self, id: &str) -> Result<(), ConfigError> {
        self.validate_common(id)?;
        validate_history(id, self.history_length)?;
        self.ceiling(id).map(|_| ())
    }

    /// Ceiling in MB/s.
    pub fn ceiling(&self, id: &str) -> Result<Ceiling, ConfigError> {
        ceiling_from_mbps(id, self.max_speed_mbps)
    }
}

impl KeyboardProperties {
    pub fn validate(&self, id: &str) -> Result<(), ConfigError> {
        self.validate_common(id)
    }
}
