//! Configuration document loading and validation.
//!
//! The document is JSON. Every section is optional and falls back to the
//! defaults below; a missing file falls back to [`AppConfig::default`] (a
//! single full-screen clock).
//!
//! ```json
//! {
//!   "refresh_rate_ms": 100,
//!   "display": { "width": 128, "height": 40, "background_color": 0 },
//!   "layout": { "type": "viewport", "virtual_width": 256, "virtual_height": 40 },
//!   "widgets": [
//!     {
//!       "type": "clock", "id": "main_clock",
//!       "position": { "x": 0, "y": 0, "w": 128, "h": 40, "z_order": 0 },
//!       "style": { "background_color": 0, "border": false },
//!       "properties": { "format": "%H:%M:%S" }
//!     }
//!   ]
//! }
//! ```
//!
//! # Validation Order
//!
//! 1. display dimensions
//! 2. layout mode and virtual canvas
//! 3. widget types and unique ids
//! 4. per-widget properties (typed, unknown fields rejected)
//! 5. geometry, through [`crate::layout::LayoutEngine`]
//!
//! Any failure is a [`ConfigError`] and aborts startup.

pub mod properties;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::{debug, info, warn};

pub use self::properties::{
    Ceiling,
    ClockProperties,
    CpuProperties,
    DiskProperties,
    DisplayMode,
    FontFamily,
    HorizontalAlign,
    KeyboardProperties,
    MemoryProperties,
    NetworkProperties,
    SpeedUnit,
    VerticalAlign,
};
use crate::error::ConfigError;
use crate::layout::{Layout, LayoutEngine, PlacedWidget, Rect, Style};

// =============================================================================
// Constants
// =============================================================================

/// Device refresh ceiling: frames are never produced faster than 10 Hz.
pub const MIN_REFRESH_RATE_MS: u64 = 100;

pub const DEFAULT_DISPLAY_WIDTH: u32 = 128;
pub const DEFAULT_DISPLAY_HEIGHT: u32 = 40;

/// Largest accepted canvas side, guarding against absurd allocations.
pub const MAX_CANVAS_SIDE: u32 = 4096;

// =============================================================================
// Document Schema
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub background_color: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_DISPLAY_WIDTH,
            height: DEFAULT_DISPLAY_HEIGHT,
            background_color: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    Basic,
    Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    #[serde(rename = "type")]
    pub kind: Option<LayoutType>,
    pub virtual_width: Option<u32>,
    pub virtual_height: Option<u32>,
    pub viewport_x: i32,
    pub viewport_y: i32,
}

/// Missing `w`/`h` default to the display size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PositionConfig {
    x: i32,
    y: i32,
    w: Option<i32>,
    h: Option<i32>,
    z_order: i32,
}

impl PositionConfig {
    fn resolve(self, display: &DisplayConfig) -> Rect {
        let w = self.w.unwrap_or(display.width as i32);
        let h = self.h.unwrap_or(display.height as i32);
        Rect::new(self.x, self.y, w, h).with_z(self.z_order)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct StyleConfig {
    background_color: u8,
    border: bool,
    border_color: u8,
    background_opacity: u8,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let style = Style::new();
        Self {
            background_color: style.background_color,
            border: style.border,
            border_color: style.border_color,
            background_opacity: style.background_opacity,
        }
    }
}

impl From<StyleConfig> for Style {
    fn from(raw: StyleConfig) -> Self {
        Self {
            background_color: raw.background_color,
            border: raw.border,
            border_color: raw.border_color,
            background_opacity: raw.background_opacity,
        }
    }
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWidget {
    #[serde(rename = "type")]
    kind: String,
    id: Option<String>,
    #[serde(default = "default_true")]
    enabled: bool,
    position: Option<PositionConfig>,
    #[serde(default)]
    style: StyleConfig,
    #[serde(default)]
    properties: serde_json::Value,
}

const fn default_refresh_rate_ms() -> u64 {
    MIN_REFRESH_RATE_MS
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    /// Vendor SDK registration keys; accepted so existing files load.
    #[serde(default)]
    game_name: Option<IgnoredAny>,
    #[serde(default)]
    game_display_name: Option<IgnoredAny>,
    #[serde(default = "default_refresh_rate_ms")]
    refresh_rate_ms: u64,
    #[serde(default = "default_true")]
    dedup_frames: bool,
    #[serde(default)]
    display: DisplayConfig,
    #[serde(default)]
    layout: LayoutConfig,
    widgets: Option<Vec<RawWidget>>,
}

// =============================================================================
// Widget Specs
// =============================================================================

/// Closed set of widget variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    Clock,
    Cpu,
    Memory,
    Network,
    Disk,
    Keyboard,
}

impl WidgetKind {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "clock" => Self::Clock,
            "cpu" => Self::Cpu,
            "memory" => Self::Memory,
            "network" => Self::Network,
            "disk" => Self::Disk,
            "keyboard" => Self::Keyboard,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Network => "network",
            Self::Disk => "disk",
            Self::Keyboard => "keyboard",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated properties of one widget, tagged by variant.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetProperties {
    Clock(ClockProperties),
    Cpu(CpuProperties),
    Memory(MemoryProperties),
    Network(NetworkProperties),
    Disk(DiskProperties),
    Keyboard(KeyboardProperties),
}

impl WidgetProperties {
    /// Parse a `properties` value for `kind`. `null` means all defaults.
    pub fn parse(kind: WidgetKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let value = if value.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            value
        };
        Ok(match kind {
            WidgetKind::Clock => Self::Clock(serde_json::from_value(value)?),
            WidgetKind::Cpu => Self::Cpu(serde_json::from_value(value)?),
            WidgetKind::Memory => Self::Memory(serde_json::from_value(value)?),
            WidgetKind::Network => Self::Network(serde_json::from_value(value)?),
            WidgetKind::Disk => Self::Disk(serde_json::from_value(value)?),
            WidgetKind::Keyboard => Self::Keyboard(serde_json::from_value(value)?),
        })
    }

    pub const fn kind(&self) -> WidgetKind {
        match self {
            Self::Clock(_) => WidgetKind::Clock,
            Self::Cpu(_) => WidgetKind::Cpu,
            Self::Memory(_) => WidgetKind::Memory,
            Self::Network(_) => WidgetKind::Network,
            Self::Disk(_) => WidgetKind::Disk,
            Self::Keyboard(_) => WidgetKind::Keyboard,
        }
    }

    pub fn validate(&self, id: &str) -> Result<(), ConfigError> {
        match self {
            Self::Clock(p) => p.validate(id),
            Self::Cpu(p) => p.validate(id),
            Self::Memory(p) => p.validate(id),
            Self::Network(p) => p.validate(id),
            Self::Disk(p) => p.validate(id),
            Self::Keyboard(p) => p.validate(id),
        }
    }

    pub fn update_interval(&self) -> Duration {
        match self {
            Self::Clock(p) => p.update_interval(),
            Self::Cpu(p) => p.update_interval(),
            Self::Memory(p) => p.update_interval(),
            Self::Network(p) => p.update_interval(),
            Self::Disk(p) => p.update_interval(),
            Self::Keyboard(p) => p.update_interval(),
        }
    }
}

/// One configured widget. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    pub id: String,
    pub enabled: bool,
    pub rect: Rect,
    pub style: Style,
    pub properties: WidgetProperties,
}

impl WidgetSpec {
    pub fn new(id: impl Into<String>, rect: Rect, properties: WidgetProperties) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            rect,
            style: Style::new(),
            properties,
        }
    }

    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    #[inline]
    pub const fn kind(&self) -> WidgetKind {
        self.properties.kind()
    }
}

// =============================================================================
// Application Config
// =============================================================================

/// Fully validated configuration of one engine run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Compositor period, already clamped to [`MIN_REFRESH_RATE_MS`].
    pub refresh_rate: Duration,
    pub dedup_frames: bool,
    pub display: DisplayConfig,
    pub layout: Layout,
    /// Every configured widget in document order, disabled ones included.
    pub widgets: Vec<WidgetSpec>,
}

impl AppConfig {
    /// Read and validate a configuration file.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_json(&text)?;
                info!(path = %path.display(), widgets = config.widgets.len(), "configuration loaded");
                Ok(config)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "configuration file not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.game_name.is_some() || raw.game_display_name.is_some() {
            debug!("game_name/game_display_name have no effect without a vendor SDK transport, ignoring");
        }
        let display = validate_display(raw.display)?;
        let layout = resolve_layout(&display, &raw.layout)?;

        let refresh_rate_ms = if raw.refresh_rate_ms < MIN_REFRESH_RATE_MS {
            warn!(
                requested = raw.refresh_rate_ms,
                applied = MIN_REFRESH_RATE_MS,
                "refresh_rate_ms below the device floor, clamping"
            );
            MIN_REFRESH_RATE_MS
        } else {
            raw.refresh_rate_ms
        };

        let widgets = match raw.widgets {
            Some(widgets) => build_widgets(widgets, &display)?,
            None => vec![default_clock(&display)],
        };

        let config = Self {
            refresh_rate: Duration::from_millis(refresh_rate_ms),
            dedup_frames: raw.dedup_frames,
            display,
            layout,
            widgets,
        };
        config.placed_widgets()?;
        Ok(config)
    }

    /// Enabled widgets in compositing order.
    pub fn placed_widgets(&self) -> Result<Vec<PlacedWidget>, ConfigError> {
        LayoutEngine::new(self.layout).resolve(&self.widgets)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let display = DisplayConfig::default();
        Self {
            refresh_rate: Duration::from_millis(MIN_REFRESH_RATE_MS),
            dedup_frames: true,
            display,
            layout: Layout::basic(display.width, display.height),
            widgets: vec![default_clock(&display)],
        }
    }
}

fn default_clock(display: &DisplayConfig) -> WidgetSpec {
    WidgetSpec::new(
        "clock_0",
        PositionConfig::default().resolve(display),
        WidgetProperties::Clock(ClockProperties::default()),
    )
}

fn validate_display(display: DisplayConfig) -> Result<DisplayConfig, ConfigError> {
    if display.width == 0 || display.height == 0 {
        return Err(ConfigError::InvalidDisplay(format!(
            "dimensions must be positive, got {}x{}",
            display.width, display.height
        )));
    }
    if display.width > MAX_CANVAS_SIDE || display.height > MAX_CANVAS_SIDE {
        return Err(ConfigError::InvalidDisplay(format!(
            "{}x{} exceeds the {MAX_CANVAS_SIDE} px limit",
            display.width, display.height
        )));
    }
    Ok(display)
}

fn resolve_layout(display: &DisplayConfig, raw: &LayoutConfig) -> Result<Layout, ConfigError> {
    let larger_virtual = raw.virtual_width.is_some_and(|w| w > display.width)
        || raw.virtual_height.is_some_and(|h| h > display.height);
    let kind = raw.kind.unwrap_or(if larger_virtual {
        LayoutType::Viewport
    } else {
        LayoutType::Basic
    });

    match kind {
        LayoutType::Basic => {
            if raw.virtual_width.is_some() || raw.virtual_height.is_some() {
                warn!("virtual canvas size is ignored in basic layout mode");
            }
            Ok(Layout::basic(display.width, display.height))
        }
        LayoutType::Viewport => {
            let virtual_width = raw.virtual_width.unwrap_or(display.width);
            let virtual_height = raw.virtual_height.unwrap_or(display.height);
            if virtual_width > MAX_CANVAS_SIDE || virtual_height > MAX_CANVAS_SIDE {
                return Err(ConfigError::InvalidLayout(format!(
                    "virtual canvas {virtual_width}x{virtual_height} exceeds the {MAX_CANVAS_SIDE} px limit"
                )));
            }
            Layout::viewport(
                display.width,
                display.height,
                virtual_width,
                virtual_height,
                (raw.viewport_x, raw.viewport_y),
            )
        }
    }
}

fn build_widgets(raw_widgets: Vec<RawWidget>, display: &DisplayConfig) -> Result<Vec<WidgetSpec>, ConfigError> {
    let mut seen = HashSet::with_capacity(raw_widgets.len());
    let mut widgets = Vec::with_capacity(raw_widgets.len());

    for (index, raw) in raw_widgets.into_iter().enumerate() {
        let kind = WidgetKind::parse(&raw.kind).ok_or_else(|| ConfigError::UnknownWidgetType {
            index,
            kind: raw.kind.clone(),
        })?;
        let id = raw.id.unwrap_or_else(|| format!("{kind}_{index}"));
        if !seen.insert(id.clone()) {
            return Err(ConfigError::DuplicateId(id));
        }

        let properties = WidgetProperties::parse(kind, raw.properties).map_err(|source| {
            ConfigError::InvalidProperties {
                id: id.clone(),
                source,
            }
        })?;
        properties.validate(&id)?;

        let rect = raw.position.unwrap_or_default().resolve(display);
        if rect.w > MAX_CANVAS_SIDE as i32 || rect.h > MAX_CANVAS_SIDE as i32 {
            return Err(ConfigError::InvalidGeometry {
                id,
                reason: format!("{}x{} exceeds the {MAX_CANVAS_SIDE} px widget size limit", rect.w, rect.h),
            });
        }
        widgets.push(WidgetSpec {
            id,
            enabled: raw.enabled,
            rect,
            style: raw.style.into(),
            properties,
        });
    }
    Ok(widgets)
}
