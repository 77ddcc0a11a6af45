// Crate-level lints: Allow common graphics patterns that pedantic lints flag
#![allow(clippy::cast_possible_truncation)] // Intentional f32->i32, u32->i32 casts for pixel math
#![allow(clippy::cast_precision_loss)] // u32/i32->f32 in graphics calculations
#![allow(clippy::cast_possible_wrap)] // u32->i32 wrapping is acceptable for our value ranges
#![allow(clippy::cast_sign_loss)] // i32->u32 where we know sign is positive
#![allow(clippy::module_name_repetitions)]

//! Display composition engine for small monochrome peripheral displays.
//!
//! Live system-state widgets (clock, CPU, memory, network, disk, keyboard
//! lock indicators) render independently into tiles, and a compositor merges
//! those tiles onto one canvas and streams physical-size frames to the device
//! at a bounded rate.
//!
//! # Architecture
//!
//! ```text
//!  widget thread (clock) ──► TileSlot ─┐
//!  widget thread (cpu)   ──► TileSlot ─┤
//!  widget thread (disk)  ──► TileSlot ─┼──► Compositor ──► Canvas ──► Frame ──► Transport
//!  ...                                 │     (z-order,     (virtual    (viewport
//!  widget thread (keys)  ──► TileSlot ─┘      blending)     size)       crop)
//! ```
//!
//! | Component | Module | Runs on |
//! |-----------|--------|---------|
//! | Canvas & pixel model | [`canvas`], [`tile`] | compositor thread |
//! | Layout engine | [`layout`] | startup |
//! | Widgets | [`widgets`] | one thread per widget |
//! | Scheduler | [`scheduler`] | one thread per widget |
//! | Compositor | [`compositor`] | compositor thread |
//! | Transport adapters | [`transport`] | compositor thread |
//!
//! # Failure Model
//!
//! - Configuration problems are fatal and reported before any thread starts.
//! - A widget whose data source disappears keeps publishing its last good tile.
//! - Geometry outside the canvas is clipped, never rejected at draw time.
//! - A failed delivery is retried on the next compositor tick.

pub mod app;
pub mod canvas;
pub mod compositor;
pub mod config;
pub mod error;
pub mod history;
pub mod layout;
pub mod scheduler;
pub mod shutdown;
pub mod sources;
pub mod stats;
pub mod tile;
pub mod transport;
pub mod widgets;

pub use app::{Engine, EngineOptions};
pub use canvas::{Canvas, Frame};
pub use config::AppConfig;
pub use error::{ConfigError, MetricError, OutOfBounds, TransportError};
pub use shutdown::Shutdown;
pub use transport::Transport;
