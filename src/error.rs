//! Error taxonomy.
//!
//! | Error | Severity | Recovery |
//! |-------|----------|----------|
//! | [`ConfigError`] | fatal | none, startup aborts |
//! | [`MetricError`] | soft | widget reuses its last tile |
//! | [`OutOfBounds`] | soft | geometry is clamped |
//! | [`TransportError`] | soft | delivery retried next tick |
//! | [`EngineError`] | fatal | none, the process exits |

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Invalid configuration. Always fatal, reported before scheduling starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed configuration document")]
    Parse(#[from] serde_json::Error),

    #[error("widget #{index}: unknown widget type `{kind}`")]
    UnknownWidgetType { index: usize, kind: String },

    #[error("widget `{id}`: invalid properties")]
    InvalidProperties {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate widget id `{0}`")]
    DuplicateId(String),

    #[error("invalid display: {0}")]
    InvalidDisplay(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("widget `{id}`: {reason}")]
    InvalidGeometry { id: String, reason: String },

    #[error("widget `{id}`: property `{field}` {reason}")]
    InvalidValue { id: String, field: &'static str, reason: String },
}

/// A widget's external sample source could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("{metric} unavailable: {reason}")]
    Unavailable { metric: &'static str, reason: String },

    #[error("{kind} `{name}` not found")]
    NotFound { kind: &'static str, name: String },
}

impl MetricError {
    pub fn unavailable(metric: &'static str, reason: impl Into<String>) -> Self {
        Self::Unavailable { metric, reason: reason.into() }
    }
}

/// A region request that does not fit inside the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("region {w}x{h} at ({x},{y}) exceeds canvas {canvas_w}x{canvas_h}")]
pub struct OutOfBounds {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
    pub canvas_w: u32,
    pub canvas_h: u32,
}

/// Frame delivery failed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O failed")]
    Io(#[from] io::Error),

    #[error("transport disconnected")]
    Disconnected,

    #[error("frame is {actual_w}x{actual_h}, transport expects {expected_w}x{expected_h}")]
    DimensionMismatch { expected_w: u32, expected_h: u32, actual_w: u32, actual_h: u32 },
}

/// The engine could not be started or stopped cleanly.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn thread")]
    Spawn(#[from] io::Error),

    #[error("thread `{0}` panicked")]
    Panicked(String),
}

/// Displays an error followed by every `source()` below it, joined by `: `.
///
/// `tracing` fields formatted with `%err` only show the top message; wrap
/// the error in this to keep causes such as serde's line and column.
pub struct Chain<'a>(pub &'a (dyn StdError + 'static));

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, ": {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_includes_parse_position() {
        let err = ConfigError::from(serde_json::from_str::<serde_json::Value>("{\n  \"a\": }").unwrap_err());
        let rendered = Chain(&err).to_string();

        assert!(rendered.starts_with("malformed configuration document: "), "{rendered}");
        assert!(rendered.contains("line 2"), "Parser position must survive: {rendered}");
    }

    #[test]
    fn test_chain_without_source_is_plain_message() {
        let err = ConfigError::DuplicateId(String::from("clock"));
        assert_eq!(Chain(&err).to_string(), "duplicate widget id `clock`");
    }

    #[test]
    fn test_chain_walks_io_source() {
        let err = TransportError::from(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        assert_eq!(Chain(&err).to_string(), "transport I/O failed: no such directory");
    }
}
