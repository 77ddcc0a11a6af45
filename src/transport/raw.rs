//! Raw 1 bpp device bitmap output.
//!
//! Each frame is packed with [`Frame::pack_1bpp`] (rows in order, MSB first,
//! set bit = lit) and written over one file, the same byte layout the device
//! accepts as an image payload. Like [`PbmTransport`](super::PbmTransport),
//! the file is replaced atomically.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Transport, check_dimensions, replace_file, temp_path_for};
use crate::canvas::Frame;
use crate::error::TransportError;

/// Writes packed device bitmaps to a file.
#[derive(Debug)]
pub struct RawTransport {
    path: PathBuf,
    temp_path: PathBuf,
    expected: Option<(u32, u32)>,
}

impl RawTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            temp_path: temp_path_for(&path),
            path,
            expected: None,
        }
    }

    /// Reject frames that are not `width × height`.
    #[must_use]
    pub const fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.expected = Some((width, height));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transport for RawTransport {
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        if let Some((w, h)) = self.expected {
            check_dimensions(frame, w, h)?;
        }

        let packed = frame.pack_1bpp();
        replace_file(&self.path, &self.temp_path, &packed)?;

        debug!(path = %self.path.display(), bytes = packed.len(), "bitmap written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_send_writes_packed_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.bin");
        let mut transport = RawTransport::new(&path).with_dimensions(128, 40);

        transport.send(&Frame::new(128, 40, 255)).unwrap();

        let written = fs::read(&path).unwrap();
        assert_eq!(written.len(), 640, "128x40 display is 640 bytes");
        assert!(written.iter().all(|&b| b == 0xFF), "Every pixel lit");
        assert!(!dir.path().join("frame.bin.tmp").exists(), "Temp file renamed away");
    }

    #[test]
    fn test_dark_frame_is_all_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = RawTransport::new(dir.path().join("frame.bin"));

        transport.send(&Frame::new(16, 2, 40)).unwrap();
        assert_eq!(fs::read(transport.path()).unwrap(), vec![0u8; 4]);
    }

    #[test]
    fn test_dimension_check() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = RawTransport::new(dir.path().join("frame.bin")).with_dimensions(128, 40);

        let err = transport.send(&Frame::new(128, 36, 0)).unwrap_err();
        assert!(matches!(err, TransportError::DimensionMismatch { actual_h: 36, .. }));
        assert!(!transport.path().exists(), "Nothing written for a rejected frame");
    }
}
