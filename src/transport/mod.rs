//! Frame delivery to the device side.
//!
//! The compositor hands every finished [`Frame`] to a [`Transport`]. A
//! failed delivery is not retried within the same tick; the compositor tries
//! again with the next frame.

pub mod pbm;
pub mod raw;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

pub use self::pbm::PbmTransport;
pub use self::raw::RawTransport;
use crate::canvas::Frame;
use crate::error::TransportError;

/// Sink for composed frames.
pub trait Transport: Send {
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        (**self).send(frame)
    }
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NullTransport {
    sent: u64,
}

impl NullTransport {
    pub const fn new() -> Self {
        Self { sent: 0 }
    }

    pub const fn sent(&self) -> u64 {
        self.sent
    }
}

impl Transport for NullTransport {
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        self.sent += 1;
        trace!(frame = self.sent, width = frame.width(), height = frame.height(), "frame discarded");
        Ok(())
    }
}

/// Reject frames whose size differs from what the device expects.
pub fn check_dimensions(frame: &Frame, expected_w: u32, expected_h: u32) -> Result<(), TransportError> {
    if frame.width() == expected_w && frame.height() == expected_h {
        return Ok(());
    }
    Err(TransportError::DimensionMismatch {
        expected_w,
        expected_h,
        actual_w: frame.width(),
        actual_h: frame.height(),
    })
}

/// Sibling path used while a frame file is being written.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let mut temp = OsString::from(path.as_os_str());
    temp.push(".tmp");
    PathBuf::from(temp)
}

/// Write `bytes` to `temp_path`, flush to disk, then rename over `path`.
pub(crate) fn replace_file(path: &Path, temp_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(temp_path)?);
    writer.write_all(bytes)?;
    writer.into_inner().map_err(|err| err.into_error())?.sync_data()?;
    fs::rename(temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_transport_counts() {
        let mut transport = NullTransport::new();
        transport.send(&Frame::new(4, 4, 0)).unwrap();
        transport.send(&Frame::new(4, 4, 0)).unwrap();
        assert_eq!(transport.sent(), 2);
    }

    #[test]
    fn test_boxed_transport_forwards() {
        let mut transport: Box<dyn Transport> = Box::new(NullTransport::new());
        assert!(transport.send(&Frame::new(1, 1, 0)).is_ok());
    }

    #[test]
    fn test_temp_path_is_a_sibling() {
        let temp = temp_path_for(Path::new("/run/steelclock/frame.bin"));
        assert_eq!(temp, Path::new("/run/steelclock/frame.bin.tmp"));
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(&Frame::new(128, 40, 0), 128, 40).is_ok());
        assert!(matches!(
            check_dimensions(&Frame::new(128, 36, 0), 128, 40),
            Err(TransportError::DimensionMismatch { actual_h: 36, .. })
        ));
    }
}
