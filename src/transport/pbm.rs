//! Binary PBM (`P4`) file output.
//!
//! Every frame overwrites one image file, written to a sibling temp file and
//! renamed into place so readers never see a truncated image. PBM rows are
//! padded to whole bytes and a set bit is black, so lit display pixels
//! (intensity ≥ [`LIT_THRESHOLD`]) are written as clear bits and the image
//! looks like the display.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Transport, check_dimensions, replace_file, temp_path_for};
use crate::canvas::{Frame, LIT_THRESHOLD};
use crate::error::TransportError;

/// Writes frames to a PBM image file.
#[derive(Debug)]
pub struct PbmTransport {
    path: PathBuf,
    temp_path: PathBuf,
    expected: Option<(u32, u32)>,
}

impl PbmTransport {
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

/// Encode `frame` as a complete `P4` image.
pub fn encode(frame: &Frame) -> Vec<u8> {
    let (w, h) = (frame.width(), frame.height());
    let header = format!("P4\n{w} {h}\n");
    let row_bytes = w.div_ceil(8) as usize;

    let mut out = Vec::with_capacity(header.len() + row_bytes * h as usize);
    out.extend_from_slice(header.as_bytes());
    for row in frame.pixels().chunks(w.max(1) as usize).take(h as usize) {
        let mut packed = vec![0u8; row_bytes];
        for (x, &value) in row.iter().enumerate() {
            if value < LIT_THRESHOLD {
                packed[x / 8] |= 0x80 >> (x % 8);
            }
        }
        out.extend_from_slice(&packed);
    }
    out
}

impl Transport for PbmTransport {
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        if let Some((w, h)) = self.expected {
            check_dimensions(frame, w, h)?;
        }

        replace_file(&self.path, &self.temp_path, &encode(frame))?;

        debug!(path = %self.path.display(), "frame written");
        Ok(())
    }
}
