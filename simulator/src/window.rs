//! Frame hand-off between the compositor thread and the SDL window.
//!
//! SDL must be driven from the main thread, so [`WindowTransport`] only
//! forwards frames over a channel and the UI loop paints the newest one.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::SimulatorDisplay;
use steelclock::canvas::Frame;
use steelclock::error::TransportError;
use steelclock::transport::{Transport, check_dimensions};

/// Transport that delivers frames to the simulator window.
pub struct WindowTransport {
    frames: Sender<Frame>,
    width: u32,
    height: u32,
}

impl WindowTransport {
    pub const fn new(frames: Sender<Frame>, width: u32, height: u32) -> Self {
        Self { frames, width, height }
    }
}

impl Transport for WindowTransport {
    fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        check_dimensions(frame, self.width, self.height)?;
        self.frames.send(frame.clone()).map_err(|_| TransportError::Disconnected)
    }
}

/// Newest frame waiting in `frames`, skipping any backlog.
///
/// Returns `Err` once the sending side is gone and the queue is empty.
pub fn latest_frame(frames: &Receiver<Frame>) -> Result<Option<Frame>, TryRecvError> {
    let mut latest = None;
    loop {
        match frames.try_recv() {
            Ok(frame) => latest = Some(frame),
            Err(TryRecvError::Empty) => return Ok(latest),
            Err(TryRecvError::Disconnected) => return latest.map_or(Err(TryRecvError::Disconnected), |f| Ok(Some(f))),
        }
    }
}

/// Paint `frame` onto the simulator display, one grey level per pixel.
pub fn paint(display: &mut SimulatorDisplay<Gray8>, frame: &Frame) {
    let width = frame.width();
    let pixels = frame.pixels().iter().enumerate().map(|(i, &luma)| {
        let (x, y) = (i as u32 % width, i as u32 / width);
        Pixel(Point::new(x as i32, y as i32), Gray8::new(luma))
    });
    display.draw_iter(pixels).ok();
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn test_transport_forwards_frames() {
        let (tx, rx) = mpsc::channel();
        let mut transport = WindowTransport::new(tx, 4, 2);

        transport.send(&Frame::new(4, 2, 7)).unwrap();
        assert_eq!(rx.try_recv().unwrap().pixel(0, 0), Some(7));
    }

    #[test]
    fn test_transport_rejects_wrong_size() {
        let (tx, _rx) = mpsc::channel();
        let mut transport = WindowTransport::new(tx, 4, 2);

        assert!(matches!(
            transport.send(&Frame::new(8, 2, 0)),
            Err(TransportError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_closed_window_disconnects() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let mut transport = WindowTransport::new(tx, 1, 1);

        assert!(matches!(transport.send(&Frame::new(1, 1, 0)), Err(TransportError::Disconnected)));
    }

    #[test]
    fn test_latest_frame_skips_backlog() {
        let (tx, rx) = mpsc::channel();
        tx.send(Frame::new(1, 1, 1)).unwrap();
        tx.send(Frame::new(1, 1, 2)).unwrap();

        let frame = latest_frame(&rx).unwrap().unwrap();
        assert_eq!(frame.pixel(0, 0), Some(2), "Only the newest frame is painted");
        assert!(latest_frame(&rx).unwrap().is_none());

        drop(tx);
        assert!(latest_frame(&rx).is_err());
    }

    #[test]
    fn test_paint_copies_intensity() {
        let (tx, rx) = mpsc::channel();
        let mut transport = WindowTransport::new(tx, 3, 2);
        transport.send(&Frame::new(3, 2, 200)).unwrap();

        let mut display = SimulatorDisplay::<Gray8>::new(Size::new(3, 2));
        paint(&mut display, &rx.try_recv().unwrap());
        assert_eq!(display.get_pixel(Point::new(2, 1)), Gray8::new(200));
    }
}
