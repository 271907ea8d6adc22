//! Bus transmission seam.
//!
//! The simulator never drives real CAN hardware; the sink trait is the
//! boundary where a hardware transport would plug in.

use heapless::Vec;
use tracing::info;

use crate::frame::Frame;

/// Frames retained by the simulated bus for inspection.
pub const MAX_SENT_HISTORY: usize = 32;

/// Outbound side of the generator bus.
pub trait FrameSink {
    /// Deliver one frame to the controller side.
    fn send_frame(&mut self, frame: &Frame) -> Result<(), &'static str>;
}

/// Loopback bus: logs each frame and keeps a bounded history of the most
/// recently sent ones.
#[derive(Debug, Default)]
pub struct SimulatedBus {
    sent: Vec<Frame, MAX_SENT_HISTORY>,
    sent_count: u32,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            sent_count: 0,
        }
    }

    /// Sent frames, oldest first, bounded at [`MAX_SENT_HISTORY`].
    pub fn sent_frames(&self) -> &[Frame] {
        &self.sent
    }

    /// Total frames sent, counting any evicted from the history.
    pub fn sent_count(&self) -> u32 {
        self.sent_count
    }
}

impl FrameSink for SimulatedBus {
    fn send_frame(&mut self, frame: &Frame) -> Result<(), &'static str> {
        if self.sent.is_full() {
            self.sent.remove(0);
        }
        let _ = self.sent.push(*frame);
        self.sent_count = self.sent_count.wrapping_add(1);
        info!("Bus TX: {}", frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_bus_records_frames() {
        let mut bus = SimulatedBus::new();
        let frame = Frame::with_header(520, 8);
        bus.send_frame(&frame).unwrap();
        assert_eq!(bus.sent_frames(), &[frame]);
        assert_eq!(bus.sent_count(), 1);
    }

    #[test]
    fn test_history_evicts_oldest_when_full() {
        let mut bus = SimulatedBus::new();
        for i in 0..(MAX_SENT_HISTORY + 4) {
            let mut frame = Frame::with_header(520, 8);
            frame.write_byte(0, i as u32);
            bus.send_frame(&frame).unwrap();
        }
        assert_eq!(bus.sent_frames().len(), MAX_SENT_HISTORY);
        assert_eq!(bus.sent_count() as usize, MAX_SENT_HISTORY + 4);
        // Oldest retained frame is the fifth one sent.
        assert_eq!(bus.sent_frames()[0].as_bytes()[2], 4);
    }
}
