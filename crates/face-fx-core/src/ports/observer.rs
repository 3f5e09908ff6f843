//! Outbound notification ports.

use crate::domain::Frame;

/// Receives blink-count changes.
///
/// Called on the frame-processing thread. Implementations that need another
/// execution context must hand the value off without blocking.
pub trait BlinkObserver: Send + Sync {
    /// Called exactly once per detected blink with the new total.
    fn on_blink_detected(&self, count: u32);
}

/// Receives every composited frame.
pub trait FrameObserver: Send + Sync {
    /// Called after a frame has been fully composited.
    fn on_frame_processed(&self, frame: &Frame);
}
