//! Frame delivery port.

use crate::domain::Frame;

/// Callback invoked once per delivered frame; returns the frame to display.
pub type ProcessingBlock = Box<dyn FnMut(Frame) -> Frame + Send>;

/// Port for a camera-like source that pushes frames into a processing block.
///
/// Implementations must serialize calls to the block: processing of frame
/// `N + 1` starts only after the call for frame `N` has returned.
pub trait FrameSource: Send {
    /// Registers the block that every frame is handed to.
    fn set_processing_block(&mut self, block: ProcessingBlock);

    /// Begins delivering frames.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is already running, has no processing
    /// block, or cannot be opened.
    fn start(&mut self) -> anyhow::Result<()>;

    /// Stops delivery. A frame already inside the block runs to completion.
    fn stop(&mut self);

    /// Returns whether frames are currently being delivered.
    fn is_running(&self) -> bool;
}
