//! Camera frames flowing through the pipeline.

use image::RgbaImage;

/// A single camera frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Monotonic sequence number assigned by the frame source.
    pub sequence: u64,
    /// Pixel data.
    pub image: RgbaImage,
}

impl Frame {
    /// Creates a frame from an RGBA image.
    #[must_use]
    pub const fn new(sequence: u64, image: RgbaImage) -> Self {
        Self { sequence, image }
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
