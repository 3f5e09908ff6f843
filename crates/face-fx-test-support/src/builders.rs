//! Synthetic frame and face builders for testing.

use face_fx_core::domain::{FaceFeature, Frame, Point, Rect};
use image::{Rgba, RgbaImage};

/// Builder for creating synthetic test frames.
///
/// Patterns with spatial variation make pixel-moving effects such as the
/// smile distortion observable; uniform frames make color effects easy to
/// assert on.
pub struct SyntheticFrameBuilder;

impl SyntheticFrameBuilder {
    /// Creates a frame filled with one opaque color.
    #[must_use]
    pub fn uniform(sequence: u64, width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let [r, g, b] = rgb;
        Frame::new(
            sequence,
            RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])),
        )
    }

    /// Creates a mid-gray frame.
    #[must_use]
    pub fn gray(sequence: u64, width: u32, height: u32) -> Frame {
        Self::uniform(sequence, width, height, [128, 128, 128])
    }

    /// Creates a black and white checkerboard with `cell_size` squares.
    #[must_use]
    pub fn checkerboard(sequence: u64, width: u32, height: u32, cell_size: u32) -> Frame {
        let cell = cell_size.max(1);
        let image = RgbaImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        Frame::new(sequence, image)
    }

    /// Creates a frame whose red channel ramps left to right and green
    /// channel top to bottom.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn gradient(sequence: u64, width: u32, height: u32) -> Frame {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let r = ((u32::from(u8::MAX) * x) / width.max(1)) as u8;
            let g = ((u32::from(u8::MAX) * y) / height.max(1)) as u8;
            Rgba([r, g, 96, 255])
        });
        Frame::new(sequence, image)
    }

    /// Creates `count` gray frames numbered from zero.
    #[must_use]
    pub fn sequence(count: u64, width: u32, height: u32) -> Vec<Frame> {
        (0..count).map(|i| Self::gray(i, width, height)).collect()
    }
}

/// Builder for [`FaceFeature`] records.
///
/// Landmarks are placed proportionally inside the bounding box, eyes open,
/// not smiling and without pose angles unless set.
#[derive(Debug, Clone)]
pub struct FaceFeatureBuilder {
    feature: FaceFeature,
}

impl Default for FaceFeatureBuilder {
    fn default() -> Self {
        Self::new(Rect::new(100.0, 100.0, 200.0, 240.0))
    }
}

impl FaceFeatureBuilder {
    /// Starts a face with landmarks laid out inside `bounds`.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        let at = |fx: f32, fy: f32| {
            Point::new(bounds.x + bounds.width * fx, bounds.y + bounds.height * fy)
        };
        Self {
            feature: FaceFeature {
                bounds,
                left_eye: at(0.3, 0.35),
                right_eye: at(0.7, 0.35),
                mouth: at(0.5, 0.75),
                left_eye_closed: false,
                right_eye_closed: false,
                smiling: false,
                yaw: None,
                roll: None,
            },
        }
    }

    /// Closes or opens both eyes.
    #[must_use]
    pub const fn eyes_closed(mut self, closed: bool) -> Self {
        self.feature.left_eye_closed = closed;
        self.feature.right_eye_closed = closed;
        self
    }

    /// Closes only the left eye.
    #[must_use]
    pub const fn wink_left(mut self) -> Self {
        self.feature.left_eye_closed = true;
        self.feature.right_eye_closed = false;
        self
    }

    /// Sets the smiling flag.
    #[must_use]
    pub const fn smiling(mut self, smiling: bool) -> Self {
        self.feature.smiling = smiling;
        self
    }

    /// Sets both pose angles.
    #[must_use]
    pub const fn pose(mut self, yaw: f32, roll: f32) -> Self {
        self.feature.yaw = Some(yaw);
        self.feature.roll = Some(roll);
        self
    }

    /// Overrides the mouth position.
    #[must_use]
    pub const fn mouth(mut self, mouth: Point) -> Self {
        self.feature.mouth = mouth;
        self
    }

    /// Overrides the eye positions.
    #[must_use]
    pub const fn eyes(mut self, left: Point, right: Point) -> Self {
        self.feature.left_eye = left;
        self.feature.right_eye = right;
        self
    }

    /// Returns the finished record.
    #[must_use]
    pub fn build(self) -> FaceFeature {
        self.feature
    }

    /// One single-face detection per entry of `closed`, for driving blink
    /// detection frame by frame.
    #[must_use]
    pub fn eye_sequence(&self, closed: &[bool]) -> Vec<Vec<FaceFeature>> {
        closed
            .iter()
            .map(|&c| vec![self.clone().eyes_closed(c).build()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_frame() {
        let frame = SyntheticFrameBuilder::uniform(7, 20, 10, [1, 2, 3]);
        assert_eq!(frame.sequence, 7);
        assert_eq!((frame.width(), frame.height()), (20, 10));
        assert!(frame.image.pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn test_checkerboard_pattern() {
        let frame = SyntheticFrameBuilder::checkerboard(0, 16, 16, 8);
        assert_eq!(frame.image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(frame.image.get_pixel(8, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_gradient_range() {
        let frame = SyntheticFrameBuilder::gradient(0, 256, 256);
        assert!(frame.image.get_pixel(0, 0).0[0] < 5);
        assert!(frame.image.get_pixel(255, 0).0[0] > 250);
        assert!(frame.image.get_pixel(0, 255).0[1] > 250);
    }

    #[test]
    fn test_sequence_numbers() {
        let frames = SyntheticFrameBuilder::sequence(3, 4, 4);
        let numbers: Vec<u64> = frames.iter().map(|f| f.sequence).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }

    #[test]
    fn test_face_layout() {
        let face = FaceFeatureBuilder::new(Rect::new(0.0, 0.0, 100.0, 100.0)).build();
        assert_eq!(face.left_eye, Point::new(30.0, 35.0));
        assert_eq!(face.right_eye, Point::new(70.0, 35.0));
        assert_eq!(face.mouth, Point::new(50.0, 75.0));
        assert!(!face.eyes_closed());
        assert_eq!(face.pose(), None);
    }

    #[test]
    fn test_face_flags() {
        let face = FaceFeatureBuilder::default()
            .eyes_closed(true)
            .smiling(true)
            .pose(0.2, -0.7)
            .build();
        assert!(face.eyes_closed());
        assert!(face.smiling);
        assert_eq!(face.pose(), Some((0.2, -0.7)));

        let wink = FaceFeatureBuilder::default().wink_left().build();
        assert!(wink.left_eye_closed);
        assert!(!wink.eyes_closed());
    }

    #[test]
    fn test_eye_sequence() {
        let frames = FaceFeatureBuilder::default().eye_sequence(&[true, false]);
        assert_eq!(frames.len(), 2);
        assert!(frames[0][0].eyes_closed());
        assert!(!frames[1][0].eyes_closed());
    }
}
