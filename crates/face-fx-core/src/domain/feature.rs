//! Face feature records produced by an external detector.

use serde::{Deserialize, Serialize};

/// A point in frame pixel coordinates (origin top-left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position in pixels.
    pub x: f32,
    /// Vertical position in pixels.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns true when both coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An axis-aligned rectangle in frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Rect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle of the given size centered on `center`.
    #[must_use]
    pub fn centered(center: Point, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns true when every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Returns true if the rectangle encloses no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Landmarks, flags and pose angles for one detected face in one frame.
///
/// Records are produced fresh for every frame and never retained by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceFeature {
    /// Face bounding box.
    pub bounds: Rect,
    /// Left eye position.
    pub left_eye: Point,
    /// Right eye position.
    pub right_eye: Point,
    /// Mouth position.
    pub mouth: Point,
    /// Whether the left eye is closed.
    #[serde(default)]
    pub left_eye_closed: bool,
    /// Whether the right eye is closed.
    #[serde(default)]
    pub right_eye_closed: bool,
    /// Whether the face is smiling.
    #[serde(default)]
    pub smiling: bool,
    /// Head yaw, when the detector reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f32>,
    /// Head roll, when the detector reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roll: Option<f32>,
}

impl FaceFeature {
    /// A face counts as blinking only when both eyes are closed.
    #[must_use]
    pub const fn eyes_closed(&self) -> bool {
        self.left_eye_closed && self.right_eye_closed
    }

    /// Returns the yaw/roll pair if both angles were reported.
    #[must_use]
    pub fn pose(&self) -> Option<(f32, f32)> {
        self.yaw.zip(self.roll)
    }
}
