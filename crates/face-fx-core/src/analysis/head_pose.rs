//! Head direction classification from yaw and roll.
//!
//! Positive yaw is labelled "Looking Left" and negative yaw "Looking Right".
//! That reads inverted against the usual convention. Keep it until product
//! confirms the intended mapping. Roll is evaluated after yaw and always wins.

use crate::domain::DirectionLabel;
use crate::error::ConfigError;

/// Default absolute angle beyond which yaw or roll counts.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Stateless yaw/roll to [`DirectionLabel`] mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadPoseClassifier {
    threshold: f32,
}

impl HeadPoseClassifier {
    /// Creates a classifier with a custom threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidThreshold`] for negative or NaN values.
    pub fn with_threshold(threshold: f32) -> Result<Self, ConfigError> {
        if threshold.is_nan() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    /// The active threshold.
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Maps a yaw/roll pair to a label.
    #[must_use]
    pub fn classify(&self, yaw: f32, roll: f32) -> DirectionLabel {
        let mut label = DirectionLabel::LookingStraight;

        if yaw > self.threshold {
            label = DirectionLabel::LookingLeft;
        } else if yaw < -self.threshold {
            label = DirectionLabel::LookingRight;
        }

        if roll > self.threshold {
            label = DirectionLabel::HeadTiltedRight;
        } else if roll < -self.threshold {
            label = DirectionLabel::HeadTiltedLeft;
        }

        label
    }
}

impl Default for HeadPoseClassifier {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Classifies with the default threshold.
#[must_use]
pub fn classify(yaw: f32, roll: f32) -> DirectionLabel {
    HeadPoseClassifier::default().classify(yaw, roll)
}
