//! Face feature detection port.

use serde::{Deserialize, Serialize};

use crate::domain::{FaceFeature, Frame};

/// Detector accuracy trade-off.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorAccuracy {
    /// Faster, less precise detection.
    Low,
    /// Slower, more precise detection.
    #[default]
    High,
}

/// Setup-time parameters handed to the detector on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Accuracy level.
    pub accuracy: DetectorAccuracy,
    /// Maximum number of faces to report.
    pub max_faces: usize,
    /// Minimum face size as a fraction of the frame's smaller dimension.
    pub min_feature_size: f32,
    /// Whether the detector may track faces across frames.
    pub tracking: bool,
    /// Whether to evaluate the smiling flag.
    pub detect_smiles: bool,
    /// Whether to evaluate the eye-closed flags.
    pub detect_eye_blinks: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            accuracy: DetectorAccuracy::High,
            max_faces: 10,
            min_feature_size: 0.1,
            tracking: false,
            detect_smiles: true,
            detect_eye_blinks: true,
        }
    }
}

/// Port for the black-box face landmark detector.
pub trait FaceFeatureSource: Send {
    /// Returns the faces found in `frame`, in detector order.
    ///
    /// # Errors
    ///
    /// Returns an error if detection fails for this frame. The pipeline
    /// treats a failure as a frame with no faces.
    fn detect(&self, frame: &Frame, config: &DetectorConfig) -> anyhow::Result<Vec<FaceFeature>>;
}
