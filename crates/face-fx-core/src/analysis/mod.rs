//! Per-face analytics: temporal blink detection and head direction.

mod blink;
mod head_pose;

pub use blink::{BlinkAlgorithm, BlinkConfig, BlinkStateMachine, BlinkPhase};
pub use head_pose::{classify, HeadPoseClassifier};
