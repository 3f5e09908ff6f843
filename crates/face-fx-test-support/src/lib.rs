//! Test support utilities for face-fx.
//!
//! Provides mocks for every core port and synthetic frame and face builders
//! for testing the per-frame pipeline.
//!
//! # Example
//!
//! ```
//! use face_fx_test_support::{FaceFeatureBuilder, MockFeatureSource, SyntheticFrameBuilder};
//!
//! // Two frames: eyes closed, then open
//! let faces = FaceFeatureBuilder::default().eye_sequence(&[true, false]);
//! let detector = MockFeatureSource::new(faces);
//!
//! let frames = SyntheticFrameBuilder::sequence(2, 320, 240);
//! assert_eq!(frames.len(), 2);
//! ```

mod builders;
mod mocks;

pub use builders::{FaceFeatureBuilder, SyntheticFrameBuilder};
pub use mocks::{
    MockFeatureSource, MockFrameSource, RecordingBlinkObserver, RecordingFrameObserver,
};
