//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the analytics core and the
//! camera, detector and presentation layers that surround it.

mod feature_source;
mod frame_source;
mod observer;

pub use feature_source::{DetectorAccuracy, DetectorConfig, FaceFeatureSource};
pub use frame_source::{FrameSource, ProcessingBlock};
pub use observer::{BlinkObserver, FrameObserver};
