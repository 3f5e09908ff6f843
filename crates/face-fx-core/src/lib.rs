//! Face FX Core - Domain logic for live facial effects
//!
//! This crate contains the domain types, ports, and the per-frame pipeline:
//! blink detection, head direction classification, overlay compositing and
//! observer notification. Camera input and face detection live behind the
//! traits in [`ports`].

pub mod analysis;
pub mod domain;
pub mod error;
pub mod notifier;
pub mod overlay;
pub mod pipeline;
pub mod ports;

pub use analysis::{BlinkAlgorithm, BlinkConfig, BlinkStateMachine, HeadPoseClassifier};
pub use domain::{BlinkEvent, DirectionLabel, FaceFeature, Frame, Point, Rect};
pub use error::{ConfigError, OverlayError};
pub use notifier::{EventNotifier, SubscriptionId};
pub use overlay::{OverlayCompositor, OverlayConfig, OverlayKind, OverlayPlan};
pub use pipeline::{FrameProcessor, FrameReport, PipelineConfig};
pub use ports::{
    BlinkObserver, DetectorAccuracy, DetectorConfig, FaceFeatureSource, FrameObserver,
    FrameSource, ProcessingBlock,
};
