//! Face FX Adapters - External adapters for face-fx.
//!
//! This crate provides adapters for:
//! - Directory-backed frame source
//! - Recorded (JSON Lines) face feature source
//! - Channel-backed blink and frame observers

pub mod channel;
pub mod features;
pub mod fs;

pub use channel::{ChannelBlinkObserver, LatestFrameObserver};
pub use features::RecordedFeatureSource;
pub use fs::{DeliveryStats, DirectoryFrameSource};
