//! Core domain types for per-frame face analytics.

mod direction;
mod event;
mod feature;
mod frame;

pub use direction::DirectionLabel;
pub use event::BlinkEvent;
pub use feature::{FaceFeature, Point, Rect};
pub use frame::Frame;
