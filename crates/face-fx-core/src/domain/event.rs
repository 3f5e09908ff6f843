//! Events emitted by the analytics stage.

use serde::{Deserialize, Serialize};

/// A detected blink, carrying the running blink count after the increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkEvent {
    /// Total blinks counted so far, including this one.
    pub count: u32,
}

impl BlinkEvent {
    /// Creates a new event.
    #[must_use]
    pub const fn new(count: u32) -> Self {
        Self { count }
    }
}
