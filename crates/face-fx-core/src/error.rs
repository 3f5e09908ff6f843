//! Typed errors raised by the core.

use thiserror::Error;

/// Invalid configuration values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The blink window cannot hold any samples.
    #[error("blink window must hold at least one sample")]
    EmptyWindow,

    /// The closed-sample range is inverted.
    #[error("blink range is inverted: min_closed {min} > max_closed {max}")]
    InvertedRange {
        /// Lower bound.
        min: usize,
        /// Upper bound.
        max: usize,
    },

    /// The closed-sample range cannot be satisfied by a full window.
    #[error("blink range minimum {min} exceeds window size {window}")]
    RangeExceedsWindow {
        /// Lower bound.
        min: usize,
        /// Window capacity.
        window: usize,
    },

    /// A pose threshold is negative or not a number.
    #[error("pose threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f32),
}

/// Failure to build a single overlay layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// A face landmark or region contains NaN or infinite coordinates.
    #[error("non-finite geometry in {0}")]
    NonFinite(&'static str),
}
