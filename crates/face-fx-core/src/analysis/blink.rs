//! Blink detection over a sliding window of eyes-closed samples.
//!
//! The machine has two phases. While accumulating, each sample is appended
//! to a bounded history and the full window is tested against the configured
//! closed-sample range. A match counts one blink, clears the history and
//! enters cooldown, during which samples are dropped until the counter
//! reaches zero.
//!
//! The defaults (10-sample window, 2 to 6 closed samples, 10-frame cooldown)
//! are the canonical tuning. A 3 to 7 range and a plain closed-then-open edge
//! detector are both reachable through [`BlinkConfig`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::BlinkEvent;
use crate::error::ConfigError;

/// Default sliding window capacity.
pub const DEFAULT_WINDOW: usize = 10;
/// Default minimum closed samples in a full window.
pub const DEFAULT_MIN_CLOSED: usize = 2;
/// Default maximum closed samples in a full window.
pub const DEFAULT_MAX_CLOSED: usize = 6;
/// Default number of samples ignored after a blink.
pub const DEFAULT_COOLDOWN_FRAMES: u32 = 10;

/// Pattern used to decide that a blink happened.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlinkAlgorithm {
    /// Count closed samples in a full sliding window.
    #[default]
    SlidingWindow,
    /// Fire when a closed sample is followed by an open one.
    FallingEdge,
}

/// Tuning for [`BlinkStateMachine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Detection pattern.
    pub algorithm: BlinkAlgorithm,
    /// History capacity for the sliding window.
    pub window: usize,
    /// Inclusive lower bound on closed samples.
    pub min_closed: usize,
    /// Inclusive upper bound on closed samples.
    pub max_closed: usize,
    /// Samples discarded after each blink.
    pub cooldown_frames: u32,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            algorithm: BlinkAlgorithm::SlidingWindow,
            window: DEFAULT_WINDOW,
            min_closed: DEFAULT_MIN_CLOSED,
            max_closed: DEFAULT_MAX_CLOSED,
            cooldown_frames: DEFAULT_COOLDOWN_FRAMES,
        }
    }
}

impl BlinkConfig {
    /// Sets the inclusive closed-sample range.
    #[must_use]
    pub const fn with_range(mut self, min_closed: usize, max_closed: usize) -> Self {
        self.min_closed = min_closed;
        self.max_closed = max_closed;
        self
    }

    /// Sets the detection algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: BlinkAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the cooldown length.
    #[must_use]
    pub const fn with_cooldown(mut self, frames: u32) -> Self {
        self.cooldown_frames = frames;
        self
    }

    /// Checks that the configuration can ever match.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.min_closed > self.max_closed {
            return Err(ConfigError::InvertedRange {
                min: self.min_closed,
                max: self.max_closed,
            });
        }
        if self.min_closed > self.window {
            return Err(ConfigError::RangeExceedsWindow {
                min: self.min_closed,
                window: self.window,
            });
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        match self.algorithm {
            BlinkAlgorithm::SlidingWindow => self.window,
            BlinkAlgorithm::FallingEdge => 2,
        }
    }
}

/// Current phase of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkPhase {
    /// Samples are being recorded and evaluated.
    Accumulating,
    /// Samples are being discarded; holds the frames left.
    Cooldown(u32),
}

/// Counts blinks from a stream of per-frame eyes-closed samples.
#[derive(Debug, Clone)]
pub struct BlinkStateMachine {
    config: BlinkConfig,
    history: VecDeque<bool>,
    cooldown: u32,
    count: u32,
}

impl BlinkStateMachine {
    /// Creates a machine with the given configuration.
    #[must_use]
    pub fn new(config: BlinkConfig) -> Self {
        let capacity = config.capacity();
        Self {
            config,
            history: VecDeque::with_capacity(capacity + 1),
            cooldown: 0,
            count: 0,
        }
    }

    /// Feeds one sample and returns an event if it completed a blink.
    pub fn ingest(&mut self, eyes_closed: bool) -> Option<BlinkEvent> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            trace!(remaining = self.cooldown, "Blink sample dropped during cooldown");
            return None;
        }

        self.history.push_back(eyes_closed);
        if self.history.len() > self.config.capacity() {
            self.history.pop_front();
        }

        if !self.matches() {
            return None;
        }

        self.count += 1;
        self.history.clear();
        self.cooldown = self.config.cooldown_frames;
        debug!(count = self.count, "Blink detected");
        Some(BlinkEvent::new(self.count))
    }

    fn matches(&self) -> bool {
        match self.config.algorithm {
            BlinkAlgorithm::SlidingWindow => {
                if self.history.len() != self.config.window {
                    return false;
                }
                let closed = self.history.iter().filter(|&&s| s).count();
                (self.config.min_closed..=self.config.max_closed).contains(&closed)
            }
            BlinkAlgorithm::FallingEdge => {
                self.history.len() == 2
                    && matches!(
                        (self.history.front().copied(), self.history.back().copied()),
                        (Some(true), Some(false))
                    )
            }
        }
    }

    /// Total blinks counted.
    #[must_use]
    pub const fn blink_count(&self) -> u32 {
        self.count
    }

    /// Remaining cooldown samples.
    #[must_use]
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Number of samples currently held.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> BlinkPhase {
        if self.cooldown > 0 {
            BlinkPhase::Cooldown(self.cooldown)
        } else {
            BlinkPhase::Accumulating
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &BlinkConfig {
        &self.config
    }

    /// Clears history, cooldown and count.
    pub fn reset(&mut self) {
        self.history.clear();
        self.cooldown = 0;
        self.count = 0;
    }
}

impl Default for BlinkStateMachine {
    fn default() -> Self {
        Self::new(BlinkConfig::default())
    }
}
