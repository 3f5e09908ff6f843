//! Head direction labels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the head is pointing, as derived from yaw and roll.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionLabel {
    /// Neither yaw nor roll beyond threshold.
    #[default]
    LookingStraight,
    /// Yaw above the positive threshold.
    LookingLeft,
    /// Yaw below the negative threshold.
    LookingRight,
    /// Roll above the positive threshold.
    HeadTiltedRight,
    /// Roll below the negative threshold.
    HeadTiltedLeft,
}

impl DirectionLabel {
    /// Display text shown in the status overlay.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LookingStraight => "Looking Straight",
            Self::LookingLeft => "Looking Left",
            Self::LookingRight => "Looking Right",
            Self::HeadTiltedRight => "Head Tilted Right",
            Self::HeadTiltedLeft => "Head Tilted Left",
        }
    }
}

impl fmt::Display for DirectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
