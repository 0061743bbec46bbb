use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("goal must be at least 1, got {0}")]
pub struct ZeroGoalError(pub u32);

/// Number of solved problems a member needs to win. Always at least 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Goal(u32);

impl Goal {
    pub const MIN: Goal = Goal(1);
    pub const DEFAULT: Goal = Goal(50);

    /// Clamps any requested goal into the valid range: values below 1 become 1
    /// and values beyond `u32::MAX` saturate.
    #[must_use]
    pub fn clamped(requested: i64) -> Self {
        let value = u32::try_from(requested.max(1)).unwrap_or(u32::MAX);
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Goal {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Goal {
    type Error = ZeroGoalError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err(ZeroGoalError(value));
        }
        Ok(Self(value))
    }
}

impl From<Goal> for u32 {
    fn from(value: Goal) -> Self {
        value.0
    }
}

impl fmt::Debug for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Goal({})", self.0)
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
