//! Transition duration for state changes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Transition time in multiples of 100ms, as the bridge's `transitiontime`.
///
/// The bridge default when omitted is 4 (400ms).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct TransitionTime {
    pub(crate) deciseconds: u16,
}

impl Default for TransitionTime {
    fn default() -> Self {
        TransitionTime { deciseconds: 4 }
    }
}

impl TransitionTime {
    pub fn create(deciseconds: u16) -> Self {
        TransitionTime { deciseconds }
    }

    /// Rounds down to the nearest 100ms, saturating at the `u16` limit.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hue_bridge_rs::TransitionTime;
    ///
    /// assert_eq!(TransitionTime::from_duration(Duration::from_millis(1250)).deciseconds(), 12);
    /// assert_eq!(TransitionTime::from_duration(Duration::ZERO).deciseconds(), 0);
    /// ```
    pub fn from_duration(duration: Duration) -> Self {
        let deciseconds = (duration.as_millis() / 100).min(u16::MAX as u128) as u16;
        TransitionTime { deciseconds }
    }

    pub fn deciseconds(&self) -> u16 {
        self.deciseconds
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.deciseconds as u64 * 100)
    }
}
