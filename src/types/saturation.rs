//! Color saturation.

use serde::{Deserialize, Serialize};

/// Saturation as the bridge's `sat` value, from 0 (white) to 254 (fully
/// colored).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(from = "u8", into = "u8")]
pub struct Saturation {
    pub(crate) value: u8,
}

impl From<u8> for Saturation {
    fn from(value: u8) -> Self {
        Self::from_raw(value)
    }
}

impl From<Saturation> for u8 {
    fn from(saturation: Saturation) -> Self {
        saturation.value
    }
}

impl Saturation {
    const MAX: u8 = 254;

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value exceeds 254.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::Saturation;
    ///
    /// assert!(Saturation::create(0).is_some());
    /// assert!(Saturation::create(254).is_some());
    /// assert!(Saturation::create(255).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Saturation { value })
        } else {
            None
        }
    }

    pub fn from_raw(value: u8) -> Self {
        Saturation {
            value: value.min(Self::MAX),
        }
    }

    pub fn from_normalized(value: f32) -> Self {
        Saturation {
            value: (super::clamp_unit(value) * Self::MAX as f32) as u8,
        }
    }

    pub fn normalized(&self) -> f32 {
        self.value as f32 / Self::MAX as f32
    }
}
