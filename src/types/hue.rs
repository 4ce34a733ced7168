//! Hue angle on the bridge's 16 bit color wheel.

use serde::{Deserialize, Serialize};

/// Hue as the bridge's `hue` value, wrapping from 0 (red) through 21845
/// (green) and 43690 (blue) back to 65535 (red).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(transparent)]
pub struct Hue {
    pub(crate) value: u16,
}

impl Hue {
    const MAX: u16 = u16::MAX;

    /// Every `u16` is a valid hue, so unlike the other value types this
    /// never fails.
    pub fn create(value: u16) -> Self {
        Hue { value }
    }

    /// Same as [`Hue::create`]; kept for parity with the clamping
    /// constructors of the other value types.
    pub fn from_raw(value: u16) -> Self {
        Self::create(value)
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// Converts a normalized `0.0..=1.0` value, clamping out-of-range input.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::Hue;
    ///
    /// assert_eq!(Hue::from_normalized(0.0).value(), 0);
    /// assert_eq!(Hue::from_normalized(1.0).value(), 65535);
    /// assert_eq!(Hue::from_normalized(-1.0).value(), 0);
    /// ```
    pub fn from_normalized(value: f32) -> Self {
        Hue {
            value: (super::clamp_unit(value) * Self::MAX as f32) as u16,
        }
    }

    /// Converts a hue angle in degrees; angles wrap around 360.
    pub fn from_degrees(degrees: f32) -> Self {
        Self::from_normalized(degrees.rem_euclid(360.0) / 360.0)
    }

    pub fn normalized(&self) -> f32 {
        self.value as f32 / Self::MAX as f32
    }

    pub fn degrees(&self) -> f32 {
        self.normalized() * 360.0
    }
}
