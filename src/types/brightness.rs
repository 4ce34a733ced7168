//! Brightness control for Hue lights.

use serde::{Deserialize, Serialize};

/// Brightness as the bridge's `bri` value, from 1 (dimmest) to 254.
///
/// A brightness of 1 is not off; lights are switched off through `on`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(from = "u8", into = "u8")]
pub struct Brightness {
    pub(crate) value: u8,
}

impl From<u8> for Brightness {
    fn from(value: u8) -> Self {
        Self::from_raw(value)
    }
}

impl From<Brightness> for u8 {
    fn from(brightness: Brightness) -> Self {
        brightness.value
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::new()
    }
}

impl Brightness {
    const MIN: u8 = 1;
    const MAX: u8 = 254;

    /// Full brightness.
    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside the bridge range (1-254).
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::Brightness;
    ///
    /// assert!(Brightness::create(0).is_none());
    /// assert!(Brightness::create(1).is_some());
    /// assert!(Brightness::create(254).is_some());
    /// assert!(Brightness::create(255).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if Self::is_valid(value) {
            Some(Brightness { value })
        } else {
            None
        }
    }

    /// Clamps a raw bridge value into range.
    pub fn from_raw(value: u8) -> Self {
        Brightness {
            value: value.clamp(Self::MIN, Self::MAX),
        }
    }

    /// Converts a normalized `0.0..=1.0` value, clamping out-of-range input.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::Brightness;
    ///
    /// assert_eq!(Brightness::from_normalized(1.0).value(), 254);
    /// assert_eq!(Brightness::from_normalized(0.5).value(), 127);
    /// assert_eq!(Brightness::from_normalized(0.0).value(), 1);
    /// assert_eq!(Brightness::from_normalized(7.0).value(), 254);
    /// ```
    pub fn from_normalized(value: f32) -> Self {
        let scaled = (super::clamp_unit(value) * Self::MAX as f32) as u8;
        Self::from_raw(scaled)
    }

    pub fn normalized(&self) -> f32 {
        self.value as f32 / Self::MAX as f32
    }

    fn is_valid(value: u8) -> bool {
        (Self::MIN..=Self::MAX).contains(&value)
    }
}
