//! White color temperature.

use serde::{Deserialize, Serialize};

/// Color temperature as the bridge's `ct` value in mired, from 153 (6500K,
/// cool daylight) to 500 (2000K, warm candlelight).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(from = "u16", into = "u16")]
pub struct ColorTemperature {
    pub(crate) mired: u16,
}

impl From<u16> for ColorTemperature {
    fn from(mired: u16) -> Self {
        Self::from_raw(mired)
    }
}

impl From<ColorTemperature> for u16 {
    fn from(temperature: ColorTemperature) -> Self {
        temperature.mired
    }
}

impl Default for ColorTemperature {
    fn default() -> Self {
        ColorTemperature { mired: Self::MAX }
    }
}

impl ColorTemperature {
    const MIN: u16 = 153;
    const MAX: u16 = 500;

    pub fn mired(&self) -> u16 {
        self.mired
    }

    /// Returns None if value is outside the bridge range (153-500).
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::ColorTemperature;
    ///
    /// assert!(ColorTemperature::create(152).is_none());
    /// assert!(ColorTemperature::create(153).is_some());
    /// assert!(ColorTemperature::create(500).is_some());
    /// assert!(ColorTemperature::create(501).is_none());
    /// ```
    pub fn create(mired: u16) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&mired) {
            Some(ColorTemperature { mired })
        } else {
            None
        }
    }

    pub fn from_raw(mired: u16) -> Self {
        ColorTemperature {
            mired: mired.clamp(Self::MIN, Self::MAX),
        }
    }

    /// Converts from Kelvin, clamping to what the bridge accepts.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::ColorTemperature;
    ///
    /// assert_eq!(ColorTemperature::from_kelvin(4000).mired(), 250);
    /// assert_eq!(ColorTemperature::from_kelvin(10_000).mired(), 153);
    /// assert_eq!(ColorTemperature::from_kelvin(0).mired(), 500);
    /// ```
    pub fn from_kelvin(kelvin: u32) -> Self {
        if kelvin == 0 {
            return Self::from_raw(Self::MAX);
        }
        let mired = (1_000_000 / kelvin).min(u16::MAX as u32) as u16;
        Self::from_raw(mired)
    }

    pub fn kelvin(&self) -> u32 {
        1_000_000 / self.mired.max(Self::MIN) as u32
    }

    /// Maps `0.0` to the coolest and `1.0` to the warmest temperature.
    pub fn from_normalized(value: f32) -> Self {
        let span = (Self::MAX - Self::MIN) as f32;
        Self::from_raw(Self::MIN + (super::clamp_unit(value) * span) as u16)
    }

    pub fn normalized(&self) -> f32 {
        self.mired.saturating_sub(Self::MIN) as f32 / (Self::MAX - Self::MIN) as f32
    }
}
