//! Alert and effect modes.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};

/// Temporary alert effect of a light.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Alert {
    /// Not performing an alert
    None,
    /// One breathe cycle
    Select,
    /// Breathe cycles for 15 seconds
    #[serde(rename = "lselect")]
    #[strum(serialize = "lselect")]
    LongSelect,
}

/// Dynamic effect of a light.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Effect {
    None,
    /// Cycle through all hues at the current brightness and saturation
    #[serde(rename = "colorloop")]
    #[strum(serialize = "colorloop")]
    ColorLoop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_alert_strings() {
        assert_eq!(Alert::from_str("lselect").unwrap(), Alert::LongSelect);
        assert_eq!(Alert::Select.as_ref(), "select");
        assert_eq!(serde_json::to_value(Alert::LongSelect).unwrap(), "lselect");
        assert!(Alert::from_str("blink").is_err());
    }

    #[test]
    fn test_effect_strings() {
        assert_eq!(Effect::from_str("colorloop").unwrap(), Effect::ColorLoop);
        assert_eq!(serde_json::to_value(Effect::None).unwrap(), "none");
    }
}
