//! Light state tracking.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::EnumString;

use crate::payload::StateUpdate;
use crate::types::{Alert, Brightness, ColorTemperature, Effect, Hue, Saturation};

/// The color mode a light last reported or was set to.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorMode {
    /// Hue and saturation
    Hs,
    /// CIE xy coordinates
    Xy,
    /// Color temperature
    Ct,
}

/// Local mirror of a light's state on the bridge.
///
/// Properties a light does not support (e.g. `hue` on a white-only bulb) are
/// `None` and stay `None` when updates are applied.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LightState {
    on: bool,
    brightness: Option<Brightness>,
    hue: Option<Hue>,
    saturation: Option<Saturation>,
    color_temperature: Option<ColorTemperature>,
    alert: Option<Alert>,
    effect: Option<Effect>,
    color_mode: Option<ColorMode>,
    reachable: bool,
}

impl LightState {
    /// Parse the bridge's `state` object. Requires an `on` boolean.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::LightState;
    /// use serde_json::json;
    ///
    /// let state = LightState::from_json(&json!({"on": true, "bri": 254})).unwrap();
    /// assert!(state.is_on());
    /// assert_eq!(state.brightness().unwrap().value(), 254);
    /// assert!(state.hue().is_none());
    /// assert!(state.is_reachable());
    ///
    /// assert!(LightState::from_json(&json!({"bri": 1})).is_none());
    /// ```
    pub fn from_json(json: &Value) -> Option<Self> {
        let raw: BridgeLightState = serde_json::from_value(json.clone()).ok()?;
        Some(LightState::from(&raw))
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    pub fn hue(&self) -> Option<Hue> {
        self.hue
    }

    pub fn saturation(&self) -> Option<Saturation> {
        self.saturation
    }

    pub fn color_temperature(&self) -> Option<ColorTemperature> {
        self.color_temperature
    }

    pub fn alert(&self) -> Option<Alert> {
        self.alert
    }

    pub fn effect(&self) -> Option<Effect> {
        self.effect
    }

    pub fn color_mode(&self) -> Option<ColorMode> {
        self.color_mode
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    /// Optimistically apply a pending update to the local state.
    pub(crate) fn apply(&mut self, update: &StateUpdate) {
        if let Some(on) = update.on {
            self.on = on;
        }
        if let Some(bri) = update.bri
            && self.brightness.is_some()
        {
            self.brightness = Some(bri);
        }
        if let Some(hue) = update.hue
            && self.hue.is_some()
        {
            self.hue = Some(hue);
            self.color_mode = Some(ColorMode::Hs);
        }
        if let Some(sat) = update.sat
            && self.saturation.is_some()
        {
            self.saturation = Some(sat);
            self.color_mode = Some(ColorMode::Hs);
        }
        if let Some(ct) = update.ct
            && self.color_temperature.is_some()
        {
            self.color_temperature = Some(ct);
            self.color_mode = Some(ColorMode::Ct);
        }
        if let Some(alert) = update.alert {
            self.alert = Some(alert);
        }
        if let Some(effect) = update.effect {
            self.effect = Some(effect);
        }
    }

    /// Apply one value the bridge confirmed, e.g. `bri` from
    /// `{"success": {"/lights/1/state/bri": 200}}`.
    ///
    /// Returns false if the attribute or value is not understood, or the
    /// light has no such capability.
    pub(crate) fn apply_success(&mut self, attribute: &str, value: &Value) -> bool {
        let supported = match attribute {
            "bri" => self.brightness.is_some(),
            "hue" => self.hue.is_some(),
            "sat" => self.saturation.is_some(),
            "ct" => self.color_temperature.is_some(),
            _ => true,
        };
        if !supported {
            return false;
        }
        match attribute {
            "on" => value.as_bool().map(|on| self.on = on).is_some(),
            "bri" => as_u8(value)
                .map(|v| self.brightness = Some(Brightness::from_raw(v)))
                .is_some(),
            "hue" => as_u16(value)
                .map(|v| {
                    self.hue = Some(Hue::from_raw(v));
                    self.color_mode = Some(ColorMode::Hs);
                })
                .is_some(),
            "sat" => as_u8(value)
                .map(|v| {
                    self.saturation = Some(Saturation::from_raw(v));
                    self.color_mode = Some(ColorMode::Hs);
                })
                .is_some(),
            "ct" => as_u16(value)
                .map(|v| {
                    self.color_temperature = Some(ColorTemperature::from_raw(v));
                    self.color_mode = Some(ColorMode::Ct);
                })
                .is_some(),
            "alert" => value
                .as_str()
                .and_then(|s| Alert::from_str(s).ok())
                .map(|a| self.alert = Some(a))
                .is_some(),
            "effect" => value
                .as_str()
                .and_then(|s| Effect::from_str(s).ok())
                .map(|e| self.effect = Some(e))
                .is_some(),
            _ => false,
        }
    }

    pub(crate) fn set_on(&mut self, on: bool) {
        self.on = on;
    }
}

impl From<&BridgeLightState> for LightState {
    fn from(raw: &BridgeLightState) -> Self {
        LightState {
            on: raw.on,
            brightness: raw.bri.map(Brightness::from_raw),
            hue: raw.hue.map(Hue::from_raw),
            saturation: raw.sat.map(Saturation::from_raw),
            color_temperature: raw.ct.map(ColorTemperature::from_raw),
            alert: raw.alert.as_deref().and_then(|s| Alert::from_str(s).ok()),
            effect: raw.effect.as_deref().and_then(|s| Effect::from_str(s).ok()),
            color_mode: raw
                .colormode
                .as_deref()
                .and_then(|s| ColorMode::from_str(s).ok()),
            reachable: raw.reachable.unwrap_or(true),
        }
    }
}

/// Light state as reported by the bridge.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct BridgeLightState {
    pub on: bool,
    #[serde(default)]
    pub bri: Option<u8>,
    #[serde(default)]
    pub hue: Option<u16>,
    #[serde(default)]
    pub sat: Option<u8>,
    #[serde(default)]
    pub ct: Option<u16>,
    #[serde(default)]
    pub alert: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub colormode: Option<String>,
    #[serde(default)]
    pub reachable: Option<bool>,
}

fn as_u8(value: &Value) -> Option<u8> {
    value.as_u64().map(|v| v.min(u8::MAX as u64) as u8)
}

fn as_u16(value: &Value) -> Option<u16> {
    value.as_u64().map(|v| v.min(u16::MAX as u64) as u16)
}
