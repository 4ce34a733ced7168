//! State change payload for Hue lights and groups.

use serde::{Deserialize, Serialize};

use crate::types::{Alert, Brightness, ColorTemperature, Effect, Hue, Saturation, TransitionTime};

/// A set of property changes to write to a light or group.
///
/// Only the properties that were set are serialized, so the JSON body sent to
/// the bridge contains exactly the changed properties. Several changes to the
/// same light are merged into one update before they are written.
///
/// # Examples
///
/// ```
/// use hue_bridge_rs::{Brightness, StateUpdate};
///
/// let mut update = StateUpdate::new();
/// update.on(true);
/// update.brightness(&Brightness::from_normalized(0.5));
///
/// let body = serde_json::to_value(&update).unwrap();
/// assert_eq!(body, serde_json::json!({"on": true, "bri": 127}));
/// ```
#[serde_with::skip_serializing_none]
#[derive(Default, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StateUpdate {
    pub(crate) on: Option<bool>,
    pub(crate) bri: Option<Brightness>,
    pub(crate) hue: Option<Hue>,
    pub(crate) sat: Option<Saturation>,
    pub(crate) ct: Option<ColorTemperature>,
    pub(crate) alert: Option<Alert>,
    pub(crate) effect: Option<Effect>,
    #[serde(rename = "transitiontime")]
    pub(crate) transition: Option<TransitionTime>,
}

impl StateUpdate {
    /// Create a new empty update.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::StateUpdate;
    ///
    /// let update = StateUpdate::new();
    /// assert!(update.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no property other than the transition time is set.
    ///
    /// A transition time on its own changes nothing on the bridge.
    pub fn is_empty(&self) -> bool {
        self.on.is_none()
            && self.bri.is_none()
            && self.hue.is_none()
            && self.sat.is_none()
            && self.ct.is_none()
            && self.alert.is_none()
            && self.effect.is_none()
    }

    pub fn on(&mut self, on: bool) {
        self.on = Some(on);
    }

    pub fn brightness(&mut self, brightness: &Brightness) {
        self.bri = Some(*brightness);
    }

    pub fn hue(&mut self, hue: &Hue) {
        self.hue = Some(*hue);
    }

    pub fn saturation(&mut self, saturation: &Saturation) {
        self.sat = Some(*saturation);
    }

    pub fn color_temperature(&mut self, ct: &ColorTemperature) {
        self.ct = Some(*ct);
    }

    pub fn alert(&mut self, alert: &Alert) {
        self.alert = Some(*alert);
    }

    pub fn effect(&mut self, effect: &Effect) {
        self.effect = Some(*effect);
    }

    pub fn transition(&mut self, transition: &TransitionTime) {
        self.transition = Some(*transition);
    }

    pub fn get_on(&self) -> Option<bool> {
        self.on
    }

    pub fn get_brightness(&self) -> Option<Brightness> {
        self.bri
    }

    /// Overwrite every property that is set in `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge_rs::{Brightness, StateUpdate};
    ///
    /// let mut first = StateUpdate::from(&Brightness::from_raw(10));
    /// first.on(true);
    ///
    /// let second = StateUpdate::from(&Brightness::from_raw(200));
    /// first.merge(&second);
    ///
    /// assert_eq!(first.get_on(), Some(true));
    /// assert_eq!(first.get_brightness().unwrap().value(), 200);
    /// ```
    pub fn merge(&mut self, other: &Self) {
        if other.on.is_some() {
            self.on = other.on;
        }
        if other.bri.is_some() {
            self.bri = other.bri;
        }
        if other.hue.is_some() {
            self.hue = other.hue;
        }
        if other.sat.is_some() {
            self.sat = other.sat;
        }
        if other.ct.is_some() {
            self.ct = other.ct;
        }
        if other.alert.is_some() {
            self.alert = other.alert;
        }
        if other.effect.is_some() {
            self.effect = other.effect;
        }
        if other.transition.is_some() {
            self.transition = other.transition;
        }
    }

    /// Move the contents out, leaving an empty update behind.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// True if `attribute` (a bridge field name such as `bri`) is set.
    pub(crate) fn has_attribute(&self, attribute: &str) -> bool {
        match attribute {
            "on" => self.on.is_some(),
            "bri" => self.bri.is_some(),
            "hue" => self.hue.is_some(),
            "sat" => self.sat.is_some(),
            "ct" => self.ct.is_some(),
            "alert" => self.alert.is_some(),
            "effect" => self.effect.is_some(),
            "transitiontime" => self.transition.is_some(),
            _ => false,
        }
    }
}

impl From<&Brightness> for StateUpdate {
    fn from(brightness: &Brightness) -> Self {
        let mut u = StateUpdate::new();
        u.brightness(brightness);
        u
    }
}

impl From<&Hue> for StateUpdate {
    fn from(hue: &Hue) -> Self {
        let mut u = StateUpdate::new();
        u.hue(hue);
        u
    }
}

impl From<&Saturation> for StateUpdate {
    fn from(saturation: &Saturation) -> Self {
        let mut u = StateUpdate::new();
        u.saturation(saturation);
        u
    }
}

impl From<&ColorTemperature> for StateUpdate {
    fn from(ct: &ColorTemperature) -> Self {
        let mut u = StateUpdate::new();
        u.color_temperature(ct);
        u
    }
}

impl From<&Alert> for StateUpdate {
    fn from(alert: &Alert) -> Self {
        let mut u = StateUpdate::new();
        u.alert(alert);
        u
    }
}

impl From<&Effect> for StateUpdate {
    fn from(effect: &Effect) -> Self {
        let mut u = StateUpdate::new();
        u.effect(effect);
        u
    }
}

impl From<bool> for StateUpdate {
    fn from(on: bool) -> Self {
        let mut u = StateUpdate::new();
        u.on(on);
        u
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transition_alone_is_empty() {
        let mut update = StateUpdate::new();
        update.transition(&TransitionTime::create(10));
        assert!(update.is_empty());
    }

    #[test]
    fn test_serializes_only_changed_fields() {
        let mut update = StateUpdate::from(&Alert::LongSelect);
        update.color_temperature(&ColorTemperature::from_raw(300));
        update.transition(&TransitionTime::create(0));
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"ct": 300, "alert": "lselect", "transitiontime": 0})
        );
    }

    #[test]
    fn test_take_leaves_empty() {
        let mut update = StateUpdate::from(true);
        let taken = update.take();
        assert!(update.is_empty());
        assert_eq!(taken.get_on(), Some(true));
    }

    #[test]
    fn test_has_attribute() {
        let update = StateUpdate::from(&Hue::create(100));
        assert!(update.has_attribute("hue"));
        assert!(!update.has_attribute("bri"));
        assert!(!update.has_attribute("colormode"));
    }
}
