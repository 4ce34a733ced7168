//! Individual light mirrored from the bridge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::StateUpdate;
use crate::state::LightState;
use crate::types::{Brightness, ColorTemperature, Hue, Saturation};

/// A light known to the bridge.
///
/// `Light` values handed out by [`crate::Bridge`] are snapshots of the local
/// registry. Changes are written through [`crate::Bridge::update_light`].
///
/// # Example
///
/// ```
/// use hue_bridge_rs::Light;
/// use serde_json::json;
///
/// let light = Light::from_json("1", &json!({
///     "name": "Hue color lamp 1",
///     "type": "Extended color light",
///     "state": {"on": true, "bri": 127, "reachable": true},
/// }))
/// .unwrap();
/// assert_eq!(light.name(), Some("Hue color lamp 1"));
/// assert!(light.is_on());
/// assert_eq!(light.brightness().unwrap().value(), 127);
/// ```
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Light {
    identifier: String,
    name: Option<String>,
    kind: Option<String>,
    model_id: Option<String>,
    unique_id: Option<String>,
    sw_version: Option<String>,
    state: LightState,
    #[serde(skip)]
    pub(crate) pending: StateUpdate,
    #[serde(skip)]
    pub(crate) queued: bool,
}

impl Light {
    /// Parse a light from its entry in the bridge's `lights` object.
    ///
    /// Returns `None` when the entry carries no `state.on` boolean.
    pub fn from_json(identifier: &str, json: &Value) -> Option<Self> {
        let state = LightState::from_json(json.get("state")?)?;
        let text = |key: &str| json.get(key).and_then(Value::as_str).map(String::from);
        Some(Light {
            identifier: identifier.to_string(),
            name: text("name"),
            kind: text("type"),
            model_id: text("modelid"),
            unique_id: text("uniqueid"),
            sw_version: text("swversion"),
            state,
            pending: StateUpdate::new(),
            queued: false,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The bridge's light type, e.g. `Extended color light`.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn model_id(&self) -> Option<&str> {
        self.model_id.as_deref()
    }

    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    pub fn sw_version(&self) -> Option<&str> {
        self.sw_version.as_deref()
    }

    pub fn state(&self) -> &LightState {
        &self.state
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    pub fn is_reachable(&self) -> bool {
        self.state.is_reachable()
    }

    pub fn brightness(&self) -> Option<Brightness> {
        self.state.brightness()
    }

    pub fn hue(&self) -> Option<Hue> {
        self.state.hue()
    }

    pub fn saturation(&self) -> Option<Saturation> {
        self.state.saturation()
    }

    pub fn color_temperature(&self) -> Option<ColorTemperature> {
        self.state.color_temperature()
    }

    /// Changes applied locally that have not been sent to the bridge yet.
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub(crate) fn state_mut(&mut self) -> &mut LightState {
        &mut self.state
    }

    pub(crate) fn state_update_path(&self) -> String {
        format!("lights/{}/state", self.identifier)
    }

    /// Merge a freshly parsed copy of this light into `self`.
    ///
    /// Pending changes survive and are re-applied on top of the bridge state.
    pub(crate) fn update_from(&mut self, other: &Self) {
        self.name.clone_from(&other.name);
        self.kind.clone_from(&other.kind);
        self.model_id.clone_from(&other.model_id);
        self.unique_id.clone_from(&other.unique_id);
        self.sw_version.clone_from(&other.sw_version);
        self.state = other.state.clone();
        self.state.apply(&self.pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn light(bri: u8) -> Light {
        Light::from_json(
            "7",
            &json!({"name": "Desk", "state": {"on": false, "bri": bri}}),
        )
        .unwrap()
    }

    #[test]
    fn test_requires_on() {
        assert!(Light::from_json("1", &json!({"name": "x", "state": {"bri": 1}})).is_none());
        assert!(Light::from_json("1", &json!({"name": "x"})).is_none());
    }

    #[test]
    fn test_state_update_path() {
        assert_eq!(light(1).state_update_path(), "lights/7/state");
    }

    #[test]
    fn test_update_from_keeps_pending() {
        let mut local = light(10);
        local.pending.merge(&StateUpdate::from(true));
        local.queued = true;

        let mut fresh = light(50);
        fresh.name = Some("Desk lamp".to_string());
        local.update_from(&fresh);

        assert_eq!(local.name(), Some("Desk lamp"));
        assert_eq!(local.brightness().unwrap().value(), 50);
        assert!(local.is_on());
        assert!(local.queued);
        assert!(local.has_pending_changes());
    }
}
