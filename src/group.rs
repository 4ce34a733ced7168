//! Groups of lights managed by the bridge.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, EnumString};

use crate::light::Light;
use crate::payload::StateUpdate;
use crate::types::Brightness;

/// The bridge's group `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr)]
pub enum GroupKind {
    /// A multisource luminaire, created by the bridge
    Luminaire,
    /// One light source of a luminaire, created by the bridge
    Lightsource,
    /// A user-defined set of lights
    LightGroup,
    Room,
    Zone,
    Entertainment,
}

/// A group of lights on the bridge.
///
/// Actions on a group are sent once to `groups/<id>/action` and mirrored
/// locally onto the reachable member lights.
///
/// # Example
///
/// ```
/// use hue_bridge_rs::{Group, GroupKind};
/// use serde_json::json;
///
/// let group = Group::from_json("1", &json!({
///     "name": "Living room",
///     "lights": ["1", "2"],
///     "type": "Room",
/// }))
/// .unwrap();
/// assert_eq!(group.kind(), GroupKind::Room);
/// assert_eq!(group.light_ids(), ["1", "2"]);
///
/// assert!(Group::from_json("2", &json!({"name": "x", "lights": [], "type": "Unknown"})).is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    identifier: String,
    name: String,
    light_ids: Vec<String>,
    kind: GroupKind,
    #[serde(skip)]
    pub(crate) pending: StateUpdate,
    #[serde(skip)]
    pub(crate) queued: bool,
}

/// Aggregated state of a group's reachable lights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStatus {
    /// At least one member is reachable and every reachable member is on.
    pub is_on: bool,
    /// Mean normalized brightness of the reachable members that report one.
    pub brightness: Option<f32>,
    pub reachable_light_ids: Vec<String>,
}

impl Group {
    /// Create a group from known parts.
    pub fn new(identifier: &str, name: &str, light_ids: Vec<String>, kind: GroupKind) -> Self {
        Group {
            identifier: identifier.to_string(),
            name: name.to_string(),
            light_ids,
            kind,
            pending: StateUpdate::new(),
            queued: false,
        }
    }

    /// Parse a group from its entry in the bridge's `groups` object.
    ///
    /// Returns `None` unless `name`, `lights` and a known `type` are present.
    pub fn from_json(identifier: &str, json: &Value) -> Option<Self> {
        let name = json.get("name")?.as_str()?;
        let light_ids = json
            .get("lights")?
            .as_array()?
            .iter()
            .map(|id| id.as_str().map(String::from))
            .collect::<Option<Vec<_>>>()?;
        let kind = json.get("type")?.as_str()?.parse::<GroupKind>().ok()?;
        Some(Group::new(identifier, name, light_ids, kind))
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn light_ids(&self) -> &[String] {
        &self.light_ids
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Member lights present in `lights` and currently reachable.
    pub fn reachable_lights<'a>(
        &'a self,
        lights: &'a HashMap<String, Light>,
    ) -> impl Iterator<Item = &'a Light> + 'a {
        self.light_ids
            .iter()
            .filter_map(|id| lights.get(id))
            .filter(|light| light.is_reachable())
    }

    /// Aggregate the state of the reachable member lights.
    pub fn status(&self, lights: &HashMap<String, Light>) -> GroupStatus {
        let reachable: Vec<&Light> = self.reachable_lights(lights).collect();
        let brightnesses: Vec<f32> = reachable
            .iter()
            .filter_map(|light| light.brightness())
            .map(|b| b.normalized())
            .collect();

        GroupStatus {
            is_on: !reachable.is_empty() && reachable.iter().all(|light| light.is_on()),
            brightness: if brightnesses.is_empty() {
                None
            } else {
                Some(brightnesses.iter().sum::<f32>() / brightnesses.len() as f32)
            },
            reachable_light_ids: reachable
                .iter()
                .map(|light| light.identifier().to_string())
                .collect(),
        }
    }

    /// Mirror an action onto the reachable member lights without writing
    /// anything to the bridge for them individually.
    pub(crate) fn apply_to_members(&self, update: &StateUpdate, lights: &mut HashMap<String, Light>) {
        for id in &self.light_ids {
            if let Some(light) = lights.get_mut(id)
                && light.is_reachable()
            {
                light.state_mut().apply(update);
            }
        }
    }

    /// Mirror one confirmed action value onto the reachable member lights.
    pub(crate) fn apply_success_to_members(
        &self,
        attribute: &str,
        value: &Value,
        lights: &mut HashMap<String, Light>,
    ) {
        for id in &self.light_ids {
            if let Some(light) = lights.get_mut(id)
                && light.is_reachable()
                && !light.pending.has_attribute(attribute)
            {
                light.state_mut().apply_success(attribute, value);
            }
        }
    }

    /// True if the group holds exactly this set of lights.
    pub fn contains_exactly(&self, light_ids: &BTreeSet<String>) -> bool {
        let own: BTreeSet<&String> = self.light_ids.iter().collect();
        own.len() == light_ids.len() && light_ids.iter().all(|id| own.contains(id))
    }

    pub(crate) fn state_update_path(&self) -> String {
        format!("groups/{}/action", self.identifier)
    }

    pub(crate) fn attributes_path(&self) -> String {
        format!("groups/{}", self.identifier)
    }

    pub(crate) fn set_light_ids(&mut self, light_ids: Vec<String>) {
        self.light_ids = light_ids;
    }

    /// Merge a freshly parsed copy of this group into `self`.
    pub(crate) fn update_from(&mut self, other: &Self) {
        self.name.clone_from(&other.name);
        self.light_ids.clone_from(&other.light_ids);
        self.kind = other.kind;
    }
}

impl GroupStatus {
    /// Mean brightness as a bridge value.
    pub fn brightness_value(&self) -> Option<Brightness> {
        self.brightness.map(Brightness::from_normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> HashMap<String, Light> {
        let mut lights = HashMap::new();
        for (id, on, bri, reachable) in [
            ("1", true, Some(254), true),
            ("2", true, Some(127), true),
            ("3", false, Some(10), false),
            ("4", true, None, true),
        ] {
            let mut state = json!({"on": on, "reachable": reachable});
            if let Some(bri) = bri {
                state["bri"] = json!(bri);
            }
            let light = Light::from_json(id, &json!({"name": id, "state": state})).unwrap();
            lights.insert(id.to_string(), light);
        }
        lights
    }

    fn group(ids: &[&str]) -> Group {
        Group::new(
            "1",
            "test",
            ids.iter().map(|s| s.to_string()).collect(),
            GroupKind::LightGroup,
        )
    }

    #[test]
    fn test_status_ignores_unreachable() {
        let status = group(&["1", "2", "3", "4"]).status(&registry());
        assert!(status.is_on);
        assert_eq!(status.reachable_light_ids, vec!["1", "2", "4"]);
        let mean = status.brightness.unwrap();
        assert!((mean - (1.0 + 127.0 / 254.0) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_status_without_reachable_lights() {
        let status = group(&["3", "missing"]).status(&registry());
        assert!(!status.is_on);
        assert!(status.brightness.is_none());
        assert!(status.reachable_light_ids.is_empty());
    }

    #[test]
    fn test_status_one_light_off() {
        let mut lights = registry();
        lights.get_mut("2").unwrap().state_mut().set_on(false);
        assert!(!group(&["1", "2"]).status(&lights).is_on);
    }

    #[test]
    fn test_apply_to_members() {
        let mut lights = registry();
        let mut update = StateUpdate::from(&Brightness::from_raw(50));
        update.on(true);
        group(&["2", "3", "4"]).apply_to_members(&update, &mut lights);

        assert_eq!(lights["2"].brightness().unwrap().value(), 50);
        // unreachable light untouched
        assert!(!lights["3"].is_on());
        assert_eq!(lights["3"].brightness().unwrap().value(), 10);
        assert!(lights["4"].brightness().is_none());
    }

    #[test]
    fn test_contains_exactly() {
        let g = group(&["1", "2", "2"]);
        let wanted: BTreeSet<String> = ["1", "2"].iter().map(|s| s.to_string()).collect();
        assert!(g.contains_exactly(&wanted));
        let more: BTreeSet<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        assert!(!g.contains_exactly(&more));
    }

    #[test]
    fn test_group_kind_names() {
        assert_eq!("LightGroup".parse::<GroupKind>().unwrap(), GroupKind::LightGroup);
        assert_eq!(GroupKind::Room.as_ref(), "Room");
    }
}
