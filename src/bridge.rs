//! Connection to one Hue bridge and the local mirror of its lights and groups.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use log::debug;
use serde_json::{Map, Value, json};

use crate::api;
use crate::config::{BridgeConfig, ClientConfig};
use crate::errors::{ApiErrorKind, Error};
use crate::group::{Group, GroupKind, GroupStatus};
use crate::history::{MessageHistory, MessageType};
use crate::light::Light;
use crate::payload::StateUpdate;
use crate::queue::{QueueItem, Target, UpdateQueue, mark_queued};
use crate::runtime::{Mutex, oneshot};
use crate::transport::{HttpTransport, Method, Transport};
use crate::types::Brightness;

type Result<T> = std::result::Result<T, Error>;

/// An item the bridge reports in its full state, keyed by identifier.
pub(crate) trait BridgeItem: Sized {
    fn from_json(identifier: &str, json: &Value) -> Option<Self>;

    /// Merge a freshly parsed copy into the existing item.
    fn update_from(&mut self, other: &Self);
}

impl BridgeItem for Light {
    fn from_json(identifier: &str, json: &Value) -> Option<Self> {
        Light::from_json(identifier, json)
    }

    fn update_from(&mut self, other: &Self) {
        Light::update_from(self, other)
    }
}

impl BridgeItem for Group {
    fn from_json(identifier: &str, json: &Value) -> Option<Self> {
        Group::from_json(identifier, json)
    }

    fn update_from(&mut self, other: &Self) {
        Group::update_from(self, other)
    }
}

/// Replace `items` with the parsed `json` entries, keeping the existing
/// object (and its pending changes) for identifiers already known.
///
/// Entries that fail to parse are skipped; items the bridge no longer
/// reports are dropped.
pub(crate) fn merge_items<T: BridgeItem>(items: &mut HashMap<String, T>, json: &Map<String, Value>) {
    let mut merged = HashMap::with_capacity(json.len());
    for (identifier, item_json) in json {
        let Some(fresh) = T::from_json(identifier, item_json) else {
            debug!("skipping unparseable bridge item {identifier}");
            continue;
        };
        let item = match items.remove(identifier) {
            Some(mut existing) => {
                existing.update_from(&fresh);
                existing
            }
            None => fresh,
        };
        merged.insert(identifier.clone(), item);
    }
    *items = merged;
}

#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) username: Option<String>,
    pub(crate) config: Option<BridgeConfig>,
    pub(crate) lights: HashMap<String, Light>,
    pub(crate) groups: HashMap<String, Group>,
}

pub(crate) struct Inner {
    pub(crate) host: String,
    pub(crate) config: ClientConfig,
    transport: Arc<dyn Transport>,
    pub(crate) registry: Mutex<Registry>,
    pub(crate) history: Mutex<MessageHistory>,
    queue: UpdateQueue,
}

impl Inner {
    /// Send an authenticated request to `path` below the user's namespace.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let username = self
            .registry
            .lock()
            .await
            .username
            .clone()
            .ok_or(Error::UsernameNotSet)?;
        let full_path = if path.is_empty() {
            username
        } else {
            format!("{username}/{path}")
        };
        let label = format!(
            "{} /{}",
            method.as_str(),
            path.trim_start_matches('/')
        );
        self.send(method, &full_path, &label, body).await
    }

    /// Send a request and record it in the history under `label`, which
    /// never contains the username.
    async fn send(
        &self,
        method: Method,
        path: &str,
        label: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        self.history
            .lock()
            .await
            .record(MessageType::Send, label, body.as_ref().unwrap_or(&Value::Null));

        match self.transport.request(method, path, body).await {
            Ok(response) => {
                debug!("{label} -> {response}");
                self.history
                    .lock()
                    .await
                    .record(MessageType::Receive, label, &response);
                Ok(response)
            }
            Err(e) => {
                self.history.lock().await.record_error(&e.to_string());
                Err(e)
            }
        }
    }
}

/// A Hue bridge on the local network.
///
/// `Bridge` is a cheap, cloneable handle. All clones share one registry of
/// lights and groups and one update queue; the queue's worker stops once the
/// last handle is dropped.
///
/// # Example
///
/// ```ignore
/// use hue_bridge_rs::{Bridge, StateUpdate, Brightness};
///
/// let bridge = Bridge::new("192.168.1.2", Some("my-username"))?;
/// bridge.refresh().await?;
///
/// let mut update = StateUpdate::new();
/// update.on(true);
/// update.brightness(&Brightness::from_normalized(0.8));
/// bridge.update_light("1", update).await?;
/// bridge.flush().await?;
/// ```
#[derive(Clone)]
pub struct Bridge {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("host", &self.inner.host)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Create a bridge handle using HTTP and the default [`ClientConfig`].
    pub fn new(host: &str, username: Option<&str>) -> Result<Self> {
        Self::with_config(host, username, ClientConfig::default())
    }

    pub fn with_config(host: &str, username: Option<&str>, config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(host, config.request_timeout)?;
        Ok(Self::with_transport(host, username, config, Arc::new(transport)))
    }

    /// Create a bridge handle on top of a custom [`Transport`].
    pub fn with_transport(
        host: &str,
        username: Option<&str>,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let registry = Registry {
            username: username.map(String::from),
            ..Registry::default()
        };
        let history = MessageHistory::with_max_entries(config.history_max_entries);
        Bridge {
            inner: Arc::new(Inner {
                host: host.to_string(),
                config,
                transport,
                registry: Mutex::new(registry),
                history: Mutex::new(history),
                queue: UpdateQueue::new(),
            }),
        }
    }

    pub fn host(&self) -> &str {
        &self.inner.host
    }

    pub fn client_config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub async fn username(&self) -> Option<String> {
        self.inner.registry.lock().await.username.clone()
    }

    /// The bridge id, known after the first successful [`Bridge::refresh`].
    pub async fn identifier(&self) -> Option<String> {
        self.inner
            .registry
            .lock()
            .await
            .config
            .as_ref()
            .map(|c| c.bridge_id.clone())
    }

    pub async fn bridge_config(&self) -> Option<BridgeConfig> {
        self.inner.registry.lock().await.config.clone()
    }

    /// Register a new user on the bridge.
    ///
    /// The link button on the bridge must have been pressed shortly before,
    /// otherwise the bridge answers with
    /// [`ApiErrorKind::LinkButtonNotPressed`].
    pub async fn request_username(&self, app_name: &str) -> Result<String> {
        let response = self
            .inner
            .send(
                Method::Post,
                "",
                "POST /api",
                Some(json!({"devicetype": app_name})),
            )
            .await?;
        let entries = api::expect_array(response)?;
        let username = api::first_success_str(&entries, "username")
            .ok_or_else(|| Error::UnexpectedResponse(Value::Array(entries)))?;

        self.inner.registry.lock().await.username = Some(username.clone());
        Ok(username)
    }

    /// Fetch the bridge's full state and merge it into the local registry.
    pub async fn refresh(&self) -> Result<()> {
        let response = self.inner.request(Method::Get, "", None).await?;
        let state = api::expect_object(response)?;

        let config = state
            .get("config")
            .cloned()
            .and_then(|config| serde_json::from_value::<BridgeConfig>(config).ok());
        let Some(config) = config else {
            return Err(Error::UnexpectedResponse(Value::Object(state)));
        };

        let mut registry = self.inner.registry.lock().await;
        debug!("refreshed bridge {}", config.bridge_id);
        registry.config = Some(config);
        if let Some(Value::Object(lights)) = state.get("lights") {
            merge_items(&mut registry.lights, lights);
        }
        if let Some(Value::Object(groups)) = state.get("groups") {
            merge_items(&mut registry.groups, groups);
        }
        Ok(())
    }

    /// Snapshot of all known lights, ordered by identifier.
    pub async fn lights(&self) -> Vec<Light> {
        let registry = self.inner.registry.lock().await;
        let mut lights: Vec<Light> = registry.lights.values().cloned().collect();
        lights.sort_by(|a, b| id_order(a.identifier(), b.identifier()));
        lights
    }

    pub async fn light(&self, id: &str) -> Option<Light> {
        self.inner.registry.lock().await.lights.get(id).cloned()
    }

    /// Snapshot of all known groups, ordered by identifier.
    pub async fn groups(&self) -> Vec<Group> {
        let registry = self.inner.registry.lock().await;
        let mut groups: Vec<Group> = registry.groups.values().cloned().collect();
        groups.sort_by(|a, b| id_order(a.identifier(), b.identifier()));
        groups
    }

    pub async fn group(&self, id: &str) -> Option<Group> {
        self.inner.registry.lock().await.groups.get(id).cloned()
    }

    /// Aggregated on/brightness state of a group's reachable lights.
    pub async fn group_status(&self, id: &str) -> Option<GroupStatus> {
        let registry = self.inner.registry.lock().await;
        registry
            .groups
            .get(id)
            .map(|group| group.status(&registry.lights))
    }

    /// Change a light's state.
    ///
    /// The change is applied to the local mirror right away and queued for
    /// writing; changes queued for the same light before the worker reaches
    /// it are sent as one request.
    pub async fn update_light(&self, id: &str, update: StateUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(Error::EmptyUpdate);
        }
        self.inner.queue.start(&self.inner).await;

        let mut registry = self.inner.registry.lock().await;
        let light = registry
            .lights
            .get_mut(id)
            .ok_or_else(|| Error::LightNotFound(id.to_string()))?;

        light.state_mut().apply(&update);
        light.pending.merge(&update);
        if self.inner.config.write_immediately && mark_queued(&mut light.queued) {
            self.inner
                .queue
                .send(QueueItem::Update(Target::Light(id.to_string())))?;
        }
        Ok(())
    }

    /// Change the state of every light in a group with one group action.
    ///
    /// Reachable member lights are updated locally; only the group action
    /// is written to the bridge.
    pub async fn update_group(&self, id: &str, update: StateUpdate) -> Result<()> {
        if update.is_empty() {
            return Err(Error::EmptyUpdate);
        }
        self.inner.queue.start(&self.inner).await;

        let mut registry = self.inner.registry.lock().await;
        let registry = &mut *registry;
        let group = registry
            .groups
            .get_mut(id)
            .ok_or_else(|| Error::GroupNotFound(id.to_string()))?;

        group.apply_to_members(&update, &mut registry.lights);
        group.pending.merge(&update);
        if self.inner.config.write_immediately && mark_queued(&mut group.queued) {
            self.inner
                .queue
                .send(QueueItem::Update(Target::Group(id.to_string())))?;
        }
        Ok(())
    }

    pub async fn set_light_on(&self, id: &str, on: bool) -> Result<()> {
        self.update_light(id, StateUpdate::from(on)).await
    }

    /// Set a light's brightness from a normalized `0.0..=1.0` value.
    pub async fn set_light_brightness(&self, id: &str, brightness: f32) -> Result<()> {
        self.update_light(id, StateUpdate::from(&Brightness::from_normalized(brightness)))
            .await
    }

    pub async fn set_group_on(&self, id: &str, on: bool) -> Result<()> {
        self.update_group(id, StateUpdate::from(on)).await
    }

    /// Set a group's brightness from a normalized `0.0..=1.0` value.
    pub async fn set_group_brightness(&self, id: &str, brightness: f32) -> Result<()> {
        self.update_group(id, StateUpdate::from(&Brightness::from_normalized(brightness)))
            .await
    }

    /// Queue every light and group with staged changes.
    ///
    /// Only needed when [`ClientConfig::write_immediately`] is off. Returns
    /// the number of items queued.
    pub async fn write_changes(&self) -> Result<usize> {
        self.inner.queue.start(&self.inner).await;

        let mut registry = self.inner.registry.lock().await;
        let mut targets = Vec::new();
        for light in registry.lights.values_mut() {
            if light.has_pending_changes() && mark_queued(&mut light.queued) {
                targets.push(Target::Light(light.identifier().to_string()));
            }
        }
        for group in registry.groups.values_mut() {
            if group.has_pending_changes() && mark_queued(&mut group.queued) {
                targets.push(Target::Group(group.identifier().to_string()));
            }
        }

        let count = targets.len();
        for target in targets {
            self.inner.queue.send(QueueItem::Update(target))?;
        }
        Ok(count)
    }

    /// Return a group holding exactly `light_ids`, creating one if needed.
    ///
    /// When the bridge's group table is full and `overwrite_if_table_full`
    /// is set, an existing group called `name` is re-pointed at the lights
    /// instead.
    pub async fn get_or_create_group(
        &self,
        light_ids: &[&str],
        name: &str,
        overwrite_if_table_full: bool,
    ) -> Result<Group> {
        let wanted: BTreeSet<String> = light_ids.iter().map(|id| id.to_string()).collect();

        {
            let registry = self.inner.registry.lock().await;
            let existing = registry
                .groups
                .values()
                .filter(|group| group.contains_exactly(&wanted))
                .min_by(|a, b| id_order(a.identifier(), b.identifier()));
            if let Some(group) = existing {
                return Ok(group.clone());
            }
        }

        let lights: Vec<String> = wanted.into_iter().collect();
        let body = json!({
            "lights": lights,
            "name": name,
            "type": GroupKind::LightGroup.as_ref(),
        });
        let result = self
            .inner
            .request(Method::Post, "groups", Some(body))
            .await
            .and_then(api::expect_array);

        match result {
            Ok(entries) => {
                let id = api::first_success_str(&entries, "id")
                    .ok_or_else(|| Error::UnexpectedResponse(Value::Array(entries)))?;
                let group = Group::new(&id, name, lights, GroupKind::LightGroup);
                self.inner
                    .registry
                    .lock()
                    .await
                    .groups
                    .insert(id, group.clone());
                Ok(group)
            }
            Err(e) if overwrite_if_table_full
                && e.api_kind() == Some(ApiErrorKind::GroupTableFull) =>
            {
                let same_name = {
                    let registry = self.inner.registry.lock().await;
                    registry
                        .groups
                        .values()
                        .filter(|group| group.name() == name)
                        .min_by(|a, b| id_order(a.identifier(), b.identifier()))
                        .map(|group| group.identifier().to_string())
                };
                let Some(id) = same_name else {
                    return Err(e);
                };
                let ids: Vec<&str> = lights.iter().map(String::as_str).collect();
                self.set_group_lights(&id, &ids).await?;
                self.group(&id)
                    .await
                    .ok_or_else(|| Error::GroupNotFound(id.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the lights of a group.
    ///
    /// The request goes through the update queue, so it is ordered with
    /// pending state writes.
    pub async fn set_group_lights(&self, id: &str, light_ids: &[&str]) -> Result<()> {
        let (path, lights) = {
            let registry = self.inner.registry.lock().await;
            let group = registry
                .groups
                .get(id)
                .ok_or_else(|| Error::GroupNotFound(id.to_string()))?;
            let lights: Vec<String> = light_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            (group.attributes_path(), lights)
        };

        let entries = self
            .enqueue_request(Method::Put, &path, Some(json!({"lights": lights})))
            .await?;
        if api::successes(&entries).next().is_none() {
            return Err(Error::UnexpectedResponse(Value::Array(entries)));
        }

        if let Some(group) = self.inner.registry.lock().await.groups.get_mut(id) {
            group.set_light_ids(lights);
        }
        Ok(())
    }

    /// Send an authenticated request right away, bypassing the queue.
    ///
    /// `path` is relative to `/api/<username>`, e.g. `lights/1`.
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        self.inner.request(method, path, body).await
    }

    /// Send an authenticated request through the update queue and wait for
    /// its result objects.
    pub async fn enqueue_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Vec<Value>> {
        self.inner.queue.start(&self.inner).await;
        let (reply, result) = oneshot::channel();
        self.inner.queue.send(QueueItem::Request {
            method,
            path: path.to_string(),
            body,
            reply,
        })?;
        result.await.map_err(|_| Error::QueueClosed)?
    }

    /// Wait until every item queued so far has been written.
    pub async fn flush(&self) -> Result<()> {
        self.inner.queue.start(&self.inner).await;
        let (reply, done) = oneshot::channel();
        self.inner.queue.send(QueueItem::Flush(reply))?;
        done.await.map_err(|_| Error::QueueClosed)
    }

    pub async fn history(&self) -> MessageHistory {
        self.inner.history.lock().await.clone()
    }

    pub async fn clear_history(&self) {
        self.inner.history.lock().await.clear();
    }

    /// Returns diagnostics including registry counts, bridge configuration
    /// and history.
    pub async fn diagnostics(&self) -> Value {
        let mut diag = {
            let registry = self.inner.registry.lock().await;
            json!({
                "host": self.inner.host,
                "authenticated": registry.username.is_some(),
                "bridge_config": registry.config,
                "lights": registry.lights.len(),
                "groups": registry.groups.len(),
                "pending_lights": registry.lights.values().filter(|l| l.has_pending_changes()).count(),
                "pending_groups": registry.groups.values().filter(|g| g.has_pending_changes()).count(),
            })
        };

        let history = self.inner.history.lock().await;
        diag["history"] = serde_json::to_value(history.summary()).unwrap_or(Value::Null);
        diag
    }
}

/// Numeric identifiers in numeric order, anything else after them.
fn id_order(a: &str, b: &str) -> std::cmp::Ordering {
    let key = |id: &str| (id.parse::<u64>().unwrap_or(u64::MAX), id.to_string());
    key(a).cmp(&key(b))
}
