//! Serialized write pipeline to the bridge.
//!
//! One worker task per bridge drains a FIFO of work items, so at most one
//! request is in flight at a time. Property changes are not carried by the
//! queue items themselves: they accumulate in the item's pending
//! [`StateUpdate`](crate::StateUpdate) and the worker takes everything that
//! is pending when it reaches the item. Changes made while a request is in
//! flight form the next batch.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, warn};
use serde_json::Value;

use crate::api;
use crate::bridge::Inner;
use crate::errors::{ApiErrorKind, Error};
use crate::runtime::{self, Mutex, mpsc, oneshot};
use crate::transport::Method;

type Result<T> = std::result::Result<T, Error>;

/// The bridge item a queued write applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Light(String),
    Group(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Light(id) => write!(f, "light {id}"),
            Target::Group(id) => write!(f, "group {id}"),
        }
    }
}

pub(crate) enum QueueItem {
    /// Write whatever is pending for the target.
    Update(Target),
    /// A one-off authenticated request, answered through `reply`.
    Request {
        method: Method,
        path: String,
        body: Option<Value>,
        reply: oneshot::Sender<Result<Vec<Value>>>,
    },
    /// Resolves once every earlier item is done.
    Flush(oneshot::Sender<()>),
}

pub(crate) struct UpdateQueue {
    tx: mpsc::UnboundedSender<QueueItem>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<QueueItem>>>,
}

impl UpdateQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        UpdateQueue {
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Spawn the worker on first use. Must be called inside a tokio runtime.
    pub(crate) async fn start(&self, bridge: &Arc<Inner>) {
        if let Some(rx) = self.rx.lock().await.take() {
            debug!("starting update queue for {}", bridge.host);
            runtime::spawn(run_worker(Arc::downgrade(bridge), rx));
        }
    }

    pub(crate) fn send(&self, item: QueueItem) -> Result<()> {
        self.tx.send(item).map_err(|_| Error::QueueClosed)
    }
}

/// Marks an item as queued; true if it was not queued before.
pub(crate) fn mark_queued(queued: &mut bool) -> bool {
    !std::mem::replace(queued, true)
}

async fn run_worker(bridge: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<QueueItem>) {
    while let Some(item) = rx.recv().await {
        let Some(inner) = bridge.upgrade() else {
            break;
        };
        match item {
            QueueItem::Update(target) => {
                let pacing = process_update(&inner, &target).await;
                drop(inner);
                if let Some(pacing) = pacing {
                    runtime::sleep(pacing).await;
                }
            }
            QueueItem::Request {
                method,
                path,
                body,
                reply,
            } => {
                let result = inner
                    .request(method, &path, body)
                    .await
                    .and_then(api::expect_array);
                let _ = reply.send(result);
            }
            QueueItem::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
    debug!("update queue stopped");
}

/// Write the pending update of `target`. Returns the pacing delay to wait
/// before the next item, or `None` when nothing was sent.
async fn process_update(inner: &Inner, target: &Target) -> Option<Duration> {
    let (path, update) = {
        let mut registry = inner.registry.lock().await;
        match target {
            Target::Light(id) => {
                let light = registry.lights.get_mut(id)?;
                light.queued = false;
                (light.state_update_path(), light.pending.take())
            }
            Target::Group(id) => {
                let group = registry.groups.get_mut(id)?;
                group.queued = false;
                (group.state_update_path(), group.pending.take())
            }
        }
    };

    if update.is_empty() {
        return None;
    }

    let body = match serde_json::to_value(&update).map_err(Error::JsonDump) {
        Ok(body) => body,
        Err(e) => {
            warn!("dropping update for {target}: {e}");
            inner.history.lock().await.record_error(&e.to_string());
            return None;
        }
    };

    debug!("write {target}: {body}");
    let result = inner
        .request(Method::Put, &path, Some(body))
        .await
        .and_then(api::into_entries);
    reconcile(inner, target, result).await;

    Some(match target {
        Target::Light(_) => inner.config.light_pacing,
        Target::Group(_) => inner.config.group_pacing,
    })
}

/// Fold the bridge's answer back into the local registry.
///
/// Confirmed values overwrite the optimistic state unless the attribute has
/// been changed locally again since the request was sent.
async fn reconcile(inner: &Inner, target: &Target, result: Result<Vec<Value>>) {
    let entries = match result {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to write {target}: {e}");
            inner.history.lock().await.record_error(&e.to_string());
            return;
        }
    };

    let changes = api::state_changes(&entries);
    let errors = api::errors(&entries);
    let light_is_off = errors
        .iter()
        .any(|e| e.api_kind() == Some(ApiErrorKind::LightIsOff));

    {
        let mut registry = inner.registry.lock().await;
        let registry = &mut *registry;
        match target {
            Target::Light(id) => {
                if let Some(light) = registry.lights.get_mut(id) {
                    for (attribute, value) in &changes {
                        if !light.pending.has_attribute(attribute) {
                            light.state_mut().apply_success(attribute, value);
                        }
                    }
                    // The bridge rejected a state change because the light
                    // is off, so our optimistic `on` is stale.
                    if light_is_off && light.pending.get_on().is_none() {
                        light.state_mut().set_on(false);
                    }
                }
            }
            Target::Group(id) => {
                if let Some(group) = registry.groups.get(id) {
                    for (attribute, value) in &changes {
                        if !group.pending.has_attribute(attribute) {
                            group.apply_success_to_members(attribute, value, &mut registry.lights);
                        }
                    }
                    if light_is_off && group.pending.get_on().is_none() {
                        group.apply_success_to_members(
                            "on",
                            &Value::Bool(false),
                            &mut registry.lights,
                        );
                    }
                }
            }
        }
    }

    for error in errors
        .iter()
        .filter(|e| e.api_kind() != Some(ApiErrorKind::LightIsOff))
    {
        warn!("bridge rejected part of the write to {target}: {error}");
        inner.history.lock().await.record_error(&error.to_string());
    }
}
