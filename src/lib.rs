//! # hue_bridge_rs
//!
//! An async Rust client for the local REST API of Philips Hue bridges.
//!
//! The crate keeps a local mirror of the bridge's lights and groups and
//! writes changes through a per-bridge queue, so property changes made in
//! quick succession are batched into single requests and the bridge is never
//! flooded.
//!
//! ## Quick Start
//!
//! ```ignore
//! use hue_bridge_rs::{Bridge, DiscoveryOptions, discover_bridges};
//!
//! async fn control_lights() -> Result<(), Box<dyn std::error::Error>> {
//!     // Find a bridge and register with it (press the link button first)
//!     let found = discover_bridges(&DiscoveryOptions::default()).await?;
//!     let bridge = found[0].clone().into_bridge(None)?;
//!     bridge.request_username("my_app#laptop").await?;
//!
//!     // Load lights and groups, then dim light 1 to half brightness
//!     bridge.refresh().await?;
//!     bridge.set_light_brightness("1", 0.5).await?;
//!     bridge.flush().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Discovery**: Find bridges with N-UPnP and SSDP via [`discover_bridges`]
//! - **Registration**: Obtain an API username with [`Bridge::request_username`]
//! - **Lights and Groups**: Mirrored as [`Light`] and [`Group`], refreshed with [`Bridge::refresh`]
//! - **State Changes**: Build a [`StateUpdate`] from [`Brightness`], [`Hue`],
//!   [`Saturation`], [`ColorTemperature`], [`Alert`] and [`Effect`]
//! - **Update Queue**: One request in flight per bridge, with pacing between writes
//! - **Group Management**: [`Bridge::get_or_create_group`] and [`Bridge::set_group_lights`]
//! - **History**: Recent requests and responses in a [`MessageHistory`]
//!
//! ## Communication
//!
//! Requests go over HTTP to `http://<host>/api/<username>/...`. The bridge
//! reports failures inside successful HTTP responses; those are surfaced as
//! [`Error::Api`] with an [`ApiErrorKind`].
//!
//! The update queue is spawned on the tokio runtime the first time a change
//! is made, so [`Bridge::new`] can be called outside of a runtime.

mod api;
mod bridge;
mod config;
mod discovery;
mod errors;
mod group;
mod history;
mod light;
mod payload;
mod queue;
pub mod runtime;
mod state;
mod transport;
mod types;

// Re-export public API
pub use bridge::Bridge;
pub use config::{BridgeConfig, ClientConfig};
pub use discovery::{
    DiscoveredBridge, Discovery, DiscoveryEvent, DiscoveryMethod, DiscoveryOptions,
    discover_bridges, spawn_discovery,
};
pub use errors::{ApiErrorKind, Error};
pub use group::{Group, GroupKind, GroupStatus};
pub use history::{HistoryEntry, HistorySummary, MessageHistory, MessageType};
pub use light::Light;
pub use payload::StateUpdate;
pub use state::{ColorMode, LightState};
pub use transport::{HttpTransport, Method, Transport};
pub use types::{
    Alert, Brightness, ColorTemperature, Effect, Hue, Saturation, TransitionTime,
};
