//! Client settings and the bridge's own configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

/// Settings for talking to one bridge.
///
/// Durations are (de)serialized as milliseconds and every field has a
/// default, so partial JSON works:
///
/// ```
/// use std::time::Duration;
/// use hue_bridge_rs::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{"light_pacing": 250}"#).unwrap();
/// assert_eq!(config.light_pacing, Duration::from_millis(250));
/// assert_eq!(config.group_pacing, Duration::from_secs(1));
/// assert!(config.write_immediately);
/// ```
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout for a single HTTP request.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub request_timeout: Duration,
    /// Pause after a light state request before the next queued item.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub light_pacing: Duration,
    /// Pause after a group action request before the next queued item.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub group_pacing: Duration,
    /// Queue a write as soon as a property changes. When false, changes are
    /// staged until [`crate::Bridge::write_changes`] is called.
    pub write_immediately: bool,
    /// Number of messages kept in the request history.
    pub history_max_entries: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            // The bridge handles roughly ten light commands per second but
            // only one group command per second.
            light_pacing: Duration::from_millis(100),
            group_pacing: Duration::from_secs(1),
            write_immediately: true,
            history_max_entries: 100,
        }
    }
}

/// The `config` section of the bridge's full state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BridgeConfig {
    #[serde(rename = "bridgeid")]
    pub bridge_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "apiversion")]
    pub api_version: Option<String>,
    #[serde(default, rename = "swversion")]
    pub sw_version: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default, rename = "modelid")]
    pub model_id: Option<String>,
    #[serde(default, rename = "ipaddress")]
    pub ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bridge_config_from_json() {
        let config: BridgeConfig = serde_json::from_value(json!({
            "name": "Philips hue",
            "bridgeid": "001788FFFE23BFC2",
            "apiversion": "1.16.0",
            "modelid": "BSB002",
            "zigbeechannel": 15,
        }))
        .unwrap();
        assert_eq!(config.bridge_id, "001788FFFE23BFC2");
        assert_eq!(config.model_id.as_deref(), Some("BSB002"));
        assert!(config.mac.is_none());
    }

    #[test]
    fn test_bridge_config_requires_id() {
        assert!(serde_json::from_value::<BridgeConfig>(json!({"name": "x"})).is_err());
    }

    #[test]
    fn test_client_config_round_trip_ms() {
        let value = serde_json::to_value(ClientConfig::default()).unwrap();
        assert_eq!(value["request_timeout"], json!(5000));
        assert_eq!(value["light_pacing"], json!(100));
    }
}
