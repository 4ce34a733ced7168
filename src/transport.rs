//! HTTP transport to the bridge's REST API.

use std::time::Duration;

use log::debug;
use reqwest::Url;
use serde_json::Value;

use crate::errors::Error;
use crate::runtime::BoxFuture;

type Result<T> = std::result::Result<T, Error>;

/// HTTP method of a bridge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Sends one request to the bridge and returns the decoded JSON body.
///
/// `path` is relative to `http://<host>/api`; an empty path addresses
/// `/api` itself. Bridge-level errors are returned as JSON, not as `Err`.
pub trait Transport: Send + Sync {
    fn request<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Value>,
    ) -> BoxFuture<'a, Result<Value>>;
}

/// [`Transport`] over plain HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Create a transport for `host` (an IP address or host name, optionally
    /// with a port).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use hue_bridge_rs::HttpTransport;
    ///
    /// let transport = HttpTransport::new("192.168.1.2", Duration::from_secs(5)).unwrap();
    /// assert_eq!(transport.url("").as_str(), "http://192.168.1.2/api");
    /// assert_eq!(
    ///     transport.url("user/lights/1/state").as_str(),
    ///     "http://192.168.1.2/api/user/lights/1/state"
    /// );
    /// assert!(HttpTransport::new("not a host", Duration::from_secs(5)).is_err());
    /// ```
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(&format!("http://{host}/api"))
            .map_err(|_| Error::InvalidHost(host.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport { client, base })
    }

    pub fn url(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        if !path.is_empty() {
            url.set_path(&format!("{}/{}", self.base.path(), path.trim_start_matches('/')));
        }
        url
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url(path);
        debug!("{} {}", method.as_str(), url);

        let mut request = self.client.request(method.into(), url);
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Error::JsonLoad)
    }
}

impl Transport for HttpTransport {
    fn request<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: Option<Value>,
    ) -> BoxFuture<'a, Result<Value>> {
        Box::pin(self.send(method, path, body))
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::{Map, Value, json};

    use super::{Method, Result, Transport};
    use crate::bridge::Bridge;
    use crate::config::ClientConfig;
    use crate::runtime::{self, BoxFuture, Instant};

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct Recorded {
        pub(crate) method: Method,
        pub(crate) path: String,
        pub(crate) body: Option<Value>,
        /// Time since the transport was created.
        pub(crate) at: Duration,
    }

    /// Records every request and answers from a script.
    ///
    /// Without a scripted response a write is acknowledged attribute by
    /// attribute, the way the bridge does it.
    pub(crate) struct MockTransport {
        start: Instant,
        latency: Duration,
        requests: Mutex<Vec<Recorded>>,
        responses: Mutex<VecDeque<Value>>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self::with_latency(Duration::ZERO)
        }

        /// Answer every request after `latency`.
        pub(crate) fn with_latency(latency: Duration) -> Self {
            MockTransport {
                start: Instant::now(),
                latency,
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::new()),
            }
        }

        pub(crate) fn respond(&self, response: Value) {
            self.responses.lock().unwrap().push_back(response);
        }

        pub(crate) fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }

        /// Every request except reads.
        pub(crate) fn writes(&self) -> Vec<Recorded> {
            self.requests()
                .into_iter()
                .filter(|r| r.method != Method::Get)
                .collect()
        }
    }

    fn acknowledge(path: &str, body: Option<&Value>) -> Value {
        // Strip the username from `user/lights/1/state`.
        let address = path.split_once('/').map(|(_, rest)| rest).unwrap_or("");
        let entries: Vec<Value> = body
            .and_then(Value::as_object)
            .map(Map::iter)
            .into_iter()
            .flatten()
            .map(|(key, value)| {
                let mut success = Map::new();
                success.insert(format!("/{address}/{key}"), value.clone());
                json!({ "success": success })
            })
            .collect();
        Value::Array(entries)
    }

    impl Transport for MockTransport {
        fn request<'a>(
            &'a self,
            method: Method,
            path: &'a str,
            body: Option<Value>,
        ) -> BoxFuture<'a, Result<Value>> {
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| acknowledge(path, body.as_ref()));
            self.requests.lock().unwrap().push(Recorded {
                method,
                path: path.to_string(),
                body,
                at: self.start.elapsed(),
            });
            let latency = self.latency;
            Box::pin(async move {
                if !latency.is_zero() {
                    runtime::sleep(latency).await;
                }
                Ok(response)
            })
        }
    }

    /// Full state of a bridge with three lights (the third unreachable)
    /// and two groups.
    pub(crate) fn full_state() -> Value {
        json!({
            "config": {"bridgeid": "001788FFFE23BFC2", "name": "Philips hue", "apiversion": "1.16.0"},
            "lights": {
                "1": {
                    "name": "Desk",
                    "type": "Extended color light",
                    "state": {"on": true, "bri": 100, "hue": 8000, "sat": 120, "ct": 300,
                              "colormode": "ct", "reachable": true}
                },
                "2": {
                    "name": "Shelf",
                    "type": "Dimmable light",
                    "state": {"on": false, "bri": 50, "reachable": true}
                },
                "3": {
                    "name": "Porch",
                    "type": "Dimmable light",
                    "state": {"on": false, "bri": 10, "reachable": false}
                }
            },
            "groups": {
                "1": {"name": "Living room", "type": "Room", "lights": ["1", "2"]},
                "2": {"name": "All", "type": "LightGroup", "lights": ["1", "2", "3"]}
            }
        })
    }

    /// A bridge logged in as `user` and refreshed from [`full_state`].
    pub(crate) async fn loaded_bridge(
        transport: MockTransport,
        config: ClientConfig,
    ) -> (Bridge, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        transport.respond(full_state());
        let bridge = Bridge::with_transport("10.0.0.2", Some("user"), config, transport.clone());
        bridge.refresh().await.unwrap();
        (bridge, transport)
    }
}
