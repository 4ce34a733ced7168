//! Bridge discovery via the N-UPnP endpoint and SSDP.

use std::collections::HashSet;
use std::time::Duration;

use log::{debug, warn};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::bridge::Bridge;
use crate::errors::Error;
use crate::runtime::{self, AsyncUdpSocket, Instant, JoinHandle, UdpSocket, mpsc};

type Result<T> = std::result::Result<T, Error>;

const SSDP_ADDR: &str = "239.255.255.250:1900";
const SSDP_SEARCH_TARGET: &str = "urn:schemas-upnp-org:device:basic:1";

/// How a bridge was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMethod {
    /// The vendor's HTTPS endpoint listing bridges on the caller's network
    NUPnP,
    /// A multicast M-SEARCH on the local network
    Ssdp,
}

/// A bridge found on the network.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredBridge {
    /// IP address or host name of the bridge
    pub host: String,
    /// Bridge id, when the discovery method reports one
    pub id: Option<String>,
    pub method: DiscoveryMethod,
}

impl DiscoveredBridge {
    /// Convert this discovered bridge into a [`Bridge`] handle.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let bridges = discover_bridges(&DiscoveryOptions::default()).await?;
    /// for found in bridges {
    ///     let bridge = found.into_bridge(None)?;
    ///     let username = bridge.request_username("my_app#phone").await?;
    /// }
    /// ```
    pub fn into_bridge(self, username: Option<&str>) -> Result<Bridge> {
        Bridge::new(&self.host, username)
    }
}

/// What to search for and for how long.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Upper bound for the whole search
    pub timeout: Duration,
    pub nupnp_url: String,
    pub use_nupnp: bool,
    pub use_ssdp: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            nupnp_url: "https://discovery.meethue.com".to_string(),
            use_nupnp: true,
            use_ssdp: true,
        }
    }
}

impl DiscoveryOptions {
    fn enabled_methods(&self) -> usize {
        self.use_nupnp as usize + self.use_ssdp as usize
    }
}

/// An event of a running [`Discovery`].
#[derive(Debug)]
pub enum DiscoveryEvent {
    /// A bridge host seen for the first time in this discovery
    Bridge(DiscoveredBridge),
    /// One of the discovery methods failed
    Error(Error),
}

/// A running discovery. Dropping it cancels the search.
pub struct Discovery {
    rx: mpsc::UnboundedReceiver<DiscoveryEvent>,
    seen: HashSet<String>,
    handle: JoinHandle<()>,
}

impl Discovery {
    /// The next event, or `None` once every method has finished.
    pub async fn next(&mut self) -> Option<DiscoveryEvent> {
        while let Some(event) = self.rx.recv().await {
            if let DiscoveryEvent::Bridge(bridge) = &event
                && !self.seen.insert(bridge.host.clone())
            {
                continue;
            }
            return Some(event);
        }
        None
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for Discovery {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start searching for bridges in the background.
///
/// Must be called inside a tokio runtime.
pub fn spawn_discovery(options: DiscoveryOptions) -> Discovery {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = runtime::spawn(async move {
        let nupnp = async {
            if !options.use_nupnp {
                return;
            }
            // The client's own timeout bounds the request, so a slow
            // endpoint surfaces as an HTTP timeout error.
            match query_nupnp(&options.nupnp_url, options.timeout).await {
                Ok(bridges) => {
                    for bridge in bridges {
                        let _ = tx.send(DiscoveryEvent::Bridge(bridge));
                    }
                }
                Err(e) => {
                    let _ = tx.send(DiscoveryEvent::Error(e));
                }
            }
        };

        let ssdp = async {
            if !options.use_ssdp {
                return;
            }
            if let Err(e) = search_ssdp(options.timeout, &tx).await {
                let _ = tx.send(DiscoveryEvent::Error(e));
            }
        };

        futures::future::join(nupnp, ssdp).await;
    });

    Discovery {
        rx,
        seen: HashSet::new(),
        handle,
    }
}

/// Discover Hue bridges on the local network.
///
/// Runs every enabled method concurrently and returns each host once, in the
/// order found. Fails only if every enabled method failed.
///
/// # Examples
///
/// ```ignore
/// use hue_bridge_rs::{DiscoveryOptions, discover_bridges};
///
/// let bridges = discover_bridges(&DiscoveryOptions::default()).await?;
/// for bridge in bridges {
///     println!("  {} ({:?})", bridge.host, bridge.method);
/// }
/// ```
pub async fn discover_bridges(options: &DiscoveryOptions) -> Result<Vec<DiscoveredBridge>> {
    let mut discovery = spawn_discovery(options.clone());
    let mut found = Vec::new();
    let mut errors = Vec::new();

    while let Some(event) = discovery.next().await {
        match event {
            DiscoveryEvent::Bridge(bridge) => {
                debug!("found bridge at {} via {:?}", bridge.host, bridge.method);
                found.push(bridge);
            }
            DiscoveryEvent::Error(e) => {
                warn!("bridge discovery method failed: {e}");
                errors.push(e);
            }
        }
    }

    if found.is_empty() && errors.len() >= options.enabled_methods() && !errors.is_empty() {
        return Err(errors.remove(0));
    }
    Ok(found)
}

#[derive(Debug, Deserialize)]
struct NupnpEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "internalipaddress")]
    internal_ip_address: String,
}

async fn query_nupnp(url: &str, timeout: Duration) -> Result<Vec<DiscoveredBridge>> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let bytes = client.get(url).send().await?.bytes().await?;
    let value: Value = serde_json::from_slice(&bytes).map_err(Error::JsonLoad)?;
    parse_nupnp(value)
}

/// Parse `[{"id": "...", "internalipaddress": "..."}]`.
fn parse_nupnp(value: Value) -> Result<Vec<DiscoveredBridge>> {
    let entries: Vec<NupnpEntry> =
        serde_json::from_value(value.clone()).map_err(|_| Error::UnexpectedResponse(value))?;
    Ok(entries
        .into_iter()
        .map(|entry| DiscoveredBridge {
            host: entry.internal_ip_address,
            id: entry.id,
            method: DiscoveryMethod::NUPnP,
        })
        .collect())
}

async fn search_ssdp(
    discovery_timeout: Duration,
    tx: &mpsc::UnboundedSender<DiscoveryEvent>,
) -> Result<()> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| Error::socket("bind", e))?;
    socket
        .set_multicast_ttl(2)
        .map_err(|e| Error::socket("set_multicast_ttl", e))?;

    let msg = format!(
        "M-SEARCH * HTTP/1.1\r\nHOST: {SSDP_ADDR}\r\nMAN: \"ssdp:discover\"\r\nMX: 3\r\nST: {SSDP_SEARCH_TARGET}\r\n\r\n"
    );
    socket
        .send_to(msg.as_bytes(), SSDP_ADDR)
        .await
        .map_err(|e| Error::socket("send_to", e))?;

    let start = Instant::now();
    let mut buffer = [0u8; 2048];
    let recv_timeout = Duration::from_millis(500);

    while start.elapsed() < discovery_timeout {
        match runtime::timeout(recv_timeout, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, _))) => {
                if let Some(bridge) = parse_ssdp_response(&buffer[..size]) {
                    let _ = tx.send(DiscoveryEvent::Bridge(bridge));
                }
            }
            Ok(Err(e)) => return Err(Error::socket("recv_from", e)),
            // Timeout elapsed - continue loop to check overall timeout
            Err(_) => continue,
        }
    }
    Ok(())
}

/// Accept only responses from Hue bridges (`SERVER: ... IpBridge/...`) and
/// take the host from the `LOCATION` URL.
fn parse_ssdp_response(bytes: &[u8]) -> Option<DiscoveredBridge> {
    let text = std::str::from_utf8(bytes).ok()?;
    let header = |name: &str| {
        text.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    };

    if !header("server")?.contains("IpBridge") {
        return None;
    }
    let location = Url::parse(&header("location")?).ok()?;
    let host = location.host_str()?.to_string();

    Some(DiscoveredBridge {
        host,
        id: header("hue-bridgeid"),
        method: DiscoveryMethod::Ssdp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BRIDGE_REPLY: &str = "HTTP/1.1 200 OK\r\n\
        CACHE-CONTROL: max-age=100\r\n\
        LOCATION: http://192.168.1.20:80/description.xml\r\n\
        SERVER: Linux/3.14.0 UPnP/1.0 IpBridge/1.41.0\r\n\
        hue-bridgeid: 001788FFFE23BFC2\r\n\
        ST: urn:schemas-upnp-org:device:basic:1\r\n\r\n";

    #[test]
    fn test_parse_bridge_reply() {
        let bridge = parse_ssdp_response(BRIDGE_REPLY.as_bytes()).unwrap();
        assert_eq!(bridge.host, "192.168.1.20");
        assert_eq!(bridge.id.as_deref(), Some("001788FFFE23BFC2"));
        assert_eq!(bridge.method, DiscoveryMethod::Ssdp);
    }

    #[test]
    fn test_ignore_other_devices() {
        let reply = BRIDGE_REPLY.replace("IpBridge/1.41.0", "Sonos/70.3");
        assert!(parse_ssdp_response(reply.as_bytes()).is_none());
        assert!(parse_ssdp_response(b"\xff\xfe").is_none());
    }

    #[test]
    fn test_parse_nupnp() {
        let bridges = parse_nupnp(json!([
            {"id": "001788fffe23bfc2", "internalipaddress": "192.168.1.20", "port": 443},
            {"internalipaddress": "10.0.0.2"}
        ]))
        .unwrap();
        assert_eq!(bridges.len(), 2);
        assert_eq!(bridges[0].host, "192.168.1.20");
        assert!(bridges[1].id.is_none());
        assert_eq!(bridges[1].method, DiscoveryMethod::NUPnP);
    }

    #[test]
    fn test_parse_nupnp_unexpected() {
        let err = parse_nupnp(json!({"error": "rate limited"})).unwrap_err();
        assert_eq!(err, Error::UnexpectedResponse(json!({"error": "rate limited"})));
    }

    #[tokio::test]
    async fn test_no_methods_enabled() {
        let options = DiscoveryOptions {
            use_nupnp: false,
            use_ssdp: false,
            ..DiscoveryOptions::default()
        };
        assert!(discover_bridges(&options).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_every_method_failed() {
        let options = DiscoveryOptions {
            timeout: Duration::from_millis(200),
            nupnp_url: "not a url".to_string(),
            use_nupnp: true,
            use_ssdp: false,
        };
        let err = discover_bridges(&options).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[tokio::test]
    async fn test_duplicate_hosts_reported_once() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut discovery = Discovery {
            rx,
            seen: HashSet::new(),
            handle: runtime::spawn(async {}),
        };
        let found = |host: &str, method| {
            DiscoveryEvent::Bridge(DiscoveredBridge {
                host: host.to_string(),
                id: None,
                method,
            })
        };
        tx.send(found("192.168.1.20", DiscoveryMethod::NUPnP)).unwrap();
        tx.send(found("192.168.1.20", DiscoveryMethod::Ssdp)).unwrap();
        tx.send(found("192.168.1.21", DiscoveryMethod::Ssdp)).unwrap();
        drop(tx);

        let mut hosts = Vec::new();
        while let Some(event) = discovery.next().await {
            if let DiscoveryEvent::Bridge(bridge) = event {
                hosts.push((bridge.host, bridge.method));
            }
        }
        assert_eq!(
            hosts,
            [
                ("192.168.1.20".to_string(), DiscoveryMethod::NUPnP),
                ("192.168.1.21".to_string(), DiscoveryMethod::Ssdp),
            ]
        );
    }
}
