//! Device discovery and state refresh via SSDP-style multicast search.
//!
//! A search datagram goes to the well-known multicast group; each device
//! answers with a unicast header block of `Key: Value` lines carrying its
//! identity and current property values. This is a different framing from the
//! JSON command channel.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use log::debug;

use crate::errors::Error;
use crate::light::Light;
use crate::runtime::{self, AsyncUdpSocket, Instant, UdpSocket};
use crate::types::Location;

type Result<T> = std::result::Result<T, Error>;

/// Multicast group and port devices listen on for searches.
pub const MULTICAST_ADDR: &str = "239.255.255.250:1982";

const SEARCH_MESSAGE: &str = "M-SEARCH * HTTP/1.1\r\n\
HOST: 239.255.255.250:1982\r\n\
MAN: \"ssdp:discover\"\r\n\
ST: wifi_bulb\r\n";

/// A parsed discovery reply.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryResponse {
    addr: SocketAddr,
    properties: HashMap<String, String>,
}

impl DiscoveryResponse {
    /// Parse a reply received from `addr`.
    ///
    /// # Examples
    ///
    /// ```
    /// use yeelight_rs::DiscoveryResponse;
    ///
    /// let reply = "HTTP/1.1 200 OK\r\nLocation: yeelight://192.168.1.239:55443\r\npower: on\r\n";
    /// let response = DiscoveryResponse::parse("192.168.1.239:1982".parse().unwrap(), reply);
    /// assert_eq!(response.get("power"), Some("on"));
    /// assert_eq!(response.location().unwrap().port(), 55443);
    /// ```
    pub fn parse(addr: SocketAddr, text: &str) -> Self {
        DiscoveryResponse {
            addr,
            properties: parse_headers(text),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }

    /// The advertised command port location.
    pub fn location(&self) -> Option<Location> {
        self.get("Location").and_then(|l| l.parse().ok())
    }

    pub fn into_properties(self) -> HashMap<String, String> {
        self.properties
    }
}

/// Split a header block into a flat map.
///
/// Each line is split on its first colon and both sides are trimmed. Lines
/// without a colon, such as the status line, are skipped.
pub fn parse_headers(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// A device that answered a network-wide search.
#[derive(Debug, Clone)]
pub struct DiscoveredBulb {
    pub response: DiscoveryResponse,
}

impl DiscoveredBulb {
    pub fn ip(&self) -> IpAddr {
        self.response.ip()
    }

    pub fn id(&self) -> Option<&str> {
        self.response.id()
    }

    /// Convert into a [`Light`] already holding the reported state.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let bulbs = discover_bulbs(Duration::from_secs(3)).await?;
    /// for bulb in bulbs {
    ///     let mut light = bulb.into_light();
    ///     light.turn_on(Line::Primary).await?;
    /// }
    /// ```
    pub fn into_light(self) -> Light {
        Light::from_discovery(&self.response)
    }
}

/// Probe for one device's current state.
///
/// Sends a multicast search and waits up to `window` for a reply whose source
/// address is `target`; replies from other devices are dropped.
pub async fn probe(target: IpAddr, window: Duration) -> Result<DiscoveryResponse> {
    let socket = search().await?;
    wait_for_reply(&socket, target, window).await
}

/// Discover every device answering within `discovery_timeout`.
///
/// # Examples
///
/// ```ignore
/// use std::time::Duration;
/// use yeelight_rs::discover_bulbs;
///
/// let bulbs = discover_bulbs(Duration::from_secs(3)).await?;
/// for bulb in bulbs {
///     println!("{} - {:?}", bulb.ip(), bulb.id());
/// }
/// ```
pub async fn discover_bulbs(discovery_timeout: Duration) -> Result<Vec<DiscoveredBulb>> {
    let socket = search().await?;
    let discovered = collect_replies(&socket, discovery_timeout).await;
    Ok(discovered.into_values().collect())
}

async fn search() -> Result<UdpSocket> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| Error::socket("bind", e))?;

    socket
        .send_to(SEARCH_MESSAGE.as_bytes(), MULTICAST_ADDR)
        .await
        .map_err(|e| Error::socket("send_to", e))?;

    Ok(socket)
}

/// Receive until a reply from `target` arrives or `window` runs out.
pub(crate) async fn wait_for_reply<S: AsyncUdpSocket>(
    socket: &S,
    target: IpAddr,
    window: Duration,
) -> Result<DiscoveryResponse> {
    let start = Instant::now();
    let mut buffer = [0u8; 4096];

    while let Some(remaining) = window.checked_sub(start.elapsed()) {
        match runtime::timeout(remaining, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, addr))) => {
                if addr.ip() != target {
                    debug!("ignoring discovery reply from {addr}");
                    continue;
                }
                if let Some(response) = decode(addr, &buffer[..size]) {
                    return Ok(response);
                }
            }
            Ok(Err(e)) if is_transient(&e) => debug!("discovery receive failed: {e}"),
            Ok(Err(e)) => return Err(Error::socket("recv_from", e)),
            Err(_) => break,
        }
    }

    Err(Error::DiscoveryTimeout(target))
}

/// Gather every reply arriving within `window`.
///
/// Replies are keyed by their `id` header, or by source IP when there is none;
/// a later reply from the same device replaces the earlier one.
pub(crate) async fn collect_replies<S: AsyncUdpSocket>(
    socket: &S,
    window: Duration,
) -> HashMap<String, DiscoveredBulb> {
    let mut discovered = HashMap::new();
    let start = Instant::now();
    let mut buffer = [0u8; 4096];

    while let Some(remaining) = window.checked_sub(start.elapsed()) {
        match runtime::timeout(remaining, socket.recv_from(&mut buffer)).await {
            Ok(Ok((size, addr))) => {
                let Some(response) = decode(addr, &buffer[..size]) else {
                    continue;
                };
                let key = response
                    .id()
                    .map_or_else(|| addr.ip().to_string(), String::from);
                discovered.insert(key, DiscoveredBulb { response });
            }
            Ok(Err(e)) if is_transient(&e) => debug!("discovery receive failed: {e}"),
            Ok(Err(e)) => {
                debug!("stopping discovery after receive error: {e}");
                break;
            }
            Err(_) => break,
        }
    }

    discovered
}

/// Receive errors worth retrying within the window.
///
/// ICMP port-unreachable from an earlier send surfaces as a refused or reset
/// receive on some platforms.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
    )
}

/// Parse a datagram, skipping our own search if it loops back.
fn decode(addr: SocketAddr, datagram: &[u8]) -> Option<DiscoveryResponse> {
    let text = std::str::from_utf8(datagram).ok()?;
    if text.starts_with("M-SEARCH") {
        return None;
    }
    debug!("discovery reply from {addr}");
    Some(DiscoveryResponse::parse(addr, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "HTTP/1.1 200 OK\r\n\
Cache-Control: max-age=3600\r\n\
Date: \r\n\
Ext: \r\n\
Location: yeelight://192.168.1.239:55443\r\n\
Server: POSIX UPnP/1.0 YGLC/1\r\n\
id: 0x000000000015243f\r\n\
model: color\r\n\
fw_ver: 18\r\n\
support: get_prop set_default set_power toggle set_bright start_cf stop_cf set_scene cron_add cron_get cron_del set_ct_abx set_rgb\r\n\
power: on\r\n\
bright: 100\r\n\
color_mode: 2\r\n\
ct: 4000\r\n\
rgb: 16711680\r\n\
hue: 100\r\n\
sat: 35\r\n\
name: my_bulb\r\n";

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_headers() {
        let headers = parse_headers(REPLY);
        assert_eq!(headers.get("Date").map(String::as_str), Some(""));
        assert_eq!(headers.get("model").map(String::as_str), Some("color"));
        assert_eq!(
            headers.get("Location").map(String::as_str),
            Some("yeelight://192.168.1.239:55443")
        );
        assert!(!headers.contains_key("HTTP/1.1 200 OK"));
        assert_eq!(headers.len(), 17);
    }

    #[test]
    fn test_response_accessors() {
        let response = DiscoveryResponse::parse(addr("192.168.1.239:1982"), REPLY);
        assert_eq!(response.id(), Some("0x000000000015243f"));
        assert_eq!(response.location(), Some(Location::new("192.168.1.239", 55443)));
        assert_eq!(response.ip(), addr("192.168.1.239:1982").ip());
    }

    #[test]
    fn test_decode_skips_search_echo() {
        assert!(decode(addr("10.0.0.2:1982"), SEARCH_MESSAGE.as_bytes()).is_none());
        assert!(decode(addr("10.0.0.2:1982"), &[0xff, 0xfe]).is_none());
        assert!(decode(addr("10.0.0.2:1982"), REPLY.as_bytes()).is_some());
    }

    #[test]
    fn test_into_light_carries_state() {
        let bulb = DiscoveredBulb {
            response: DiscoveryResponse::parse(addr("192.168.1.239:1982"), REPLY),
        };
        let light = bulb.into_light();
        assert_eq!(light.location(), &Location::new("192.168.1.239", 55443));
        assert_eq!(light.state().model(), Some("color"));
        assert_eq!(light.power(), Some(true));
    }

    #[cfg(feature = "runtime-tokio")]
    #[tokio::test]
    async fn test_reply_filtered_by_source() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dest = socket.local_addr().unwrap().to_string();

        let other = tokio::net::UdpSocket::bind("127.0.0.2:0").await.unwrap();
        let wanted = tokio::net::UdpSocket::bind("127.0.0.3:0").await.unwrap();
        other
            .send_to(b"HTTP/1.1 200 OK\r\nid: 0xb\r\n", &dest)
            .await
            .unwrap();
        wanted
            .send_to(b"HTTP/1.1 200 OK\r\nid: 0xa\r\n", &dest)
            .await
            .unwrap();

        let target: IpAddr = "127.0.0.3".parse().unwrap();
        let response = wait_for_reply(&socket, target, Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(response.ip(), target);
        assert_eq!(response.id(), Some("0xa"));
    }

    #[cfg(feature = "runtime-tokio")]
    #[tokio::test]
    async fn test_no_reply_times_out() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target: IpAddr = "127.0.0.4".parse().unwrap();
        let err = wait_for_reply(&socket, target, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err, Error::DiscoveryTimeout(target));
    }

    #[test]
    fn test_transient_receive_errors() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::ConnectionRefused)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::Interrupted)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::InvalidInput)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }

    #[cfg(feature = "runtime-tokio")]
    #[tokio::test]
    async fn test_replies_deduplicated_by_id() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dest = socket.local_addr().unwrap().to_string();

        let first = tokio::net::UdpSocket::bind("127.0.0.2:0").await.unwrap();
        let second = tokio::net::UdpSocket::bind("127.0.0.3:0").await.unwrap();
        let anonymous = tokio::net::UdpSocket::bind("127.0.0.4:0").await.unwrap();
        let echo = tokio::net::UdpSocket::bind("127.0.0.5:0").await.unwrap();

        first
            .send_to(b"HTTP/1.1 200 OK\r\nid: 0xa\r\npower: off\r\n", &dest)
            .await
            .unwrap();
        second
            .send_to(b"HTTP/1.1 200 OK\r\nid: 0xa\r\npower: on\r\n", &dest)
            .await
            .unwrap();
        anonymous
            .send_to(b"HTTP/1.1 200 OK\r\nmodel: mono\r\n", &dest)
            .await
            .unwrap();
        echo.send_to(SEARCH_MESSAGE.as_bytes(), &dest).await.unwrap();

        let discovered = collect_replies(&socket, Duration::from_millis(300)).await;
        assert_eq!(discovered.len(), 2);

        let bulb = &discovered["0xa"];
        assert_eq!(bulb.response.get("power"), Some("on"));

        let unnamed = &discovered["127.0.0.4"];
        assert_eq!(unnamed.id(), None);
        assert_eq!(unnamed.ip(), "127.0.0.4".parse::<IpAddr>().unwrap());
        assert!(!discovered.contains_key("127.0.0.5"));
    }
}
