//! Network location of a device's command port.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::errors::Error;

/// Host and TCP port of a device, as advertised in the discovery `Location`
/// header (`yeelight://192.168.1.239:55443`).
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use yeelight_rs::Location;
///
/// let location = Location::from_str("yeelight://192.168.1.239:55443").unwrap();
/// assert_eq!(location.addr(), "192.168.1.239:55443");
///
/// let bare = Location::from_str("192.168.1.40").unwrap();
/// assert_eq!(bare.port(), Location::DEFAULT_PORT);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    host: String,
    port: u16,
}

impl Location {
    pub const DEFAULT_PORT: u16 = 55443;
    const SCHEME: &'static str = "yeelight";

    /// IPv6 hosts may be given with or without brackets.
    pub fn new(host: &str, port: u16) -> Self {
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        Location {
            host: host.to_string(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for connecting.
    pub fn addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// The host as an IP address, if it is one.
    pub fn ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", Self::SCHEME, self.addr())
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidLocation(s.to_string());
        let rest = s.trim();
        let rest = rest.split_once("://").map_or(rest, |(_, r)| r);
        let rest = rest.trim_end_matches('/');

        if let Ok(addr) = rest.parse::<SocketAddr>() {
            return Ok(Location::new(&addr.ip().to_string(), addr.port()));
        }
        let bare = rest
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .unwrap_or(rest);
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return Ok(Location::new(&ip.to_string(), Self::DEFAULT_PORT));
        }

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (rest, Self::DEFAULT_PORT),
        };
        if host.is_empty() || host.contains(':') {
            return Err(invalid());
        }
        Ok(Location::new(host, port))
    }
}
