use std::io;
use std::net::IpAddr;

/// All error types that can occur when interacting with Yeelight devices.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The device refused the connection or the network path to it is down.
    #[error("device at {location} is unreachable: {err}")]
    Unreachable { location: String, err: io::Error },

    /// Any other failure on the command socket, including timeouts.
    #[error("connection {action} error: {err}")]
    Connection { action: String, err: io::Error },

    /// A command was issued while no connection was open.
    #[error("no open connection to the device")]
    NotConnected,

    /// A transition duration between 1 and 29 milliseconds was requested.
    #[error("invalid effect duration {0}ms; use 0 for sudden or at least 30 for smooth")]
    InvalidDuration(u32),

    /// A flow expression used a mode other than 1, 2 or 7.
    #[error("invalid flow mode {0}; expected 1 (color), 2 (color temperature) or 7 (sleep)")]
    InvalidMode(u8),

    /// A flow tuple value could not be converted to an integer.
    #[error("invalid flow value: {0}")]
    InvalidFlowValue(String),

    /// No discovery reply arrived from the device within the wait window.
    #[error("no discovery reply from {0} within the wait window")]
    DiscoveryTimeout(IpAddr),

    /// A discovery socket operation failed.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: io::Error },

    /// Failed to serialize a command to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// A device location could not be parsed.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// Failed to parse an [`crate::Rgb`] from a hex string.
    #[error("invalid color string: {0}")]
    InvalidColorString(String),
}

impl Error {
    /// Create a new discovery socket error
    pub fn socket(action: &str, err: io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new command connection error
    pub fn connection(action: &str, err: io::Error) -> Self {
        Error::Connection {
            action: action.to_string(),
            err,
        }
    }

    /// Returns true for failures that mean the device itself could not be reached.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::Unreachable { .. })
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
