//! Lazily opened TCP connection to a device's command port.

use std::io;
use std::time::Duration;

use log::debug;

use crate::errors::Error;
use crate::runtime::{self, AsyncTcpStream, TcpStream};
use crate::types::Location;

type Result<T> = std::result::Result<T, Error>;

/// `EHOSTUNREACH` on Linux.
const HOST_UNREACHABLE_ERRNO: i32 = 113;

#[derive(Debug, Default)]
enum ConnectionState {
    #[default]
    Disconnected,
    Connected(TcpStream),
}

/// The command socket for one device.
///
/// The socket is opened by the first [`Connection::send`] and reused until
/// [`Connection::release`]. Failures never trigger a reconnect; the caller
/// decides whether to release and try again.
#[derive(Debug, Default)]
pub(crate) struct Connection {
    state: ConnectionState,
}

impl Connection {
    /// Bound on connect, write and read.
    pub const TIMEOUT: Duration = Duration::from_secs(3);
    const READ_CHUNK: usize = 4096;

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Return the open stream, connecting to `location` first if needed.
    pub async fn obtain(&mut self, location: &Location) -> Result<&mut TcpStream> {
        if let ConnectionState::Disconnected = self.state {
            let stream = connect(location).await?;
            self.state = ConnectionState::Connected(stream);
        }
        match &mut self.state {
            ConnectionState::Connected(stream) => Ok(stream),
            ConnectionState::Disconnected => Err(Error::NotConnected),
        }
    }

    /// Write one framed command.
    pub async fn send(&mut self, location: &Location, frame: &[u8]) -> Result<()> {
        let stream = self.obtain(location).await?;
        runtime::timeout(Self::TIMEOUT, stream.write_all(frame))
            .await
            .map_err(|e| Error::connection("write", e.into()))?
            .map_err(|e| Error::connection("write", e))
    }

    /// Read raw reply bytes from the open socket.
    ///
    /// Stops after a chunk ending in CRLF, at EOF, or when a read times out
    /// with some data already collected.
    pub async fn read_reply(&mut self) -> Result<Vec<u8>> {
        let ConnectionState::Connected(stream) = &mut self.state else {
            return Err(Error::NotConnected);
        };

        let mut reply = Vec::new();
        let mut chunk = [0u8; Self::READ_CHUNK];
        loop {
            match runtime::timeout(Self::TIMEOUT, stream.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    reply.extend_from_slice(&chunk[..n]);
                    if reply.ends_with(b"\r\n") {
                        break;
                    }
                }
                Ok(Err(e)) => return Err(Error::connection("read", e)),
                Err(_) if !reply.is_empty() => break,
                Err(e) => return Err(Error::connection("read", e.into())),
            }
        }
        Ok(reply)
    }

    /// Close the socket if one is open.
    pub fn release(&mut self) {
        if let ConnectionState::Connected(_) = std::mem::take(&mut self.state) {
            debug!("command connection closed");
        }
    }
}

async fn connect(location: &Location) -> Result<TcpStream> {
    let addr = location.addr();
    debug!("connecting to {addr}");
    match runtime::timeout(Connection::TIMEOUT, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(classify(location, e)),
        Err(e) => Err(Error::connection("connect", e.into())),
    }
}

/// Split transport-level refusal from every other socket failure.
fn classify(location: &Location, err: io::Error) -> Error {
    let unreachable = matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::NetworkUnreachable
    ) || err.raw_os_error() == Some(HOST_UNREACHABLE_ERRNO);

    if unreachable {
        Error::Unreachable {
            location: location.to_string(),
            err,
        }
    } else {
        Error::connection("connect", err)
    }
}
