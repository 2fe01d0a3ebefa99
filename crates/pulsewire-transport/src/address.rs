use std::fmt;
use std::str::FromStr;

#[cfg(unix)]
use std::path::PathBuf;

use crate::error::{Result, TransportError};
use crate::stream::Stream;
use crate::tcp::TcpSocket;

#[cfg(unix)]
use crate::uds::UnixDomainSocket;

/// A stream endpoint.
///
/// Accepted forms: `tcp://host:port`, `ipc:///path/to.sock`,
/// `unix:///path/to.sock`, or a bare filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    #[cfg(unix)]
    Unix(PathBuf),
    /// `host:port`
    Tcp(String),
}

impl Address {
    /// Bind a listener on this address.
    pub fn bind(&self) -> Result<Listener> {
        match self {
            #[cfg(unix)]
            Address::Unix(path) => UnixDomainSocket::bind(path).map(Listener::Unix),
            Address::Tcp(address) => TcpSocket::bind(address).map(Listener::Tcp),
        }
    }

    /// Connect to a listener on this address.
    pub fn connect(&self) -> Result<Stream> {
        match self {
            #[cfg(unix)]
            Address::Unix(path) => UnixDomainSocket::connect(path),
            Address::Tcp(address) => TcpSocket::connect(address),
        }
    }
}

impl FromStr for Address {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TransportError::InvalidAddress(s.to_string()));
        }

        if let Some(rest) = s.strip_prefix("tcp://") {
            let valid = rest
                .rsplit_once(':')
                .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
            if !valid {
                return Err(TransportError::InvalidAddress(s.to_string()));
            }
            return Ok(Address::Tcp(rest.to_string()));
        }

        let path = match s.strip_prefix("ipc://").or_else(|| s.strip_prefix("unix://")) {
            Some(path) => path,
            None if s.contains("://") => return Err(TransportError::InvalidAddress(s.to_string())),
            None => s,
        };
        if path.is_empty() {
            return Err(TransportError::InvalidAddress(s.to_string()));
        }

        #[cfg(unix)]
        {
            Ok(Address::Unix(PathBuf::from(path)))
        }
        #[cfg(not(unix))]
        {
            Err(TransportError::Unsupported(s.to_string()))
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(unix)]
            Address::Unix(path) => write!(f, "ipc://{}", path.display()),
            Address::Tcp(address) => write!(f, "tcp://{address}"),
        }
    }
}

/// A bound listener of either kind.
#[derive(Debug)]
pub enum Listener {
    #[cfg(unix)]
    Unix(UnixDomainSocket),
    Tcp(TcpSocket),
}

impl Listener {
    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        match self {
            #[cfg(unix)]
            Listener::Unix(socket) => socket.accept(),
            Listener::Tcp(socket) => socket.accept(),
        }
    }

    /// Toggle non-blocking `accept`. A pending accept then fails with
    /// [`TransportError::Accept`] of kind `WouldBlock`.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        match self {
            #[cfg(unix)]
            Listener::Unix(socket) => socket.set_nonblocking(nonblocking),
            Listener::Tcp(socket) => socket.set_nonblocking(nonblocking),
        }
    }

    /// The address peers should connect to.
    pub fn local_address(&self) -> Address {
        match self {
            #[cfg(unix)]
            Listener::Unix(socket) => Address::Unix(socket.path().to_path_buf()),
            Listener::Tcp(socket) => Address::Tcp(socket.local_addr().to_string()),
        }
    }
}
