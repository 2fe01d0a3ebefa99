use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::Stream;

/// TCP listener.
#[derive(Debug)]
pub struct TcpSocket {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpSocket {
    /// Bind and listen on `host:port`. A `*` host binds all interfaces.
    pub fn bind(address: &str) -> Result<Self> {
        let resolved = match address.strip_prefix("*:") {
            Some(port) => format!("0.0.0.0:{port}"),
            None => address.to_string(),
        };
        let bind_err = |source: std::io::Error| TransportError::Bind {
            address: address.to_string(),
            source,
        };
        let listener = TcpListener::bind(&resolved).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        info!(%local_addr, "listening on tcp");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted tcp connection");
        Ok(Stream::from_tcp(stream))
    }

    /// Connect to `host:port` (blocking).
    pub fn connect(address: &str) -> Result<Stream> {
        let stream = TcpStream::connect(address).map_err(|source| TransportError::Connect {
            address: address.to_string(),
            source,
        })?;
        debug!(address, "connected over tcp");
        Ok(Stream::from_tcp(stream))
    }

    /// Toggle non-blocking `accept`.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener.set_nonblocking(nonblocking)?;
        Ok(())
    }

    /// The bound address, with the actual port when bound to port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
