//! Byte-stream transports.
//!
//! Provides a unified interface over the local and network stream mechanisms
//! pulse streams travel on:
//! - Unix domain sockets (`ipc://` / `unix://` addresses, Linux/macOS)
//! - TCP (`tcp://host:port`)
//!
//! This is the lowest layer of pulsewire. Everything else builds on top of
//! the [`Stream`] type provided here.

pub mod address;
pub mod error;
pub mod stream;
pub mod tcp;

#[cfg(unix)]
pub mod uds;

pub use address::{Address, Listener};
pub use error::{Result, TransportError};
pub use stream::Stream;
pub use tcp::TcpSocket;

#[cfg(unix)]
pub use uds::UnixDomainSocket;
