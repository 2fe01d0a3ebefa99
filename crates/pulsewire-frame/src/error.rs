use pulsewire_transport::TransportError;

use crate::config::Mode;

/// Errors that can occur while framing or moving frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x5057 \"PW\")")]
    InvalidMagic,

    /// Reserved flag bits were set.
    #[error("invalid frame flags 0x{0:02x}")]
    InvalidFlags(u8),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binding, accepting or connecting failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The peer went away. Distinct from a receive timeout, which is `Ok(None)`.
    #[error("connection closed")]
    ConnectionClosed,

    /// A bound sender had no peer to hand the message to.
    #[error("no peer connected within {0:?}")]
    NoPeer(std::time::Duration),

    /// The operation is not allowed for the session's role.
    #[error("{mode} session cannot {operation}")]
    WrongMode { mode: Mode, operation: &'static str },
}

pub type Result<T> = std::result::Result<T, FrameError>;
