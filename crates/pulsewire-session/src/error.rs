use pulsewire_codec::{DecodeError, EncodeError};
use pulsewire_frame::FrameError;

/// Errors that can occur in sender and source sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] pulsewire_transport::TransportError),

    /// Frame-level error other than a disconnect.
    #[error("frame error: {0}")]
    Frame(FrameError),

    /// The peer went away.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// No receiver was connected to take the pulse; nothing was sent.
    #[error("no receiver connected")]
    NoPeer,

    /// A pulse could not be decoded (malformed header or schema).
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A pulse could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The provisioning service refused or failed a request.
    #[error("provisioning failed: {0}")]
    Provisioning(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A thread panicked while holding the sender state.
    #[error("sender state poisoned")]
    Poisoned,
}

impl From<FrameError> for SessionError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::ConnectionClosed => Self::Disconnected("connection closed".to_string()),
            FrameError::Transport(err) => Self::Transport(err),
            FrameError::NoPeer(_) => Self::NoPeer,
            other => Self::Frame(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
