//! Pulse-synchronized channel streaming.
//!
//! A producer emits one multipart message per pulse: a JSON pulse header, a
//! JSON data header describing the channels, then a value frame and a
//! timestamp frame per channel. Consumers cache the channel schema by hash
//! and decode values according to it.
//!
//! # Crate Structure
//!
//! - [`transport`]: stream sockets (Unix domain sockets, TCP)
//! - [`frame`]: multipart framing and the message transport interface
//! - [`codec`]: type table, compression, schema registry, encoder and decoder
//! - [`session`]: senders and sources tying codec and transport together (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use pulsewire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pulsewire_frame::*;
}

/// Re-export codec types.
pub mod codec {
    pub use pulsewire_codec::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use pulsewire_session::*;
}
