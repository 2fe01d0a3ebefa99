//! Sending and receiving pulse streams.
//!
//! [`Sender`] couples an encoder with a transport and can resend on a
//! timer. [`Source`] couples a decoder with a transport, tracks pulse
//! consistency and optionally obtains its address from a provisioning
//! service.

pub mod config;
pub mod error;
pub mod provision;
pub mod sender;
pub mod source;

pub use config::{SenderConfig, SourceConfig, DEFAULT_PORT};
pub use error::{Result, SessionError};
pub use provision::{
    BackendChannel, ChannelInfo, ChannelRequest, Provisioning, StreamRequest, StreamType,
    TimeRange, TtlRequest,
};
pub use sender::Sender;
pub use source::Source;
