//! Multipart message framing over byte streams.
//!
//! A pulse travels as a sequence of frames. Every frame is written with:
//! - A 2-byte magic number ("PW") for stream synchronization
//! - A 4-byte little-endian payload length
//! - A 1-byte flags field; bit 0 set means another frame of the same
//!   message follows
//!
//! On top of the codec sit [`FrameReader`]/[`FrameWriter`] and the
//! [`Transport`] session interface used by senders and receivers.

pub mod codec;
pub mod config;
pub mod error;
pub mod memory;
pub mod reader;
pub mod stream;
pub mod transport;
pub mod writer;

pub use codec::{decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use config::{ConnectionType, Mode, ReceiveTimeout, TransportConfig};
pub use error::{FrameError, Result};
pub use memory::MemoryTransport;
pub use reader::FrameReader;
pub use stream::StreamTransport;
pub use transport::{connect, Transport};
pub use writer::FrameWriter;
