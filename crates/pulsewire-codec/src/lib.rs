//! Wire codec for pulse-synchronized channel streams.
//!
//! Every pulse travels as a multipart message:
//! - Frame 1: JSON pulse header (`htype`, `hash`, `pulse_id`, `global_timestamp`)
//! - Frame 2: JSON data header listing the channels, identified by the MD5 `hash`
//! - Frames 3..: one value frame and one 16-byte timestamp frame per channel
//!
//! The decoder caches the channel schema by hash so the data header is only
//! parsed when it changes. A channel that fails to decode yields an absent
//! value; the rest of the pulse is still delivered.

pub mod bitshuffle;
pub mod compression;
pub mod config;
pub mod consistency;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frames;
pub mod header;
pub mod message;
pub mod registry;
pub mod types;

pub use compression::{BitshuffleLz4, Compression, CompressionId, Passthrough};
pub use config::{ChannelOptions, EncoderConfig, DATA_HEADER_HTYPE, MAIN_HEADER_HTYPE};
pub use consistency::{ConsistencyTracker, PulseOrder};
pub use decoder::Decoder;
pub use encoder::{EncodedPulse, Encoder, ValueSource};
pub use error::{ChannelError, DecodeError, EncodeError, SchemaError};
pub use frames::{FrameSource, PulseFrames};
pub use header::{ChannelSpec, DataHeader, PulseHeader, Timestamp};
pub use message::{ChannelValues, Message, Value};
pub use registry::{
    build_data_header, content_hash, BuiltSchema, Channel, Resolution, Schema, SchemaRegistry,
};
pub use types::{
    resolve_for_decode, resolve_for_encode, Array, ArrayData, ByteOrder, Data, Descriptor,
    Element, ElementClass, ElementKind, EncodeTarget, Scalar,
};
