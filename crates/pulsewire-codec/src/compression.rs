//! Channel payload compression.
//!
//! Two codecs exist: [`Passthrough`] (raw elements) and [`BitshuffleLz4`].
//! They are selected once, when a schema is built, through [`CompressionId`].

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::bitshuffle;
use crate::error::{ChannelError, EncodeError};
use crate::types::{from_element_bytes, to_element_bytes, Data, Descriptor};

/// Pack/unpack interface for channel value frames.
pub trait Compression: Send + Sync {
    fn id(&self) -> CompressionId;

    /// Serialize a present value into value frame bytes.
    fn pack(&self, data: &Data, descriptor: Descriptor) -> Result<Bytes, ChannelError>;

    /// Decode a non-empty value frame. `shape` is the declared
    /// fastest-dimension-first shape, `None` for scalars.
    fn unpack(
        &self,
        raw: &[u8],
        descriptor: Descriptor,
        shape: Option<&[usize]>,
    ) -> Result<Option<Data>, ChannelError>;
}

/// Raw elements in the channel byte order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Compression for Passthrough {
    fn id(&self) -> CompressionId {
        CompressionId::None
    }

    fn pack(&self, data: &Data, descriptor: Descriptor) -> Result<Bytes, ChannelError> {
        Ok(to_element_bytes(data, descriptor.order))
    }

    fn unpack(
        &self,
        raw: &[u8],
        descriptor: Descriptor,
        shape: Option<&[usize]>,
    ) -> Result<Option<Data>, ChannelError> {
        from_element_bytes(raw, descriptor, shape)
    }
}

/// Bit-shuffled LZ4 blocks; see [`crate::bitshuffle`] for the layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitshuffleLz4;

impl BitshuffleLz4 {
    /// Compress an opaque byte buffer (element width 1), as used for data headers.
    pub fn compress_bytes(&self, raw: &[u8]) -> Result<Vec<u8>, ChannelError> {
        bitshuffle::compress(raw, 1, 0)
    }

    /// Inverse of [`BitshuffleLz4::compress_bytes`].
    pub fn decompress_bytes(&self, raw: &[u8]) -> Result<Vec<u8>, ChannelError> {
        bitshuffle::decompress(raw, 1)
    }
}

impl Compression for BitshuffleLz4 {
    fn id(&self) -> CompressionId {
        CompressionId::BitshuffleLz4
    }

    fn pack(&self, data: &Data, descriptor: Descriptor) -> Result<Bytes, ChannelError> {
        let elements = to_element_bytes(data, descriptor.order);
        Ok(Bytes::from(bitshuffle::compress(
            &elements,
            descriptor.width(),
            0,
        )?))
    }

    fn unpack(
        &self,
        raw: &[u8],
        descriptor: Descriptor,
        shape: Option<&[usize]>,
    ) -> Result<Option<Data>, ChannelError> {
        let elements = bitshuffle::decompress(raw, descriptor.width())?;
        from_element_bytes(&elements, descriptor, shape)
    }
}

static PASSTHROUGH: Passthrough = Passthrough;
static BITSHUFFLE_LZ4: BitshuffleLz4 = BitshuffleLz4;

/// Compression id as written in data headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionId {
    #[default]
    None,
    BitshuffleLz4,
}

impl CompressionId {
    /// Look up a header value. Absent and `"none"` select passthrough;
    /// unknown ids yield `None`.
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None => Some(Self::None),
            Some(name) if name.eq_ignore_ascii_case("none") || name.is_empty() => Some(Self::None),
            Some(name) if name.eq_ignore_ascii_case("bitshuffle_lz4") => Some(Self::BitshuffleLz4),
            Some(_) => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BitshuffleLz4 => "bitshuffle_lz4",
        }
    }

    /// Header value, omitted for passthrough.
    pub fn header_value(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            other => Some(other.as_str()),
        }
    }

    pub fn codec(self) -> &'static dyn Compression {
        match self {
            Self::None => &PASSTHROUGH,
            Self::BitshuffleLz4 => &BITSHUFFLE_LZ4,
        }
    }
}

impl FromStr for CompressionId {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(Some(s)).ok_or_else(|| EncodeError::UnknownCompression(s.to_string()))
    }
}

impl fmt::Display for CompressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
