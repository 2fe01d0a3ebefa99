use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + length (4) + flags (1) = 7 bytes.
pub const HEADER_SIZE: usize = 7;

/// Magic bytes: "PW" (0x50 0x57).
pub const MAGIC: [u8; 2] = [0x50, 0x57];

/// Flag bit: another frame of the same message follows.
pub const FLAG_MORE: u8 = 0x01;

/// Default maximum payload size: 64 MiB. Detector images are large.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// One part of a multipart message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame payload. May be empty.
    pub payload: Bytes,
    /// Whether another frame of the same message follows.
    pub more: bool,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>, more: bool) -> Self {
        Self {
            payload: payload.into(),
            more,
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────┬──────────┬─────────────────┐
/// │ Magic (2B)   │ Length    │ Flags    │ Payload          │
/// │ 0x50 0x57    │ (4B LE)   │ (1B)     │ (Length bytes)   │
/// │ "PW"         │           │ bit0=more│                  │
/// └──────────────┴───────────┴──────────┴─────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], more: bool, dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(len);
    dst.put_u8(if more { FLAG_MORE } else { 0 });
    dst.put_slice(payload);
    Ok(())
}

/// Take one frame off the front of `src`.
///
/// `Ok(None)` until the whole frame is buffered; nothing is consumed then.
/// Header errors are reported as soon as the 7 header bytes are in.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let mut head = &src[MAGIC.len()..HEADER_SIZE];
    let payload_len = head.get_u32_le() as usize;
    let flags = head.get_u8();
    if flags & !FLAG_MORE != 0 {
        return Err(FrameError::InvalidFlags(flags));
    }

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame {
        payload,
        more: flags & FLAG_MORE != 0,
    }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 64 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
