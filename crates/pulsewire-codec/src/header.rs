//! JSON header models: the per-pulse header (frame 1) and the data header
//! listing the channels (frame 2).

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::types::ByteOrder;

/// Seconds and nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(alias = "epoch")]
    pub sec: u64,
    #[serde(default)]
    pub ns: u64,
}

impl Timestamp {
    pub const FRAME_LEN: usize = 16;

    pub const fn new(sec: u64, ns: u64) -> Self {
        Self { sec, ns }
    }

    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            sec: elapsed.as_secs(),
            ns: u64::from(elapsed.subsec_nanos()),
        }
    }

    /// 16-byte channel timestamp frame in the given byte order.
    pub fn to_frame(&self, order: ByteOrder) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::FRAME_LEN);
        match order {
            ByteOrder::Big => {
                buf.put_u64(self.sec);
                buf.put_u64(self.ns);
            }
            ByteOrder::Little => {
                buf.put_u64_le(self.sec);
                buf.put_u64_le(self.ns);
            }
        }
        buf.freeze()
    }

    /// Parse a channel timestamp frame. Anything but 16 bytes yields `None`.
    pub fn from_frame(mut raw: &[u8], order: ByteOrder) -> Option<Self> {
        if raw.len() != Self::FRAME_LEN {
            return None;
        }
        let (sec, ns) = match order {
            ByteOrder::Big => (raw.get_u64(), raw.get_u64()),
            ByteOrder::Little => (raw.get_u64_le(), raw.get_u64_le()),
        };
        Some(Self { sec, ns })
    }
}

/// Frame 1 of every pulse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseHeader {
    #[serde(default)]
    pub htype: String,
    /// Lowercase hex MD5 of the data header frame as sent.
    pub hash: String,
    pub pulse_id: u64,
    pub global_timestamp: Timestamp,
    /// Compression of the data header frame, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dh_compression: Option<String>,
}

/// One channel entry of the data header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    /// Fastest-dimension-first; absent means scalar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulo: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl ChannelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            shape: None,
            encoding: None,
            compression: None,
            modulo: None,
            offset: None,
        }
    }
}

/// Frame 2: the ordered channel list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataHeader {
    #[serde(default)]
    pub htype: String,
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
}
