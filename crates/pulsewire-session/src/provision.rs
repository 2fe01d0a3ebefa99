//! Provisioning collaborator: an external service that allocates stream
//! addresses for requested channel sets.
//!
//! Only the request/response model and the [`Provisioning`] interface live
//! here; talking to a concrete service is up to the implementor.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One channel of a stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRequest {
    pub name: String,
    /// Deliver every `modulo`-th pulse only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulo: Option<u64>,
    /// Pulse offset applied with `modulo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl ChannelRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modulo: None,
            offset: None,
        }
    }

    pub fn with_modulo(mut self, modulo: u64) -> Self {
        self.modulo = Some(modulo);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl From<&str> for ChannelRequest {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Delivery pattern of a provisioned stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamType {
    PushPull,
    PubSub,
}

/// Body of a stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    pub channels: Vec<ChannelRequest>,
    #[serde(rename = "streamType")]
    pub stream_type: StreamType,
    /// Ask the service not to compress channel payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

impl StreamRequest {
    pub fn new(channels: Vec<ChannelRequest>, stream_type: StreamType) -> Self {
        Self {
            channels,
            stream_type,
            compression: None,
        }
    }

    /// Request uncompressed channel payloads.
    pub fn without_compression(mut self) -> Self {
        self.compression = Some("none".to_string());
        self
    }
}

/// A channel the provisioning service can stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulo: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Address of the source producing the channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A channel name qualified with its storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendChannel {
    pub name: String,
    pub backend: String,
}

impl BackendChannel {
    /// Split `backend/name`. Names without a prefix use `default_backend`.
    pub fn parse(qualified: &str, default_backend: &str) -> Self {
        match qualified.split_once('/') {
            Some((backend, name)) if !backend.is_empty() => Self {
                name: name.to_string(),
                backend: backend.to_string(),
            },
            _ => Self {
                name: qualified.trim_start_matches('/').to_string(),
                backend: default_backend.to_string(),
            },
        }
    }
}

/// Time window in seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(rename = "startSeconds")]
    pub start_seconds: u64,
    #[serde(rename = "endSeconds")]
    pub end_seconds: u64,
}

impl TimeRange {
    pub fn new(start: SystemTime, end: SystemTime) -> Self {
        Self {
            start_seconds: epoch_seconds(start),
            end_seconds: epoch_seconds(end),
        }
    }
}

fn epoch_seconds(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs())
}

/// Body of a retention (time-to-live) update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlRequest {
    pub channels: Vec<BackendChannel>,
    pub range: TimeRange,
    /// Retention in seconds.
    pub ttl: u64,
}

impl TtlRequest {
    /// Build a request, qualifying bare channel names with `default_backend`.
    pub fn new<S: AsRef<str>>(
        channels: &[S],
        range: TimeRange,
        ttl: Duration,
        default_backend: &str,
    ) -> Self {
        Self {
            channels: channels
                .iter()
                .map(|channel| BackendChannel::parse(channel.as_ref(), default_backend))
                .collect(),
            range,
            ttl: ttl.as_secs(),
        }
    }
}

/// Stream provisioning service.
pub trait Provisioning: Send + Sync {
    /// Allocate a stream carrying `request.channels`; returns its address.
    fn request_stream(&self, request: &StreamRequest) -> Result<String>;

    /// Release a stream obtained from [`Provisioning::request_stream`].
    fn remove_stream(&self, address: &str) -> Result<()>;

    fn list_channels(&self) -> Result<Vec<ChannelInfo>>;

    fn update_ttl(&self, request: &TtlRequest) -> Result<()>;
}
