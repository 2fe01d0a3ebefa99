//! Channel schema registry.
//!
//! The decoder side caches the parsed data header keyed by its hash; the
//! encoder side builds data header bytes and their hash.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use md5::{Digest, Md5};
use tracing::debug;

use crate::compression::{BitshuffleLz4, CompressionId};
use crate::error::{ChannelError, EncodeError, SchemaError};
use crate::frames::FrameSource;
use crate::header::{ChannelSpec, DataHeader, PulseHeader, Timestamp};
use crate::types::{resolve_for_decode, ByteOrder, Data, Descriptor, ElementKind};

/// A data header channel with its type, byte order and codec resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    spec: ChannelSpec,
    kind: Option<ElementKind>,
    order: ByteOrder,
    compression: CompressionId,
}

impl Channel {
    /// Resolve a channel spec. Unknown compression ids are fatal; unknown
    /// types produce a channel that always decodes to an absent value.
    pub fn from_spec(spec: ChannelSpec) -> Result<Self, SchemaError> {
        let compression = CompressionId::parse(spec.compression.as_deref()).ok_or_else(|| {
            SchemaError::UnknownCompression {
                channel: spec.name.clone(),
                compression: spec.compression.clone().unwrap_or_default(),
            }
        })?;
        let kind = resolve_for_decode(spec.type_name.as_deref());
        let order = ByteOrder::from_encoding(spec.encoding.as_deref());
        Ok(Self {
            spec,
            kind,
            order,
            compression,
        })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &ChannelSpec {
        &self.spec
    }

    /// Element type, `None` for unsupported type names.
    pub fn kind(&self) -> Option<ElementKind> {
        self.kind
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn compression(&self) -> CompressionId {
        self.compression
    }

    /// Declared shape, fastest-dimension-first.
    pub fn shape(&self) -> Option<&[usize]> {
        self.spec.shape.as_deref()
    }

    /// Decode a value frame. An empty frame is an absent value.
    pub fn decode_value(&self, raw: &[u8]) -> Result<Option<Data>, ChannelError> {
        if raw.is_empty() {
            return Ok(None);
        }
        let Some(kind) = self.kind else {
            return Ok(None);
        };
        self.compression
            .codec()
            .unpack(raw, Descriptor::new(kind, self.order), self.shape())
    }

    pub fn decode_timestamp(&self, raw: &[u8]) -> Option<Timestamp> {
        Timestamp::from_frame(raw, self.order)
    }
}

/// Ordered channel list valid for every pulse sharing `hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    hash: String,
    htype: String,
    channels: Vec<Channel>,
}

impl Schema {
    /// Parse data header JSON.
    pub fn parse(hash: impl Into<String>, json: &[u8]) -> Result<Self, SchemaError> {
        let header: DataHeader = serde_json::from_slice(json)?;
        let mut seen = HashSet::with_capacity(header.channels.len());
        for spec in &header.channels {
            if !seen.insert(spec.name.as_str()) {
                return Err(SchemaError::DuplicateChannel(spec.name.clone()));
            }
        }
        let channels = header
            .channels
            .into_iter()
            .map(Channel::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            hash: hash.into(),
            htype: header.htype,
            channels,
        })
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn htype(&self) -> &str {
        &self.htype
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|channel| channel.name() == name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Outcome of resolving a pulse's data header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Hash matched the cache; the data header frame was skipped.
    Unchanged(Arc<Schema>),
    /// A new data header was parsed and cached.
    Changed(Arc<Schema>),
    /// The pulse carries no channels. Remaining frames were drained and the
    /// cache was left untouched.
    Heartbeat,
}

/// Decoder-side schema cache.
///
/// Belongs to exactly one decoder. It is not synchronized; concurrent
/// consumers each need their own registry.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    cached: Option<Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently cached schema, if any.
    pub fn current(&self) -> Option<&Arc<Schema>> {
        self.cached.as_ref()
    }

    /// Forget the cached schema; the next pulse reports a format change.
    pub fn clear(&mut self) {
        self.cached = None;
    }

    /// Resolve the schema for a pulse whose header was just read. Consumes
    /// the data header frame from `frames`.
    pub fn resolve<S: FrameSource + ?Sized>(
        &mut self,
        header: &PulseHeader,
        frames: &mut S,
    ) -> Result<Resolution, SchemaError> {
        let raw = frames
            .next_frame()
            .ok_or_else(|| SchemaError::MissingDataHeader {
                hash: header.hash.clone(),
            })?;

        if let Some(schema) = &self.cached {
            if schema.hash == header.hash {
                return Ok(Resolution::Unchanged(Arc::clone(schema)));
            }
        }

        let json = match CompressionId::parse(header.dh_compression.as_deref()) {
            Some(CompressionId::None) => Cow::Borrowed(raw.as_ref()),
            Some(CompressionId::BitshuffleLz4) => Cow::Owned(
                BitshuffleLz4
                    .decompress_bytes(&raw)
                    .map_err(SchemaError::Decompress)?,
            ),
            None => {
                return Err(SchemaError::UnknownHeaderCompression(
                    header.dh_compression.clone().unwrap_or_default(),
                ))
            }
        };

        let schema = Schema::parse(header.hash.clone(), &json)?;
        if schema.is_empty() {
            let dropped = frames.drain();
            debug!(pulse_id = header.pulse_id, dropped, "heartbeat pulse");
            return Ok(Resolution::Heartbeat);
        }

        debug!(
            hash = %header.hash,
            channels = schema.len(),
            "data header changed"
        );
        let schema = Arc::new(schema);
        self.cached = Some(Arc::clone(&schema));
        Ok(Resolution::Changed(schema))
    }
}

/// Encoded data header ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltSchema {
    /// Frame 2 bytes, compressed if requested.
    pub bytes: Bytes,
    /// MD5 of the uncompressed data header JSON.
    pub hash: String,
    pub compression: CompressionId,
}

/// Serialize a channel list into a data header frame.
pub fn build_data_header(
    htype: &str,
    channels: &[ChannelSpec],
    compression: CompressionId,
) -> Result<BuiltSchema, EncodeError> {
    let mut seen = HashSet::with_capacity(channels.len());
    for spec in channels {
        if spec.name.is_empty() {
            return Err(EncodeError::EmptyChannelName);
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(EncodeError::DuplicateChannel(spec.name.clone()));
        }
    }

    let header = DataHeader {
        htype: htype.to_string(),
        channels: channels.to_vec(),
    };
    let json = serde_json::to_vec(&header)?;
    let hash = content_hash(&json);
    let bytes = match compression {
        CompressionId::None => Bytes::from(json),
        CompressionId::BitshuffleLz4 => Bytes::from(
            BitshuffleLz4
                .compress_bytes(&json)
                .map_err(EncodeError::HeaderCompression)?,
        ),
    };

    Ok(BuiltSchema {
        bytes,
        hash,
        compression,
    })
}

/// Lowercase hex MD5 digest.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::PulseFrames;
    use crate::types::{Array, Scalar};

    fn spec(name: &str, type_name: &str) -> ChannelSpec {
        ChannelSpec {
            type_name: Some(type_name.to_string()),
            shape: Some(vec![1]),
            encoding: Some("little".to_string()),
            ..ChannelSpec::new(name)
        }
    }

    fn header_for(built: &BuiltSchema) -> PulseHeader {
        PulseHeader {
            htype: "bsr_m-1.1".into(),
            hash: built.hash.clone(),
            pulse_id: 1,
            global_timestamp: Timestamp::new(0, 0),
            dh_compression: built.compression.header_value().map(str::to_string),
        }
    }

    #[test]
    fn content_hash_is_lowercase_md5() {
        assert_eq!(content_hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(content_hash(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn build_rejects_duplicate_and_empty_names() {
        let err = build_data_header(
            "bsr_d-1.1",
            &[spec("a", "int8"), spec("a", "int16")],
            CompressionId::None,
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::DuplicateChannel(name) if name == "a"));

        let err = build_data_header("bsr_d-1.1", &[spec("", "int8")], CompressionId::None)
            .unwrap_err();
        assert!(matches!(err, EncodeError::EmptyChannelName));
    }

    #[test]
    fn hash_matches_uncompressed_bytes() {
        let channels = [spec("a", "float64")];
        let plain = build_data_header("bsr_d-1.1", &channels, CompressionId::None).unwrap();
        assert_eq!(plain.hash, content_hash(&plain.bytes));

        let packed =
            build_data_header("bsr_d-1.1", &channels, CompressionId::BitshuffleLz4).unwrap();
        assert_eq!(packed.hash, plain.hash);
        assert_ne!(packed.bytes, plain.bytes);
    }

    #[test]
    fn resolve_caches_by_hash() {
        let built =
            build_data_header("bsr_d-1.1", &[spec("a", "int32")], CompressionId::None).unwrap();
        let header = header_for(&built);
        let mut registry = SchemaRegistry::new();

        let mut frames = PulseFrames::from(vec![built.bytes.clone()]);
        let first = registry.resolve(&header, &mut frames).unwrap();
        assert!(matches!(first, Resolution::Changed(ref schema) if schema.len() == 1));

        // On a cache hit the frame is skipped unread, even if it is garbage.
        let mut frames = PulseFrames::from(vec![Bytes::from_static(b"not json")]);
        let second = registry.resolve(&header, &mut frames).unwrap();
        assert!(matches!(second, Resolution::Unchanged(_)));
        assert!(frames.is_empty());
    }

    #[test]
    fn resolve_compressed_data_header() {
        let built = build_data_header(
            "bsr_d-1.1",
            &[spec("a", "uint8"), spec("b", "string")],
            CompressionId::BitshuffleLz4,
        )
        .unwrap();
        let header = header_for(&built);
        let mut registry = SchemaRegistry::new();
        let mut frames = PulseFrames::from(vec![built.bytes]);

        let Resolution::Changed(schema) = registry.resolve(&header, &mut frames).unwrap() else {
            panic!("expected schema change");
        };
        assert_eq!(schema.channels()[1].kind(), Some(ElementKind::String));
        assert_eq!(schema.hash(), built.hash);
    }

    #[test]
    fn heartbeat_leaves_cache_untouched() {
        let built =
            build_data_header("bsr_d-1.1", &[spec("a", "int32")], CompressionId::None).unwrap();
        let mut registry = SchemaRegistry::new();
        let mut frames = PulseFrames::from(vec![built.bytes.clone()]);
        registry.resolve(&header_for(&built), &mut frames).unwrap();

        let empty = build_data_header("bsr_d-1.1", &[], CompressionId::None).unwrap();
        let mut frames = PulseFrames::from(vec![empty.bytes.clone(), Bytes::from_static(b"x")]);
        let resolution = registry.resolve(&header_for(&empty), &mut frames).unwrap();
        assert_eq!(resolution, Resolution::Heartbeat);
        assert!(frames.is_empty());
        assert_eq!(registry.current().unwrap().hash(), built.hash);
    }

    #[test]
    fn unknown_channel_compression_is_fatal() {
        let json = br#"{"htype":"bsr_d-1.1","channels":[{"name":"a","compression":"zstd"}]}"#;
        let err = Schema::parse("h", json).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnknownCompression { ref channel, ref compression }
                if channel == "a" && compression == "zstd"
        ));
    }

    #[test]
    fn unknown_header_compression_is_fatal() {
        let mut header = header_for(
            &build_data_header("bsr_d-1.1", &[], CompressionId::None).unwrap(),
        );
        header.dh_compression = Some("gzip".into());
        let mut frames = PulseFrames::from(vec![Bytes::from_static(b"{}")]);
        let err = SchemaRegistry::new()
            .resolve(&header, &mut frames)
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownHeaderCompression(ref id) if id == "gzip"));
    }

    #[test]
    fn missing_data_header_frame() {
        let header = header_for(
            &build_data_header("bsr_d-1.1", &[], CompressionId::None).unwrap(),
        );
        let mut frames = PulseFrames::new();
        let err = SchemaRegistry::new()
            .resolve(&header, &mut frames)
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingDataHeader { .. }));
    }

    #[test]
    fn malformed_json_keeps_previous_schema() {
        let built =
            build_data_header("bsr_d-1.1", &[spec("a", "int32")], CompressionId::None).unwrap();
        let mut registry = SchemaRegistry::new();
        let mut frames = PulseFrames::from(vec![built.bytes.clone()]);
        registry.resolve(&header_for(&built), &mut frames).unwrap();

        let mut header = header_for(&built);
        header.hash = "other".into();
        let mut frames = PulseFrames::from(vec![Bytes::from_static(b"{broken")]);
        let err = registry.resolve(&header, &mut frames).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidJson(_)));
        assert_eq!(registry.current().unwrap().hash(), built.hash);
    }

    #[test]
    fn unknown_type_decodes_absent_missing_type_is_float64() {
        let json = br#"{"channels":[{"name":"a","type":"complex64"},{"name":"b"}]}"#;
        let schema = Schema::parse("h", json).unwrap();
        assert_eq!(schema.channels()[0].kind(), None);
        assert_eq!(schema.channels()[1].kind(), Some(ElementKind::Float64));

        let raw = 1.5f64.to_le_bytes();
        assert_eq!(schema.channels()[0].decode_value(&raw).unwrap(), None);
        assert_eq!(
            schema.channels()[1].decode_value(&raw).unwrap(),
            Some(Data::Scalar(Scalar::Float64(1.5)))
        );
    }

    #[test]
    fn legacy_long_is_four_bytes_wide() {
        let json = br#"{"channels":[{"name":"l","type":"long","shape":[2]}]}"#;
        let schema = Schema::parse("h", json).unwrap();
        let mut raw = 7i32.to_le_bytes().to_vec();
        raw.extend_from_slice(&9i32.to_le_bytes());
        let value = schema.channels()[0].decode_value(&raw).unwrap();
        assert_eq!(value, Some(Data::from(Array::from_vec(vec![7i32, 9]))));
    }

    #[test]
    fn duplicate_channel_in_data_header() {
        let json = br#"{"channels":[{"name":"a"},{"name":"a"}]}"#;
        assert!(matches!(
            Schema::parse("h", json),
            Err(SchemaError::DuplicateChannel(_))
        ));
    }
}
