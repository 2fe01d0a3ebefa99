//! Pulse encoding with per-channel type inference and data header caching.

use std::fmt;

use bytes::Bytes;
use tracing::debug;

use crate::config::{ChannelOptions, EncoderConfig};
use crate::error::EncodeError;
use crate::header::{ChannelSpec, PulseHeader, Timestamp};
use crate::registry::{build_data_header, BuiltSchema};
use crate::types::{resolve_for_encode, Data, Descriptor, ElementKind};

/// Per-channel value callback, invoked with the pulse id being encoded.
pub type ValueSource = Box<dyn Fn(u64) -> Option<Data> + Send>;

struct EncoderChannel {
    name: String,
    options: ChannelOptions,
    source: Option<ValueSource>,
    /// Type and fastest-first shape last written into the data header.
    inferred: Option<(ElementKind, Vec<usize>)>,
}

impl EncoderChannel {
    fn new(name: String, options: ChannelOptions, source: Option<ValueSource>) -> Self {
        Self {
            name,
            options,
            source,
            inferred: None,
        }
    }

    fn spec(&self, inferred: Option<&(ElementKind, Vec<usize>)>) -> ChannelSpec {
        let (kind, shape) = inferred
            .cloned()
            .unwrap_or((ElementKind::Float64, vec![1]));
        ChannelSpec {
            name: self.name.clone(),
            type_name: Some(kind.name().to_string()),
            shape: Some(shape),
            encoding: Some(self.options.encoding.as_str().to_string()),
            compression: self.options.compression.header_value().map(str::to_string),
            modulo: self.options.modulo,
            offset: self.options.offset,
        }
    }
}

/// Frames of one encoded pulse, in send order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPulse {
    pub pulse_id: u64,
    pub header: PulseHeader,
    pub frames: Vec<Bytes>,
    /// Whether the data header was rebuilt for this pulse.
    pub schema_rebuilt: bool,
}

/// Turns channel values into pulse frames.
///
/// The data header is rebuilt only when the channel set or an inferred
/// channel type or shape changes.
pub struct Encoder {
    config: EncoderConfig,
    channels: Vec<EncoderChannel>,
    schema: Option<BuiltSchema>,
    next_pulse_id: u64,
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("config", &self.config)
            .field("channels", &self.channel_names().collect::<Vec<_>>())
            .field("hash", &self.current_hash())
            .field("next_pulse_id", &self.next_pulse_id)
            .finish()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

impl Encoder {
    pub fn new(config: EncoderConfig) -> Self {
        let next_pulse_id = config.start_pulse_id;
        Self {
            config,
            channels: Vec::new(),
            schema: None,
            next_pulse_id,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Register a channel. Its type is inferred from the first value sent.
    pub fn add_channel(
        &mut self,
        name: impl Into<String>,
        options: ChannelOptions,
    ) -> Result<(), EncodeError> {
        self.register(name.into(), options, None)
    }

    /// Register a channel whose value is produced by `source` whenever a
    /// pulse carries no explicit value for it.
    pub fn add_channel_with_source<F>(
        &mut self,
        name: impl Into<String>,
        options: ChannelOptions,
        source: F,
    ) -> Result<(), EncodeError>
    where
        F: Fn(u64) -> Option<Data> + Send + 'static,
    {
        self.register(name.into(), options, Some(Box::new(source)))
    }

    /// Remove a channel. Returns false if it was not registered.
    pub fn remove_channel(&mut self, name: &str) -> bool {
        let Some(index) = self.index_of(name) else {
            return false;
        };
        self.channels.remove(index);
        self.schema = None;
        true
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|channel| channel.name.as_str())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Hash of the last built data header.
    pub fn current_hash(&self) -> Option<&str> {
        self.schema.as_ref().map(|schema| schema.hash.as_str())
    }

    /// Pulse id used when `encode` is called without one.
    pub fn next_pulse_id(&self) -> u64 {
        self.next_pulse_id
    }

    /// Record that `pulse_id` went out; the next default id follows it.
    pub fn mark_sent(&mut self, pulse_id: u64) {
        self.next_pulse_id = pulse_id.wrapping_add(1);
    }

    /// Encode one pulse.
    ///
    /// `values` override channel sources; unknown names are registered with
    /// default options. Channels without a value are sent as absent. The
    /// pulse id defaults to [`Encoder::next_pulse_id`] and is not advanced
    /// here: call [`Encoder::mark_sent`] once the frames are on the wire.
    pub fn encode<I, K>(
        &mut self,
        values: I,
        pulse_id: Option<u64>,
        timestamp: Option<Timestamp>,
    ) -> Result<EncodedPulse, EncodeError>
    where
        I: IntoIterator<Item = (K, Option<Data>)>,
        K: Into<String>,
    {
        let pulse_id = pulse_id.unwrap_or(self.next_pulse_id);
        let timestamp = timestamp.unwrap_or_else(Timestamp::now);

        let mut explicit = Vec::new();
        for (name, value) in values {
            let name = name.into();
            let index = match self.index_of(&name) {
                Some(index) => index,
                None => {
                    debug!(channel = %name, "registering channel on first use");
                    self.register(name, ChannelOptions::default(), None)?;
                    self.channels.len() - 1
                }
            };
            explicit.push((index, value));
        }

        let mut slots: Vec<Option<Option<Data>>> = vec![None; self.channels.len()];
        for (index, value) in explicit {
            slots[index] = Some(value);
        }
        let values: Vec<Option<Data>> = self
            .channels
            .iter()
            .zip(slots)
            .map(|(channel, slot)| match slot {
                Some(value) => value,
                None => channel.source.as_ref().and_then(|source| source(pulse_id)),
            })
            .collect();

        // Nothing is committed to `self` until every frame is built.
        let targets: Vec<Option<(ElementKind, Vec<usize>)>> = self
            .channels
            .iter()
            .zip(&values)
            .map(|(channel, value)| match value {
                Some(data) => {
                    let target = resolve_for_encode(data);
                    Some((target.kind, target.shape))
                }
                None if channel.inferred.is_some() => channel.inferred.clone(),
                None => Some((ElementKind::Float64, vec![1])),
            })
            .collect();
        let changed = self
            .channels
            .iter()
            .zip(&targets)
            .any(|(channel, target)| &channel.inferred != target);

        let (schema, schema_rebuilt) = match &self.schema {
            Some(schema) if !changed => (schema.clone(), false),
            _ => {
                let specs: Vec<ChannelSpec> = self
                    .channels
                    .iter()
                    .zip(&targets)
                    .map(|(channel, target)| channel.spec(target.as_ref()))
                    .collect();
                let schema = build_data_header(
                    &self.config.data_htype,
                    &specs,
                    self.config.data_header_compression,
                )?;
                debug!(
                    hash = %schema.hash,
                    channels = specs.len(),
                    "data header rebuilt"
                );
                (schema, true)
            }
        };

        let header = PulseHeader {
            htype: self.config.main_htype.clone(),
            hash: schema.hash.clone(),
            pulse_id,
            global_timestamp: timestamp,
            dh_compression: schema.compression.header_value().map(str::to_string),
        };

        let mut frames = Vec::with_capacity(2 + 2 * self.channels.len());
        frames.push(Bytes::from(serde_json::to_vec(&header)?));
        frames.push(schema.bytes.clone());

        for (channel, value) in self.channels.iter().zip(values) {
            let Some(data) = value else {
                frames.push(Bytes::new());
                frames.push(Bytes::new());
                continue;
            };
            let descriptor = Descriptor::new(data.kind(), channel.options.encoding);
            let packed = channel
                .options
                .compression
                .codec()
                .pack(&data, descriptor)
                .map_err(|source| EncodeError::Pack {
                    channel: channel.name.clone(),
                    source,
                })?;
            if packed.is_empty() {
                frames.push(packed);
                frames.push(Bytes::new());
            } else {
                frames.push(packed);
                frames.push(timestamp.to_frame(channel.options.encoding));
            }
        }

        for (channel, target) in self.channels.iter_mut().zip(targets) {
            channel.inferred = target;
        }
        self.schema = Some(schema);
        Ok(EncodedPulse {
            pulse_id,
            header,
            frames,
            schema_rebuilt,
        })
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|channel| channel.name == name)
    }

    fn register(
        &mut self,
        name: String,
        options: ChannelOptions,
        source: Option<ValueSource>,
    ) -> Result<(), EncodeError> {
        if name.is_empty() {
            return Err(EncodeError::EmptyChannelName);
        }
        if self.index_of(&name).is_some() {
            return Err(EncodeError::DuplicateChannel(name));
        }
        self.channels
            .push(EncoderChannel::new(name, options, source));
        self.schema = None;
        Ok(())
    }
}
