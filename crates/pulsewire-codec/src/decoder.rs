//! Pulse decoding: header, data header lookup, then one value and timestamp
//! frame per channel.

use tracing::warn;

use crate::error::DecodeError;
use crate::frames::FrameSource;
use crate::header::PulseHeader;
use crate::message::{ChannelValues, Message, Value};
use crate::registry::{Resolution, SchemaRegistry};

/// Turns the frames of one pulse into a [`Message`].
///
/// Owns the schema cache, so one decoder serves exactly one stream.
#[derive(Debug, Default)]
pub struct Decoder {
    registry: SchemaRegistry,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Drop the cached schema.
    pub fn reset(&mut self) {
        self.registry.clear();
    }

    /// Decode one pulse.
    ///
    /// Returns `Ok(None)` when the message carries no pulse header. Header
    /// and schema errors drop the whole pulse (its remaining frames are
    /// drained). Channel errors never surface: the channel value is absent
    /// and the other channels are decoded normally.
    pub fn decode<S: FrameSource + ?Sized>(
        &mut self,
        frames: &mut S,
    ) -> Result<Option<Message>, DecodeError> {
        let Some(raw) = frames.next_frame() else {
            return Ok(None);
        };
        if raw.is_empty() {
            frames.drain();
            return Ok(None);
        }

        let header: PulseHeader = match serde_json::from_slice(&raw) {
            Ok(header) => header,
            Err(err) => {
                frames.drain();
                return Err(DecodeError::Header(err));
            }
        };

        let resolution = match self.registry.resolve(&header, frames) {
            Ok(resolution) => resolution,
            Err(err) => {
                frames.drain();
                return Err(err.into());
            }
        };

        let (schema, format_changed) = match resolution {
            Resolution::Heartbeat => {
                return Ok(Some(Message {
                    header,
                    data: ChannelValues::default(),
                    format_changed: false,
                }))
            }
            Resolution::Unchanged(schema) => (schema, false),
            Resolution::Changed(schema) => (schema, true),
        };

        let pulse_id = header.pulse_id;
        let channels = schema.channels();
        let mut data = ChannelValues::with_capacity(channels.len());

        for (index, channel) in channels.iter().enumerate() {
            let Some(value_frame) = frames.next_frame() else {
                warn!(
                    pulse_id,
                    missing = channels.len() - index,
                    "pulse ended early, remaining channels are absent"
                );
                for channel in &channels[index..] {
                    data.push(channel.name(), Value::absent());
                }
                break;
            };
            let timestamp_frame = frames.next_frame();

            if value_frame.is_empty() {
                data.push(channel.name(), Value::absent());
                continue;
            }

            let value = match channel.decode_value(&value_frame) {
                Ok(value) => value,
                Err(err) => {
                    warn!(
                        pulse_id,
                        channel = channel.name(),
                        error = %err,
                        "channel decode failed, value dropped"
                    );
                    None
                }
            };
            let timestamp = timestamp_frame
                .as_deref()
                .and_then(|raw| channel.decode_timestamp(raw));
            data.push(channel.name(), Value::new(value, timestamp));
        }

        let extra = frames.drain();
        if extra > 0 {
            warn!(pulse_id, extra, "ignoring frames beyond the declared channels");
        }

        Ok(Some(Message {
            header,
            data,
            format_changed,
        }))
    }
}
