//! Encoder and per-channel options.

use crate::compression::CompressionId;
use crate::types::ByteOrder;

/// `htype` of the pulse header frame.
pub const MAIN_HEADER_HTYPE: &str = "bsr_m-1.1";

/// `htype` of the data header frame.
pub const DATA_HEADER_HTYPE: &str = "bsr_d-1.1";

/// Encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub main_htype: String,
    pub data_htype: String,
    /// Compression applied to the data header frame.
    pub data_header_compression: CompressionId,
    /// Pulse id used for the first pulse when none is given.
    pub start_pulse_id: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            main_htype: MAIN_HEADER_HTYPE.to_string(),
            data_htype: DATA_HEADER_HTYPE.to_string(),
            data_header_compression: CompressionId::None,
            start_pulse_id: 0,
        }
    }
}

impl EncoderConfig {
    pub fn with_data_header_compression(mut self, compression: CompressionId) -> Self {
        self.data_header_compression = compression;
        self
    }

    pub fn with_start_pulse_id(mut self, pulse_id: u64) -> Self {
        self.start_pulse_id = pulse_id;
        self
    }

    pub fn with_htypes(mut self, main: impl Into<String>, data: impl Into<String>) -> Self {
        self.main_htype = main.into();
        self.data_htype = data.into();
        self
    }
}

/// Per-channel encoding options.
///
/// `modulo` and `offset` are written into the data header for the
/// provisioning side; the codec itself does not decimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelOptions {
    pub encoding: ByteOrder,
    pub compression: CompressionId,
    pub modulo: Option<u64>,
    pub offset: Option<u64>,
}

impl ChannelOptions {
    pub fn with_encoding(mut self, encoding: ByteOrder) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_compression(mut self, compression: CompressionId) -> Self {
        self.compression = compression;
        self
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EncoderConfig::default();
        assert_eq!(config.main_htype, "bsr_m-1.1");
        assert_eq!(config.data_htype, "bsr_d-1.1");
        assert_eq!(config.data_header_compression, CompressionId::None);
        assert_eq!(config.start_pulse_id, 0);

        let options = ChannelOptions::default();
        assert_eq!(options.encoding, ByteOrder::Little);
        assert_eq!(options.compression, CompressionId::None);
    }

    #[test]
    fn builders_override() {
        let options = ChannelOptions::default()
            .with_encoding(ByteOrder::Big)
            .with_compression(CompressionId::BitshuffleLz4)
            .with_modulo(10)
            .with_offset(2);
        assert_eq!(options.modulo, Some(10));
        assert_eq!(options.offset, Some(2));
        assert_eq!(options.encoding, ByteOrder::Big);

        let config = EncoderConfig::default().with_start_pulse_id(100);
        assert_eq!(config.start_pulse_id, 100);
    }
}
