use pulsewire_codec::EncoderConfig;
use pulsewire_frame::{ConnectionType, Mode, ReceiveTimeout, TransportConfig};

/// Port senders listen on unless told otherwise.
pub const DEFAULT_PORT: u16 = 9999;

const SENDER_QUEUE_SIZE: usize = 10;

/// Settings for a [`crate::Sender`].
#[derive(Debug, Clone)]
pub struct SenderConfig {
    pub address: String,
    pub connection_type: ConnectionType,
    /// `Push` or `Pub`.
    pub mode: Mode,
    pub transport: TransportConfig,
    pub encoder: EncoderConfig,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            address: format!("tcp://*:{DEFAULT_PORT}"),
            connection_type: ConnectionType::Bind,
            mode: Mode::Push,
            transport: TransportConfig::default().with_queue_size(SENDER_QUEUE_SIZE),
            encoder: EncoderConfig::default(),
        }
    }
}

impl SenderConfig {
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = connection_type;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }
}

/// Settings for a [`crate::Source`].
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub address: String,
    pub connection_type: ConnectionType,
    /// `Pull` or `Sub`.
    pub mode: Mode,
    pub transport: TransportConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            address: format!("tcp://localhost:{DEFAULT_PORT}"),
            connection_type: ConnectionType::Connect,
            mode: Mode::Pull,
            transport: TransportConfig::default(),
        }
    }
}

impl SourceConfig {
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_connection_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = connection_type;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Shorthand for the transport receive timeout.
    pub fn with_receive_timeout(mut self, timeout: ReceiveTimeout) -> Self {
        self.transport.receive_timeout = timeout;
        self
    }
}
