use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::codec::{FrameConfig, DEFAULT_MAX_PAYLOAD};

/// Default depth of the bounded in-memory queue.
pub const DEFAULT_QUEUE_SIZE: usize = 100;

/// How long a bound sender waits for a peer before dropping a message.
pub const DEFAULT_PEER_WAIT: Duration = Duration::from_secs(1);

/// How long `receive` waits for the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiveTimeout {
    /// Block until a frame arrives or the peer disconnects.
    #[default]
    Forever,
    /// Return `None` at once when nothing is pending.
    Immediate,
    /// Wait at most this long.
    After(Duration),
}

impl ReceiveTimeout {
    /// Legacy millisecond convention: negative waits forever, `0` returns
    /// immediately.
    pub fn from_millis(millis: i64) -> Self {
        match millis {
            m if m < 0 => Self::Forever,
            0 => Self::Immediate,
            m => Self::After(Duration::from_millis(m.unsigned_abs())),
        }
    }

    /// Socket read timeout for this setting. `Immediate` has none; it is
    /// implemented with a non-blocking socket instead.
    pub fn read_timeout(self) -> Option<Duration> {
        match self {
            Self::After(duration) => Some(duration),
            Self::Forever | Self::Immediate => None,
        }
    }
}

/// Whether a session dials out or waits for its peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionType {
    #[default]
    Connect,
    /// Listen on the address and serve the first peer that connects.
    Bind,
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "connect" => Ok(Self::Connect),
            "bind" => Ok(Self::Bind),
            other => Err(format!("unknown connection type: {other}")),
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Bind => "bind",
        })
    }
}

/// Messaging pattern of a session. Push/Pub only send, Pull/Sub only receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Push,
    Pull,
    Pub,
    Sub,
}

impl Mode {
    pub fn can_send(self) -> bool {
        matches!(self, Self::Push | Self::Pub)
    }

    pub fn can_receive(self) -> bool {
        matches!(self, Self::Pull | Self::Sub)
    }

    /// The mode a peer of this session must use.
    pub fn peer(self) -> Self {
        match self {
            Self::Push => Self::Pull,
            Self::Pull => Self::Push,
            Self::Pub => Self::Sub,
            Self::Sub => Self::Pub,
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "pull" => Ok(Self::Pull),
            "pub" => Ok(Self::Pub),
            "sub" => Ok(Self::Sub),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Push => "push",
            Self::Pull => "pull",
            Self::Pub => "pub",
            Self::Sub => "sub",
        })
    }
}

/// Session-level transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Bound of the in-memory queue between a sender and a receiver.
    pub queue_size: usize,
    pub receive_timeout: ReceiveTimeout,
    /// Largest accepted frame payload.
    pub max_payload_size: usize,
    /// Longest a bound sender waits for a peer at the start of a message.
    pub peer_wait: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            receive_timeout: ReceiveTimeout::Forever,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            peer_wait: DEFAULT_PEER_WAIT,
        }
    }
}

impl TransportConfig {
    pub fn with_queue_size(mut self, queue_size: usize) -> Self {
        self.queue_size = queue_size;
        self
    }

    pub fn with_receive_timeout(mut self, receive_timeout: ReceiveTimeout) -> Self {
        self.receive_timeout = receive_timeout;
        self
    }

    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }

    pub fn with_peer_wait(mut self, peer_wait: Duration) -> Self {
        self.peer_wait = peer_wait;
        self
    }

    /// Frame codec settings derived from this config.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
            read_timeout: self.receive_timeout.read_timeout(),
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_millisecond_timeouts() {
        assert_eq!(ReceiveTimeout::from_millis(-1), ReceiveTimeout::Forever);
        assert_eq!(ReceiveTimeout::from_millis(0), ReceiveTimeout::Immediate);
        assert_eq!(
            ReceiveTimeout::from_millis(250),
            ReceiveTimeout::After(Duration::from_millis(250))
        );
    }

    #[test]
    fn read_timeout_mapping() {
        assert_eq!(ReceiveTimeout::Forever.read_timeout(), None);
        assert_eq!(ReceiveTimeout::Immediate.read_timeout(), None);
        assert_eq!(
            ReceiveTimeout::After(Duration::from_secs(1)).read_timeout(),
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn mode_roles_and_parsing() {
        assert!(Mode::Push.can_send() && !Mode::Push.can_receive());
        assert!(Mode::Sub.can_receive() && !Mode::Sub.can_send());
        assert_eq!(Mode::Pub.peer(), Mode::Sub);
        assert_eq!("PULL".parse::<Mode>().unwrap(), Mode::Pull);
        assert!("dealer".parse::<Mode>().is_err());
        assert_eq!(Mode::Pub.to_string(), "pub");
    }

    #[test]
    fn connection_type_parsing() {
        assert_eq!("bind".parse::<ConnectionType>().unwrap(), ConnectionType::Bind);
        assert_eq!(ConnectionType::default(), ConnectionType::Connect);
        assert!("listen".parse::<ConnectionType>().is_err());
    }

    #[test]
    fn builder_overrides() {
        let cfg = TransportConfig::default()
            .with_queue_size(4)
            .with_receive_timeout(ReceiveTimeout::Immediate)
            .with_max_payload_size(1024);
        assert_eq!(cfg.queue_size, 4);
        assert_eq!(cfg.frame_config().max_payload_size, 1024);
        assert_eq!(cfg.frame_config().read_timeout, None);
    }
}
