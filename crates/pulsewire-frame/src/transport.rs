use bytes::Bytes;
use pulsewire_transport::Address;
use tracing::debug;

use crate::config::{ConnectionType, Mode, TransportConfig};
use crate::error::{FrameError, Result};
use crate::stream::StreamTransport;

/// A message session moving multipart messages one frame at a time.
pub trait Transport: Send {
    /// Send one frame. `more` marks that another frame of the same message
    /// follows.
    fn send(&mut self, payload: &[u8], more: bool) -> Result<()>;

    /// Receive the next frame. `Ok(None)` means the receive timeout elapsed;
    /// a departed peer is `Err(FrameError::ConnectionClosed)`.
    fn receive(&mut self) -> Result<Option<Bytes>>;

    /// Whether the last received frame announced a follow-up frame.
    fn has_more(&self) -> bool;

    fn mode(&self) -> Mode;

    /// Receive frames into `parts` until a message is complete.
    ///
    /// Returns `Ok(false)` on timeout; frames gathered so far stay in
    /// `parts` so the next call continues the same message.
    fn receive_multipart(&mut self, parts: &mut Vec<Bytes>) -> Result<bool> {
        loop {
            match self.receive()? {
                Some(frame) => {
                    parts.push(frame);
                    if !self.has_more() {
                        return Ok(true);
                    }
                }
                None => return Ok(false),
            }
        }
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, payload: &[u8], more: bool) -> Result<()> {
        (**self).send(payload, more)
    }

    fn receive(&mut self) -> Result<Option<Bytes>> {
        (**self).receive()
    }

    fn has_more(&self) -> bool {
        (**self).has_more()
    }

    fn mode(&self) -> Mode {
        (**self).mode()
    }

    fn receive_multipart(&mut self, parts: &mut Vec<Bytes>) -> Result<bool> {
        (**self).receive_multipart(parts)
    }
}

/// Open a stream session on `address`.
///
/// With [`ConnectionType::Connect`] the peer must already be listening.
/// With [`ConnectionType::Bind`] this returns once the listener is up; the
/// first peer is accepted lazily by the first `send`/`receive`.
pub fn connect(
    address: &str,
    connection_type: ConnectionType,
    mode: Mode,
    config: TransportConfig,
) -> Result<StreamTransport> {
    let address: Address = address.parse()?;
    debug!(%address, %connection_type, %mode, "opening transport");
    match connection_type {
        ConnectionType::Connect => StreamTransport::connect(&address, mode, config),
        ConnectionType::Bind => StreamTransport::bind(&address, mode, config),
    }
}

pub(crate) fn check_role(mode: Mode, allowed: bool, operation: &'static str) -> Result<()> {
    if allowed {
        Ok(())
    } else {
        Err(FrameError::WrongMode { mode, operation })
    }
}
