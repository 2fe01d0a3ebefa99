use std::time::{Duration, Instant};

use bytes::Bytes;
use pulsewire_transport::{Address, Listener, Stream, TransportError};
use tracing::{debug, info};

use crate::config::{Mode, ReceiveTimeout, TransportConfig};
use crate::error::{FrameError, Result};
use crate::reader::FrameReader;
use crate::transport::{check_role, Transport};
use crate::writer::FrameWriter;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// [`Transport`] over a socket stream (Unix domain socket or TCP).
///
/// A bound session serves one peer at a time. When that peer goes away the
/// session falls back to waiting for the next one.
pub struct StreamTransport {
    mode: Mode,
    config: TransportConfig,
    listener: Option<Listener>,
    peer: Option<Peer>,
    has_more: bool,
    /// A multipart message is half sent; its remaining parts must go to the
    /// same peer.
    in_message: bool,
}

struct Peer {
    reader: FrameReader<Stream>,
    writer: FrameWriter<Stream>,
}

impl StreamTransport {
    /// Connect to a listening peer.
    pub fn connect(address: &Address, mode: Mode, config: TransportConfig) -> Result<Self> {
        let stream = address.connect()?;
        info!(%address, %mode, "connected");
        Self::from_stream(stream, mode, config)
    }

    /// Listen on `address`. The peer is accepted on first use.
    pub fn bind(address: &Address, mode: Mode, config: TransportConfig) -> Result<Self> {
        let listener = address.bind()?;
        info!(address = %listener.local_address(), %mode, "bound");
        Ok(Self {
            mode,
            config,
            listener: Some(listener),
            peer: None,
            has_more: false,
            in_message: false,
        })
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: Stream, mode: Mode, config: TransportConfig) -> Result<Self> {
        let mut transport = Self {
            mode,
            config,
            listener: None,
            peer: None,
            has_more: false,
            in_message: false,
        };
        transport.attach(stream)?;
        Ok(transport)
    }

    /// Address of the listener of a bound session.
    pub fn local_address(&self) -> Option<Address> {
        self.listener.as_ref().map(Listener::local_address)
    }

    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn attach(&mut self, stream: Stream) -> Result<()> {
        let frame_config = self.config.frame_config();
        let nonblocking =
            self.mode.can_receive() && self.config.receive_timeout == ReceiveTimeout::Immediate;
        stream.set_nonblocking(nonblocking)?;
        let reader = FrameReader::with_config_stream(stream.try_clone()?, frame_config.clone())?;
        let writer = FrameWriter::with_config_stream(stream, frame_config)?;
        self.peer = Some(Peer { reader, writer });
        self.has_more = false;
        Ok(())
    }

    /// Make sure a peer is attached. `Ok(false)` when none arrived within
    /// `wait` (only possible for bound sessions).
    fn ensure_peer(&mut self, wait: ReceiveTimeout) -> Result<bool> {
        if self.peer.is_some() {
            return Ok(true);
        }
        let Some(listener) = self.listener.as_ref() else {
            return Err(FrameError::ConnectionClosed);
        };

        let stream = match wait {
            ReceiveTimeout::Forever => {
                listener.set_nonblocking(false)?;
                listener.accept()?
            }
            ReceiveTimeout::Immediate => {
                listener.set_nonblocking(true)?;
                match try_accept(listener)? {
                    Some(stream) => stream,
                    None => return Ok(false),
                }
            }
            ReceiveTimeout::After(timeout) => {
                listener.set_nonblocking(true)?;
                let deadline = Instant::now() + timeout;
                loop {
                    if let Some(stream) = try_accept(listener)? {
                        break stream;
                    }
                    if Instant::now() >= deadline {
                        return Ok(false);
                    }
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        };
        info!(mode = %self.mode, transport = stream.transport_name(), "peer attached");
        self.attach(stream)?;
        Ok(true)
    }

    /// Drop a departed peer so a bound session can accept the next one.
    fn on_error(&mut self, err: FrameError) -> FrameError {
        self.in_message = false;
        if matches!(err, FrameError::ConnectionClosed) && self.peer.take().is_some() {
            self.has_more = false;
            if self.listener.is_some() {
                debug!(mode = %self.mode, "peer disconnected; waiting for the next one");
            }
        }
        err
    }
}

fn try_accept(listener: &Listener) -> Result<Option<Stream>> {
    match listener.accept() {
        Ok(stream) => Ok(Some(stream)),
        Err(TransportError::Accept(err)) if err.kind() == std::io::ErrorKind::WouldBlock => {
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

impl Transport for StreamTransport {
    fn send(&mut self, payload: &[u8], more: bool) -> Result<()> {
        check_role(self.mode, self.mode.can_send(), "send")?;
        if !self.in_message {
            let wait = self.config.peer_wait;
            if !self.ensure_peer(ReceiveTimeout::After(wait))? {
                return Err(FrameError::NoPeer(wait));
            }
        }
        let Some(peer) = self.peer.as_mut() else {
            return Err(self.on_error(FrameError::ConnectionClosed));
        };
        match peer.writer.send(payload, more) {
            Ok(()) => {
                self.in_message = more;
                Ok(())
            }
            Err(err) => Err(self.on_error(err)),
        }
    }

    fn receive(&mut self) -> Result<Option<Bytes>> {
        check_role(self.mode, self.mode.can_receive(), "receive")?;
        if !self.ensure_peer(self.config.receive_timeout)? {
            return Ok(None);
        }
        let Some(peer) = self.peer.as_mut() else {
            return Err(FrameError::ConnectionClosed);
        };
        let result = peer.reader.try_read_frame();
        match result {
            Ok(Some(frame)) => {
                self.has_more = frame.more;
                Ok(Some(frame.payload))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(self.on_error(err)),
        }
    }

    fn has_more(&self) -> bool {
        self.has_more
    }

    fn mode(&self) -> Mode {
        self.mode
    }
}

impl Drop for StreamTransport {
    fn drop(&mut self) {
        if let Some(peer) = self.peer.as_ref() {
            let _ = peer.writer.get_ref().shutdown();
        }
    }
}

impl std::fmt::Debug for StreamTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("mode", &self.mode)
            .field("listener", &self.listener)
            .field("connected", &self.peer.is_some())
            .finish()
    }
}
