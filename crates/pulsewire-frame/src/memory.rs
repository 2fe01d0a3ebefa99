use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};

use bytes::Bytes;

use crate::codec::Frame;
use crate::config::{Mode, ReceiveTimeout, TransportConfig};
use crate::error::{FrameError, Result};
use crate::transport::{check_role, Transport};

/// In-process [`Transport`] backed by a bounded queue of `queue_size`
/// frames. `send` blocks while the queue is full.
#[derive(Debug)]
pub struct MemoryTransport {
    mode: Mode,
    timeout: ReceiveTimeout,
    max_payload_size: usize,
    tx: Option<SyncSender<Frame>>,
    rx: Option<Receiver<Frame>>,
    has_more: bool,
}

impl MemoryTransport {
    /// A connected sending/receiving pair. `sender_mode` must be a sending
    /// mode; the receiving end gets its peer mode.
    pub fn pair(sender_mode: Mode, config: &TransportConfig) -> Result<(Self, Self)> {
        check_role(sender_mode, sender_mode.can_send(), "send")?;
        let (tx, rx) = mpsc::sync_channel(config.queue_size);
        let sender = Self {
            mode: sender_mode,
            timeout: config.receive_timeout,
            max_payload_size: config.max_payload_size,
            tx: Some(tx),
            rx: None,
            has_more: false,
        };
        let receiver = Self {
            mode: sender_mode.peer(),
            timeout: config.receive_timeout,
            max_payload_size: config.max_payload_size,
            tx: None,
            rx: Some(rx),
            has_more: false,
        };
        Ok((sender, receiver))
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, payload: &[u8], more: bool) -> Result<()> {
        check_role(self.mode, self.mode.can_send(), "send")?;
        if payload.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload_size,
            });
        }
        let tx = self.tx.as_ref().ok_or(FrameError::ConnectionClosed)?;
        tx.send(Frame::new(Bytes::copy_from_slice(payload), more))
            .map_err(|_| FrameError::ConnectionClosed)
    }

    fn receive(&mut self) -> Result<Option<Bytes>> {
        check_role(self.mode, self.mode.can_receive(), "receive")?;
        let rx = self.rx.as_ref().ok_or(FrameError::ConnectionClosed)?;
        let frame = match self.timeout {
            ReceiveTimeout::Forever => rx.recv().map_err(|_| FrameError::ConnectionClosed)?,
            ReceiveTimeout::Immediate => match rx.try_recv() {
                Ok(frame) => frame,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(FrameError::ConnectionClosed),
            },
            ReceiveTimeout::After(timeout) => match rx.recv_timeout(timeout) {
                Ok(frame) => frame,
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => return Err(FrameError::ConnectionClosed),
            },
        };
        self.has_more = frame.more;
        Ok(Some(frame.payload))
    }

    fn has_more(&self) -> bool {
        self.has_more
    }

    fn mode(&self) -> Mode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(timeout: ReceiveTimeout) -> TransportConfig {
        TransportConfig::default()
            .with_queue_size(8)
            .with_receive_timeout(timeout)
    }

    #[test]
    fn carries_frames_in_order_with_more_flags() {
        let (mut push, mut pull) =
            MemoryTransport::pair(Mode::Push, &config(ReceiveTimeout::Forever)).unwrap();
        assert_eq!(pull.mode(), Mode::Pull);

        push.send(b"a", true).unwrap();
        push.send(b"b", false).unwrap();

        assert_eq!(pull.receive().unwrap(), Some(Bytes::from_static(b"a")));
        assert!(pull.has_more());
        assert_eq!(pull.receive().unwrap(), Some(Bytes::from_static(b"b")));
        assert!(!pull.has_more());
    }

    #[test]
    fn timeouts_yield_none() {
        let (_push, mut pull) =
            MemoryTransport::pair(Mode::Pub, &config(ReceiveTimeout::Immediate)).unwrap();
        assert_eq!(pull.mode(), Mode::Sub);
        assert_eq!(pull.receive().unwrap(), None);

        let (_push, mut pull) = MemoryTransport::pair(
            Mode::Push,
            &config(ReceiveTimeout::After(Duration::from_millis(10))),
        )
        .unwrap();
        assert_eq!(pull.receive().unwrap(), None);
    }

    #[test]
    fn dropped_sender_is_disconnect() {
        let (push, mut pull) =
            MemoryTransport::pair(Mode::Push, &config(ReceiveTimeout::Immediate)).unwrap();
        drop(push);
        assert!(matches!(pull.receive(), Err(FrameError::ConnectionClosed)));
    }

    #[test]
    fn dropped_receiver_fails_send() {
        let (mut push, pull) =
            MemoryTransport::pair(Mode::Push, &config(ReceiveTimeout::Forever)).unwrap();
        drop(pull);
        assert!(matches!(push.send(b"x", false), Err(FrameError::ConnectionClosed)));
    }

    #[test]
    fn pair_requires_sending_mode() {
        let result = MemoryTransport::pair(Mode::Pull, &TransportConfig::default());
        assert!(matches!(result, Err(FrameError::WrongMode { .. })));
    }

    #[test]
    fn oversized_payload_rejected() {
        let cfg = TransportConfig::default().with_max_payload_size(2);
        let (mut push, _pull) = MemoryTransport::pair(Mode::Push, &cfg).unwrap();
        assert!(matches!(
            push.send(b"abc", false),
            Err(FrameError::PayloadTooLarge { size: 3, max: 2 })
        ));
    }

    #[test]
    fn partial_message_survives_timeout() {
        let (mut push, mut pull) =
            MemoryTransport::pair(Mode::Push, &config(ReceiveTimeout::Immediate)).unwrap();
        let mut parts = Vec::new();

        push.send(b"first", true).unwrap();
        assert!(!pull.receive_multipart(&mut parts).unwrap());
        assert_eq!(parts.len(), 1);

        push.send(b"second", false).unwrap();
        assert!(pull.receive_multipart(&mut parts).unwrap());
        assert_eq!(parts, vec![Bytes::from_static(b"first"), Bytes::from_static(b"second")]);
    }
}
