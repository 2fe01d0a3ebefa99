use std::sync::Arc;

use bytes::Bytes;
use pulsewire_codec::{ConsistencyTracker, Decoder, Message, PulseFrames};
use pulsewire_frame::{connect, ConnectionType, FrameError, Mode, Transport};
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::error::{Result, SessionError};
use crate::provision::{ChannelRequest, Provisioning, StreamRequest, StreamType};

struct ProvisionedStream {
    service: Arc<dyn Provisioning>,
    address: String,
}

/// Receives pulses from a transport.
///
/// Owns its decoder, so the schema cache serves this stream only. Frames of
/// a message that is cut off by a receive timeout are kept and completed by
/// the next call.
pub struct Source {
    decoder: Decoder,
    transport: Box<dyn Transport>,
    pending: Vec<Bytes>,
    tracker: ConsistencyTracker,
    provisioned: Option<ProvisionedStream>,
}

impl Source {
    /// Connect (or bind) as described by `config`.
    pub fn connect(config: SourceConfig) -> Result<Self> {
        if !config.mode.can_receive() {
            return Err(SessionError::Frame(FrameError::WrongMode {
                mode: config.mode,
                operation: "receive",
            }));
        }
        let transport = connect(
            &config.address,
            config.connection_type,
            config.mode,
            config.transport,
        )?;
        info!(address = %config.address, mode = %config.mode, "source opened");
        Ok(Self::with_transport(transport))
    }

    /// Ask `service` for a stream carrying `channels` and connect to it.
    ///
    /// The stream is released again when the source disconnects or drops.
    pub fn provisioned(
        service: Arc<dyn Provisioning>,
        channels: Vec<ChannelRequest>,
        config: SourceConfig,
    ) -> Result<Self> {
        let stream_type = match config.mode {
            Mode::Sub | Mode::Pub => StreamType::PubSub,
            Mode::Pull | Mode::Push => StreamType::PushPull,
        };
        let address = service.request_stream(&StreamRequest::new(channels, stream_type))?;
        info!(%address, "stream provisioned");

        let config = config
            .with_address(address.clone())
            .with_connection_type(ConnectionType::Connect);
        match Self::connect(config) {
            Ok(mut source) => {
                source.provisioned = Some(ProvisionedStream { service, address });
                Ok(source)
            }
            Err(err) => {
                if let Err(release) = service.remove_stream(&address) {
                    warn!(%address, error = %release, "failed to release stream");
                }
                Err(err)
            }
        }
    }

    /// Receive over an already established transport.
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            decoder: Decoder::new(),
            transport: Box::new(transport),
            pending: Vec::new(),
            tracker: ConsistencyTracker::new(),
            provisioned: None,
        }
    }

    /// Receive the next pulse.
    ///
    /// `Ok(None)` means the receive timeout elapsed. A departed peer is
    /// [`SessionError::Disconnected`]. Header and schema failures drop the
    /// pulse and are returned as [`SessionError::Decode`].
    pub fn receive(&mut self) -> Result<Option<Message>> {
        loop {
            match self.transport.receive_multipart(&mut self.pending) {
                Ok(true) => {}
                Ok(false) => return Ok(None),
                Err(err) => {
                    // Parts of a pulse from a departed peer never complete.
                    if !self.pending.is_empty() {
                        debug!(parts = self.pending.len(), "discarding partial pulse");
                        self.pending.clear();
                    }
                    return Err(err.into());
                }
            }
            let mut frames = PulseFrames::from(std::mem::take(&mut self.pending));
            if let Some(message) = self.decoder.decode(&mut frames)? {
                self.tracker.observe(message.pulse_id());
                return Ok(Some(message));
            }
            debug!("skipping message without pulse header");
        }
    }

    /// Receive until `filter` accepts a pulse. Timeouts still return
    /// `Ok(None)`; rejected pulses count toward the statistics.
    pub fn receive_filtered<F>(&mut self, mut filter: F) -> Result<Option<Message>>
    where
        F: FnMut(&Message) -> bool,
    {
        loop {
            match self.receive()? {
                Some(message) if filter(&message) => return Ok(Some(message)),
                Some(_) => continue,
                None => return Ok(None),
            }
        }
    }

    /// Pulse sequence statistics since connect or the last reset.
    pub fn stats(&self) -> &ConsistencyTracker {
        &self.tracker
    }

    pub fn reset_stats(&mut self) {
        self.tracker.reset();
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// Address of a provisioned stream.
    pub fn provisioned_address(&self) -> Option<&str> {
        self.provisioned.as_ref().map(|stream| stream.address.as_str())
    }

    /// Close the transport and release a provisioned stream.
    pub fn disconnect(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        match self.provisioned.take() {
            Some(stream) => {
                debug!(address = %stream.address, "releasing provisioned stream");
                stream.service.remove_stream(&stream.address)
            }
            None => Ok(()),
        }
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            warn!(error = %err, "failed to release provisioned stream");
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("mode", &self.transport.mode())
            .field("stats", &self.tracker)
            .field("provisioned", &self.provisioned_address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use pulsewire_codec::{ChannelOptions, Data, DecodeError, EncoderConfig};
    use pulsewire_frame::{MemoryTransport, ReceiveTimeout, TransportConfig};

    use super::*;
    use crate::provision::{ChannelInfo, TtlRequest};
    use crate::sender::Sender;

    fn pair(timeout: ReceiveTimeout) -> (Sender, Source) {
        let config = TransportConfig::default()
            .with_queue_size(256)
            .with_receive_timeout(timeout);
        let (push, pull) = MemoryTransport::pair(Mode::Push, &config).unwrap();
        (
            Sender::with_transport(push, EncoderConfig::default()),
            Source::with_transport(pull),
        )
    }

    #[test]
    fn receives_pulses_and_tracks_consistency() {
        let (sender, mut source) = pair(ReceiveTimeout::Immediate);
        for id in [5u64, 6, 8, 8, 7] {
            sender
                .send_with([("A", Some(Data::from(id as i64)))], Some(id), None)
                .unwrap();
        }

        let mut received = Vec::new();
        while let Some(message) = source.receive().unwrap() {
            received.push(message.pulse_id());
        }
        assert_eq!(received, vec![5, 6, 8, 8, 7]);

        let stats = source.stats();
        assert_eq!(stats.received_count(), 5);
        assert_eq!(stats.missed_count(), 1);
        assert_eq!(stats.duplicate_count(), 1);
        assert_eq!(stats.reverted_count(), 1);
        assert_eq!(stats.last_pulse_id(), Some(8));

        source.reset_stats();
        assert_eq!(source.stats().received_count(), 0);
    }

    #[test]
    fn schema_is_reused_until_channels_change() {
        let (sender, mut source) = pair(ReceiveTimeout::Immediate);
        sender.send([("A", Some(Data::from(1.0f64)))]).unwrap();
        sender.send([("A", Some(Data::from(2.0f64)))]).unwrap();
        sender
            .send([("A", Some(Data::from(3.0f64))), ("B", Some(Data::from("x")))])
            .unwrap();

        let flags: Vec<bool> = std::iter::from_fn(|| source.receive().unwrap())
            .map(|message| message.format_changed)
            .collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn filter_skips_rejected_pulses() {
        let (sender, mut source) = pair(ReceiveTimeout::Immediate);
        for id in 0..6u64 {
            sender
                .send_with([("A", Some(Data::from(id as i64)))], Some(id), None)
                .unwrap();
        }

        let message = source
            .receive_filtered(|message| message.pulse_id() % 4 == 3)
            .unwrap()
            .unwrap();
        assert_eq!(message.pulse_id(), 3);
        assert_eq!(source.stats().received_count(), 4);

        assert!(source
            .receive_filtered(|message| message.pulse_id() > 100)
            .unwrap()
            .is_none());
    }

    #[test]
    fn timeout_then_disconnect() {
        let (sender, mut source) = pair(ReceiveTimeout::After(Duration::from_millis(10)));
        assert!(source.receive().unwrap().is_none());
        drop(sender);
        assert!(matches!(source.receive(), Err(SessionError::Disconnected(_))));
    }

    #[test]
    fn malformed_header_is_surfaced_and_stream_continues() {
        let config = TransportConfig::default().with_receive_timeout(ReceiveTimeout::Immediate);
        let (mut push, pull) = MemoryTransport::pair(Mode::Push, &config).unwrap();
        let mut source = Source::with_transport(pull);

        push.send(b"{not json", true).unwrap();
        push.send(b"", false).unwrap();
        let err = source.receive().unwrap_err();
        assert!(matches!(err, SessionError::Decode(DecodeError::Header(_))));

        let sender = Sender::with_transport(push, EncoderConfig::default());
        sender.add_channel("A", ChannelOptions::default()).unwrap();
        sender.send([("A", Some(Data::from(1i64)))]).unwrap();
        let message = source.receive().unwrap().unwrap();
        assert_eq!(message.value("A"), Some(&Data::from(1i64)));
    }

    #[test]
    fn connect_rejects_sending_mode() {
        let config = SourceConfig::default().with_mode(Mode::Push);
        assert!(matches!(
            Source::connect(config),
            Err(SessionError::Frame(FrameError::WrongMode { .. }))
        ));
    }

    #[derive(Default)]
    struct RecordingProvisioning {
        requests: Mutex<Vec<StreamRequest>>,
        removed: Mutex<Vec<String>>,
        address: String,
    }

    impl Provisioning for RecordingProvisioning {
        fn request_stream(&self, request: &StreamRequest) -> Result<String> {
            self.requests
                .lock()
                .map_err(|_| SessionError::Poisoned)?
                .push(request.clone());
            Ok(self.address.clone())
        }

        fn remove_stream(&self, address: &str) -> Result<()> {
            self.removed
                .lock()
                .map_err(|_| SessionError::Poisoned)?
                .push(address.to_string());
            Ok(())
        }

        fn list_channels(&self) -> Result<Vec<ChannelInfo>> {
            Ok(Vec::new())
        }

        fn update_ttl(&self, _request: &TtlRequest) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_connect_releases_provisioned_stream() {
        let dir = std::env::temp_dir().join(format!("pulsewire-prov-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let address = format!("ipc://{}", dir.join("missing.sock").display());

        let service = Arc::new(RecordingProvisioning {
            address: address.clone(),
            ..RecordingProvisioning::default()
        });
        let result = Source::provisioned(
            service.clone(),
            vec![ChannelRequest::new("A").with_modulo(10)],
            SourceConfig::default().with_mode(Mode::Sub),
        );
        assert!(result.is_err());

        let requests = service.requests.lock().unwrap();
        assert_eq!(requests[0].stream_type, StreamType::PubSub);
        assert_eq!(requests[0].channels[0].modulo, Some(10));
        assert_eq!(*service.removed.lock().unwrap(), vec![address]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn provisioned_source_releases_stream_on_disconnect() {
        let dir = std::env::temp_dir().join(format!("pulsewire-prov-ok-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let address = format!("ipc://{}", dir.join("stream.sock").display());
        let listener: pulsewire_transport::Address = address.parse().unwrap();
        let _bound = listener.bind().unwrap();

        let service = Arc::new(RecordingProvisioning {
            address: address.clone(),
            ..RecordingProvisioning::default()
        });
        let source = Source::provisioned(
            service.clone(),
            vec![ChannelRequest::new("A")],
            SourceConfig::default(),
        )
        .unwrap();
        assert_eq!(source.provisioned_address(), Some(address.as_str()));
        assert_eq!(
            service.requests.lock().unwrap()[0].stream_type,
            StreamType::PushPull
        );

        source.disconnect().unwrap();
        assert_eq!(*service.removed.lock().unwrap(), vec![address]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
