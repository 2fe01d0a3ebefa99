use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use pulsewire_codec::{ChannelOptions, Data, Encoder, EncoderConfig, Timestamp};
use pulsewire_frame::{connect, Transport};
use tracing::{debug, info, warn};

use crate::config::SenderConfig;
use crate::error::{Result, SessionError};

struct SenderState {
    encoder: Encoder,
    transport: Box<dyn Transport>,
}

impl SenderState {
    /// Encode and emit one pulse. Runs under the state lock, so a channel
    /// table change never lands between two frames of the same pulse.
    fn emit<I, K>(
        &mut self,
        values: I,
        pulse_id: Option<u64>,
        timestamp: Option<Timestamp>,
    ) -> Result<u64>
    where
        I: IntoIterator<Item = (K, Option<Data>)>,
        K: Into<String>,
    {
        let pulse = self.encoder.encode(values, pulse_id, timestamp)?;
        let count = pulse.frames.len();
        for (index, frame) in pulse.frames.iter().enumerate() {
            self.transport.send(frame, index + 1 < count)?;
        }
        self.encoder.mark_sent(pulse.pulse_id);
        if pulse.schema_rebuilt {
            debug!(pulse_id = pulse.pulse_id, hash = %pulse.header.hash, "sent pulse with new data header");
        }
        Ok(pulse.pulse_id)
    }
}

struct Resend {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Sends pulses on a transport.
///
/// All methods take `&self`; the encoder and transport sit behind one lock
/// shared with the optional periodic resend thread.
pub struct Sender {
    state: Arc<Mutex<SenderState>>,
    resend: Option<Resend>,
}

impl Sender {
    /// Open the transport described by `config`.
    pub fn open(config: SenderConfig) -> Result<Self> {
        let transport = connect(
            &config.address,
            config.connection_type,
            config.mode,
            config.transport,
        )?;
        info!(address = %config.address, mode = %config.mode, "sender opened");
        Ok(Self::with_transport(transport, config.encoder))
    }

    /// Send over an already established transport.
    pub fn with_transport(transport: impl Transport + 'static, config: EncoderConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SenderState {
                encoder: Encoder::new(config),
                transport: Box::new(transport),
            })),
            resend: None,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SenderState>> {
        self.state.lock().map_err(|_| SessionError::Poisoned)
    }

    pub fn add_channel(&self, name: impl Into<String>, options: ChannelOptions) -> Result<()> {
        self.lock()?.encoder.add_channel(name, options)?;
        Ok(())
    }

    /// Register a channel whose value is produced per pulse by `source`.
    pub fn add_channel_with_source<F>(
        &self,
        name: impl Into<String>,
        options: ChannelOptions,
        source: F,
    ) -> Result<()>
    where
        F: Fn(u64) -> Option<Data> + Send + 'static,
    {
        self.lock()?
            .encoder
            .add_channel_with_source(name, options, source)?;
        Ok(())
    }

    pub fn remove_channel(&self, name: &str) -> Result<bool> {
        Ok(self.lock()?.encoder.remove_channel(name))
    }

    pub fn channel_names(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.encoder.channel_names().map(str::to_string).collect())
    }

    /// Pulse id the next default send will use.
    pub fn next_pulse_id(&self) -> Result<u64> {
        Ok(self.lock()?.encoder.next_pulse_id())
    }

    /// Send one pulse with explicit values; channels not named are taken
    /// from their sources. Returns the pulse id sent.
    pub fn send<I, K>(&self, values: I) -> Result<u64>
    where
        I: IntoIterator<Item = (K, Option<Data>)>,
        K: Into<String>,
    {
        self.lock()?.emit(values, None, None)
    }

    /// [`Sender::send`] with an explicit pulse id and/or timestamp.
    pub fn send_with<I, K>(
        &self,
        values: I,
        pulse_id: Option<u64>,
        timestamp: Option<Timestamp>,
    ) -> Result<u64>
    where
        I: IntoIterator<Item = (K, Option<Data>)>,
        K: Into<String>,
    {
        self.lock()?.emit(values, pulse_id, timestamp)
    }

    /// Send one pulse built only from channel sources.
    pub fn send_from_sources(&self) -> Result<u64> {
        self.lock()?
            .emit(std::iter::empty::<(String, Option<Data>)>(), None, None)
    }

    /// Send a pulse from the channel sources now and then every `interval`
    /// on a background thread until [`Sender::stop_periodic`].
    pub fn start_periodic(&mut self, interval: Duration) {
        self.stop_periodic();

        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::clone(&self.state);
        let flag = Arc::clone(&running);
        let handle = std::thread::spawn(move || resend_loop(&state, &flag, interval));
        info!(?interval, "periodic send started");
        self.resend = Some(Resend { running, handle });
    }

    /// Stop the periodic send thread and wait for it to finish.
    pub fn stop_periodic(&mut self) {
        if let Some(resend) = self.resend.take() {
            resend.running.store(false, Ordering::SeqCst);
            resend.handle.thread().unpark();
            if resend.handle.join().is_err() {
                warn!("periodic send thread panicked");
            }
            debug!("periodic send stopped");
        }
    }

    pub fn is_periodic(&self) -> bool {
        self.resend.is_some()
    }
}

fn resend_loop(state: &Mutex<SenderState>, running: &AtomicBool, interval: Duration) {
    while running.load(Ordering::SeqCst) {
        let outcome = match state.lock() {
            Ok(mut state) => state.emit(std::iter::empty::<(String, Option<Data>)>(), None, None),
            Err(_) => Err(SessionError::Poisoned),
        };
        match outcome {
            Ok(pulse_id) => debug!(pulse_id, "periodic pulse sent"),
            Err(SessionError::Poisoned) => {
                warn!("sender state poisoned; stopping periodic send");
                return;
            }
            Err(err) => warn!(error = %err, "periodic send failed"),
        }

        let deadline = Instant::now() + interval;
        loop {
            let now = Instant::now();
            if now >= deadline || !running.load(Ordering::SeqCst) {
                break;
            }
            std::thread::park_timeout(deadline - now);
        }
    }
}

impl Drop for Sender {
    fn drop(&mut self) {
        self.stop_periodic();
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("periodic", &self.resend.is_some())
            .finish_non_exhaustive()
    }
}
