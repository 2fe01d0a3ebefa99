use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pulsewire_codec::{Array, ChannelOptions, CompressionId, Data, EncoderConfig, Scalar};
use pulsewire_frame::ConnectionType;
use pulsewire_session::{Sender, SenderConfig, SessionError};
use tracing::{debug, info, warn};

use crate::cmd::{install_ctrlc_handler, parse_duration, GenerateArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_generated, OutputFormat};

const WAVE_SAMPLES: u32 = 30;

pub fn run(args: GenerateArgs, format: OutputFormat) -> CliResult<i32> {
    if !args.mode.can_send() {
        return Err(CliError::new(
            USAGE,
            format!("mode {} cannot send; use push or pub", args.mode),
        ));
    }
    let interval = parse_duration(&args.interval)?;

    let config = SenderConfig::default()
        .with_address(args.address.clone())
        .with_mode(args.mode)
        .with_connection_type(if args.connect {
            ConnectionType::Connect
        } else {
            ConnectionType::Bind
        })
        .with_encoder(
            EncoderConfig::default()
                .with_start_pulse_id(args.start_pulse_id)
                .with_data_header_compression(args.compression),
        );
    let sender = Sender::open(config).map_err(|err| session_error("open failed", err))?;
    add_simulated_channels(&sender, args.compression)
        .map_err(|err| session_error("channel setup failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    let mut sent = 0u64;
    let mut last_pulse_id = None;
    while running.load(Ordering::SeqCst) && args.count.is_none_or(|count| sent < count) {
        match sender.send_from_sources() {
            Ok(pulse_id) => {
                sent += 1;
                last_pulse_id = Some(pulse_id);
                debug!(pulse_id, "pulse sent");
            }
            Err(SessionError::Disconnected(reason)) if !args.connect => {
                warn!(%reason, "receiver left; waiting for the next one");
            }
            Err(SessionError::NoPeer) => {
                debug!("no receiver connected; pulse dropped");
                continue;
            }
            Err(err) => return Err(session_error("send failed", err)),
        }
        std::thread::sleep(interval);
    }

    info!(sent, "generator stopped");
    print_generated(&args.address, sent, last_pulse_id, format);
    Ok(SUCCESS)
}

/// Register the simulated channel set on `sender`.
///
/// Scalars track the pulse id; `WAVE` is a sine slowly drifting with the
/// pulse id; `WWW` and `IMAGE` are constant arrays.
pub fn add_simulated_channels(
    sender: &Sender,
    compression: CompressionId,
) -> Result<(), SessionError> {
    let scalar = ChannelOptions::default();
    let array = ChannelOptions::default().with_compression(compression);

    sender.add_channel_with_source("ABC", scalar, |pulse_id| {
        i32::try_from(pulse_id)
            .ok()
            .map(|value| Data::Scalar(Scalar::Int32(value)))
    })?;
    sender.add_channel_with_source("ABCD", scalar, |pulse_id| {
        Some(Data::from(pulse_id as f64 * 10.0))
    })?;
    sender.add_channel_with_source("ABCDF", scalar, |pulse_id| {
        Some(Data::from(pulse_id as f64 * 100.0))
    })?;
    sender.add_channel_with_source("XYZ", scalar, |pulse_id| {
        Some(Data::from(pulse_id as f64 * 200.0))
    })?;
    sender.add_channel_with_source("XYZW", scalar, |_| Some(Data::from("hello")))?;
    sender.add_channel_with_source("WWW", array, |_| {
        Some(Data::from(vec![1.0f64, 2.0, 3.0, 4.0]))
    })?;
    sender.add_channel_with_source("WAVE", array, |pulse_id| {
        Some(Data::from(waveform(pulse_id)))
    })?;
    sender.add_channel_with_source("IMAGE", array, |_| {
        Array::from_rows(vec![vec![1.0f64, 2.0, 3.0, 4.0]; 2])
            .ok()
            .map(Data::from)
    })?;
    Ok(())
}

fn waveform(pulse_id: u64) -> Vec<f64> {
    let phase = pulse_id as f64 / 100.0;
    (0..WAVE_SAMPLES)
        .map(|index| (PI * f64::from(index) / 200.0 + phase).sin())
        .collect()
}
