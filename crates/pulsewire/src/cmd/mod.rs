use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Subcommand};
use pulsewire_codec::{CompressionId, Message};
use pulsewire_frame::{ConnectionType, Mode, ReceiveTimeout, TransportConfig};
use pulsewire_session::{SessionError, Source, SourceConfig};
use tracing::{debug, info, warn};

use crate::exit::{session_error, CliError, CliResult, INTERNAL, TIMEOUT, USAGE};
use crate::output::OutputFormat;

pub mod generate;
pub mod receive;
pub mod stats;
pub mod version;

/// How often receive loops wake up to check for ctrl-c.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve a simulated pulse stream.
    Generate(GenerateArgs),
    /// Print received pulses.
    Receive(ReceiveArgs),
    /// Receive pulses and report pulse id consistency.
    Stats(StatsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Generate(args) => generate::run(args, format),
        Command::Receive(args) => receive::run(args, format),
        Command::Stats(args) => stats::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Address to serve on (tcp://host:port or ipc:///path).
    #[arg(default_value = "tcp://*:9999")]
    pub address: String,
    /// Socket pattern: push or pub.
    #[arg(long, short = 'm', default_value = "push")]
    pub mode: Mode,
    /// Connect to the address instead of binding it.
    #[arg(long)]
    pub connect: bool,
    /// Time between pulses (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub interval: String,
    /// Stop after N pulses.
    #[arg(long)]
    pub count: Option<u64>,
    /// Pulse id of the first pulse.
    #[arg(long, default_value_t = 0)]
    pub start_pulse_id: u64,
    /// Compression of array channels and the data header (none, bitshuffle_lz4).
    #[arg(long, default_value = "none")]
    pub compression: CompressionId,
}

/// Where and how a receiving command attaches to a stream.
#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Stream address (tcp://host:port or ipc:///path).
    #[arg(default_value = "tcp://localhost:9999")]
    pub address: String,
    /// Socket pattern: pull or sub.
    #[arg(long, short = 'm', default_value = "pull")]
    pub mode: Mode,
    /// Bind the address and wait for a sender instead of connecting.
    #[arg(long)]
    pub bind: bool,
    /// Incoming queue size.
    #[arg(long, short = 'q', default_value_t = 100)]
    pub queue_size: usize,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    #[command(flatten)]
    pub stream: StreamArgs,
    /// Only print these channels (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub channels: Option<Vec<String>>,
    /// Exit after receiving N pulses.
    #[arg(long)]
    pub count: Option<usize>,
    /// Fail if no pulse arrives for this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub stream: StreamArgs,
    /// Stop after N pulses.
    #[arg(long)]
    pub count: Option<u64>,
    /// Stop once no pulse arrived for this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
    /// Also print every Nth pulse (0 prints none).
    #[arg(short = 'n', long, default_value_t = 0)]
    pub every: u64,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

impl StreamArgs {
    pub fn open(&self) -> CliResult<Source> {
        if !self.mode.can_receive() {
            return Err(CliError::new(
                USAGE,
                format!("mode {} cannot receive; use pull or sub", self.mode),
            ));
        }
        let config = SourceConfig::default()
            .with_address(self.address.clone())
            .with_mode(self.mode)
            .with_connection_type(if self.bind {
                ConnectionType::Bind
            } else {
                ConnectionType::Connect
            })
            .with_transport(
                TransportConfig::default()
                    .with_queue_size(self.queue_size)
                    .with_receive_timeout(ReceiveTimeout::After(POLL_INTERVAL)),
            );
        Source::connect(config).map_err(|err| session_error("connect failed", err))
    }
}

/// Why [`drain`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drained {
    /// The handler asked to stop.
    Done,
    /// Ctrl-c.
    Interrupted,
    /// The sender went away.
    Ended,
    /// Nothing arrived within the idle limit.
    Idle,
}

/// Feed received pulses to `handle` until it returns `false`, ctrl-c, the
/// stream ends, or no pulse arrived for `idle_limit`.
///
/// Undecodable pulses are logged and skipped. A bound source outlives its
/// peers and keeps waiting for the next sender.
pub fn drain<F>(
    source: &mut Source,
    bound: bool,
    idle_limit: Option<Duration>,
    mut handle: F,
) -> CliResult<Drained>
where
    F: FnMut(&Message) -> bool,
{
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running))?;

    let mut last_activity = Instant::now();
    while running.load(Ordering::SeqCst) {
        match source.receive() {
            Ok(Some(message)) => {
                last_activity = Instant::now();
                if !handle(&message) {
                    return Ok(Drained::Done);
                }
            }
            Ok(None) => {
                if idle_limit.is_some_and(|limit| last_activity.elapsed() >= limit) {
                    return Ok(Drained::Idle);
                }
            }
            Err(SessionError::Disconnected(reason)) if bound => {
                debug!(%reason, "sender left; waiting for the next one");
            }
            Err(SessionError::Disconnected(reason)) => {
                info!(%reason, "stream ended");
                return Ok(Drained::Ended);
            }
            Err(SessionError::Decode(err)) => {
                warn!(error = %err, "skipping undecodable pulse");
            }
            Err(err) => return Err(session_error("receive failed", err)),
        }
    }
    Ok(Drained::Interrupted)
}

pub fn idle_timeout_error(limit: Duration) -> CliError {
    CliError::new(TIMEOUT, format!("no pulse received within {limit:?}"))
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(number) => (number, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

pub fn parse_optional_duration(input: Option<&str>) -> CliResult<Option<Duration>> {
    input.map(parse_duration).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_optional_duration(None).unwrap(), None);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration(" ").unwrap_err().code, USAGE);
    }

    #[test]
    fn sending_modes_cannot_receive() {
        let args = StreamArgs {
            address: "ipc:///tmp/never-bound.sock".into(),
            mode: Mode::Push,
            bind: false,
            queue_size: 100,
        };
        assert_eq!(args.open().unwrap_err().code, USAGE);
    }
}
