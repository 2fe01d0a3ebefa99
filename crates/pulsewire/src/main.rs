mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "pulsewire", version, about = "Pulse stream generator and monitor")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    match cmd::run(cli.command, format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use pulsewire_codec::CompressionId;
    use pulsewire_frame::Mode;

    use super::*;

    #[test]
    fn parses_generate_defaults() {
        let cli = Cli::try_parse_from(["pulsewire", "generate"]).expect("generate should parse");
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.address, "tcp://*:9999");
        assert_eq!(args.mode, Mode::Push);
        assert_eq!(args.compression, CompressionId::None);
        assert!(!args.connect);
    }

    #[test]
    fn parses_receive_options() {
        let cli = Cli::try_parse_from([
            "pulsewire",
            "--format",
            "json",
            "receive",
            "ipc:///tmp/pulse.sock",
            "--mode",
            "sub",
            "--bind",
            "--channels",
            "ABC,WAVE",
            "--count",
            "3",
        ])
        .expect("receive args should parse");

        let Command::Receive(args) = cli.command else {
            panic!("expected receive");
        };
        assert_eq!(args.stream.mode, Mode::Sub);
        assert!(args.stream.bind);
        assert_eq!(
            args.channels,
            Some(vec!["ABC".to_string(), "WAVE".to_string()])
        );
        assert_eq!(args.count, Some(3));
    }

    #[test]
    fn rejects_unknown_mode_and_compression() {
        let err = Cli::try_parse_from(["pulsewire", "stats", "--mode", "dealer"])
            .expect_err("unknown mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let err = Cli::try_parse_from(["pulsewire", "generate", "--compression", "zstd"])
            .expect_err("unknown compression should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_stats_sampling() {
        let cli = Cli::try_parse_from(["pulsewire", "stats", "-n", "10", "--timeout", "2s"])
            .expect("stats args should parse");
        assert!(matches!(cli.command, Command::Stats(ref args) if args.every == 10));
    }
}
