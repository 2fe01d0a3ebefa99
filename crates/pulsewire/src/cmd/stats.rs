use std::time::Instant;

use tracing::info;

use crate::cmd::{drain, parse_optional_duration, StatsArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_message, print_stats, OutputFormat};

pub fn run(args: StatsArgs, format: OutputFormat) -> CliResult<i32> {
    let idle_limit = parse_optional_duration(args.timeout.as_deref())?;
    let mut source = args.stream.open()?;

    let started = Instant::now();
    let mut seen = 0u64;
    let drained = drain(&mut source, args.stream.bind, idle_limit, |message| {
        seen += 1;
        if args.every != 0 && seen % args.every == 0 {
            print_message(message, None, format);
        }
        args.count.is_none_or(|count| seen < count)
    })?;
    info!(?drained, received = seen, "stats collection finished");

    print_stats(source.stats(), started.elapsed(), format);
    Ok(SUCCESS)
}
