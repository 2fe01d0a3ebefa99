use crate::cmd::{drain, idle_timeout_error, parse_optional_duration, Drained, ReceiveArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: ReceiveArgs, format: OutputFormat) -> CliResult<i32> {
    let idle_limit = parse_optional_duration(args.timeout.as_deref())?;
    let mut source = args.stream.open()?;

    let mut printed = 0usize;
    let drained = drain(&mut source, args.stream.bind, idle_limit, |message| {
        print_message(message, args.channels.as_deref(), format);
        printed = printed.saturating_add(1);
        args.count.is_none_or(|count| printed < count)
    })?;

    match (drained, idle_limit) {
        (Drained::Idle, Some(limit)) => Err(idle_timeout_error(limit)),
        _ => Ok(SUCCESS),
    }
}
