//! Command-line entry points shared by the binary and the tests
//!
//! [`run`] takes the argument vector and explicit sinks and returns the
//! process exit status, so the whole tool can be driven in memory.

use std::ffi::OsString;
use std::io::Write;

use tracing::debug;

use crate::cli::{try_parse_args_from, CliArgs};
use crate::config::Config;
use crate::interrupt::Interrupt;
use crate::process::{format_multiple_files, Streams};

/// Exit status for usage and validation errors
pub const EXIT_USAGE: i32 = 2;

/// Exit status after a user interrupt
pub const EXIT_INTERRUPTED: i32 = 130;

/// Parse `argv`, reporting clap errors, help and version to the sinks
///
/// Returns the exit status to stop with when no run should happen.
pub fn parse<I, T>(argv: I, streams: &mut Streams<'_>) -> Result<CliArgs, i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    try_parse_args_from(argv).map_err(|e| {
        let sink: &mut dyn Write = if e.use_stderr() {
            &mut *streams.stderr
        } else {
            &mut *streams.stdout
        };
        let _ = write!(sink, "{}", e.render());
        e.exit_code()
    })
}

/// Validate the arguments and format every input
pub fn run_with_args(args: &CliArgs, streams: &mut Streams<'_>, interrupt: &Interrupt) -> i32 {
    let config = Config::from_args(args);
    if let Some(message) = config.validate_inputs(&args.files) {
        let _ = writeln!(streams.stderr, "{message}");
        return EXIT_USAGE;
    }
    debug!("{config:?}");

    let result = format_multiple_files(&args.files, &config, interrupt, streams);
    if interrupt.is_raised() {
        return EXIT_INTERRUPTED;
    }
    result.exit_code()
}

/// Parse `argv` and run
pub fn run<I, T>(argv: I, streams: &mut Streams<'_>, interrupt: &Interrupt) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match parse(argv, streams) {
        Ok(args) => run_with_args(&args, streams, interrupt),
        Err(code) => code,
    }
}
