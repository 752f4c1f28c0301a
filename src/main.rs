//! pyformat - Formats Python code to follow a consistent style

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io;
use std::process::ExitCode;

use pyformat::app;
use pyformat::interrupt::Interrupt;
use pyformat::process::Streams;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "PYFORMAT_LOG";

fn main() -> ExitCode {
    let mut stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let mut streams = Streams {
        stdin: &mut stdin,
        stdout: &mut stdout,
        stderr: &mut stderr,
    };

    let args = match app::parse(std::env::args_os(), &mut streams) {
        Ok(args) => args,
        Err(code) => return exit_code(code),
    };
    init_logging(args.debug);

    let interrupt = Interrupt::new();
    if let Err(e) = interrupt.install_handler() {
        warn!("Failed to install interrupt handler: {e}");
    }

    exit_code(app::run_with_args(&args, &mut streams, &interrupt))
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
