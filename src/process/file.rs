//! Per-file processing
//!
//! [`format_file`] reads one input, runs the pipeline and performs the output
//! action. [`process_file`] wraps it for the dispatcher: every error becomes
//! a diagnostic line and an [`Outcome`], so one bad file never stops a batch.
//! A closed output pipe is not a failure: the file is dropped quietly.

use std::fs;
use std::io::{Read, Write};

use tracing::debug;

use crate::config::Config;
use crate::encoding::{detect_encoding, TextEncoding};
use crate::error::{is_broken_pipe, is_interrupted};
use crate::interrupt::Interrupt;
use crate::Result;

use super::diff::unified_diff;
use super::pipeline::Pipeline;
use super::is_stdin;

/// The working set for one input
#[derive(Debug, Clone)]
pub struct FileUnit {
    pub identifier: String,
    pub raw_bytes: Vec<u8>,
    pub encoding: TextEncoding,
    pub text: String,
}

impl FileUnit {
    /// Read and decode an input; `-` reads from `stdin`
    pub fn read(identifier: &str, stdin: &mut dyn Read) -> Result<Self> {
        let raw_bytes = if is_stdin(identifier) {
            let mut buf = Vec::new();
            stdin.read_to_end(&mut buf)?;
            buf
        } else {
            fs::read(identifier)?
        };
        let encoding = detect_encoding(&raw_bytes, None);
        debug!("{identifier}: encoding {}", encoding.name());
        let text = encoding.decode(&raw_bytes)?;

        Ok(Self {
            identifier: identifier.to_string(),
            raw_bytes,
            encoding,
            text,
        })
    }
}

/// Result of processing one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub changed: bool,
    pub errored: bool,
}

impl Outcome {
    const ERRORED: Self = Self {
        changed: false,
        errored: true,
    };
}

/// The sinks a sequential run reads from and writes to
pub struct Streams<'a> {
    pub stdin: &'a mut dyn Read,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Format one input and perform its output action
///
/// Returns whether the file counts as changed:
/// - in-place standard input always writes the result to `stdout`
/// - otherwise an unchanged file has no side effect
/// - a changed file is overwritten (in place) or printed as a diff
pub fn format_file(
    identifier: &str,
    config: &Config,
    interrupt: &Interrupt,
    stdin: &mut dyn Read,
    stdout: &mut dyn Write,
) -> Result<bool> {
    let unit = FileUnit::read(identifier, stdin)?;
    if unit.text.is_empty() {
        return Ok(false);
    }

    let pipeline = Pipeline::compose(config, identifier);
    let formatted = pipeline.run_interruptible(&unit.text, interrupt)?;

    if config.in_place && is_stdin(identifier) {
        stdout.write_all(formatted.as_bytes())?;
        stdout.flush()?;
        return Ok(true);
    }

    if formatted == unit.text {
        return Ok(false);
    }

    if config.in_place {
        let bytes = unit.encoding.encode(&formatted)?;
        let _writing = interrupt.begin_write()?;
        fs::write(identifier, bytes)?;
    } else {
        let diff = unified_diff(&unit.text, &formatted, identifier);
        stdout.write_all(diff.as_bytes())?;
        stdout.flush()?;
    }
    Ok(true)
}

/// Format one input, reporting failures to `streams.stderr`
///
/// An interrupted file is neither changed nor errored.
pub fn process_file(
    identifier: &str,
    config: &Config,
    interrupt: &Interrupt,
    streams: &mut Streams<'_>,
) -> Outcome {
    // Diagnostics are best effort: a broken error sink must not fail the file
    if config.verbose {
        let _ = write!(streams.stderr, "{identifier}: ");
    }

    match format_file(identifier, config, interrupt, streams.stdin, streams.stdout) {
        Ok(changed) => {
            if config.verbose {
                let status = if changed { "changed" } else { "unchanged" };
                let _ = writeln!(streams.stderr, "{status}");
            }
            Outcome {
                changed,
                errored: false,
            }
        }
        Err(e) if is_interrupted(&e) => {
            if config.verbose {
                let _ = writeln!(streams.stderr, "interrupted");
            }
            Outcome::default()
        }
        Err(e) if is_broken_pipe(&e) => {
            debug!("{identifier}: output closed");
            if config.verbose {
                let _ = writeln!(streams.stderr, "output closed");
            }
            Outcome::default()
        }
        Err(e) => {
            if config.verbose {
                let _ = writeln!(streams.stderr, "{e:#}");
            } else {
                let _ = writeln!(streams.stderr, "{identifier}: {e:#}");
            }
            Outcome::ERRORED
        }
    }
}
