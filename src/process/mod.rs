//! File processing and batch dispatch.
//!
//! Each input goes through the same steps:
//! 1. [`discovery`]: expand directories and apply exclusion globs
//! 2. [`file`]: read, detect the encoding, decode, run the pipeline, then
//!    write in place, print a diff, or echo standard input
//! 3. [`batch`]: fan the files out over a worker pool and fold the
//!    per-file [`Outcome`]s into a [`BatchResult`]
//!
//! The stages each file runs through are composed by [`pipeline`].

pub mod batch;
pub mod diff;
pub mod discovery;
pub mod file;
pub mod pipeline;

pub use batch::{dispatch, format_multiple_files, BatchResult};
pub use diff::unified_diff;
pub use discovery::find_files;
pub use file::{format_file, process_file, FileUnit, Outcome, Streams};
pub use pipeline::Pipeline;

/// Identifier that stands for standard input
pub const STDIN_IDENTIFIER: &str = "-";

/// Check whether an identifier refers to standard input
#[must_use]
pub fn is_stdin(identifier: &str) -> bool {
    identifier == STDIN_IDENTIFIER
}
