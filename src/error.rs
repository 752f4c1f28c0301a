//! Error types and result aliases for pyformat.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used throughout the crate
//! - [`Interrupted`]: Marker error raised when the user interrupts a run

use std::fmt;
use std::io;

use anyhow::Result as AnyhowResult;

pub type Result<T> = AnyhowResult<T>;

/// Raised when processing stops because of a user interrupt.
///
/// Travels through `anyhow` like any other error; callers recognize it with
/// [`is_interrupted`] and do not count it as a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("interrupted")
    }
}

impl std::error::Error for Interrupted {}

/// Check whether an error (or anything in its context chain) is an interrupt
#[must_use]
pub fn is_interrupted(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| cause.is::<Interrupted>())
}

/// Check whether an error was caused by writing to a closed pipe
#[must_use]
pub fn is_broken_pipe(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_interrupted_detected_directly() {
        let err = anyhow::Error::new(Interrupted);
        assert!(is_interrupted(&err));
    }

    #[test]
    fn test_interrupted_detected_through_context() {
        let result: Result<()> = Err(anyhow::Error::new(Interrupted));
        let err = result.context("while running stage").unwrap_err();
        assert!(is_interrupted(&err));
    }

    #[test]
    fn test_other_errors_not_interrupted() {
        let err = anyhow::anyhow!("disk full");
        assert!(!is_interrupted(&err));
    }

    #[test]
    fn test_broken_pipe_detected_through_context() {
        let result: Result<()> = Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        let err = result.context("writing diff").unwrap_err();
        assert!(is_broken_pipe(&err));

        let err = anyhow::Error::new(io::Error::from(io::ErrorKind::NotFound));
        assert!(!is_broken_pipe(&err));
    }
}
