//! User interrupt tracking.
//!
//! A Ctrl-C handler raises a shared flag. While no in-place write is in
//! progress, or on a second Ctrl-C, the handler ends the process at once with
//! [`EXIT_INTERRUPTED`]; otherwise the pipeline sees the flag between stages
//! and the dispatcher before starting each file.

use std::process;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::app::EXIT_INTERRUPTED;
use crate::error::{Interrupted, Result};

/// Cloneable handle to the process-wide interrupt flag
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    raised: Arc<AtomicBool>,
    writing: Arc<AtomicUsize>,
}

/// Marks an in-place write in progress until dropped
#[derive(Debug)]
pub struct WriteGuard {
    writing: Arc<AtomicUsize>,
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.writing.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Interrupt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a Ctrl-C handler for this flag
    ///
    /// Can only be called once per process.
    pub fn install_handler(&self) -> Result<()> {
        let handle = self.clone();
        ctrlc::set_handler(move || {
            if handle.signal() {
                process::exit(EXIT_INTERRUPTED);
            }
        })?;
        Ok(())
    }

    /// Record a user interrupt
    ///
    /// Returns `true` when the process should stop immediately: the flag was
    /// already raised, or no write is in progress.
    pub fn signal(&self) -> bool {
        let again = self.raised.swap(true, Ordering::SeqCst);
        again || self.writing.load(Ordering::SeqCst) == 0
    }

    /// Start an in-place write, failing with [`Interrupted`] once the flag is up
    ///
    /// The write counter is raised before the flag is read, and
    /// [`signal`](Self::signal) raises the flag before reading the counter, so
    /// a write that starts is always seen by the handler.
    pub fn begin_write(&self) -> Result<WriteGuard> {
        self.writing.fetch_add(1, Ordering::SeqCst);
        let guard = WriteGuard {
            writing: Arc::clone(&self.writing),
        };
        self.check()?;
        Ok(guard)
    }

    /// Raise the flag
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Fail with [`Interrupted`] if the flag has been raised
    pub fn check(&self) -> Result<()> {
        if self.is_raised() {
            return Err(Interrupted.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_interrupted;

    #[test]
    fn test_new_flag_is_clear() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.is_raised());
        assert!(interrupt.check().is_ok());
    }

    #[test]
    fn test_raise_is_shared_between_clones() {
        let interrupt = Interrupt::new();
        let clone = interrupt.clone();
        clone.raise();
        assert!(interrupt.is_raised());
        let err = interrupt.check().unwrap_err();
        assert!(is_interrupted(&err));
    }

    #[test]
    fn test_signal_while_idle_stops_at_once() {
        let interrupt = Interrupt::new();
        assert!(interrupt.signal());
        assert!(interrupt.is_raised());
    }

    #[test]
    fn test_signal_during_write_defers_until_second() {
        let interrupt = Interrupt::new();
        let guard = interrupt.begin_write().unwrap();
        assert!(!interrupt.signal());
        assert!(interrupt.is_raised());
        assert!(interrupt.signal());
        drop(guard);
    }

    #[test]
    fn test_write_guard_released_on_drop() {
        let interrupt = Interrupt::new();
        drop(interrupt.begin_write().unwrap());
        assert!(interrupt.signal());
    }

    #[test]
    fn test_no_write_starts_after_interrupt() {
        let interrupt = Interrupt::new();
        interrupt.raise();
        let err = interrupt.begin_write().unwrap_err();
        assert!(is_interrupted(&err));
        assert_eq!(interrupt.writing.load(Ordering::SeqCst), 0);
    }
}
