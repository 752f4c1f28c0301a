//! Batch dispatch and result aggregation

use std::collections::HashSet;
use std::io;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::config::Config;
use crate::interrupt::Interrupt;

use super::discovery::find_files;
use super::file::{process_file, Outcome, Streams};

/// OR-reduction of every file's [`Outcome`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub any_changed: bool,
    pub any_errored: bool,
}

impl BatchResult {
    #[must_use]
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        outcomes.iter().fold(Self::default(), |acc, outcome| Self {
            any_changed: acc.any_changed || outcome.changed,
            any_errored: acc.any_errored || outcome.errored,
        })
    }

    /// Process exit status: 1 when any file failed, changes are not a failure
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.any_errored)
    }
}

/// Process every input and collect one [`Outcome`] per file started
///
/// With more than one job the files are spread over a dedicated pool and
/// workers write to the process-wide standard streams; otherwise they run in
/// order against `streams`. Files not yet started when the interrupt is
/// raised are skipped.
pub fn dispatch(
    inputs: &[String],
    config: &Config,
    interrupt: &Interrupt,
    streams: &mut Streams<'_>,
) -> Vec<Outcome> {
    let mut seen = HashSet::new();
    let unique: Vec<String> = inputs
        .iter()
        .filter(|input| seen.insert(*input))
        .cloned()
        .collect();
    let files = find_files(&unique, config.recursive, &config.exclude_patterns);
    debug!("Formatting {} files with {} jobs", files.len(), config.jobs);

    if config.jobs > 1 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build()
        {
            Ok(pool) => return pool.install(|| process_parallel(&files, config, interrupt)),
            Err(e) => warn!("Failed to build thread pool, formatting sequentially: {e}"),
        }
    }
    process_sequential(&files, config, interrupt, streams)
}

fn process_sequential(
    files: &[String],
    config: &Config,
    interrupt: &Interrupt,
    streams: &mut Streams<'_>,
) -> Vec<Outcome> {
    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        if interrupt.is_raised() {
            break;
        }
        outcomes.push(process_file(file, config, interrupt, streams));
    }
    outcomes
}

fn process_parallel(files: &[String], config: &Config, interrupt: &Interrupt) -> Vec<Outcome> {
    files
        .par_iter()
        .filter_map(|file| {
            if interrupt.is_raised() {
                return None;
            }
            let mut stdin = io::stdin();
            let mut stdout = io::stdout();
            let mut stderr = io::stderr();
            let mut streams = Streams {
                stdin: &mut stdin,
                stdout: &mut stdout,
                stderr: &mut stderr,
            };
            Some(process_file(file, config, interrupt, &mut streams))
        })
        .collect()
}

/// Format every input and fold the outcomes
pub fn format_multiple_files(
    inputs: &[String],
    config: &Config,
    interrupt: &Interrupt,
    streams: &mut Streams<'_>,
) -> BatchResult {
    BatchResult::from_outcomes(&dispatch(inputs, config, interrupt, streams))
}
