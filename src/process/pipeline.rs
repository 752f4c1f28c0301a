//! Formatting pipeline
//!
//! Composes the ordered stage list for one file and runs it:
//! 1. Unused import/variable remover (aggressive only)
//! 2. Trailing-comma inserter (aggressive and `--add-trailing-comma`)
//! 3. Style fixer, with the aggressive level forwarded
//! 4. Docstring normalizer
//! 5. Quote unifier
//! 6. Import sorter (`--sort-imports`)
//!
//! The trailing-comma inserter must run before the style fixer, which
//! re-indents the lines it produces, and sorting imports comes last.

use anyhow::Context;
use tracing::debug;

use crate::config::{Config, StyleSettings};
use crate::format::{
    DocstringNormalizer, ImportSorter, QuoteUnifier, Stage, StyleFixer, TrailingCommaInserter,
    UnusedRemover,
};
use crate::interrupt::Interrupt;
use crate::Result;

/// An ordered list of stages
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Pipeline {
    /// Compose the pipeline for `filename`
    ///
    /// Local style settings are resolved here, once, so stages never look
    /// at the filesystem.
    #[must_use]
    pub fn compose(config: &Config, filename: &str) -> Self {
        let settings = StyleSettings::resolve(config, filename);
        let pipeline = Self::with_settings(config, settings);
        debug!("{filename}: stages {:?}", pipeline.stage_names());
        pipeline
    }

    /// Compose the pipeline with already resolved style settings
    #[must_use]
    pub fn with_settings(config: &Config, settings: StyleSettings) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(6);

        if config.aggressive >= 1 {
            stages.push(Box::new(UnusedRemover::new(
                config.remove_all_unused_imports,
                config.remove_unused_variables,
            )));
            if config.add_trailing_comma {
                stages.push(Box::new(TrailingCommaInserter));
            }
        }
        stages.push(Box::new(StyleFixer::new(config.aggressive, settings)));
        stages.push(Box::new(DocstringNormalizer));
        stages.push(Box::new(QuoteUnifier::new(settings.quote_style)));
        if config.sort_imports {
            stages.push(Box::new(ImportSorter));
        }

        Self { stages }
    }

    /// Build a pipeline from explicit stages
    #[must_use]
    pub fn from_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Stage names in execution order
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, feeding each one the previous output
    pub fn run(&self, source: &str) -> Result<String> {
        self.stages
            .iter()
            .try_fold(source.to_string(), |text, stage| apply_stage(stage.as_ref(), &text))
    }

    /// Like [`run`](Self::run), but stop with an
    /// [`Interrupted`](crate::error::Interrupted) error at the next stage
    /// boundary once `interrupt` is raised
    pub fn run_interruptible(&self, source: &str, interrupt: &Interrupt) -> Result<String> {
        self.stages
            .iter()
            .try_fold(source.to_string(), |text, stage| {
                interrupt.check()?;
                apply_stage(stage.as_ref(), &text)
            })
    }
}

fn apply_stage(stage: &dyn Stage, text: &str) -> Result<String> {
    stage
        .apply(text)
        .with_context(|| format!("{} stage failed", stage.name()))
}
