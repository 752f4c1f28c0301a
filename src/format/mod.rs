//! Python source formatting stages.
//!
//! Each stage is a pure text-to-text transformation implementing [`Stage`]:
//! - [`unused`]: Removes unused imports and, optionally, unused variables
//! - [`trailing_comma`]: Adds trailing commas to multi-line brackets
//! - [`style`]: General style fixes, built from [`whitespace`] (per-line
//!   fixes) and [`continuation`] (indentation and blank lines)
//! - [`docstring`]: Normalizes module, class and function docstrings
//! - [`quotes`]: Unifies string literal quotes
//! - [`imports`]: Sorts the top-level import block
//!
//! Stages only rewrite code outside string literals and comments, unless
//! the stage is about strings or comments, and every stage is idempotent.

pub mod continuation;
pub mod docstring;
pub mod imports;
pub mod quotes;
pub mod style;
pub mod trailing_comma;
pub mod unused;
pub mod whitespace;

pub use docstring::DocstringNormalizer;
pub use imports::{is_stdlib_module, ImportSorter};
pub use quotes::QuoteUnifier;
pub use style::StyleFixer;
pub use trailing_comma::TrailingCommaInserter;
pub use unused::UnusedRemover;

use crate::Result;

/// A single formatting transformation
///
/// Stages are stateless apart from their construction-time parameters, so
/// one stage value can be shared across threads.
pub trait Stage: Send + Sync {
    /// Short name used in logs and error context
    fn name(&self) -> &'static str;

    /// Transform `source` into its formatted form
    fn apply(&self, source: &str) -> Result<String>;
}

/// Newline sequence used by `source`, based on its first line
pub(crate) fn newline_of(source: &str) -> &'static str {
    match source.find('\n') {
        Some(n) if n > 0 && source.as_bytes()[n - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_of() {
        assert_eq!(newline_of("a\r\nb\r\n"), "\r\n");
        assert_eq!(newline_of("a\nb\r\n"), "\n");
        assert_eq!(newline_of("a"), "\n");
    }
}
