//! General style fixer stage

use crate::config::StyleSettings;
use crate::Result;

use super::continuation::reindent;
use super::whitespace::fix_lines;
use super::Stage;

/// Fixes whitespace, comments, indentation, and blank lines
///
/// With `aggressive >= 1` it also rewrites comparisons; with
/// `aggressive >= 2` it splits `;`-separated statements.
#[derive(Debug, Clone)]
pub struct StyleFixer {
    aggressive: u32,
    settings: StyleSettings,
}

impl StyleFixer {
    #[must_use]
    pub fn new(aggressive: u32, settings: StyleSettings) -> Self {
        Self {
            aggressive,
            settings,
        }
    }
}

impl Stage for StyleFixer {
    fn name(&self) -> &'static str {
        "style"
    }

    fn apply(&self, source: &str) -> Result<String> {
        if source.is_empty() {
            return Ok(String::new());
        }
        let fixed = fix_lines(source, self.aggressive);
        Ok(reindent(&fixed, &self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixer(aggressive: u32) -> StyleFixer {
        StyleFixer::new(aggressive, StyleSettings::default())
    }

    #[test]
    fn test_combined_fixes() {
        let source = "def f(a,b):\n\tif a==None:  \n\t\treturn [a,\n\t\t  b]\n\n\n\n";
        let expected = "def f(a, b):\n    if a is None:\n        return [a,\n                b]\n";
        assert_eq!(fixer(1).apply(source).unwrap(), expected);
    }

    #[test]
    fn test_empty() {
        assert_eq!(fixer(2).apply("").unwrap(), "");
    }

    #[test]
    fn test_split_lines_get_indented() {
        let source = "if x:\n\ta = 1; b = 2\n";
        assert_eq!(fixer(2).apply(source).unwrap(), "if x:\n    a = 1\n    b = 2\n");
    }
}
