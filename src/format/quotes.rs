//! String quote unification

use crate::config::QuoteStyle;
use crate::parser::{CharFilter, StringLiteral};
use crate::Result;

use super::Stage;

/// Switches single-line string literals to the preferred quote character
///
/// A literal is left alone when switching would need escaping: its body
/// already contains the preferred quote, or an escaped quote of either
/// kind. Triple-quoted and byte strings are never touched.
#[derive(Debug, Clone, Copy)]
pub struct QuoteUnifier {
    preferred: char,
}

impl QuoteUnifier {
    #[must_use]
    pub fn new(style: QuoteStyle) -> Self {
        Self {
            preferred: style.char(),
        }
    }

    fn should_switch(&self, source: &str, literal: &StringLiteral) -> bool {
        if literal.triple || !literal.terminated || literal.quote == self.preferred {
            return false;
        }
        if literal.is_bytes(source) {
            return false;
        }
        let body = literal.body(source);
        !body.contains(self.preferred) && !body.contains("\\'") && !body.contains("\\\"")
    }
}

impl Stage for QuoteUnifier {
    fn name(&self) -> &'static str {
        "quotes"
    }

    fn apply(&self, source: &str) -> Result<String> {
        let filter = CharFilter::new(source);
        let mut result = String::with_capacity(source.len());
        let mut cursor = 0;

        for literal in filter.strings() {
            if !self.should_switch(source, literal) {
                continue;
            }
            result.push_str(&source[cursor..literal.quote_start]);
            result.push(self.preferred);
            result.push_str(literal.body(source));
            result.push(self.preferred);
            cursor = literal.end;
        }
        result.push_str(&source[cursor..]);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> String {
        QuoteUnifier::new(QuoteStyle::Single).apply(source).unwrap()
    }

    #[test]
    fn test_switch_to_single() {
        assert_eq!(single("x = \"abc\"\n"), "x = 'abc'\n");
        assert_eq!(single("x = f\"{a}\" + r\"\\d\"\n"), "x = f'{a}' + r'\\d'\n");
        assert_eq!(single("x = \"\"\n"), "x = ''\n");
    }

    #[test]
    fn test_switch_to_double() {
        let unifier = QuoteUnifier::new(QuoteStyle::Double);
        assert_eq!(unifier.apply("x = 'abc'\n").unwrap(), "x = \"abc\"\n");
    }

    #[test]
    fn test_kept_when_escaping_needed() {
        for source in [
            "x = \"it's\"\n",
            "x = \"say \\\"hi\\\"\"\n",
            "x = \"a\\'b\"\n",
            "x = f\"{d['k']}\"\n",
        ] {
            assert_eq!(single(source), source);
        }
    }

    #[test]
    fn test_triple_and_bytes_untouched() {
        for source in ["x = \"\"\"doc\"\"\"\n", "x = b\"raw\"\n"] {
            assert_eq!(single(source), source);
        }
    }

    #[test]
    fn test_comments_untouched() {
        let source = "# say \"hi\"\nx = 1\n";
        assert_eq!(single(source), source);
    }
}
