//! Trailing comma insertion for multi-line brackets
//!
//! When a closing bracket starts its own line, the last element before it
//! gets a trailing comma. Whether a bracket qualifies depends on what it
//! is:
//! - `(` after a name, `)` or `]` (a call or definition): always
//! - `(` anywhere else: only if it is already a tuple (top-level comma)
//! - `[` after a name, `)` or `]` (a subscript): only with a top-level comma
//! - `[` anywhere else (a list) and `{`: always
//!
//! Comprehensions and empty brackets never qualify.

use crate::parser::char_filter::is_word_byte;
use crate::parser::patterns::KEYWORDS;
use crate::parser::stream::word_before;
use crate::parser::{analyze_lines, CharFilter, OpenBracket};
use crate::Result;

use super::Stage;

/// Adds trailing commas to brackets whose closer is on its own line
#[derive(Debug, Clone, Copy, Default)]
pub struct TrailingCommaInserter;

impl Stage for TrailingCommaInserter {
    fn name(&self) -> &'static str {
        "trailing-comma"
    }

    fn apply(&self, source: &str) -> Result<String> {
        let filter = CharFilter::new(source);
        let masked = filter.masked();
        let bytes = source.as_bytes();

        let mut inserts: Vec<usize> = Vec::new();
        for line in analyze_lines(&filter) {
            if line.starts_in_string {
                continue;
            }
            let (Some(bracket), Some(first)) = (line.brackets.last(), line.first_code) else {
                continue;
            };
            if !filter.is_code(first) || !matches!(bytes[first], b')' | b']' | b'}') {
                continue;
            }
            if let Some(pos) = insertion_point(source, &filter, &masked, bracket, first) {
                inserts.push(pos);
            }
        }

        if inserts.is_empty() {
            return Ok(source.to_string());
        }
        inserts.sort_unstable();

        let mut result = String::with_capacity(source.len() + inserts.len());
        let mut cursor = 0;
        for pos in inserts {
            result.push_str(&source[cursor..pos]);
            result.push(',');
            cursor = pos;
        }
        result.push_str(&source[cursor..]);
        Ok(result)
    }
}

/// What precedes an opening bracket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    /// A name, `)` or `]`: a call, definition, or subscript
    Applied,
    /// Anything else: a parenthesized expression, tuple, list, or display
    Bare,
}

/// Summary of the top level of a bracket's contents
#[derive(Debug, Default)]
struct Contents {
    has_comma: bool,
    comprehension: bool,
    /// Offset where the last top-level element starts
    last_element: usize,
}

fn insertion_point(
    source: &str,
    filter: &CharFilter<'_>,
    masked: &str,
    bracket: &OpenBracket,
    closer: usize,
) -> Option<usize> {
    let last = last_significant(source, filter, bracket.pos, closer)?;
    if filter.is_code(last) {
        let b = source.as_bytes()[last];
        if !(is_word_byte(b) || matches!(b, b')' | b']' | b'}' | b'.')) {
            return None;
        }
    } else if !filter.string_at(last).is_some_and(|s| s.terminated) {
        return None;
    }

    let contents = scan_contents(masked, bracket.pos + 1, closer);
    if contents.comprehension {
        return None;
    }
    let opener = classify_opener(source, filter, bracket.pos);
    let qualifies = match bracket.ch {
        b'(' => {
            let starred = masked[contents.last_element..=last]
                .trim_start()
                .starts_with('*');
            !starred && (opener == Opener::Applied || contents.has_comma)
        }
        b'[' => opener == Opener::Bare || contents.has_comma,
        _ => true,
    };
    qualifies.then_some(last + 1)
}

/// Last code or string byte between `open` and `close`, skipping
/// whitespace and comments
fn last_significant(
    source: &str,
    filter: &CharFilter<'_>,
    open: usize,
    close: usize,
) -> Option<usize> {
    let bytes = source.as_bytes();
    (open + 1..close).rev().find(|&pos| {
        if filter.is_code(pos) {
            !bytes[pos].is_ascii_whitespace()
        } else {
            !filter.in_comment(pos)
        }
    })
}

fn scan_contents(masked: &str, start: usize, end: usize) -> Contents {
    let bytes = masked.as_bytes();
    let mut contents = Contents {
        last_element: start,
        ..Default::default()
    };
    let mut depth = 0usize;

    for pos in start..end {
        match bytes[pos] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                contents.has_comma = true;
                contents.last_element = pos + 1;
            }
            b'f' if depth == 0 && is_keyword_at(bytes, pos, b"for") => {
                contents.comprehension = true;
            }
            _ => {}
        }
    }
    contents
}

fn is_keyword_at(bytes: &[u8], pos: usize, keyword: &[u8]) -> bool {
    bytes[pos..].starts_with(keyword)
        && (pos == 0 || !is_word_byte(bytes[pos - 1]))
        && bytes
            .get(pos + keyword.len())
            .map_or(true, |&b| !is_word_byte(b))
}

fn classify_opener(source: &str, filter: &CharFilter<'_>, open: usize) -> Opener {
    let bytes = source.as_bytes();
    let mut pos = open;
    while pos > 0 && matches!(bytes[pos - 1], b' ' | b'\t' | b'\x0c') {
        pos -= 1;
    }
    if pos == 0 {
        return Opener::Bare;
    }

    let prev = pos - 1;
    if !filter.is_code(prev) {
        return if filter.string_at(prev).is_some() {
            Opener::Applied
        } else {
            Opener::Bare
        };
    }
    match bytes[prev] {
        b')' | b']' => Opener::Applied,
        b if is_word_byte(b) => match word_before(source, pos) {
            Some(word) if KEYWORDS.contains(&word) => Opener::Bare,
            _ => Opener::Applied,
        },
        _ => Opener::Bare,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        TrailingCommaInserter.apply(source).unwrap()
    }

    #[test]
    fn test_call() {
        assert_eq!(
            run("foo(\n    a,\n    b\n)\n"),
            "foo(\n    a,\n    b,\n)\n"
        );
    }

    #[test]
    fn test_list_and_dict() {
        assert_eq!(run("x = [\n    1\n]\n"), "x = [\n    1,\n]\n");
        assert_eq!(run("d = {\n    'a': 1\n}\n"), "d = {\n    'a': 1,\n}\n");
    }

    #[test]
    fn test_parenthesized_expression_untouched() {
        let source = "x = (\n    1\n)\n";
        assert_eq!(run(source), source);
        assert_eq!(run("x = (\n    1, 2\n)\n"), "x = (\n    1, 2,\n)\n");
    }

    #[test]
    fn test_subscript_needs_comma() {
        let source = "y = x[\n    0\n]\n";
        assert_eq!(run(source), source);
        assert_eq!(
            run("t = Dict[\n    str, int\n]\n"),
            "t = Dict[\n    str, int,\n]\n"
        );
    }

    #[test]
    fn test_keyword_paren() {
        let source = "if (\n    a\n):\n    pass\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_comprehension_untouched() {
        let source = "f(\n    a for a in b\n)\n";
        assert_eq!(run(source), source);
        let source = "x = [\n    a for a in b\n]\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_comment_and_string() {
        assert_eq!(
            run("f(\n    a  # note\n)\n"),
            "f(\n    a,  # note\n)\n"
        );
        assert_eq!(run("f(\n    'x'\n)\n"), "f(\n    'x',\n)\n");
    }

    #[test]
    fn test_single_line_and_empty_untouched() {
        for source in ["f(a, b)\n", "f(\n)\n", "def f(\n    *args\n):\n    pass\n"] {
            assert_eq!(run(source), source);
        }
    }

    #[test]
    fn test_nested() {
        assert_eq!(
            run("f(\n    g(\n        1\n    )\n)\n"),
            "f(\n    g(\n        1,\n    ),\n)\n"
        );
    }

    #[test]
    fn test_idempotent() {
        let once = run("f(\n    [\n        1\n    ]\n)\n");
        assert_eq!(run(&once), once);
    }
}
