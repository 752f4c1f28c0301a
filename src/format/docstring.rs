//! Docstring normalization
//!
//! Applies to triple-quoted strings that are the first statement of a
//! module, class, or function:
//! - Whitespace after the opening and before the closing quotes stripped
//! - A period appended to a one-line summary without end punctuation
//! - Trailing whitespace removed from every line
//! - Multi-line docstrings close on their own line, at the docstring's
//!   indentation, with no blank lines before the closing quotes

use crate::parser::patterns::{CLASS_RE, DEF_RE};
use crate::parser::stream::line_index;
use crate::parser::{analyze_lines, CharFilter, SourceLine, StringLiteral};
use crate::Result;

use super::continuation::indent_width;
use super::whitespace::fix_inline_comment;
use super::{newline_of, Stage};

/// Normalizes module, class, and function docstrings
#[derive(Debug, Clone, Copy, Default)]
pub struct DocstringNormalizer;

impl Stage for DocstringNormalizer {
    fn name(&self) -> &'static str {
        "docstring"
    }

    fn apply(&self, source: &str) -> Result<String> {
        let filter = CharFilter::new(source);
        let lines = analyze_lines(&filter);
        let newline = newline_of(source);

        let mut result = String::with_capacity(source.len());
        let mut cursor = 0;
        for literal in filter.strings() {
            let Some(idx) = docstring_line(source, &lines, literal) else {
                continue;
            };
            let indent = lines[idx].indent(source);
            let body = literal.body(source);
            let normalized = normalize_body(body, indent, literal.quote, newline);
            let line_end = lines[line_index(&lines, literal.end - 1)].end;
            let tail = &source[literal.end..line_end];
            let fixed_tail = closing_tail(tail);
            if normalized.as_deref().map_or(true, |n| n == body) && fixed_tail == tail {
                continue;
            }

            result.push_str(&source[cursor..literal.body_start]);
            result.push_str(normalized.as_deref().unwrap_or(body));
            result.push_str(&source[literal.body_end..literal.end]);
            result.push_str(&fixed_tail);
            cursor = line_end;
        }
        result.push_str(&source[cursor..]);
        Ok(result)
    }
}

/// Normalize what follows the closing quotes on their line
///
/// A collapsed docstring's closing line no longer starts inside a string,
/// so it must already look the way the style fixer would leave it.
fn closing_tail(tail: &str) -> String {
    let tail = tail.trim_end_matches([' ', '\t', '\x0c']);
    let comment = tail.trim_start_matches([' ', '\t', '\x0c']);
    if comment.is_empty() {
        String::new()
    } else {
        format!("  {}", fix_inline_comment(comment))
    }
}

/// Index of the line a docstring starts on, if `literal` is one
fn docstring_line(source: &str, lines: &[SourceLine], literal: &StringLiteral) -> Option<usize> {
    if !literal.triple
        || !literal.terminated
        || literal.is_bytes(source)
        || literal.is_format(source)
    {
        return None;
    }

    let idx = line_index(lines, literal.start);
    let line = &lines[idx];
    if !line.starts_statement() || line.first_code != Some(literal.start) {
        return None;
    }
    // The literal must be the whole statement
    let end_line = &lines[line_index(lines, literal.end - 1)];
    if end_line.last_code.is_some_and(|pos| pos >= literal.end) {
        return None;
    }

    let Some(prev) = (0..idx)
        .rev()
        .find(|&j| lines[j].first_code.is_some() || lines[j].starts_in_string)
    else {
        // Module docstring: nothing but comments and blank lines before it
        return Some(idx);
    };

    let header_end = &lines[prev];
    if header_end.starts_in_string
        || !header_end
            .last_code
            .is_some_and(|pos| source.as_bytes()[pos] == b':')
    {
        return None;
    }
    let header = (0..=prev).rev().find(|&k| lines[k].starts_statement())?;
    let header_text = lines[header].text(source);
    if !(DEF_RE.is_match(header_text) || CLASS_RE.is_match(header_text)) {
        return None;
    }
    let deeper = indent_width(line.indent(source), 1)
        > indent_width(lines[header].indent(source), 1);
    deeper.then_some(idx)
}

/// Normalize a docstring body
///
/// Returns `None` when the body should be left alone: it is blank, or
/// stripping it would put a quote or backslash against the closing quotes.
fn normalize_body(body: &str, indent: &str, quote: char, newline: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lines: Vec<&str> = trimmed.split('\n').map(str::trim_end).collect();

    if let [summary] = lines.as_slice() {
        if summary.ends_with(quote) || summary.ends_with('\\') {
            return None;
        }
        return Some(with_period(summary));
    }

    let mut result = String::with_capacity(body.len());
    if lines[1].is_empty() {
        result.push_str(&with_period(lines[0]));
    } else {
        result.push_str(lines[0]);
    }
    for line in &lines[1..] {
        result.push_str(newline);
        result.push_str(line);
    }
    result.push_str(newline);
    result.push_str(indent);
    Some(result)
}

fn with_period(summary: &str) -> String {
    if summary.chars().last().is_some_and(char::is_alphanumeric) {
        format!("{summary}.")
    } else {
        summary.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        DocstringNormalizer.apply(source).unwrap()
    }

    #[test]
    fn test_function_one_line() {
        assert_eq!(
            run("def f():\n    \"\"\"  Return x  \"\"\"\n    return 1\n"),
            "def f():\n    \"\"\"Return x.\"\"\"\n    return 1\n"
        );
    }

    #[test]
    fn test_module_docstring_collapses() {
        assert_eq!(
            run("#!/usr/bin/env python\n\"\"\"\nModule doc\n\"\"\"\nimport os\n"),
            "#!/usr/bin/env python\n\"\"\"Module doc.\"\"\"\nimport os\n"
        );
    }

    #[test]
    fn test_class_multi_line() {
        let source = "class A:\n    \"\"\"Summary\n\n    Details here.   \n\n    \"\"\"\n";
        let expected = "class A:\n    \"\"\"Summary.\n\n    Details here.\n    \"\"\"\n";
        assert_eq!(run(source), expected);
    }

    #[test]
    fn test_closing_quotes_moved_to_own_line() {
        let source = "def f():\n    '''Summary.\n\n    More.'''\n";
        let expected = "def f():\n    '''Summary.\n\n    More.\n    '''\n";
        assert_eq!(run(source), expected);
    }

    #[test]
    fn test_wrapped_summary_gets_no_period() {
        let source = "def f():\n    \"\"\"Line one\n    line two\n    \"\"\"\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_not_docstrings() {
        for source in [
            "x = 1\n\"\"\"not doc \"\"\"\n",
            "def f():\n    x = \"\"\" a \"\"\"\n",
            "def f():\n    pass\n    \"\"\" late \"\"\"\n",
            "def f():\n    \"\"\" a \"\"\".strip()\n",
        ] {
            assert_eq!(run(source), source);
        }
    }

    #[test]
    fn test_quote_against_closing_kept() {
        let source = "def f():\n    ''' say 'x' '''\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_punctuation_kept() {
        let source = "def f():\n    \"\"\"Really?\"\"\"\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_collapsed_closing_line_tail() {
        assert_eq!(
            run("def f():\n    \"\"\"Doc\n    \"\"\"#c\n"),
            "def f():\n    \"\"\"Doc.\"\"\"  # c\n"
        );
        assert_eq!(
            run("\"\"\"\ndef f(a,b):\"\"\"    \n"),
            "\"\"\"def f(a,b):\"\"\"\n"
        );
    }

    #[test]
    fn test_closing_line_tail_of_kept_docstring() {
        let source = "def f():\n    \"\"\"Doc.\"\"\"   # note  \n";
        assert_eq!(run(source), "def f():\n    \"\"\"Doc.\"\"\"  # note\n");
    }

    #[test]
    fn test_idempotent() {
        let once = run("class A:\n    \"\"\"  Doc\n\n      indented   \n    \"\"\"\n");
        assert_eq!(run(&once), once);
    }
}
