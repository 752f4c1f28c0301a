//! Indentation and blank-line normalization
//!
//! Implements the layout half of the style fixer:
//! - Statement indentation: tabs expanded to `indent_size` spaces
//! - Hanging indents: opener line indent plus `indent_size`
//! - Visual indents: aligned one column past the opening bracket
//! - Closing brackets that start a line: aligned with the opener line
//! - Blank-line runs capped, trailing blank lines removed, final newline
//!
//! Only leading whitespace and blank lines change here, so bracket columns
//! on an opener line can be computed from its original content.

use crate::config::StyleSettings;
use crate::parser::{analyze_lines, CharFilter, OpenBracket, SourceLine};

use super::newline_of;

/// Width of an indentation string, counting tabs as `indent_size` columns
#[must_use]
pub fn indent_width(indent: &str, indent_size: usize) -> usize {
    indent
        .chars()
        .map(|c| if c == '\t' { indent_size } else { 1 })
        .sum()
}

/// One output line before blank-line capping
#[derive(Debug)]
struct LaidOutLine<'a> {
    text: String,
    terminator: &'a str,
    /// New indentation column; `None` for lines continuing a string
    column: Option<usize>,
    blank: bool,
}

/// Re-indent continuation lines and normalize blank lines
#[must_use]
pub fn reindent(source: &str, settings: &StyleSettings) -> String {
    if source.is_empty() {
        return String::new();
    }

    let filter = CharFilter::new(source);
    let lines = analyze_lines(&filter);
    let mut laid_out: Vec<LaidOutLine<'_>> = Vec::with_capacity(lines.len());

    for line in &lines {
        let terminator = line.terminator(source);
        if line.starts_in_string {
            laid_out.push(LaidOutLine {
                text: line.text(source).to_string(),
                terminator,
                column: None,
                blank: false,
            });
            continue;
        }
        if line.is_blank(source) {
            laid_out.push(LaidOutLine {
                text: String::new(),
                terminator,
                column: Some(0),
                blank: true,
            });
            continue;
        }

        let indent = line.indent(source);
        let content = &line.text(source)[indent.len()..];
        let column = line
            .brackets
            .last()
            .and_then(|bracket| {
                continuation_column(source, &filter, &lines, &laid_out, bracket, line, settings)
            })
            .unwrap_or_else(|| indent_width(indent, settings.indent_size));

        laid_out.push(LaidOutLine {
            text: format!("{}{content}", " ".repeat(column)),
            terminator,
            column: Some(column),
            blank: false,
        });
    }

    join_lines(&laid_out, settings.max_blank_lines, newline_of(source))
}

/// Column for a line inside an open bracket
///
/// Returns `None` when the opener line's layout is unknown (it continues a
/// string), in which case the line keeps its own indentation.
fn continuation_column(
    source: &str,
    filter: &CharFilter<'_>,
    lines: &[SourceLine],
    laid_out: &[LaidOutLine<'_>],
    bracket: &OpenBracket,
    line: &SourceLine,
    settings: &StyleSettings,
) -> Option<usize> {
    let opener_column = laid_out.get(bracket.line)?.column?;
    let first = line.start + line.indent(source).len();

    if filter.is_code(first) && matches!(source.as_bytes()[first], b')' | b']' | b'}') {
        return Some(opener_column);
    }
    if bracket.hanging {
        return Some(opener_column + settings.indent_size);
    }

    let opener = &lines[bracket.line];
    let content_start = opener.start + opener.indent(source).len();
    let offset = source[content_start..bracket.pos].chars().count();
    Some(opener_column + offset + 1)
}

fn join_lines(laid_out: &[LaidOutLine<'_>], max_blank_lines: usize, newline: &str) -> String {
    let mut result = String::new();
    let mut idx = 0;

    while idx < laid_out.len() {
        let line = &laid_out[idx];
        if !line.blank {
            result.push_str(&line.text);
            result.push_str(line.terminator);
            idx += 1;
            continue;
        }

        let Some(run_end) = (idx..laid_out.len()).find(|&j| !laid_out[j].blank) else {
            // Trailing blank lines
            break;
        };
        let cap = if laid_out[run_end].column == Some(0) {
            max_blank_lines
        } else {
            1
        };
        for blank in laid_out[idx..run_end].iter().take(cap) {
            result.push_str(blank.terminator);
        }
        idx = run_end;
    }

    if !result.is_empty() && !result.ends_with('\n') {
        result.push_str(newline);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        reindent(source, &StyleSettings::default())
    }

    #[test]
    fn test_indent_width() {
        assert_eq!(indent_width("    ", 4), 4);
        assert_eq!(indent_width("\t  ", 4), 6);
        assert_eq!(indent_width("\t", 2), 2);
    }

    #[test]
    fn test_tabs_expanded() {
        assert_eq!(run("if x:\n\ty = 1\n"), "if x:\n    y = 1\n");
    }

    #[test]
    fn test_tabs_expanded_with_indent_size() {
        let settings = StyleSettings {
            indent_size: 2,
            ..Default::default()
        };
        assert_eq!(reindent("if x:\n\ty = 1\n", &settings), "if x:\n  y = 1\n");
    }

    #[test]
    fn test_hanging_indent() {
        let source = "result = call(\n        a,\n  b,\n      )\n";
        assert_eq!(run(source), "result = call(\n    a,\n    b,\n)\n");
    }

    #[test]
    fn test_nested_hanging_indent() {
        let source = "    x = f(\n    g(\n    1,\n    ),\n    )\n";
        assert_eq!(
            run(source),
            "    x = f(\n        g(\n            1,\n        ),\n    )\n"
        );
    }

    #[test]
    fn test_visual_indent() {
        let source = "x = call(a,\n   b)\n";
        assert_eq!(run(source), "x = call(a,\n         b)\n");
    }

    #[test]
    fn test_visual_indent_counts_chars() {
        let source = "x = 'é' + f(a,\n b)\n";
        assert_eq!(run(source), "x = 'é' + f(a,\n            b)\n");
    }

    #[test]
    fn test_multiline_string_untouched() {
        let source = "x = f('''\n  keep\n''',\n      1)\n";
        assert_eq!(run(source), source);
    }

    #[test]
    fn test_blank_line_caps() {
        let source = "import os\n\n\n\n\ndef f():\n    a = 1\n\n\n    b = 2\n";
        assert_eq!(
            run(source),
            "import os\n\n\ndef f():\n    a = 1\n\n    b = 2\n"
        );
    }

    #[test]
    fn test_max_blank_lines_setting() {
        let settings = StyleSettings {
            max_blank_lines: 1,
            ..Default::default()
        };
        assert_eq!(reindent("a = 1\n\n\n\nb = 2\n", &settings), "a = 1\n\nb = 2\n");
    }

    #[test]
    fn test_trailing_blank_lines_and_final_newline() {
        assert_eq!(run("x = 1\n\n\n  \n"), "x = 1\n");
        assert_eq!(run("x = 1"), "x = 1\n");
        assert_eq!(run("x = 1\r\ny = 2"), "x = 1\r\ny = 2\r\n");
        assert_eq!(run("\n\n"), "");
    }

    #[test]
    fn test_idempotent() {
        let source = "def f(a,\n\tb):\n\treturn [\n\t\t1,\n\t]\n\n\n\n";
        let once = run(source);
        assert_eq!(run(&once), once);
    }
}
