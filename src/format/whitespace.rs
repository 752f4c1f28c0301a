//! Per-line whitespace and comparison fixes
//!
//! Implements the content half of the style fixer, one physical line at a
//! time:
//! 1. A space after commas
//! 2. Inline comments: two spaces before, `# ` inside
//! 3. Trailing whitespace removed
//! 4. Aggressive comparison rewrites (`== None`, `not x in y`)
//! 5. At aggressive level 2, top-level `;` statements split onto their own
//!    lines
//!
//! Indentation is left alone here; see [`continuation`](super::continuation).

use std::borrow::Cow;

use crate::parser::patterns::{
    COMPARE_NONE_RE, COMPARISON_RE, COMPOUND_RE, KEYWORDS, NOT_IN_RE, NOT_IS_RE,
};
use crate::parser::stream::word_before;
use crate::parser::{analyze_lines, CharFilter, SourceLine};

/// A replacement of `start..end` in the source
#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

impl Edit {
    fn insert(at: usize, text: &str) -> Self {
        Edit {
            start: at,
            end: at,
            text: text.to_string(),
        }
    }
}

/// Apply per-line fixes to the whole source
///
/// Lines that begin or end inside a multi-line string are copied verbatim.
#[must_use]
pub fn fix_lines(source: &str, aggressive: u32) -> String {
    let filter = CharFilter::new(source);
    let masked = filter.masked();
    let lines = analyze_lines(&filter);
    let mut out = String::with_capacity(source.len());

    for (idx, line) in lines.iter().enumerate() {
        let terminator = line.terminator(source);
        if line.starts_in_string || line.ends_in_string {
            out.push_str(line.text(source));
            out.push_str(terminator);
            continue;
        }

        let simple = line.is_simple_statement(lines.get(idx + 1));
        let mut edits = comma_edits(source, &filter, line);
        if aggressive >= 1 {
            edits.extend(comparison_edits(&masked, line, simple));
        }
        edits.extend(tail_edit(source, &filter, line));
        edits.sort_by_key(|e| (e.start, e.end));
        let fixed = apply_edits(source, line, &edits);

        if aggressive >= 2 && simple {
            if let Some(parts) = split_statements(&fixed) {
                for part in parts {
                    out.push_str(&part);
                    out.push_str(if terminator.is_empty() {
                        "\n"
                    } else {
                        terminator
                    });
                }
                continue;
            }
        }
        out.push_str(&fixed);
        out.push_str(terminator);
    }

    out
}

fn apply_edits(source: &str, line: &SourceLine, edits: &[Edit]) -> String {
    let mut result = String::with_capacity(line.end - line.start + 8);
    let mut cursor = line.start;
    for edit in edits {
        if edit.start < cursor {
            continue;
        }
        result.push_str(&source[cursor..edit.start]);
        result.push_str(&edit.text);
        cursor = edit.end;
    }
    result.push_str(&source[cursor..line.end]);
    result
}

/// Insert a space after commas followed directly by an operand
fn comma_edits(source: &str, filter: &CharFilter<'_>, line: &SourceLine) -> Vec<Edit> {
    let bytes = source.as_bytes();
    (line.start..line.end.saturating_sub(1))
        .filter(|&pos| bytes[pos] == b',' && filter.is_code(pos))
        .filter(|&pos| needs_space(filter, bytes, pos + 1))
        .map(|pos| Edit::insert(pos + 1, " "))
        .collect()
}

fn needs_space(filter: &CharFilter<'_>, bytes: &[u8], pos: usize) -> bool {
    if filter.is_code(pos) {
        !matches!(
            bytes[pos],
            b' ' | b'\t' | b'\x0c' | b')' | b']' | b'}' | b'\\' | b'\r'
        )
    } else {
        filter.string_at(pos).is_some_and(|s| s.start == pos)
    }
}

/// Rewrite comparisons against `None` and negated membership/identity tests
fn comparison_edits(masked: &str, line: &SourceLine, simple: bool) -> Vec<Edit> {
    let text = &masked[line.start..line.end];
    let mut edits = Vec::new();

    for caps in COMPARE_NONE_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let replacement = if &caps["op"] == "==" {
            " is None"
        } else {
            " is not None"
        };
        edits.push(Edit {
            start: line.start + m.start(),
            end: line.start + m.end(),
            text: replacement.to_string(),
        });
    }

    // `not x in y` only rewrites when nothing else could chain with the
    // comparison, so the result parses to the same tree
    if simple {
        for (re, op) in [(&*NOT_IN_RE, "not in"), (&*NOT_IS_RE, "is not")] {
            for caps in re.captures_iter(text) {
                let Some(m) = caps.get(0) else { continue };
                let operand = &caps["x"];
                if KEYWORDS.contains(&operand)
                    || matches!(operand, "None" | "True" | "False")
                    || word_before(text, m.start()) == Some("is")
                    || COMPARISON_RE.is_match(&text[m.end()..])
                {
                    continue;
                }
                edits.push(Edit {
                    start: line.start + m.start(),
                    end: line.start + m.end(),
                    text: format!("{operand} {op} "),
                });
            }
        }
    }

    edits
}

/// Fix the end of a line: inline comment spacing and trailing whitespace
fn tail_edit(source: &str, filter: &CharFilter<'_>, line: &SourceLine) -> Option<Edit> {
    let comment_start = if line.has_comment {
        (line.start..line.end).find(|&pos| filter.in_comment(pos))
    } else {
        None
    };

    let Some(start) = comment_start else {
        let text = line.text(source);
        let trimmed = trim_trailing(text);
        return (trimmed.len() < text.len()).then(|| Edit {
            start: line.start + trimmed.len(),
            end: line.end,
            text: String::new(),
        });
    };

    let comment = trim_trailing(&source[start..line.end]);
    if line.first_code.is_some_and(|first| first < start) {
        let code_end = line.start + trim_trailing(&source[line.start..start]).len();
        Some(Edit {
            start: code_end,
            end: line.end,
            text: format!("  {}", fix_inline_comment(comment)),
        })
    } else {
        Some(Edit {
            start,
            end: line.end,
            text: comment.to_string(),
        })
    }
}

fn trim_trailing(text: &str) -> &str {
    text.trim_end_matches([' ', '\t', '\x0c'])
}

/// Ensure an inline comment starts with `# `
#[must_use]
pub fn fix_inline_comment(comment: &str) -> Cow<'_, str> {
    let body = comment.trim_start_matches('#');
    if body.is_empty() || body.starts_with(char::is_whitespace) {
        Cow::Borrowed(comment)
    } else {
        let hashes = &comment[..comment.len() - body.len()];
        Cow::Owned(format!("{hashes} {body}"))
    }
}

/// Split a single-line statement at top-level semicolons
///
/// Returns `None` when the line holds no such semicolon or opens a
/// compound statement.
fn split_statements(line: &str) -> Option<Vec<String>> {
    let filter = CharFilter::new(line);
    let masked = filter.masked();
    if COMPOUND_RE.is_match(&masked) {
        return None;
    }

    let mut depth = 0usize;
    let mut cuts = Vec::new();
    for (pos, b) in masked.bytes().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => cuts.push(pos),
            _ => {}
        }
    }
    if cuts.is_empty() {
        return None;
    }

    let indent = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
    let mut parts: Vec<&str> = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(line.len())) {
        let part = line[start..cut].trim_matches([' ', '\t']);
        if !part.is_empty() {
            parts.push(part);
        }
        start = cut + 1;
    }

    // A comment left on its own belongs to the statement before it
    let mut statements: Vec<String> = Vec::with_capacity(parts.len());
    for part in parts {
        match statements.last_mut() {
            Some(last) if part.starts_with('#') => {
                last.push_str("  ");
                last.push_str(part);
            }
            _ => statements.push(format!("{indent}{part}")),
        }
    }

    (!statements.is_empty()).then_some(statements)
}
