//! Physical line analysis
//!
//! Splits classified source into physical lines and records, for each line,
//! the bracket nesting and string state it starts in. Stages use this to
//! skip lines that continue a multi-line string and to re-indent lines that
//! continue an open bracket.

use super::char_filter::{is_word_byte, CharFilter};

/// An opening bracket that is still unclosed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBracket {
    /// The bracket character: `(`, `[` or `{`
    pub ch: u8,
    /// Byte offset of the bracket
    pub pos: usize,
    /// Index of the line the bracket was opened on
    pub line: usize,
    /// True when nothing but whitespace or a comment follows the bracket on
    /// its line (a hanging indent)
    pub hanging: bool,
}

/// One physical line of source
#[derive(Debug, Clone)]
pub struct SourceLine {
    /// Offset of the first byte of the line
    pub start: usize,
    /// Offset of the end of the line content, excluding `\r\n` or `\n`
    pub end: usize,
    /// Offset just past the line terminator
    pub next: usize,
    /// The line begins inside a multi-line string
    pub starts_in_string: bool,
    /// The line terminator is inside a multi-line string
    pub ends_in_string: bool,
    /// Brackets open when the line starts, outermost first
    pub brackets: Vec<OpenBracket>,
    /// The previous line ended with a backslash continuation
    pub continues_backslash: bool,
    /// Offset of the first non-whitespace code byte, if any
    pub first_code: Option<usize>,
    /// Offset of the last non-whitespace code byte, if any
    pub last_code: Option<usize>,
    /// The line holds a comment
    pub has_comment: bool,
}

impl SourceLine {
    /// Line content without its terminator
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// The line terminator (`"\n"`, `"\r\n"`, or `""` at end of file)
    #[must_use]
    pub fn terminator<'a>(&self, source: &'a str) -> &'a str {
        &source[self.end..self.next]
    }

    /// Leading whitespace of the line
    #[must_use]
    pub fn indent<'a>(&self, source: &'a str) -> &'a str {
        let text = self.text(source);
        &text[..text.len() - text.trim_start_matches([' ', '\t']).len()]
    }

    /// True for lines that are empty or whitespace-only (outside strings)
    #[must_use]
    pub fn is_blank(&self, source: &str) -> bool {
        !self.starts_in_string && self.text(source).trim().is_empty()
    }

    /// True when the line starts a new logical statement
    #[must_use]
    pub fn starts_statement(&self) -> bool {
        !self.starts_in_string && self.brackets.is_empty() && !self.continues_backslash
    }

    /// True when the line's statement also ends on this line
    #[must_use]
    pub fn is_simple_statement(&self, next: Option<&SourceLine>) -> bool {
        self.starts_statement() && next.map_or(true, SourceLine::starts_statement)
    }
}

/// Analyze the physical lines of a classified source
#[must_use]
pub fn analyze_lines(filter: &CharFilter<'_>) -> Vec<SourceLine> {
    let source = filter.source();
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut stack: Vec<OpenBracket> = Vec::new();
    let mut continues_backslash = false;
    let mut start = 0;

    while start < bytes.len() {
        let newline = bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|n| start + n);
        let next = newline.map_or(bytes.len(), |n| n + 1);
        let end = match newline {
            Some(n) if n > start && bytes[n - 1] == b'\r' => n - 1,
            Some(n) => n,
            None => bytes.len(),
        };
        let index = lines.len();
        let brackets = stack.clone();
        let mut first_code = None;
        let mut last_code = None;
        let mut has_comment = false;

        for pos in start..end {
            if !filter.is_code(pos) {
                if !has_comment && filter.in_comment(pos) {
                    has_comment = true;
                }
                // A string is content too: it ends any hanging run
                if filter.string_at(pos).is_some_and(|s| s.start == pos) {
                    mark_not_hanging(&mut stack, index, pos);
                    first_code.get_or_insert(pos);
                }
                continue;
            }
            let b = bytes[pos];
            if b == b' ' || b == b'\t' || b == b'\x0c' || b == b'\r' {
                continue;
            }
            mark_not_hanging(&mut stack, index, pos);
            first_code.get_or_insert(pos);
            last_code = Some(pos);
            match b {
                b'(' | b'[' | b'{' => stack.push(OpenBracket {
                    ch: b,
                    pos,
                    line: index,
                    hanging: true,
                }),
                b')' | b']' | b'}' => {
                    stack.pop();
                }
                _ => {}
            }
        }

        let starts_in_string = start > 0 && filter.inside_string(start);
        let ends_in_string = newline.is_some_and(|n| filter.inside_string(n));
        lines.push(SourceLine {
            start,
            end,
            next,
            starts_in_string,
            ends_in_string,
            brackets,
            continues_backslash,
            first_code,
            last_code,
            has_comment,
        });
        continues_backslash = last_code.is_some_and(|p| bytes[p] == b'\\') && !ends_in_string;
        start = next;
    }

    lines
}

fn mark_not_hanging(stack: &mut [OpenBracket], line: usize, pos: usize) {
    for bracket in stack.iter_mut().rev() {
        if bracket.line != line {
            break;
        }
        if bracket.pos < pos {
            bracket.hanging = false;
        }
    }
}

/// Find the line index containing byte offset `pos`
#[must_use]
pub fn line_index(lines: &[SourceLine], pos: usize) -> usize {
    lines
        .partition_point(|line| line.next <= pos)
        .min(lines.len().saturating_sub(1))
}

/// Find the last word (identifier or keyword) ending right before `pos`,
/// skipping whitespace
#[must_use]
pub fn word_before(source: &str, pos: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    let mut end = pos;
    while end > 0 && matches!(bytes[end - 1], b' ' | b'\t') {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && is_word_byte(bytes[start - 1]) {
        start -= 1;
    }
    (start < end).then(|| &source[start..end])
}
