/// `CharFilter` - Classifies Python source bytes as code, string, or comment
///
/// Every formatting stage must leave string contents and comments alone
/// unless it is specifically about them. `CharFilter` scans the source once
/// and records the string literals (prefixed, single-line, and triple-quoted)
/// and `#` comments so stages can ask whether a byte is code, or build a
/// masked copy of the text where non-code bytes are blanked out.
///
/// Offsets are byte offsets into the original source. All delimiters Python
/// cares about are ASCII, so byte-level scanning never splits a UTF-8
/// character.

/// Byte used in masked text in place of non-code bytes
pub const MASK_BYTE: u8 = 0;

/// Kind of a lexical segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Code,
    String,
    Comment,
}

/// A string literal located in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLiteral {
    /// Start of the literal, including any prefix letters
    pub start: usize,
    /// Offset of the opening quote
    pub quote_start: usize,
    /// Start of the body (after the opening quote or quotes)
    pub body_start: usize,
    /// End of the body (before the closing quote or quotes)
    pub body_end: usize,
    /// End of the literal (exclusive)
    pub end: usize,
    /// Quote character, `'` or `"`
    pub quote: char,
    pub triple: bool,
    /// False when the source ended (or the line ended, for single-quoted
    /// strings) before the closing quote
    pub terminated: bool,
}

impl StringLiteral {
    #[must_use]
    pub fn prefix<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.quote_start]
    }

    #[must_use]
    pub fn body<'a>(&self, source: &'a str) -> &'a str {
        &source[self.body_start..self.body_end]
    }

    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    #[must_use]
    pub fn is_bytes(&self, source: &str) -> bool {
        self.prefix(source).contains(['b', 'B'])
    }

    #[must_use]
    pub fn is_raw(&self, source: &str) -> bool {
        self.prefix(source).contains(['r', 'R'])
    }

    #[must_use]
    pub fn is_format(&self, source: &str) -> bool {
        self.prefix(source).contains(['f', 'F'])
    }
}

/// A contiguous run of source bytes of one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: usize,
    pub end: usize,
}

/// Lexical classification of one source text
#[derive(Debug, Clone)]
pub struct CharFilter<'a> {
    source: &'a str,
    segments: Vec<Segment>,
    strings: Vec<StringLiteral>,
    code: Vec<bool>,
}

impl<'a> CharFilter<'a> {
    /// Scan `source` and classify every byte
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        let (segments, strings) = tokenize(source);
        let mut code = vec![false; source.len()];
        for segment in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
            code[segment.start..segment.end].fill(true);
        }
        Self {
            source,
            segments,
            strings,
            code,
        }
    }

    #[must_use]
    pub fn source(&self) -> &'a str {
        self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// String literals in source order
    #[must_use]
    pub fn strings(&self) -> &[StringLiteral] {
        &self.strings
    }

    /// Comment segments in source order
    pub fn comments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Comment)
    }

    /// Check whether the byte at `pos` is code (outside strings and comments)
    #[must_use]
    pub fn is_code(&self, pos: usize) -> bool {
        self.code.get(pos).copied().unwrap_or(false)
    }

    /// Find the string literal containing `pos`, if any
    #[must_use]
    pub fn string_at(&self, pos: usize) -> Option<&StringLiteral> {
        let idx = self.strings.partition_point(|s| s.end <= pos);
        self.strings
            .get(idx)
            .filter(|s| s.start <= pos && pos < s.end)
    }

    /// Check whether `pos` lies strictly inside a string literal
    ///
    /// A newline at `pos` that is inside a triple-quoted string means the
    /// next physical line continues that string.
    #[must_use]
    pub fn inside_string(&self, pos: usize) -> bool {
        self.string_at(pos).is_some_and(|s| s.start < pos)
    }

    /// Check whether `pos` is part of a comment
    #[must_use]
    pub fn in_comment(&self, pos: usize) -> bool {
        let idx = self.segments.partition_point(|s| s.end <= pos);
        self.segments
            .get(idx)
            .is_some_and(|s| s.kind == SegmentKind::Comment && s.start <= pos)
    }

    /// Copy of the source where string and comment bytes are replaced by
    /// [`MASK_BYTE`], keeping newlines and byte offsets intact
    #[must_use]
    pub fn masked(&self) -> String {
        self.masked_with(true)
    }

    /// Copy of the source where only comments are masked
    ///
    /// String contents stay visible; used when names mentioned inside
    /// strings (f-string expressions, `__all__`) must count as references.
    #[must_use]
    pub fn masked_comments(&self) -> String {
        self.masked_with(false)
    }

    fn masked_with(&self, mask_strings: bool) -> String {
        let mut bytes = self.source.as_bytes().to_vec();
        for segment in &self.segments {
            let mask = match segment.kind {
                SegmentKind::Code => false,
                SegmentKind::String => mask_strings,
                SegmentKind::Comment => true,
            };
            if mask {
                for b in &mut bytes[segment.start..segment.end] {
                    if *b != b'\n' {
                        *b = MASK_BYTE;
                    }
                }
            }
        }
        // Whole segments are masked and segment edges are ASCII delimiters,
        // so the result is still valid UTF-8.
        String::from_utf8(bytes).unwrap_or_default()
    }
}

/// Split `source` into code, string, and comment segments
fn tokenize(source: &str) -> (Vec<Segment>, Vec<StringLiteral>) {
    let bytes = source.as_bytes();
    let mut segments = Vec::new();
    let mut strings = Vec::new();
    let mut code_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                push_code(&mut segments, code_start, i);
                let end = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |n| i + n);
                segments.push(Segment {
                    kind: SegmentKind::Comment,
                    start: i,
                    end,
                });
                i = end;
                code_start = i;
            }
            b'\'' | b'"' => {
                let start = prefix_start(bytes, code_start, i);
                push_code(&mut segments, code_start, start);
                let literal = scan_string(bytes, start, i);
                segments.push(Segment {
                    kind: SegmentKind::String,
                    start: literal.start,
                    end: literal.end,
                });
                strings.push(literal);
                i = literal.end;
                code_start = i;
            }
            _ => i += 1,
        }
    }
    push_code(&mut segments, code_start, bytes.len());

    (segments, strings)
}

fn push_code(segments: &mut Vec<Segment>, start: usize, end: usize) {
    if start < end {
        segments.push(Segment {
            kind: SegmentKind::Code,
            start,
            end,
        });
    }
}

/// Find where the prefix letters (`r`, `b`, `f`, `u` and pairs) of a string
/// starting at `quote` begin
fn prefix_start(bytes: &[u8], floor: usize, quote: usize) -> usize {
    const PREFIXES: &[&str] = &["r", "u", "b", "f", "br", "rb", "fr", "rf"];

    for len in [2, 1] {
        if quote < floor + len {
            continue;
        }
        let start = quote - len;
        let candidate = String::from_utf8_lossy(&bytes[start..quote]).to_ascii_lowercase();
        if !PREFIXES.contains(&candidate.as_str()) {
            continue;
        }
        let preceded_by_word = start > 0 && is_word_byte(bytes[start - 1]);
        if !preceded_by_word {
            return start;
        }
    }
    quote
}

fn scan_string(bytes: &[u8], start: usize, quote_start: usize) -> StringLiteral {
    let quote = bytes[quote_start];
    let triple = bytes.len() >= quote_start + 3
        && bytes[quote_start + 1] == quote
        && bytes[quote_start + 2] == quote;
    let delimiter = if triple { 3 } else { 1 };
    let body_start = quote_start + delimiter;

    let mut j = body_start;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b'\\' {
            j += 2;
            continue;
        }
        if triple {
            if b == quote && j + 3 <= bytes.len() && bytes[j + 1] == quote && bytes[j + 2] == quote
            {
                return literal(start, quote_start, body_start, j, j + 3, quote, true, true);
            }
        } else if b == quote {
            return literal(start, quote_start, body_start, j, j + 1, quote, false, true);
        } else if b == b'\n' {
            return literal(start, quote_start, body_start, j, j, quote, false, false);
        }
        j += 1;
    }
    let end = bytes.len();
    literal(start, quote_start, body_start, end, end, quote, triple, false)
}

#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
fn literal(
    start: usize,
    quote_start: usize,
    body_start: usize,
    body_end: usize,
    end: usize,
    quote: u8,
    triple: bool,
    terminated: bool,
) -> StringLiteral {
    StringLiteral {
        start,
        quote_start,
        body_start: body_start.min(end),
        body_end: body_end.max(body_start.min(end)),
        end,
        quote: char::from(quote),
        triple,
        terminated,
    }
}

/// Check whether a byte can be part of an identifier
#[must_use]
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}
