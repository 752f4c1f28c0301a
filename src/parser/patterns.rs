/// Regex patterns for Python syntax
///
/// All patterns are compiled once at first use using `LazyLock`.
///
/// Patterns that look at code are run against masked text (see
/// [`CharFilter::masked`](super::CharFilter::masked)), so they never match
/// inside strings or comments. Masked bytes are NUL, which is why several
/// patterns exclude `\x00` explicitly.
use std::sync::LazyLock;

use regex::Regex;

/// Build a regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. All patterns in this module are
/// constants covered by tests, so this can only fire during development.
fn build_re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

// ===== ENCODING DECLARATIONS =====

/// `# -*- coding: latin-1 -*-`, `# vim: set fileencoding=utf-8 :`
pub static CODING_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^[ \t\x0c]*#.*?coding[:=][ \t]*([-\w.]+)"));

/// A line that is blank or only a comment
pub static BLANK_OR_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^[ \t\x0c]*(?:[#\r\n]|$)"));

// ===== FILE DISCOVERY =====

pub static PYTHON_SHEBANG_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^#!.*\bpython[23w]?(?:\.\d+)?\b"));

// ===== IMPORTS =====

/// `import a.b as c, d`
pub static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^(?P<indent>[ \t]*)import[ \t]+(?P<names>[\w.]+(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*[\w.]+(?:[ \t]+as[ \t]+\w+)?)*)[ \t]*$",
    )
});

/// `from .pkg import a as b, c`
pub static FROM_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^(?P<indent>[ \t]*)from[ \t]+(?P<module>\.+[\w.]*|[\w.]+)[ \t]+import[ \t]+(?P<names>\w+(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*\w+(?:[ \t]+as[ \t]+\w+)?)*)[ \t]*$",
    )
});

/// One `name` or `name as alias` entry of an import list
pub static IMPORT_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(?P<name>[\w.]+)(?:[ \t]+as[ \t]+(?P<alias>\w+))?$"));

// ===== DEFINITIONS =====

pub static DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^[ \t]*(?:async[ \t]+)?def[ \t]+\w"));

pub static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^[ \t]*class[ \t]+\w"));

/// Simple assignment `name = expr` (not `==`, augmented, or annotated)
pub static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^(?P<indent>[ \t]+)(?P<name>[A-Za-z_]\w*)[ \t]*=[ \t]*(?P<expr>[^=\s].*?)[ \t]*$")
});

/// Right-hand sides with no side effects
pub static SIMPLE_EXPR_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r#"^(?:[A-Za-z_][\w.]*|-?\d[\w.]*|'[^'\\]*'|"[^"\\]*"|\(\)|\[\]|\{\})$"#,
    )
});

/// Statements that open an indented block and cannot be split at `;`
pub static COMPOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^[ \t]*(?:if|elif|else|for|while|with|try|except|finally|def|class|async|match|case|lambda)\b",
    )
});

// ===== STYLE =====

/// `x == None` / `x != None`
pub static COMPARE_NONE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"[ \t]*(?P<op>==|!=)[ \t]*None\b"));

/// `not x in y`
pub static NOT_IN_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"\bnot[ \t]+(?P<x>[A-Za-z_][\w.]*)[ \t]+in[ \t]+"));

/// `not x is y`
pub static NOT_IS_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"\bnot[ \t]+(?P<x>[A-Za-z_][\w.]*)[ \t]+is[ \t]+"));

/// Anything that would chain with a rewritten comparison
pub static COMPARISON_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"==|!=|<|>|\b(?:in|is|not)\b"));

/// Python keywords that may precede `(` without making it a call
pub const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "case", "del", "elif", "else", "except", "for",
    "from", "if", "import", "in", "is", "lambda", "match", "not", "or", "raise", "return",
    "while", "with", "yield",
];
