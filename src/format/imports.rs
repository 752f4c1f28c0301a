//! Import sorting
//!
//! Sorts the first top-level block of single-line import statements:
//! 1. Sections: `__future__`, standard library, third party, local
//!    (relative), separated by one blank line
//! 2. Within a section, `import x` lines before `from x import y` lines,
//!    each ordered case-insensitively by module
//! 3. `import a, b` split into one statement per module
//! 4. Duplicate `from` imports of one module merged, names ordered
//!    constants, classes, then functions
//!
//! The block ends at the first line that is not an import or blank line;
//! imports with comments or parentheses end it too.

use std::cmp::Ordering;

use crate::parser::patterns::{FROM_IMPORT_RE, IMPORT_ALIAS_RE, IMPORT_RE};
use crate::parser::{analyze_lines, CharFilter, SourceLine};
use crate::Result;

use super::{newline_of, Stage};

/// Top-level modules of the Python standard library
const STDLIB_MODULES: &[&str] = &[
    "__future__", "_thread", "abc", "aifc", "argparse", "array", "ast", "asynchat", "asyncio",
    "asyncore", "atexit", "audioop", "base64", "bdb", "binascii", "bisect", "builtins", "bz2",
    "cProfile", "calendar", "cgi", "cgitb", "chunk", "cmath", "cmd", "code", "codecs", "codeop",
    "collections", "colorsys", "compileall", "concurrent", "configparser", "contextlib",
    "contextvars", "copy", "copyreg", "crypt", "csv", "ctypes", "curses", "dataclasses",
    "datetime", "dbm", "decimal", "difflib", "dis", "doctest", "email", "encodings",
    "ensurepip", "enum", "errno", "faulthandler", "fcntl", "filecmp", "fileinput", "fnmatch",
    "fractions", "ftplib", "functools", "gc", "getopt", "getpass", "gettext", "glob",
    "graphlib", "grp", "gzip", "hashlib", "heapq", "hmac", "html", "http", "imaplib", "imghdr",
    "imp", "importlib", "inspect", "io", "ipaddress", "itertools", "json", "keyword",
    "linecache", "locale", "logging", "lzma", "mailbox", "mailcap", "marshal", "math",
    "mimetypes", "mmap", "modulefinder", "msilib", "msvcrt", "multiprocessing", "netrc",
    "nis", "nntplib", "numbers", "operator", "optparse", "os", "ossaudiodev", "pathlib",
    "pdb", "pickle", "pickletools", "pipes", "pkgutil", "platform", "plistlib", "poplib",
    "posix", "pprint", "profile", "pstats", "pty", "pwd", "py_compile", "pyclbr", "pydoc",
    "queue", "quopri", "random", "re", "readline", "reprlib", "resource", "rlcompleter",
    "runpy", "sched", "secrets", "select", "selectors", "shelve", "shlex", "shutil", "signal",
    "site", "smtpd", "smtplib", "sndhdr", "socket", "socketserver", "spwd", "sqlite3", "ssl",
    "stat", "statistics", "string", "stringprep", "struct", "subprocess", "sunau", "symtable",
    "sys", "sysconfig", "syslog", "tabnanny", "tarfile", "telnetlib", "tempfile", "termios",
    "textwrap", "threading", "time", "timeit", "tkinter", "token", "tokenize", "tomllib",
    "trace", "traceback", "tracemalloc", "tty", "turtle", "types", "typing", "unicodedata",
    "unittest", "urllib", "uu", "uuid", "venv", "warnings", "wave", "weakref", "webbrowser",
    "winreg", "winsound", "wsgiref", "xdrlib", "xml", "xmlrpc", "zipapp", "zipfile",
    "zipimport", "zlib", "zoneinfo",
];

/// Check whether a (possibly dotted) module belongs to the standard library
#[must_use]
pub fn is_stdlib_module(module: &str) -> bool {
    let top = module.split('.').next().unwrap_or(module);
    STDLIB_MODULES.contains(&top)
}

/// Sorts the top-level import block
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSorter;

impl Stage for ImportSorter {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn apply(&self, source: &str) -> Result<String> {
        let filter = CharFilter::new(source);
        let lines = analyze_lines(&filter);
        let Some((first, last)) = find_block(source, &lines) else {
            return Ok(source.to_string());
        };

        let mut block = ImportBlock::default();
        for line in &lines[first..=last] {
            block.add_line(line.text(source));
        }
        let newline = newline_of(source);
        let sorted = block.render(newline);

        let start = lines[first].start;
        let end = lines[last].next;
        let mut result = String::with_capacity(source.len());
        result.push_str(&source[..start]);
        result.push_str(&sorted);
        if lines[last].terminator(source).is_empty() {
            // Keep a missing final newline missing
            result.truncate(result.len() - newline.len());
        }
        result.push_str(&source[end..]);
        Ok(result)
    }
}

/// Find the first top-level import block as an inclusive line range
///
/// Trailing blank lines are not part of the block.
fn find_block(source: &str, lines: &[SourceLine]) -> Option<(usize, usize)> {
    let is_import = |idx: usize| {
        let line = &lines[idx];
        line.is_simple_statement(lines.get(idx + 1))
            && !line.has_comment
            && line.indent(source).is_empty()
            && parse_line(line.text(source)).is_some()
    };

    let first = (0..lines.len()).find(|&idx| is_import(idx))?;
    let mut last = first;
    for idx in first + 1..lines.len() {
        if is_import(idx) {
            last = idx;
        } else if !lines[idx].is_blank(source) {
            break;
        }
    }
    Some((first, last))
}

/// One parsed import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Statement {
    /// `import module [as alias], ...`
    Plain(Vec<Alias>),
    /// `from module import name [as alias], ...`
    From(String, Vec<Alias>),
}

/// An imported name and its optional `as` alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Alias {
    pub(crate) name: String,
    pub(crate) alias: Option<String>,
}

impl Alias {
    fn parse(entry: &str) -> Option<Self> {
        let caps = IMPORT_ALIAS_RE.captures(entry.trim())?;
        Some(Alias {
            name: caps["name"].to_string(),
            alias: caps.name("alias").map(|m| m.as_str().to_string()),
        })
    }

    pub(crate) fn render(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {alias}", self.name),
            None => self.name.clone(),
        }
    }
}

fn parse_names(names: &str) -> Option<Vec<Alias>> {
    names.split(',').map(Alias::parse).collect()
}

/// Parse a single-line `import` or `from .. import` statement
pub(crate) fn parse_line(text: &str) -> Option<Statement> {
    if let Some(caps) = IMPORT_RE.captures(text) {
        return parse_names(&caps["names"]).map(Statement::Plain);
    }
    let caps = FROM_IMPORT_RE.captures(text)?;
    let names = parse_names(&caps["names"])?;
    Some(Statement::From(caps["module"].to_string(), names))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Future,
    Stdlib,
    ThirdParty,
    Local,
}

impl Section {
    fn of(module: &str) -> Self {
        if module == "__future__" {
            Section::Future
        } else if module.starts_with('.') {
            Section::Local
        } else if is_stdlib_module(module) {
            Section::Stdlib
        } else {
            Section::ThirdParty
        }
    }
}

/// Imports collected from a block, merged per module
#[derive(Debug, Default)]
struct ImportBlock {
    plain: Vec<Alias>,
    from: Vec<(String, Vec<Alias>)>,
}

impl ImportBlock {
    fn add_line(&mut self, text: &str) {
        match parse_line(text) {
            Some(Statement::Plain(aliases)) => {
                for alias in aliases {
                    if !self.plain.contains(&alias) {
                        self.plain.push(alias);
                    }
                }
            }
            Some(Statement::From(module, names)) => {
                let idx = match self.from.iter().position(|(m, _)| *m == module) {
                    Some(idx) => idx,
                    None => {
                        self.from.push((module, Vec::new()));
                        self.from.len() - 1
                    }
                };
                let merged = &mut self.from[idx].1;
                for name in names {
                    if !merged.contains(&name) {
                        merged.push(name);
                    }
                }
            }
            None => {}
        }
    }

    fn render(mut self, newline: &str) -> String {
        self.plain.sort_by(|a, b| {
            compare_modules(&a.name, &b.name).then_with(|| a.alias.cmp(&b.alias))
        });
        self.from.sort_by(|a, b| compare_modules(&a.0, &b.0));
        for (_, names) in &mut self.from {
            names.sort_by(compare_names);
        }

        let mut sections: Vec<(Section, Vec<String>)> = Vec::new();
        let mut push = |section: Section, line: String| {
            match sections.iter_mut().find(|(s, _)| *s == section) {
                Some((_, lines)) => lines.push(line),
                None => sections.push((section, vec![line])),
            }
        };
        for alias in &self.plain {
            push(Section::of(&alias.name), format!("import {}", alias.render()));
        }
        for (module, names) in &self.from {
            let names: Vec<String> = names.iter().map(Alias::render).collect();
            push(
                Section::of(module),
                format!("from {module} import {}", names.join(", ")),
            );
        }
        sections.sort_by_key(|(section, _)| *section);

        let mut result = String::new();
        for (idx, (_, lines)) in sections.iter().enumerate() {
            if idx > 0 {
                result.push_str(newline);
            }
            for line in lines {
                result.push_str(line);
                result.push_str(newline);
            }
        }
        result
    }
}

fn compare_modules(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Kind of an imported name, used for ordering
fn name_kind(name: &str) -> u8 {
    if name.len() > 1 && name.chars().all(|c| !c.is_lowercase()) {
        // CONSTANT
        0
    } else if name.chars().next().is_some_and(char::is_uppercase) {
        // Class
        1
    } else {
        2
    }
}

fn compare_names(a: &Alias, b: &Alias) -> Ordering {
    name_kind(&a.name)
        .cmp(&name_kind(&b.name))
        .then_with(|| compare_modules(&a.name, &b.name))
        .then_with(|| a.alias.cmp(&b.alias))
}
