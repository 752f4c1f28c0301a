//! Unused import and variable removal
//!
//! Removes single-line import bindings that nothing else in the file
//! refers to. Only standard library imports are removed unless
//! `remove_all_unused_imports` is set, since importing a third-party module
//! can have side effects. `__future__` imports, star imports, and lines
//! with comments (including `# noqa`) are never touched.
//!
//! With `remove_unused_variables`, single-line `name = expr` statements in
//! a function body whose name is never read are dropped (for side-effect
//! free right-hand sides) or reduced to the bare expression.
//!
//! Removing the only statement of a block leaves `pass` in its place. The
//! stage repeats until nothing changes, as one removal can make another
//! binding unused.

use crate::parser::char_filter::is_word_byte;
use crate::parser::patterns::{ASSIGN_RE, CLASS_RE, DEF_RE, SIMPLE_EXPR_RE};
use crate::parser::{analyze_lines, CharFilter, SourceLine};
use crate::Result;

use super::continuation::indent_width;
use super::imports::{is_stdlib_module, parse_line, Alias, Statement};
use super::Stage;

/// Upper bound on removal passes
const MAX_PASSES: usize = 16;

/// Names whose presence makes local variables observable
const DYNAMIC_SCOPE_WORDS: &[&str] = &[
    "locals", "globals", "vars", "global", "nonlocal", "exec", "eval",
];

/// Removes unused imports and, optionally, unused local variables
#[derive(Debug, Clone, Copy, Default)]
pub struct UnusedRemover {
    remove_all_unused_imports: bool,
    remove_unused_variables: bool,
}

impl UnusedRemover {
    #[must_use]
    pub fn new(remove_all_unused_imports: bool, remove_unused_variables: bool) -> Self {
        Self {
            remove_all_unused_imports,
            remove_unused_variables,
        }
    }

    fn pass(&self, source: &str) -> String {
        let filter = CharFilter::new(source);
        let lines = analyze_lines(&filter);
        let references = filter.masked_comments();
        let mut actions = vec![Action::Keep; lines.len()];

        self.plan_imports(source, &lines, &references, &mut actions);
        if self.remove_unused_variables {
            plan_variables(source, &lines, &references, &mut actions);
        }
        render(source, &lines, &actions)
    }

    fn plan_imports(
        &self,
        source: &str,
        lines: &[SourceLine],
        references: &str,
        actions: &mut [Action],
    ) {
        let imports: Vec<(usize, Statement)> = lines
            .iter()
            .enumerate()
            .filter(|(idx, line)| {
                !line.has_comment && line.is_simple_statement(lines.get(idx + 1))
            })
            .filter_map(|(idx, line)| parse_line(line.text(source)).map(|stmt| (idx, stmt)))
            .collect();
        if imports.is_empty() {
            return;
        }

        // Imports do not count as references to each other
        let mut text = String::with_capacity(references.len());
        let mut next_import = imports.iter().map(|(idx, _)| *idx).peekable();
        for (idx, line) in lines.iter().enumerate() {
            if next_import.peek() == Some(&idx) {
                next_import.next();
                text.push('\n');
            } else {
                text.push_str(&references[line.start..line.next]);
            }
        }

        for (idx, statement) in imports {
            let indent = lines[idx].indent(source);
            let (kept, total, rendered) = match &statement {
                Statement::Plain(aliases) => {
                    let kept: Vec<&Alias> = aliases
                        .iter()
                        .filter(|a| {
                            let binding = a
                                .alias
                                .as_deref()
                                .unwrap_or_else(|| a.name.split('.').next().unwrap_or(&a.name));
                            !self.removable(&a.name) || count_word(&text, binding) > 0
                        })
                        .collect();
                    let rendered = format!("{indent}import {}", join_aliases(&kept));
                    (kept.len(), aliases.len(), rendered)
                }
                Statement::From(module, names) => {
                    let kept: Vec<&Alias> = names
                        .iter()
                        .filter(|a| {
                            let binding = a.alias.as_deref().unwrap_or(&a.name);
                            !self.removable(module) || count_word(&text, binding) > 0
                        })
                        .collect();
                    let rendered = format!("{indent}from {module} import {}", join_aliases(&kept));
                    (kept.len(), names.len(), rendered)
                }
            };

            actions[idx] = if kept == total {
                Action::Keep
            } else if kept == 0 {
                Action::Remove
            } else {
                Action::Replace(rendered)
            };
        }
    }

    fn removable(&self, module: &str) -> bool {
        module != "__future__" && (self.remove_all_unused_imports || is_stdlib_module(module))
    }
}

impl Stage for UnusedRemover {
    fn name(&self) -> &'static str {
        "unused"
    }

    fn apply(&self, source: &str) -> Result<String> {
        let mut current = source.to_string();
        for _ in 0..MAX_PASSES {
            let next = self.pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        Ok(current)
    }
}

/// What to do with one physical line
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Keep,
    Remove,
    Replace(String),
}

fn join_aliases(aliases: &[&Alias]) -> String {
    aliases
        .iter()
        .map(|a| a.render())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Count whole-word occurrences of `word` in `text`
fn count_word(text: &str, word: &str) -> usize {
    let bytes = text.as_bytes();
    text.match_indices(word)
        .filter(|(pos, _)| {
            let before = *pos == 0 || !is_word_byte(bytes[pos - 1]);
            let after = bytes
                .get(pos + word.len())
                .map_or(true, |&b| !is_word_byte(b));
            before && after
        })
        .count()
}

fn has_content(line: &SourceLine) -> bool {
    line.first_code.is_some() || line.starts_in_string
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Function,
    Class,
}

/// A `def` or `class` with an indented body
#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    header: usize,
    /// First body line
    body_start: usize,
    /// One past the last body line with content
    body_end: usize,
}

fn find_scopes(source: &str, lines: &[SourceLine]) -> Vec<Scope> {
    let bytes = source.as_bytes();
    let mut scopes = Vec::new();

    for (header, line) in lines.iter().enumerate() {
        if !line.starts_statement() {
            continue;
        }
        let text = line.text(source);
        let kind = if DEF_RE.is_match(text) {
            ScopeKind::Function
        } else if CLASS_RE.is_match(text) {
            ScopeKind::Class
        } else {
            continue;
        };

        let mut header_end = header;
        while header_end + 1 < lines.len() && !lines[header_end + 1].starts_statement() {
            header_end += 1;
        }
        if !lines[header_end]
            .last_code
            .is_some_and(|pos| bytes[pos] == b':')
        {
            continue;
        }

        let header_width = indent_width(line.indent(source), 8);
        let mut body_end = header_end + 1;
        for (idx, body_line) in lines.iter().enumerate().skip(header_end + 1) {
            if !has_content(body_line) {
                continue;
            }
            if body_line.starts_statement()
                && indent_width(body_line.indent(source), 8) <= header_width
            {
                break;
            }
            body_end = idx + 1;
        }
        scopes.push(Scope {
            kind,
            header,
            body_start: header_end + 1,
            body_end,
        });
    }
    scopes
}

fn plan_variables(source: &str, lines: &[SourceLine], references: &str, actions: &mut [Action]) {
    let scopes = find_scopes(source, lines);

    for (idx, line) in lines.iter().enumerate() {
        if actions[idx] != Action::Keep
            || line.has_comment
            || line.ends_in_string
            || !line.is_simple_statement(lines.get(idx + 1))
        {
            continue;
        }
        let Some(caps) = ASSIGN_RE.captures(line.text(source)) else {
            continue;
        };
        let name = &caps["name"];
        let expr = &caps["expr"];
        if name.starts_with('_') || expr.starts_with('*') {
            continue;
        }

        let Some(scope) = scopes
            .iter()
            .filter(|s| s.body_start <= idx && idx < s.body_end)
            .max_by_key(|s| s.header)
        else {
            continue;
        };
        if scope.kind != ScopeKind::Function {
            continue;
        }

        let body = &references[lines[scope.body_start].start..lines[scope.body_end - 1].next];
        if DYNAMIC_SCOPE_WORDS
            .iter()
            .any(|word| count_word(body, word) > 0)
            || count_word(body, name) != 1
        {
            continue;
        }

        actions[idx] = if SIMPLE_EXPR_RE.is_match(expr) {
            Action::Remove
        } else {
            Action::Replace(format!("{}{expr}", &caps["indent"]))
        };
    }
}

/// Build the output, putting `pass` where a removal would empty a block
fn render(source: &str, lines: &[SourceLine], actions: &[Action]) -> String {
    let bytes = source.as_bytes();
    let mut result = String::with_capacity(source.len());
    let mut after_header = false;

    for (idx, line) in lines.iter().enumerate() {
        let terminator = line.terminator(source);
        match &actions[idx] {
            Action::Keep => {
                result.push_str(line.text(source));
                result.push_str(terminator);
                if has_content(line) {
                    after_header = !line.starts_in_string
                        && line.last_code.is_some_and(|pos| bytes[pos] == b':')
                        && lines.get(idx + 1).map_or(true, SourceLine::starts_statement);
                }
            }
            Action::Replace(text) => {
                result.push_str(text);
                result.push_str(terminator);
                after_header = false;
            }
            Action::Remove => {
                if after_header && block_ends_after(source, lines, actions, idx) {
                    result.push_str(line.indent(source));
                    result.push_str("pass");
                    result.push_str(terminator);
                    after_header = false;
                }
            }
        }
    }
    result
}

/// Check whether no statement of the block containing `idx` survives after
/// it
fn block_ends_after(source: &str, lines: &[SourceLine], actions: &[Action], idx: usize) -> bool {
    let width = indent_width(lines[idx].indent(source), 8);
    lines
        .iter()
        .enumerate()
        .skip(idx + 1)
        .find(|(j, line)| has_content(line) && actions[*j] != Action::Remove)
        .map_or(true, |(_, line)| {
            line.starts_statement() && indent_width(line.indent(source), 8) < width
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imports_only(source: &str) -> String {
        UnusedRemover::new(false, false).apply(source).unwrap()
    }

    fn everything(source: &str) -> String {
        UnusedRemover::new(true, true).apply(source).unwrap()
    }

    #[test]
    fn test_count_word() {
        assert_eq!(count_word("os.path, osx, _os, os", "os"), 2);
        assert_eq!(count_word("", "os"), 0);
    }

    #[test]
    fn test_removes_unused_stdlib_import() {
        assert_eq!(imports_only("import os\nimport sys\nsys.exit()\n"), "import sys\nsys.exit()\n");
    }

    #[test]
    fn test_keeps_third_party_by_default() {
        let source = "import requests\nx = 1\n";
        assert_eq!(imports_only(source), source);
        assert_eq!(everything(source), "x = 1\n");
    }

    #[test]
    fn test_partial_statements() {
        assert_eq!(
            imports_only("import os, sys\nfrom os import path, sep as s\nprint(sys, s)\n"),
            "import sys\nfrom os import sep as s\nprint(sys, s)\n"
        );
    }

    #[test]
    fn test_dotted_import_binding() {
        let source = "import os.path\nos.path.join('a')\n";
        assert_eq!(imports_only(source), source);
    }

    #[test]
    fn test_never_touched() {
        for source in [
            "from __future__ import annotations\n",
            "from os import *\n",
            "import os  # noqa\n",
            "from os import (\n    path,\n)\n",
        ] {
            assert_eq!(everything(source), source);
        }
    }

    #[test]
    fn test_string_reference_counts() {
        let source = "import os\n__all__ = ['os']\n";
        assert_eq!(imports_only(source), source);
    }

    #[test]
    fn test_comment_reference_does_not_count() {
        assert_eq!(imports_only("import os\n# os is great\n"), "# os is great\n");
    }

    #[test]
    fn test_pass_inserted_for_empty_block() {
        let source = "try:\n    import json\nexcept ImportError:\n    pass\n";
        let expected = "try:\n    pass\nexcept ImportError:\n    pass\n";
        assert_eq!(imports_only(source), expected);
    }

    #[test]
    fn test_unused_variables() {
        let source = "def f():\n    a = 1\n    b = compute()\n    c = 2\n    return c\n";
        let expected = "def f():\n    compute()\n    c = 2\n    return c\n";
        assert_eq!(everything(source), expected);
    }

    #[test]
    fn test_variable_only_statement_becomes_pass() {
        assert_eq!(everything("def f():\n    x = 1\n"), "def f():\n    pass\n");
    }

    #[test]
    fn test_variables_kept() {
        for source in [
            "def f():\n    x = 1\n    def g():\n        return x\n    return g\n",
            "def f():\n    x = 1\n    return locals()\n",
            "def f():\n    global x\n    x = 1\n",
            "class A:\n    x = 1\n",
            "def f():\n    _ = 1\n",
            "def f():\n    x = 1  # keep\n",
        ] {
            assert_eq!(everything(source), source);
        }
    }

    #[test]
    fn test_variables_need_flag() {
        let source = "def f():\n    x = 1\n";
        assert_eq!(imports_only(source), source);
    }

    #[test]
    fn test_fixed_point() {
        // Removing `x` makes `os` unused
        let source = "import os\n\ndef f():\n    x = os.sep\n";
        assert_eq!(everything(source), "\ndef f():\n    pass\n");
    }
}
