//! Input discovery
//!
//! Expands directories when recursing and drops inputs matching an exclusion
//! glob. Patterns use shell wildcard syntax. Walked entries are matched on
//! their path and base name, and an excluded directory is not descended into.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::parser::patterns::PYTHON_SHEBANG_RE;

const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Resolve inputs to the list of files to format
///
/// Files, and directories when not recursing, are passed through unless
/// excluded. Recursive walks skip hidden entries and yield Python files only.
#[must_use]
pub fn find_files(inputs: &[String], recursive: bool, exclude_patterns: &[String]) -> Vec<String> {
    let patterns = compile_patterns(exclude_patterns);
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if recursive && path.is_dir() {
            walk_directory(path, &patterns, &mut files);
        } else if !matches_any(&absolute(path).to_string_lossy(), &patterns) {
            files.push(input.clone());
        } else {
            debug!("{input}: excluded");
        }
    }

    files
}

fn compile_patterns(exclude_patterns: &[String]) -> Vec<Pattern> {
    exclude_patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Ignoring invalid exclude pattern {p:?}: {e}");
                None
            }
        })
        .collect()
}

fn walk_directory(root: &Path, patterns: &[Pattern], files: &mut Vec<String>) {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !(is_hidden(entry.path()) || is_excluded(entry.path(), patterns))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() && is_python_file(entry.path()) {
            files.push(entry.path().to_string_lossy().into_owned());
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

fn matches_any(text: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches(text))
}

/// Check if a walked entry matches any exclusion pattern
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    matches_any(&path.to_string_lossy(), patterns)
        || path
            .file_name()
            .is_some_and(|name| matches_any(&name.to_string_lossy(), patterns))
}

/// Check for a Python extension or a `python` shebang
fn is_python_file(path: &Path) -> bool {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext));
    if by_extension {
        return true;
    }

    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut first_line = Vec::new();
    if BufReader::new(file).read_until(b'\n', &mut first_line).is_err() {
        return false;
    }
    PYTHON_SHEBANG_RE.is_match(&String::from_utf8_lossy(&first_line))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::write(root.join("pkg/a.py"), "x = 1\n").unwrap();
        fs::write(root.join("pkg/b.pyi"), "x: int\n").unwrap();
        fs::write(root.join("pkg/sub/c.py"), "x = 1\n").unwrap();
        fs::write(root.join("pkg/script"), "#!/usr/bin/env python3\nx = 1\n").unwrap();
        fs::write(root.join("pkg/notes.txt"), "hello\n").unwrap();
        fs::write(root.join("pkg/.hidden.py"), "x = 1\n").unwrap();
        fs::write(root.join(".git/hook.py"), "x = 1\n").unwrap();
        fs::write(root.join("build/gen.py"), "x = 1\n").unwrap();
        dir
    }

    fn names(files: &[String], root: &Path) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                Path::new(f)
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_recursive_walk_finds_python_files() {
        let dir = tree();
        let root = dir.path().to_string_lossy().into_owned();
        let files = find_files(&[root], true, &[]);
        assert_eq!(
            names(&files, dir.path()),
            vec!["build/gen.py", "pkg/a.py", "pkg/b.pyi", "pkg/script", "pkg/sub/c.py"]
        );
    }

    #[test]
    fn test_exclude_prunes_directories() {
        let dir = tree();
        let root = dir.path().to_string_lossy().into_owned();
        let files = find_files(&[root], true, &["build".to_string(), "sub".to_string()]);
        assert_eq!(
            names(&files, dir.path()),
            vec!["pkg/a.py", "pkg/b.pyi", "pkg/script"]
        );
    }

    #[test]
    fn test_exclude_by_base_name_glob() {
        let dir = tree();
        let root = dir.path().to_string_lossy().into_owned();
        let files = find_files(&[root], true, &["*.pyi".to_string()]);
        assert!(!names(&files, dir.path()).contains(&"pkg/b.pyi".to_string()));
    }

    #[test]
    fn test_plain_inputs_pass_through() {
        let dir = tree();
        let txt = dir.path().join("pkg/notes.txt").to_string_lossy().into_owned();
        let files = find_files(&[txt.clone(), "-".to_string()], false, &[]);
        assert_eq!(files, vec![txt, "-".to_string()]);
    }

    #[test]
    fn test_directory_without_recursion_is_kept() {
        let dir = tree();
        let root = dir.path().to_string_lossy().into_owned();
        assert_eq!(find_files(&[root.clone()], false, &[]), vec![root]);
    }

    #[test]
    fn test_plain_input_excluded_by_absolute_path() {
        let dir = tree();
        let a = dir.path().join("pkg/a.py").to_string_lossy().into_owned();
        let files = find_files(&[a], false, &["*/pkg/*".to_string()]);
        assert!(files.is_empty());
    }

    #[test]
    fn test_invalid_pattern_ignored() {
        let dir = tree();
        let a = dir.path().join("pkg/a.py").to_string_lossy().into_owned();
        assert_eq!(find_files(&[a.clone()], false, &["[".to_string()]), vec![a]);
    }
}
