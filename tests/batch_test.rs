//! Batch dispatch tests over real files

use std::fs;
use std::io::Cursor;

use pyformat::process::{dispatch, format_multiple_files, Streams};
use pyformat::{Config, Interrupt};
use tempfile::TempDir;

fn hermetic() -> Config {
    Config {
        apply_local_config: false,
        ..Default::default()
    }
}

#[test]
fn test_error_change_and_unchanged_aggregate() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("a.py");
    let changed = dir.path().join("b.py");
    let unchanged = dir.path().join("c.py");
    fs::write(&changed, "x = [1,2]\n").unwrap();
    fs::write(&unchanged, "x = 1\n").unwrap();
    let inputs: Vec<String> = [&missing, &changed, &unchanged]
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    let mut stdin = Cursor::new(Vec::new());
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = format_multiple_files(
        &inputs,
        &hermetic(),
        &Interrupt::new(),
        &mut Streams {
            stdin: &mut stdin,
            stdout: &mut out,
            stderr: &mut err,
        },
    );

    assert!(result.any_changed);
    assert!(result.any_errored);
    assert_eq!(result.exit_code(), 1);

    let out = String::from_utf8(out).unwrap();
    let err = String::from_utf8(err).unwrap();
    assert_eq!(out.matches("--- original/").count(), 1);
    assert!(out.contains(&format!("+++ fixed/{}", inputs[1])));
    assert_eq!(err.lines().count(), 1);
    assert!(err.starts_with(&format!("{}: ", inputs[0])));
}

#[test]
fn test_stdin_in_place_emits_unchanged_text() {
    let config = Config {
        in_place: true,
        ..hermetic()
    };
    let mut stdin = Cursor::new(b"x = 1\n".to_vec());
    let mut out = Vec::new();
    let mut err = Vec::new();
    let outcomes = dispatch(
        &["-".to_string()],
        &config,
        &Interrupt::new(),
        &mut Streams {
            stdin: &mut stdin,
            stdout: &mut out,
            stderr: &mut err,
        },
    );

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].changed);
    assert_eq!(out, b"x = 1\n");
}

#[test]
fn test_recursive_in_place() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("pkg/skip")).unwrap();
    fs::write(dir.path().join("pkg/a.py"), "f(a,b)\n").unwrap();
    fs::write(dir.path().join("pkg/skip/b.py"), "f(a,b)\n").unwrap();
    let config = Config {
        in_place: true,
        recursive: true,
        exclude_patterns: vec!["skip".to_string()],
        ..hermetic()
    };

    let mut stdin = Cursor::new(Vec::new());
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = format_multiple_files(
        &[dir.path().to_string_lossy().into_owned()],
        &config,
        &Interrupt::new(),
        &mut Streams {
            stdin: &mut stdin,
            stdout: &mut out,
            stderr: &mut err,
        },
    );

    assert!(result.any_changed);
    assert!(!result.any_errored);
    assert_eq!(
        fs::read_to_string(dir.path().join("pkg/a.py")).unwrap(),
        "f(a, b)\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("pkg/skip/b.py")).unwrap(),
        "f(a,b)\n"
    );
}

#[test]
fn test_local_config_applies_per_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pyformat.toml"), "quote_style = \"double\"\n").unwrap();
    let path = dir.path().join("a.py");
    fs::write(&path, "x = 'a'\n").unwrap();
    let config = Config {
        in_place: true,
        ..Default::default()
    };

    let mut stdin = Cursor::new(Vec::new());
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = format_multiple_files(
        &[path.to_string_lossy().into_owned()],
        &config,
        &Interrupt::new(),
        &mut Streams {
            stdin: &mut stdin,
            stdout: &mut out,
            stderr: &mut err,
        },
    );

    assert!(result.any_changed);
    assert_eq!(fs::read_to_string(&path).unwrap(), "x = \"a\"\n");
}
