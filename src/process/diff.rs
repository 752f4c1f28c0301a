//! Unified diff rendering

use similar::{Algorithm, TextDiff};

/// Lines of context around each change
const CONTEXT_LINES: usize = 3;

/// Render the changes from `original` to `formatted` as a unified diff
///
/// Headers are `--- original/<identifier>` and `+++ fixed/<identifier>`.
/// Returns an empty string when the texts are equal.
#[must_use]
pub fn unified_diff(original: &str, formatted: &str, identifier: &str) -> String {
    if original == formatted {
        return String::new();
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(original, formatted);
    diff.unified_diff()
        .context_radius(CONTEXT_LINES)
        .missing_newline_hint(true)
        .header(
            &format!("original/{identifier}"),
            &format!("fixed/{identifier}"),
        )
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_line() {
        let diff = unified_diff("a\nb\n", "a\nb\nc\n", "example.py");
        let lines: Vec<&str> = diff.lines().collect();
        assert_eq!(lines[0], "--- original/example.py");
        assert_eq!(lines[1], "+++ fixed/example.py");
        assert_eq!(lines[2], "@@ -1,2 +1,3 @@");
        assert_eq!(lines[3..], [" a", " b", "+c"]);
    }

    #[test]
    fn test_equal_is_empty() {
        assert_eq!(unified_diff("x\n", "x\n", "x.py"), "");
    }

    #[test]
    fn test_missing_newline_hint() {
        let diff = unified_diff("x = 1", "x = 1\n", "x.py");
        assert!(diff.contains("\\ No newline at end of file"));
        assert!(diff.contains("+x = 1\n"));
    }

    #[test]
    fn test_context_limited() {
        let original: String = (0..20).map(|i| format!("line{i}\n")).collect();
        let formatted = original.replace("line10\n", "changed\n");
        let diff = unified_diff(&original, &formatted, "x.py");
        assert!(diff.contains("@@ -8,7 +8,7 @@"));
        assert!(!diff.contains("line6"));
    }
}
