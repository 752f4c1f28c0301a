//! Command-line interface for pyformat.
//!
//! Defines CLI arguments using clap builder API

use clap::{Arg, ArgAction, Command};

/// CLI arguments parsed from command line
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Files or directories to format (`-` for standard input)
    pub files: Vec<String>,

    /// Make changes to files instead of printing diffs
    pub in_place: bool,

    /// Drill down directories recursively
    pub recursive: bool,

    /// Aggressiveness level (number of `-a` flags)
    pub aggressive: u32,

    /// Remove all unused imports, not just standard library ones
    pub remove_all_unused_imports: bool,

    /// Remove unused variables
    pub remove_unused_variables: bool,

    /// Sort imports
    pub sort_imports: bool,

    /// Add trailing commas to multi-line brackets
    pub add_trailing_comma: bool,

    /// Number of parallel jobs as given (values below 1 mean CPU count)
    pub jobs: i64,

    /// Print verbose messages
    pub verbose: bool,

    /// Exclude patterns for files/directories (glob patterns)
    pub exclude: Vec<String>,

    /// Look for and apply local configuration files
    pub config: bool,

    /// Enable debug logging
    pub debug: bool,
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("pyformat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Formats Python code to follow a consistent style.")
        .arg(
            Arg::new("in-place")
                .short('i')
                .long("in-place")
                .help("Make changes to files instead of printing diffs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .long("recursive")
                .help("Drill down directories recursively")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("aggressive")
                .short('a')
                .long("aggressive")
                .help("Use more aggressive formatters (repeat for more)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("remove-all-unused-imports")
                .long("remove-all-unused-imports")
                .help("Remove all unused imports, not just standard library (requires \"aggressive\")")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("remove-unused-variables")
                .long("remove-unused-variables")
                .help("Remove unused variables (requires \"aggressive\")")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("sort-imports")
                .long("sort-imports")
                .help("Sort imports")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("add-trailing-comma")
                .long("add-trailing-comma")
                .help("Add trailing comma to code (requires \"aggressive\")")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parallel jobs; match CPU count if value is less than 1")
                .value_name("n")
                .default_value("1")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose messages")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("exclude")
                .long("exclude")
                .help("Exclude files matching this pattern; specify this multiple times for multiple patterns")
                .value_name("pattern")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("no-config")
                .long("no-config")
                .help("Don't look for and apply local configuration files (pyformat.toml)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug logging (pipeline composition, config discovery, encodings)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("files")
                .help("Files to format")
                .value_name("files")
                .num_args(1..)
                .required(true),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Parse CLI arguments from an iterator, returning clap errors instead of
/// exiting
pub fn try_parse_args_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Ok(args_from_matches(&build_cli().try_get_matches_from(args)?))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    CliArgs {
        files: matches
            .get_many::<String>("files")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        in_place: matches.get_flag("in-place"),
        recursive: matches.get_flag("recursive"),
        aggressive: u32::from(matches.get_count("aggressive")),
        remove_all_unused_imports: matches.get_flag("remove-all-unused-imports"),
        remove_unused_variables: matches.get_flag("remove-unused-variables"),
        sort_imports: matches.get_flag("sort-imports"),
        add_trailing_comma: matches.get_flag("add-trailing-comma"),
        jobs: matches.get_one::<i64>("jobs").copied().unwrap_or(1),
        verbose: matches.get_flag("verbose"),
        exclude: matches
            .get_many::<String>("exclude")
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default(),
        config: !matches.get_flag("no-config"),
        debug: matches.get_flag("debug"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_builds() {
        let cmd = build_cli();
        assert_eq!(cmd.get_name(), "pyformat");
        cmd.debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let args = parse_args_from(["pyformat", "file.py"]);
        assert_eq!(args.files, vec!["file.py".to_string()]);
        assert!(!args.in_place);
        assert!(!args.recursive);
        assert_eq!(args.aggressive, 0);
        assert_eq!(args.jobs, 1);
        assert!(args.config);
        assert!(args.exclude.is_empty());
    }

    #[test]
    fn test_aggressive_counts() {
        let args = parse_args_from(["pyformat", "-aa", "file.py"]);
        assert_eq!(args.aggressive, 2);
        let args = parse_args_from(["pyformat", "-a", "--aggressive", "-a", "file.py"]);
        assert_eq!(args.aggressive, 3);
    }

    #[test]
    fn test_stdin_sentinel() {
        let args = parse_args_from(["pyformat", "-i", "-"]);
        assert_eq!(args.files, vec!["-".to_string()]);
        assert!(args.in_place);
    }

    #[test]
    fn test_jobs_negative_allowed() {
        let args = parse_args_from(["pyformat", "-j", "-1", "file.py"]);
        assert_eq!(args.jobs, -1);
        let args = parse_args_from(["pyformat", "--jobs", "4", "file.py"]);
        assert_eq!(args.jobs, 4);
    }

    #[test]
    fn test_exclude_multiple() {
        let args = parse_args_from([
            "pyformat",
            "--exclude",
            "build",
            "--exclude",
            "*_pb2.py",
            "src",
        ]);
        assert_eq!(args.exclude, vec!["build".to_string(), "*_pb2.py".to_string()]);
    }

    #[test]
    fn test_no_config() {
        let args = parse_args_from(["pyformat", "--no-config", "file.py"]);
        assert!(!args.config);
    }

    #[test]
    fn test_aggressive_only_flags() {
        let args = parse_args_from([
            "pyformat",
            "-a",
            "--remove-all-unused-imports",
            "--remove-unused-variables",
            "--add-trailing-comma",
            "--sort-imports",
            "file.py",
        ]);
        assert!(args.remove_all_unused_imports);
        assert!(args.remove_unused_variables);
        assert!(args.add_trailing_comma);
        assert!(args.sort_imports);
    }

    #[test]
    fn test_files_required() {
        assert!(try_parse_args_from(["pyformat"]).is_err());
    }
}
