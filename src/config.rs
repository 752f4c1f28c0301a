//! Configuration management for pyformat.
//!
//! Two layers of configuration exist:
//! - [`Config`]: the immutable run configuration built from CLI arguments.
//!   It decides which stages run and how files are dispatched.
//! - [`StyleSettings`]: per-file style parameters resolved from local
//!   `pyformat.toml` files. Resolution happens once per file, before stages
//!   are constructed, so stages never look anything up themselves.
//!
//! Config files are auto-discovered by searching parent directories from the
//! file being formatted up to the filesystem root, plus the user's home
//! directory. Closer files override farther ones.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::cli::CliArgs;
use crate::process::is_stdin;

/// Config file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["pyformat.toml"];

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    // Try HOME environment variable first (works on Unix and some Windows setups)
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    // Fallback for Windows
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

/// Run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Aggressiveness level; 0 disables the higher-risk stages
    pub aggressive: u32,
    /// Consult local `pyformat.toml` files
    pub apply_local_config: bool,
    pub remove_all_unused_imports: bool,
    pub remove_unused_variables: bool,
    pub sort_imports: bool,
    pub add_trailing_comma: bool,
    /// Overwrite files (or echo standard input) instead of printing diffs
    pub in_place: bool,
    pub recursive: bool,
    /// Glob patterns excluding files and directories, in command-line order
    pub exclude_patterns: Vec<String>,
    /// Worker count, always at least 1
    pub jobs: usize,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            aggressive: 0,
            apply_local_config: true,
            remove_all_unused_imports: false,
            remove_unused_variables: false,
            sort_imports: false,
            add_trailing_comma: false,
            in_place: false,
            recursive: false,
            exclude_patterns: Vec::new(),
            jobs: 1,
            verbose: false,
        }
    }
}

impl Config {
    /// Build the run configuration from parsed arguments
    ///
    /// A job count below 1 resolves to the available hardware parallelism.
    #[must_use]
    pub fn from_args(args: &CliArgs) -> Self {
        let jobs = usize::try_from(args.jobs)
            .ok()
            .filter(|&n| n >= 1)
            .unwrap_or_else(default_jobs);
        Config {
            aggressive: args.aggressive,
            apply_local_config: args.config,
            remove_all_unused_imports: args.remove_all_unused_imports,
            remove_unused_variables: args.remove_unused_variables,
            sort_imports: args.sort_imports,
            add_trailing_comma: args.add_trailing_comma,
            in_place: args.in_place,
            recursive: args.recursive,
            exclude_patterns: args.exclude.clone(),
            jobs,
            verbose: args.verbose,
        }
    }

    /// Validate flag combinations
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.jobs > 1 && !self.in_place {
            return Some("parallel jobs requires --in-place".to_string());
        }
        if self.aggressive == 0 {
            if self.remove_all_unused_imports {
                return Some("--remove-all-unused-imports requires --aggressive".to_string());
            }
            if self.remove_unused_variables {
                return Some("--remove-unused-variables requires --aggressive".to_string());
            }
            if self.add_trailing_comma {
                return Some("--add-trailing-comma requires --aggressive".to_string());
            }
        }
        None
    }

    /// Validate the configuration against the inputs it will run on
    ///
    /// Standard input can only be consumed once, so it cannot be combined
    /// with parallel jobs.
    #[must_use]
    pub fn validate_inputs(&self, files: &[String]) -> Option<String> {
        if let Some(error) = self.validate() {
            return Some(error);
        }
        if self.jobs > 1 && files.iter().any(|f| is_stdin(f)) {
            return Some("standard input cannot be combined with parallel jobs".to_string());
        }
        None
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Preferred quote character for string literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    #[must_use]
    pub fn char(self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

/// Style parameters resolved from local configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSettings {
    /// Spaces per indentation level (default: 4)
    pub indent_size: usize,
    /// Maximum consecutive blank lines at top level (default: 2)
    pub max_blank_lines: usize,
    /// Quote character string literals are unified to (default: single)
    pub quote_style: QuoteStyle,
}

impl Default for StyleSettings {
    fn default() -> Self {
        StyleSettings {
            indent_size: 4,
            max_blank_lines: 2,
            quote_style: QuoteStyle::Single,
        }
    }
}

/// Partial settings for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialSettings {
    indent_size: Option<usize>,
    max_blank_lines: Option<usize>,
    quote_style: Option<QuoteStyle>,
}

impl StyleSettings {
    /// Maximum reasonable indent size
    const MAX_INDENT: usize = 16;

    /// Resolve the settings that apply to `filename`
    ///
    /// Standard input has no on-disk context and always gets the defaults,
    /// as does every file when local configuration is disabled.
    #[must_use]
    pub fn resolve(config: &Config, filename: &str) -> Self {
        if !config.apply_local_config || is_stdin(filename) {
            return Self::default();
        }
        Self::from_discovered_files(Path::new(filename))
    }

    /// Load settings from a TOML file on top of the defaults
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let partial: PartialSettings = toml::from_str(&contents)?;
        let mut settings = Self::default();
        settings.apply_partial(&partial);
        Ok(settings)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: &PartialSettings) {
        if let Some(v) = partial.indent_size {
            if (1..=Self::MAX_INDENT).contains(&v) {
                self.indent_size = v;
            } else {
                warn!("ignoring indent_size {v}: must be between 1 and {}", Self::MAX_INDENT);
            }
        }
        if let Some(v) = partial.max_blank_lines {
            self.max_blank_lines = v;
        }
        if let Some(v) = partial.quote_style {
            self.quote_style = v;
        }
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        let start_dir = if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            std::path::absolute(start_path)
                .ok()
                .and_then(|p| p.parent().map(Path::to_path_buf))
        };

        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Root first, so closer files come later and win
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge settings from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Returns defaults if no files are found; unreadable files are skipped
    /// with a warning.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let config_files = Self::discover_config_files(start_path);
        let mut settings = Self::default();
        for path in &config_files {
            debug!("applying config file {}", path.display());
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<PartialSettings>(&contents) {
                    Ok(partial) => settings.apply_partial(&partial),
                    Err(e) => warn!("failed to parse {}: {e}", path.display()),
                },
                Err(e) => warn!("failed to read {}: {e}", path.display()),
            }
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_args_from;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.aggressive, 0);
        assert_eq!(config.jobs, 1);
        assert!(config.apply_local_config);
        assert!(config.validate().is_none());
    }

    #[test]
    fn test_from_args() {
        let args = parse_args_from(["pyformat", "-i", "-a", "-j", "3", "--no-config", "x.py"]);
        let config = Config::from_args(&args);
        assert!(config.in_place);
        assert_eq!(config.aggressive, 1);
        assert_eq!(config.jobs, 3);
        assert!(!config.apply_local_config);
    }

    #[test]
    fn test_jobs_below_one_use_cpu_count() {
        let args = parse_args_from(["pyformat", "-j", "0", "x.py"]);
        assert!(Config::from_args(&args).jobs >= 1);
        let args = parse_args_from(["pyformat", "-j", "-3", "x.py"]);
        assert!(Config::from_args(&args).jobs >= 1);
    }

    #[test]
    fn test_validate_parallel_requires_in_place() {
        let config = Config {
            jobs: 4,
            ..Default::default()
        };
        assert_eq!(
            config.validate().as_deref(),
            Some("parallel jobs requires --in-place")
        );
        let config = Config {
            jobs: 4,
            in_place: true,
            ..Default::default()
        };
        assert!(config.validate().is_none());
    }

    #[test]
    fn test_validate_aggressive_only_flags() {
        let cases = [
            (
                Config {
                    remove_all_unused_imports: true,
                    ..Default::default()
                },
                "--remove-all-unused-imports requires --aggressive",
            ),
            (
                Config {
                    remove_unused_variables: true,
                    ..Default::default()
                },
                "--remove-unused-variables requires --aggressive",
            ),
            (
                Config {
                    add_trailing_comma: true,
                    ..Default::default()
                },
                "--add-trailing-comma requires --aggressive",
            ),
        ];
        for (config, message) in cases {
            assert_eq!(config.validate().as_deref(), Some(message));
            let aggressive = Config {
                aggressive: 1,
                ..config
            };
            assert!(aggressive.validate().is_none());
        }
    }

    #[test]
    fn test_validate_inputs_rejects_parallel_stdin() {
        let config = Config {
            jobs: 2,
            in_place: true,
            ..Default::default()
        };
        let files = vec!["a.py".to_string(), "-".to_string()];
        assert_eq!(
            config.validate_inputs(&files).as_deref(),
            Some("standard input cannot be combined with parallel jobs")
        );
        let sequential = Config {
            jobs: 1,
            ..config
        };
        assert!(sequential.validate_inputs(&files).is_none());
    }

    #[test]
    fn test_settings_defaults_for_stdin() {
        let config = Config::default();
        assert_eq!(StyleSettings::resolve(&config, "-"), StyleSettings::default());
    }

    #[test]
    fn test_settings_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyformat.toml");
        std::fs::write(&path, "indent_size = 2\nquote_style = \"double\"\n").unwrap();
        let settings = StyleSettings::from_toml_file(&path).unwrap();
        assert_eq!(settings.indent_size, 2);
        assert_eq!(settings.quote_style, QuoteStyle::Double);
        assert_eq!(settings.max_blank_lines, 2);
    }

    #[test]
    fn test_settings_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyformat.toml");
        std::fs::write(&path, "line_length = 100\n").unwrap();
        assert!(StyleSettings::from_toml_file(&path).is_err());
    }

    #[test]
    fn test_settings_closer_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("pkg");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(
            dir.path().join("pyformat.toml"),
            "indent_size = 2\nmax_blank_lines = 1\n",
        )
        .unwrap();
        std::fs::write(nested.join("pyformat.toml"), "indent_size = 8\n").unwrap();
        let file = nested.join("mod.py");
        std::fs::write(&file, "x = 1\n").unwrap();

        let config = Config::default();
        let settings = StyleSettings::resolve(&config, file.to_str().unwrap());
        assert_eq!(settings.indent_size, 8);
        assert_eq!(settings.max_blank_lines, 1);

        let no_config = Config {
            apply_local_config: false,
            ..Default::default()
        };
        assert_eq!(
            StyleSettings::resolve(&no_config, file.to_str().unwrap()),
            StyleSettings::default()
        );
    }

    #[test]
    fn test_invalid_indent_size_ignored() {
        let mut settings = StyleSettings::default();
        settings.apply_partial(&PartialSettings {
            indent_size: Some(0),
            ..Default::default()
        });
        assert_eq!(settings.indent_size, 4);
    }

    #[test]
    fn test_quote_style_char() {
        assert_eq!(QuoteStyle::Single.char(), '\'');
        assert_eq!(QuoteStyle::Double.char(), '"');
    }
}
