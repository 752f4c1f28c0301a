//! pyformat - Formats Python code to follow a consistent style
//!
//! Runs an ordered pipeline of conservative formatting stages over Python
//! files, printing diffs or rewriting files in place, in parallel.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]

pub mod app;
pub mod cli;
pub mod config;
pub mod encoding;
pub mod error;
pub mod format;
pub mod interrupt;
pub mod parser;
pub mod process;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::{Config, QuoteStyle, StyleSettings};
pub use encoding::{detect_encoding, TextEncoding};
pub use error::Result;
pub use format::Stage;
pub use interrupt::Interrupt;
pub use process::{format_multiple_files, BatchResult, Outcome, Pipeline, Streams};
