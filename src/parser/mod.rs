//! Python source scanning utilities.
//!
//! This module provides the lexical infrastructure shared by the stages:
//! - [`CharFilter`]: Classifies bytes as code, string literal, or comment
//! - [`stream`]: Physical lines with their bracket and string state
//! - [`patterns`]: Precompiled regex patterns for Python syntax elements
//!
//! Nothing here parses Python grammar; it only knows enough about strings,
//! comments, brackets, and line structure for text-level fixes to stay
//! out of string contents and keep statements intact.

pub mod char_filter;
pub mod patterns;
pub mod stream;

pub use char_filter::{CharFilter, Segment, SegmentKind, StringLiteral};
pub use stream::{analyze_lines, OpenBracket, SourceLine};
