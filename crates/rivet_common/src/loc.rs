//! Call-site locations captured from generator code.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::panic::Location;

/// A source location inside user generator code.
///
/// Captured with `#[track_caller]` when a port is declared, a signal is
/// created, or an error is raised, so diagnostics can point at the line of
/// Rust that built the offending piece of hardware.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SourceLoc {
    /// The source file path as reported by the compiler.
    pub file: Cow<'static, str>,
    /// The line number (1-indexed).
    pub line: u32,
    /// The column number (1-indexed).
    pub column: u32,
}

impl SourceLoc {
    /// A placeholder used when no caller location is available.
    pub const UNKNOWN: SourceLoc = SourceLoc {
        file: Cow::Borrowed("<unknown>"),
        line: 0,
        column: 0,
    };

    /// Captures the location of the caller.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    /// Returns `true` if this is the [`UNKNOWN`](Self::UNKNOWN) placeholder.
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl From<&'static Location<'static>> for SourceLoc {
    fn from(loc: &'static Location<'static>) -> Self {
        Self {
            file: Cow::Borrowed(loc.file()),
            line: loc.line(),
            column: loc.column(),
        }
    }
}

impl Default for SourceLoc {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_points_at_this_file() {
        let loc = SourceLoc::caller();
        assert!(loc.file.ends_with("loc.rs"));
        assert!(loc.line > 0);
        assert!(!loc.is_unknown());
    }

    #[test]
    fn display_format() {
        let loc = SourceLoc {
            file: Cow::Borrowed("src/mux.rs"),
            line: 12,
            column: 9,
        };
        assert_eq!(format!("{loc}"), "src/mux.rs:12:9");
    }

    #[test]
    fn unknown_default() {
        assert!(SourceLoc::default().is_unknown());
    }
}
