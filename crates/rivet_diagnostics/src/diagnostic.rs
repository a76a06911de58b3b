//! Structured diagnostic messages with severity, codes, and hierarchy locations.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use rivet_common::SourceLoc;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message.
///
/// Each diagnostic includes:
/// - A severity level and unique code
/// - A primary message
/// - The instance path in the design hierarchy where the issue was found
/// - The generator call site that produced the offending construct, if known
/// - Optional notes and help text
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The unique code identifying the kind of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Dotted instance path (e.g. `Top.or0`), if the issue is inside a design.
    pub path: Option<String>,
    /// Generator call site, if known.
    pub location: Option<SourceLoc>,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
    /// Actionable suggestions (e.g., "help: ...").
    pub help: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic with the given code and message.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message)
    }

    /// Creates a new warning diagnostic with the given code and message.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message)
    }

    fn with_severity(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            path: None,
            location: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Sets the instance path.
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the generator call site. Unknown locations are ignored.
    pub fn at_location(mut self, loc: SourceLoc) -> Self {
        if !loc.is_unknown() {
            self.location = Some(loc);
        }
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn create_error() {
        let code = DiagnosticCode::new(Category::Error, 300);
        let diag = Diagnostic::error(code, "width mismatch");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "width mismatch");
        assert!(diag.path.is_none());
    }

    #[test]
    fn create_warning() {
        let code = DiagnosticCode::new(Category::Warning, 300);
        let diag = Diagnostic::warning(code, "input `b` is never read");
        assert_eq!(diag.severity, Severity::Warning);
    }

    #[test]
    fn builder_methods() {
        let code = DiagnosticCode::new(Category::Error, 302);
        let diag = Diagnostic::error(code, "output `out` never assigned")
            .at_path("Top.mux")
            .at_location(SourceLoc::caller())
            .with_note("every output must be assigned exactly once")
            .with_help("call `scope.assign(\"out\", ...)` in the generator");
        assert_eq!(diag.path.as_deref(), Some("Top.mux"));
        assert!(diag.location.is_some());
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn unknown_location_is_dropped() {
        let code = DiagnosticCode::new(Category::Error, 300);
        let diag = Diagnostic::error(code, "x").at_location(SourceLoc::UNKNOWN);
        assert!(diag.location.is_none());
    }
}
