//! Construction errors and their diagnostic codes.
//!
//! Every failure while declaring, realizing, or validating a design is a
//! [`BuildError`]. Errors carry the structural location of the problem: the
//! module name, the dotted instance path, the port involved, and the
//! generator call site when one is known. Codes `E300`--`E311` identify the
//! error kinds; `W300`--`W301` are lint warnings.

use rivet_common::SourceLoc;
use rivet_diagnostics::{Category, Diagnostic, DiagnosticCode};
use rivet_ir::{SignalId, TypeError};
use std::fmt;

/// Type or width mismatch.
pub const E300: DiagnosticCode = DiagnosticCode::new(Category::Error, 300);
/// Missing required context such as a clock.
pub const E301: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
/// Output port left unassigned by its generator.
pub const E302: DiagnosticCode = DiagnosticCode::new(Category::Error, 302);
/// Output port assigned twice.
pub const E303: DiagnosticCode = DiagnosticCode::new(Category::Error, 303);
/// Instance bindings do not match the module's inputs.
pub const E304: DiagnosticCode = DiagnosticCode::new(Category::Error, 304);
/// A module instantiates itself.
pub const E305: DiagnosticCode = DiagnosticCode::new(Category::Error, 305);
/// Reference to a port the module does not declare.
pub const E306: DiagnosticCode = DiagnosticCode::new(Category::Error, 306);
/// Signal used outside the instance that created it.
pub const E307: DiagnosticCode = DiagnosticCode::new(Category::Error, 307);
/// Two sibling instances share a name.
pub const E308: DiagnosticCode = DiagnosticCode::new(Category::Error, 308);
/// Two different descriptors share a module name.
pub const E309: DiagnosticCode = DiagnosticCode::new(Category::Error, 309);
/// Instance found in the wrong lifecycle state (never frozen).
pub const E310: DiagnosticCode = DiagnosticCode::new(Category::Error, 310);
/// A lint configured as `deny` fired.
pub const E311: DiagnosticCode = DiagnosticCode::new(Category::Error, 311);

/// Input port that nothing reads.
pub const W300: DiagnosticCode = DiagnosticCode::new(Category::Warning, 300);
/// Register declared without a reset.
pub const W301: DiagnosticCode = DiagnosticCode::new(Category::Warning, 301);

/// Convenience alias for construction results.
pub type BuildResult<T> = Result<T, BuildError>;

/// The kind of a [`BuildError`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Shape or width mismatch.
    TypeError,
    /// Missing required context.
    ConfigError,
    /// Generator left an output unassigned.
    UnassignedOutputError,
    /// Generator assigned an output twice.
    ReassignmentError,
    /// Instantiation inputs do not match.
    BindingError,
    /// A module instantiates itself.
    CyclicInstantiationError,
    /// Unknown port name.
    UnknownPort,
    /// Signal from another instance.
    ForeignSignal,
    /// Duplicate sibling instance name.
    DuplicateInstance,
    /// Duplicate module name.
    DuplicateModule,
    /// Instance in the wrong lifecycle state.
    Frozen,
    /// Denied lint.
    Lint,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An error raised while building a design.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    /// A type comparison failed.
    #[error("type error in `{path}`: {message}")]
    Type {
        /// Instance path; empty until the error leaves the generator.
        path: String,
        /// What did not match.
        message: String,
        /// Generator call site.
        loc: SourceLoc,
    },
    /// Required context is missing.
    #[error("configuration error in `{path}`: {message}")]
    Config {
        /// Instance path.
        path: String,
        /// What is missing.
        message: String,
        /// Generator call site.
        loc: SourceLoc,
    },
    /// A generator returned without assigning an output.
    #[error("output `{port}` of module `{module}` was never assigned in `{path}`")]
    UnassignedOutput {
        /// Module name.
        module: String,
        /// Instance path.
        path: String,
        /// The unassigned output.
        port: String,
    },
    /// An output was assigned a second time.
    #[error("output `{port}` of module `{module}` is already assigned in `{path}`")]
    Reassignment {
        /// Module name.
        module: String,
        /// Instance path.
        path: String,
        /// The output port.
        port: String,
        /// Call site of the second assignment.
        loc: SourceLoc,
    },
    /// Instantiation inputs do not cover exactly the module's inputs.
    #[error("cannot instantiate `{module}` as `{path}`: {message}")]
    Binding {
        /// Module name.
        module: String,
        /// Path of the instance being created.
        path: String,
        /// What is wrong with the bindings.
        message: String,
        /// Call site of the instantiation.
        loc: SourceLoc,
    },
    /// A module (transitively) instantiates itself.
    #[error("cyclic instantiation of module `{module}` at `{path}`: {}", cycle.join(" -> "))]
    CyclicInstantiation {
        /// The re-entered module.
        module: String,
        /// Path of the instance that closed the cycle.
        path: String,
        /// Module names along the cycle, starting and ending with `module`.
        cycle: Vec<String>,
        /// Call site of the instantiation.
        loc: SourceLoc,
    },
    /// A port name that the module does not declare.
    #[error("module `{module}` has no {expected} port `{port}` (in `{path}`)")]
    UnknownPort {
        /// Module name.
        module: String,
        /// Instance path.
        path: String,
        /// The requested port.
        port: String,
        /// The kind of port that was expected, e.g. `input`.
        expected: &'static str,
        /// Generator call site.
        loc: SourceLoc,
    },
    /// A signal was used by an instance that did not create it.
    #[error("signal {signal} belongs to `{owner}` and cannot be used in `{path}`")]
    ForeignSignal {
        /// The instance trying to use the signal.
        path: String,
        /// The offending signal.
        signal: SignalId,
        /// Path of the owning instance.
        owner: String,
        /// Generator call site.
        loc: SourceLoc,
    },
    /// Two sibling instances share a name.
    #[error("instance `{path}` already exists")]
    DuplicateInstance {
        /// The duplicated path.
        path: String,
        /// Call site of the second instantiation.
        loc: SourceLoc,
    },
    /// Two different descriptors declare the same module name.
    #[error("module name `{module}` is declared by two different descriptors")]
    DuplicateModule {
        /// The module name.
        module: String,
        /// Declaration site of the second descriptor.
        loc: SourceLoc,
    },
    /// An instance was used in the wrong lifecycle state.
    #[error("instance `{path}` {message}")]
    Frozen {
        /// The instance.
        path: String,
        /// What happened, e.g. `was never frozen`.
        message: String,
        /// Generator call site.
        loc: SourceLoc,
    },
    /// A lint configured as `deny` fired.
    #[error("lint `{lint}` denied in `{path}`: {message}")]
    Lint {
        /// The lint name as spelled in `rivet.toml`.
        lint: &'static str,
        /// Instance path.
        path: String,
        /// The finding.
        message: String,
    },
}

impl BuildError {
    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::Type { .. } => ErrorKind::TypeError,
            BuildError::Config { .. } => ErrorKind::ConfigError,
            BuildError::UnassignedOutput { .. } => ErrorKind::UnassignedOutputError,
            BuildError::Reassignment { .. } => ErrorKind::ReassignmentError,
            BuildError::Binding { .. } => ErrorKind::BindingError,
            BuildError::CyclicInstantiation { .. } => ErrorKind::CyclicInstantiationError,
            BuildError::UnknownPort { .. } => ErrorKind::UnknownPort,
            BuildError::ForeignSignal { .. } => ErrorKind::ForeignSignal,
            BuildError::DuplicateInstance { .. } => ErrorKind::DuplicateInstance,
            BuildError::DuplicateModule { .. } => ErrorKind::DuplicateModule,
            BuildError::Frozen { .. } => ErrorKind::Frozen,
            BuildError::Lint { .. } => ErrorKind::Lint,
        }
    }

    /// Returns the stable diagnostic code for this error.
    pub fn code(&self) -> DiagnosticCode {
        match self.kind() {
            ErrorKind::TypeError => E300,
            ErrorKind::ConfigError => E301,
            ErrorKind::UnassignedOutputError => E302,
            ErrorKind::ReassignmentError => E303,
            ErrorKind::BindingError => E304,
            ErrorKind::CyclicInstantiationError => E305,
            ErrorKind::UnknownPort => E306,
            ErrorKind::ForeignSignal => E307,
            ErrorKind::DuplicateInstance => E308,
            ErrorKind::DuplicateModule => E309,
            ErrorKind::Frozen => E310,
            ErrorKind::Lint => E311,
        }
    }

    /// Returns the instance path the error points at, if any.
    pub fn path(&self) -> Option<&str> {
        let path = match self {
            BuildError::Type { path, .. }
            | BuildError::Config { path, .. }
            | BuildError::UnassignedOutput { path, .. }
            | BuildError::Reassignment { path, .. }
            | BuildError::Binding { path, .. }
            | BuildError::CyclicInstantiation { path, .. }
            | BuildError::UnknownPort { path, .. }
            | BuildError::ForeignSignal { path, .. }
            | BuildError::DuplicateInstance { path, .. }
            | BuildError::Frozen { path, .. }
            | BuildError::Lint { path, .. } => path,
            BuildError::DuplicateModule { .. } => return None,
        };
        (!path.is_empty()).then_some(path.as_str())
    }

    /// Returns the generator call site, if one was captured.
    pub fn location(&self) -> Option<&SourceLoc> {
        match self {
            BuildError::Type { loc, .. }
            | BuildError::Config { loc, .. }
            | BuildError::Reassignment { loc, .. }
            | BuildError::Binding { loc, .. }
            | BuildError::CyclicInstantiation { loc, .. }
            | BuildError::UnknownPort { loc, .. }
            | BuildError::ForeignSignal { loc, .. }
            | BuildError::DuplicateInstance { loc, .. }
            | BuildError::DuplicateModule { loc, .. }
            | BuildError::Frozen { loc, .. } => (!loc.is_unknown()).then_some(loc),
            BuildError::UnassignedOutput { .. } | BuildError::Lint { .. } => None,
        }
    }

    /// Fills in the instance path of errors raised before it was known.
    pub(crate) fn within(mut self, instance_path: &str) -> Self {
        if let BuildError::Type { path, .. } | BuildError::Config { path, .. } = &mut self {
            if path.is_empty() {
                *path = instance_path.to_string();
            }
        }
        self
    }

    /// Converts the error into a coded diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.code(), self.to_string());
        if let Some(path) = self.path() {
            diag = diag.at_path(path);
        }
        if let Some(loc) = self.location() {
            diag = diag.at_location(loc.clone());
        }
        match self {
            BuildError::UnassignedOutput { port, .. } => diag
                .with_help(format!("call `scope.assign(\"{port}\", ...)` in the generator")),
            BuildError::Reassignment { .. } => {
                diag.with_note("each output port is a write-once slot")
            }
            BuildError::CyclicInstantiation { .. } => {
                diag.with_note("the module directly or indirectly instantiates itself")
            }
            BuildError::Config { .. } => diag.with_help(
                "declare a clock (or reset) port on this module or one of its ancestors",
            ),
            BuildError::ForeignSignal { .. } => diag.with_help(
                "pass the signal into the instance through an input port binding",
            ),
            _ => diag,
        }
    }
}

impl From<TypeError> for BuildError {
    #[track_caller]
    fn from(err: TypeError) -> Self {
        BuildError::Type {
            path: String::new(),
            message: err.to_string(),
            loc: SourceLoc::caller(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_formats() {
        assert_eq!(format!("{E300}"), "E300");
        assert_eq!(format!("{E311}"), "E311");
        assert_eq!(format!("{W301}"), "W301");
    }

    #[test]
    fn kinds_map_to_codes() {
        let err = BuildError::UnassignedOutput {
            module: "Mux2".into(),
            path: "Mux2".into(),
            port: "out".into(),
        };
        assert_eq!(err.kind(), ErrorKind::UnassignedOutputError);
        assert_eq!(err.code(), E302);
        assert_eq!(err.path(), Some("Mux2"));
        assert!(err.to_string().contains("`out`"));
    }

    #[test]
    fn type_error_lifts_and_gains_path() {
        let err: BuildError = TypeError::ZeroWidth.into();
        assert_eq!(err.kind(), ErrorKind::TypeError);
        assert_eq!(err.path(), None);
        let err = err.within("top.u0");
        assert_eq!(err.path(), Some("top.u0"));
        assert!(err.location().is_some());
    }

    #[test]
    fn within_keeps_existing_path() {
        let err = BuildError::Config {
            path: "top.inner".into(),
            message: "no clock".into(),
            loc: SourceLoc::UNKNOWN,
        };
        assert_eq!(err.within("top").path(), Some("top.inner"));
    }

    #[test]
    fn cycle_message_lists_modules() {
        let err = BuildError::CyclicInstantiation {
            module: "A".into(),
            path: "A.b.a".into(),
            cycle: vec!["A".into(), "B".into(), "A".into()],
            loc: SourceLoc::UNKNOWN,
        };
        assert!(err.to_string().ends_with("A -> B -> A"));
        assert_eq!(err.location(), None);
    }

    #[test]
    fn diagnostic_carries_code_path_and_help() {
        let err = BuildError::UnassignedOutput {
            module: "Mux2".into(),
            path: "Mux2".into(),
            port: "out".into(),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, E302);
        assert_eq!(diag.path.as_deref(), Some("Mux2"));
        assert_eq!(diag.help.len(), 1);
    }
}
