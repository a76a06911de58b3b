//! The compilation driver and backend hand-off.
//!
//! [`compile`] realizes every root module, validates the complete hierarchy,
//! and returns a [`ValidatedDesign`]. A [`Backend`] only ever receives a
//! `ValidatedDesign`, which can only be produced by validation, so no
//! partially realized instance is ever exported. [`System`] bundles roots,
//! configuration, and a diagnostic sink the way a project file would.

use std::io::Write;
use std::ops::Deref;

use rivet_config::SystemConfig;
use rivet_diagnostics::DiagnosticSink;
use rivet_ir::Design;
use tracing::{debug, info, instrument};

use crate::context::BuildContext;
use crate::descriptor::ModuleRef;
use crate::errors::{BuildError, BuildResult};
use crate::instantiate::Bindings;
use crate::validate::validate;

/// A design that passed full validation. Read-only.
#[derive(Debug, Clone)]
pub struct ValidatedDesign {
    design: Design,
}

impl ValidatedDesign {
    pub(crate) fn new(design: Design) -> Self {
        Self { design }
    }

    /// Returns the validated design.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Gives up the validation guarantee and returns the raw design.
    pub fn into_inner(self) -> Design {
        self.design
    }
}

impl Deref for ValidatedDesign {
    type Target = Design;

    fn deref(&self) -> &Design {
        &self.design
    }
}

/// Realizes and validates a design.
///
/// Each root is instantiated under its own module name with no bindings, so
/// its inputs (clock and reset included) become top-level ports. The first
/// error aborts compilation; it is also emitted to `sink` as a diagnostic.
#[instrument(skip_all, fields(system = %config.system.name, roots = roots.len()))]
pub fn compile(
    roots: &[ModuleRef],
    config: &SystemConfig,
    sink: &DiagnosticSink,
) -> BuildResult<ValidatedDesign> {
    let result = realize_and_validate(roots, config, sink);
    if let Err(err) = &result {
        sink.emit(err.to_diagnostic());
    }
    result
}

fn realize_and_validate(
    roots: &[ModuleRef],
    config: &SystemConfig,
    sink: &DiagnosticSink,
) -> BuildResult<ValidatedDesign> {
    let mut ctx = BuildContext::new(config);
    for root in roots {
        info!(module = root.name(), "realizing root");
        ctx.instantiate(root, None, root.name(), &Bindings::new(), root.loc().clone())?;
    }
    let design = ctx.into_design();
    let validated = validate(design, config, sink)?;
    info!(
        modules = validated.module_count(),
        instances = validated.instance_count(),
        signals = validated.signals.len(),
        warnings = sink.warning_count(),
        "compiled"
    );
    Ok(validated)
}

/// Errors raised by a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Writing the output failed.
    #[error("backend i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding the design failed.
    #[error("failed to encode design: {0}")]
    Encode(#[from] serde_json::Error),
    /// Any other backend failure.
    #[error("{0}")]
    Other(String),
}

/// A consumer of validated designs, e.g. an HDL emitter.
pub trait Backend {
    /// Lowers or exports `design`.
    ///
    /// `config.system.output_directory` is passed through untouched; the
    /// backend decides what it means.
    fn emit(&mut self, design: &ValidatedDesign, config: &SystemConfig) -> Result<(), BackendError>;
}

/// Writes the design IR as pretty-printed JSON.
#[derive(Debug)]
pub struct JsonBackend<W: Write> {
    writer: W,
}

impl<W: Write> JsonBackend<W> {
    /// Creates a backend writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Backend for JsonBackend<W> {
    fn emit(
        &mut self,
        design: &ValidatedDesign,
        _config: &SystemConfig,
    ) -> Result<(), BackendError> {
        serde_json::to_writer_pretty(&mut self.writer, design.design())?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Discards designs, counting how many it received.
#[derive(Debug, Default)]
pub struct NullBackend {
    /// Number of designs emitted so far.
    pub emitted: usize,
}

impl Backend for NullBackend {
    fn emit(
        &mut self,
        _design: &ValidatedDesign,
        _config: &SystemConfig,
    ) -> Result<(), BackendError> {
        self.emitted += 1;
        Ok(())
    }
}

/// Errors from [`System::compile_with`].
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Realization or validation failed.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// A set of root modules compiled together under one configuration.
#[derive(Debug)]
pub struct System {
    roots: Vec<ModuleRef>,
    config: SystemConfig,
    sink: DiagnosticSink,
}

impl System {
    /// Creates a system from roots and a configuration.
    pub fn new(roots: impl IntoIterator<Item = ModuleRef>, config: SystemConfig) -> Self {
        Self {
            roots: roots.into_iter().collect(),
            config,
            sink: DiagnosticSink::new(),
        }
    }

    /// Creates a system with default configuration and the given name.
    pub fn named(roots: impl IntoIterator<Item = ModuleRef>, name: impl Into<String>) -> Self {
        Self::new(roots, SystemConfig::named(name))
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Returns the diagnostics collected so far.
    pub fn sink(&self) -> &DiagnosticSink {
        &self.sink
    }

    /// Realizes and validates the design.
    pub fn compile(&self) -> BuildResult<ValidatedDesign> {
        compile(&self.roots, &self.config, &self.sink)
    }

    /// Realizes, validates, and hands the design to `backend`.
    pub fn compile_with(&self, backend: &mut dyn Backend) -> Result<ValidatedDesign, CompileError> {
        let design = self.compile()?;
        debug!(system = %self.config.system.name, "emitting design");
        backend.emit(&design, &self.config)?;
        Ok(design)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ModuleDescriptor, TypeSpec};
    use crate::errors::ErrorKind;

    fn pass_through() -> ModuleRef {
        ModuleDescriptor::builder("Pass")
            .input("a", TypeSpec::bits(2))
            .output("y", TypeSpec::bits(2))
            .generator(|s| {
                let a = s.input("a")?;
                s.assign("y", a)
            })
            .build()
            .unwrap()
    }

    #[test]
    fn compile_with_null_backend() {
        let system = System::named([pass_through()], "sys");
        let mut backend = NullBackend::default();
        let design = system.compile_with(&mut backend).unwrap();
        assert_eq!(backend.emitted, 1);
        assert_eq!(design.name, "sys");
        assert_eq!(design.roots.len(), 1);
        assert!(!system.sink().has_errors());
    }

    #[test]
    fn json_backend_writes_design() {
        let system = System::named([pass_through()], "sys");
        let mut backend = JsonBackend::new(Vec::new());
        system.compile_with(&mut backend).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&backend.into_inner()).unwrap();
        assert_eq!(json["name"], "sys");
        assert!(json["names"].as_array().unwrap().iter().any(|n| n == "Pass"));
    }

    #[test]
    fn failed_compile_reaches_no_backend() {
        let broken = ModuleDescriptor::builder("Broken")
            .output("y", TypeSpec::bits(1))
            .build()
            .unwrap();
        let system = System::named([broken], "sys");
        let mut backend = NullBackend::default();
        let err = system.compile_with(&mut backend).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Build(ref e) if e.kind() == ErrorKind::UnassignedOutputError
        ));
        assert_eq!(backend.emitted, 0);
        assert_eq!(system.sink().error_count(), 1);
    }

    #[test]
    fn empty_root_list_compiles() {
        let sink = DiagnosticSink::new();
        let design = compile(&[], &SystemConfig::named("empty"), &sink).unwrap();
        assert_eq!(design.instance_count(), 0);
    }
}
