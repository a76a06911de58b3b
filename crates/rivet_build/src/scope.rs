//! The realization scope handed to a generator.
//!
//! A [`Scope`] is bound to exactly one instance while its generator runs. It
//! exposes the instance's input signals, a write-once slot per output port,
//! instantiation of children, and (through the `impl Scope` block in
//! [`ops`](crate::ops)) the operator library. Every signal a scope creates is
//! owned by its instance; signals from other instances are rejected.

use rivet_common::{BitsValue, SourceLoc};
use rivet_ir::{InstanceId, PortRole, Signal, SignalKind, TypeDb, TypeId};

use crate::context::BuildContext;
use crate::descriptor::{ModuleDescriptor, TypeSpec};
use crate::errors::{BuildError, BuildResult};
use crate::eval;
use crate::instantiate::{Bindings, InstanceHandle};

/// Per-instance view of the design under construction.
pub struct Scope<'c> {
    pub(crate) ctx: &'c mut BuildContext,
    pub(crate) instance: InstanceId,
    desc: &'c ModuleDescriptor,
}

impl<'c> Scope<'c> {
    pub(crate) fn new(
        ctx: &'c mut BuildContext,
        instance: InstanceId,
        desc: &'c ModuleDescriptor,
    ) -> Self {
        Self {
            ctx,
            instance,
            desc,
        }
    }

    /// Returns the ID of the instance being realized.
    pub fn instance_id(&self) -> InstanceId {
        self.instance
    }

    /// Returns the name of the module being realized.
    pub fn module_name(&self) -> &str {
        self.desc.name()
    }

    /// Returns the dotted path of the instance being realized.
    pub fn path(&self) -> &str {
        &self.ctx.design.instances[self.instance].path
    }

    /// Returns the design's type database for building ad-hoc types.
    pub fn types(&mut self) -> &mut TypeDb {
        &mut self.ctx.design.types
    }

    /// Interns a [`TypeSpec`].
    #[track_caller]
    pub fn ty(&mut self, spec: &TypeSpec) -> BuildResult<TypeId> {
        let loc = SourceLoc::caller();
        spec.intern(&mut self.ctx.design.types)
            .map_err(|e| self.type_error(e.to_string(), loc))
    }

    /// Renders the type of a signal.
    pub fn type_name(&self, signal: Signal) -> String {
        self.ctx.design.types.display(signal.ty)
    }

    /// Returns the packed bit width of a signal.
    pub fn width(&self, signal: Signal) -> u32 {
        self.ctx.design.types.width_of(signal.ty)
    }

    /// Returns the signal carried by input port `name`.
    #[track_caller]
    pub fn input(&self, name: &str) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        self.find_input(name, PortRole::Data)
            .ok_or_else(|| self.unknown_port(name, "input", loc))
    }

    /// Returns the instance's clock.
    ///
    /// Fails with a configuration error if the module declares no clock.
    #[track_caller]
    pub fn clock(&self) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        self.timing_port(PortRole::Clock)
            .ok_or_else(|| self.config_error("module declares no clock port", loc))
    }

    /// Returns the instance's reset.
    ///
    /// Fails with a configuration error if the module declares no reset.
    #[track_caller]
    pub fn reset(&self) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        self.timing_port(PortRole::Reset)
            .ok_or_else(|| self.config_error("module declares no reset port", loc))
    }

    /// Assigns `signal` to output port `name`.
    ///
    /// Each output can be assigned once, with a signal of exactly the port's
    /// type that was created in this scope.
    #[track_caller]
    pub fn assign(&mut self, name: &str, signal: Signal) -> BuildResult<()> {
        let loc = SourceLoc::caller();
        let port = self
            .ctx
            .interner
            .get(name)
            .and_then(|id| self.ctx.design.module_of(self.instance).port(id))
            .filter(|p| p.is_output())
            .map(|p| (p.name, p.ty))
            .ok_or_else(|| self.unknown_port(name, "output", loc.clone()))?;
        let (port, port_ty) = port;
        self.check(signal, &loc)?;
        if signal.ty != port_ty {
            let types = &self.ctx.design.types;
            let message = format!(
                "output `{name}` expects {}, got {}",
                types.display(port_ty),
                types.display(signal.ty)
            );
            return Err(self.type_error(message, loc));
        }
        let module = self.desc.name().to_string();
        let inst = self.ctx.design.instances.get_mut(self.instance);
        let path = inst.path.clone();
        match inst.output_mut(port) {
            Some(slot) if slot.signal.is_some() => Err(BuildError::Reassignment {
                module,
                path,
                port: name.to_string(),
                loc,
            }),
            Some(slot) => {
                slot.signal = Some(signal.id);
                Ok(())
            }
            None => Err(BuildError::UnknownPort {
                module,
                path,
                port: name.to_string(),
                expected: "output",
                loc,
            }),
        }
    }

    /// Instantiates `desc` as a child named `name`, realizing it immediately.
    ///
    /// The returned handle's outputs are signals of this scope.
    #[track_caller]
    pub fn instantiate(
        &mut self,
        desc: &ModuleDescriptor,
        name: &str,
        bindings: Bindings,
    ) -> BuildResult<InstanceHandle> {
        let loc = SourceLoc::caller();
        let child = self
            .ctx
            .instantiate(desc, Some(self.instance), name, &bindings, loc.clone())?;
        let module = self.ctx.design.module_of(child);
        let outputs: Vec<_> = module.outputs().map(|p| (p.name, p.ty)).collect();
        let mut handle = InstanceHandle {
            id: child,
            module: desc.name().to_string(),
            path: self.ctx.design.instances[child].path.clone(),
            outputs: Vec::with_capacity(outputs.len()),
        };
        for (port, ty) in outputs {
            let sig = self.push(
                ty,
                SignalKind::InstanceOutput {
                    instance: child,
                    port,
                },
                loc.clone(),
            );
            handle
                .outputs
                .push((self.ctx.resolve(port).to_string(), sig));
        }
        Ok(handle)
    }

    /// Attaches a debug name to a signal of this scope.
    #[track_caller]
    pub fn name_signal(&mut self, signal: Signal, name: &str) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        self.check(signal, &loc)?;
        let ident = self.ctx.interner.get_or_intern(name);
        self.ctx.design.signals.get_mut(signal.id).name = Some(ident);
        Ok(signal)
    }

    /// Evaluates a signal at construction time.
    ///
    /// Returns `None` if the value depends on a register or on an input that
    /// is not driven by a constant.
    pub fn try_fold(&self, signal: Signal) -> Option<BitsValue> {
        eval::fold(&self.ctx.design, signal.id, &eval::Env::new())
    }

    fn find_input(&self, name: &str, role: PortRole) -> Option<Signal> {
        let ident = self.ctx.interner.get(name)?;
        let port = self.ctx.design.module_of(self.instance).port(ident)?;
        if !port.is_input() || port.role != role {
            return None;
        }
        let id = self.ctx.design.instances[self.instance].port_signal(ident)?;
        Some(Signal::new(id, port.ty))
    }

    fn timing_port(&self, role: PortRole) -> Option<Signal> {
        let module = self.ctx.design.module_of(self.instance);
        let port = module.ports.iter().find(|p| p.role == role)?;
        let id = self.ctx.design.instances[self.instance].port_signal(port.name)?;
        Some(Signal::new(id, port.ty))
    }

    pub(crate) fn push(&mut self, ty: TypeId, kind: SignalKind, loc: SourceLoc) -> Signal {
        self.ctx.alloc_signal(self.instance, ty, kind, loc)
    }

    pub(crate) fn check(&self, signal: Signal, loc: &SourceLoc) -> BuildResult<()> {
        self.ctx.check_owned(self.instance, signal, loc)
    }

    pub(crate) fn type_error(&self, message: impl Into<String>, loc: SourceLoc) -> BuildError {
        BuildError::Type {
            path: self.path().to_string(),
            message: message.into(),
            loc,
        }
    }

    pub(crate) fn config_error(&self, message: impl Into<String>, loc: SourceLoc) -> BuildError {
        BuildError::Config {
            path: self.path().to_string(),
            message: message.into(),
            loc,
        }
    }

    fn unknown_port(&self, name: &str, expected: &'static str, loc: SourceLoc) -> BuildError {
        BuildError::UnknownPort {
            module: self.desc.name().to_string(),
            path: self.path().to_string(),
            port: name.to_string(),
            expected,
            loc,
        }
    }
}
