//! Mutable realization state.
//!
//! [`BuildContext`] owns the [`Design`] under construction, the interner all
//! names go through, the descriptor-to-module table, and the stack of
//! descriptors currently being realized, which is how instantiation cycles
//! are caught.

use std::collections::HashMap;

use rivet_common::{ContentHash, Ident, Interner, SourceLoc};
use rivet_config::SystemConfig;
use rivet_ir::module::interface_bytes;
use rivet_ir::{
    Design, InstanceId, ModuleId, ModuleInfo, Port, Signal, SignalKind, SignalNode, TypeId,
};
use tracing::{debug, trace};

use crate::descriptor::{DescriptorId, ModuleDescriptor, PortDecl, PortName};
use crate::errors::{BuildError, BuildResult};

/// Mutable state carried through recursive realization.
pub struct BuildContext {
    pub(crate) design: Design,
    pub(crate) interner: Interner,
    config: SystemConfig,
    /// Module registered for each descriptor seen so far.
    modules: HashMap<DescriptorId, ModuleId>,
    /// Which descriptor owns each module name.
    module_names: HashMap<Ident, DescriptorId>,
    /// Descriptors currently being realized, outermost first.
    realizing: Vec<(DescriptorId, String)>,
}

impl BuildContext {
    /// Creates a context for a design named after `config.system.name`.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            design: Design::new(config.system.name.clone()),
            interner: Interner::new(),
            config: config.clone(),
            modules: HashMap::new(),
            module_names: HashMap::new(),
            realizing: Vec::new(),
        }
    }

    /// Returns the configuration this context was created with.
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Returns the design built so far.
    pub fn design(&self) -> &Design {
        &self.design
    }

    /// Finishes construction, attaching the name table to the design.
    pub fn into_design(self) -> Design {
        let mut design = self.design;
        design.names = self.interner.snapshot();
        design
    }

    /// Resolves an identifier.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// Returns the depth of the realization stack.
    pub fn realization_depth(&self) -> usize {
        self.realizing.len()
    }

    /// Marks `desc` as being realized.
    ///
    /// Fails with a cyclic-instantiation error if it is already on the stack.
    pub(crate) fn push_realizing(
        &mut self,
        desc: &ModuleDescriptor,
        path: &str,
        loc: &SourceLoc,
    ) -> BuildResult<()> {
        if let Some(pos) = self.realizing.iter().position(|(id, _)| *id == desc.id()) {
            let mut cycle: Vec<String> =
                self.realizing[pos..].iter().map(|(_, n)| n.clone()).collect();
            cycle.push(desc.name().to_string());
            return Err(BuildError::CyclicInstantiation {
                module: desc.name().to_string(),
                path: path.to_string(),
                cycle,
                loc: loc.clone(),
            });
        }
        self.realizing.push((desc.id(), desc.name().to_string()));
        Ok(())
    }

    /// Pops the innermost descriptor from the realization stack.
    pub(crate) fn pop_realizing(&mut self) {
        self.realizing.pop();
    }

    /// Returns the resolved name of a declared port.
    pub(crate) fn port_name<'d>(&'d self, decl: &'d PortDecl) -> &'d str {
        match &decl.name {
            PortName::Named(name) => name,
            PortName::Configured => match decl.role {
                rivet_ir::PortRole::Reset => &self.config.clock.reset_port,
                _ => &self.config.clock.port,
            },
        }
    }

    /// Returns the module for `desc`, registering it on first use.
    pub(crate) fn ensure_module(&mut self, desc: &ModuleDescriptor) -> BuildResult<ModuleId> {
        if let Some(id) = self.modules.get(&desc.id()) {
            return Ok(*id);
        }
        let name = self.interner.get_or_intern(desc.name());
        if self.module_names.get(&name).is_some_and(|d| *d != desc.id()) {
            return Err(BuildError::DuplicateModule {
                module: desc.name().to_string(),
                loc: desc.loc().clone(),
            });
        }

        let mut ports: Vec<Port> = Vec::with_capacity(desc.ports().len());
        for decl in desc.ports() {
            let port_name = self.port_name(decl).to_string();
            let ty = decl
                .ty
                .intern(&mut self.design.types)
                .map_err(|e| BuildError::Type {
                    path: String::new(),
                    message: format!("port `{port_name}` of `{}`: {e}", desc.name()),
                    loc: decl.loc.clone(),
                })?;
            let ident = self.interner.get_or_intern(&port_name);
            if ports.iter().any(|p| p.name == ident) {
                return Err(BuildError::Binding {
                    module: desc.name().to_string(),
                    path: String::new(),
                    message: format!("port `{port_name}` is declared twice"),
                    loc: decl.loc.clone(),
                });
            }
            ports.push(Port {
                name: ident,
                direction: decl.direction,
                role: decl.role,
                ty,
                loc: decl.loc.clone(),
            });
        }

        let bytes = interface_bytes(
            &ports,
            |id| self.interner.resolve(id),
            |p| self.design.types.display(p.ty),
        );
        let interface_hash = ContentHash::from_bytes(&bytes);
        let id = self.design.modules.alloc_with(|id| ModuleInfo {
            id,
            name,
            descriptor: desc.id().as_raw(),
            ports,
            interface_hash,
            instances: Vec::new(),
        });
        self.modules.insert(desc.id(), id);
        self.module_names.insert(name, desc.id());
        debug!(module = desc.name(), %id, hash = %interface_hash, "registered module");
        Ok(id)
    }

    /// Appends a node to the signal graph.
    pub(crate) fn alloc_signal(
        &mut self,
        owner: InstanceId,
        ty: TypeId,
        kind: SignalKind,
        loc: SourceLoc,
    ) -> Signal {
        let id = self.design.signals.alloc_with(|id| SignalNode {
            id,
            ty,
            owner,
            kind,
            name: None,
            loc,
        });
        trace!(signal = %id, ty = %self.design.types.display(ty), owner = %owner, "new signal");
        Signal::new(id, ty)
    }

    /// Checks that `signal` exists, was created by `instance`, and that its
    /// cached type is current.
    pub(crate) fn check_owned(
        &self,
        instance: InstanceId,
        signal: Signal,
        loc: &SourceLoc,
    ) -> BuildResult<()> {
        let path = &self.design.instances[instance].path;
        let foreign = |owner: String| BuildError::ForeignSignal {
            path: path.clone(),
            signal: signal.id,
            owner,
            loc: loc.clone(),
        };
        let Some(node) = self.design.signals.try_get(signal.id) else {
            return Err(foreign("<unknown>".to_string()));
        };
        if node.owner != instance || node.ty != signal.ty {
            return Err(foreign(self.design.instances[node.owner].path.clone()));
        }
        Ok(())
    }
}
