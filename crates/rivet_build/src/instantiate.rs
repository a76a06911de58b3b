//! Instantiation and realization of module instances.
//!
//! [`BuildContext::instantiate`] checks the caller's [`Bindings`] against the
//! module's inputs, creates the instance, runs its generator exactly once,
//! checks that every output was assigned, and freezes it. Children are
//! realized depth first from inside their parent's generator, so a child is
//! frozen before the parent can read any of its outputs.

use rivet_common::{Ident, SourceLoc};
use rivet_ir::{
    Instance, InstanceId, InstanceState, OutputSlot, PortBinding, PortRole, Signal, SignalKind,
};
use tracing::{debug, instrument};

use crate::context::BuildContext;
use crate::descriptor::ModuleDescriptor;
use crate::errors::{BuildError, BuildResult};
use crate::scope::Scope;

/// Caller-side signals for a child's input ports, keyed by port name.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entries: Vec<(String, Signal)>,
}

impl Bindings {
    /// Creates an empty set of bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds input `port` to `signal`.
    pub fn bind(mut self, port: impl Into<String>, signal: Signal) -> Self {
        self.entries.push((port.into(), signal));
        self
    }

    /// Iterates over `(port, signal)` pairs in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Signal)> {
        self.entries.iter().map(|(p, s)| (p.as_str(), *s))
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A realized child as seen from its parent's generator.
#[derive(Debug, Clone)]
pub struct InstanceHandle {
    pub(crate) id: InstanceId,
    pub(crate) module: String,
    pub(crate) path: String,
    pub(crate) outputs: Vec<(String, Signal)>,
}

impl InstanceHandle {
    /// Returns the child's instance ID.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Returns the child's dotted path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the parent-side signal carrying output `name`.
    #[track_caller]
    pub fn output(&self, name: &str) -> BuildResult<Signal> {
        self.outputs
            .iter()
            .find(|(port, _)| port == name)
            .map(|(_, sig)| *sig)
            .ok_or_else(|| BuildError::UnknownPort {
                module: self.module.clone(),
                path: self.path.clone(),
                port: name.to_string(),
                expected: "output",
                loc: SourceLoc::caller(),
            })
    }

    /// Iterates over `(port, signal)` pairs for every output.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, Signal)> {
        self.outputs.iter().map(|(p, s)| (p.as_str(), *s))
    }
}

impl BuildContext {
    /// Creates and realizes one instance of `desc`.
    ///
    /// Roots (`parent == None`) take no bindings: each input becomes a free
    /// port of the design. Children must bind every data input; clock and
    /// reset inputs left unbound are connected to the parent's.
    #[instrument(level = "debug", skip_all, fields(module = desc.name(), instance = name))]
    pub fn instantiate(
        &mut self,
        desc: &ModuleDescriptor,
        parent: Option<InstanceId>,
        name: &str,
        bindings: &Bindings,
        loc: SourceLoc,
    ) -> BuildResult<InstanceId> {
        let path = match parent {
            Some(p) => format!("{}.{name}", self.design.instances[p].path),
            None => name.to_string(),
        };
        self.push_realizing(desc, &path, &loc)?;
        let result = self.realize(desc, parent, name, &path, bindings, &loc);
        self.pop_realizing();
        result
    }

    fn realize(
        &mut self,
        desc: &ModuleDescriptor,
        parent: Option<InstanceId>,
        name: &str,
        path: &str,
        bindings: &Bindings,
        loc: &SourceLoc,
    ) -> BuildResult<InstanceId> {
        let module = self.ensure_module(desc)?;
        let name_id = self.interner.get_or_intern(name);
        self.check_unique_name(parent, name_id, path, loc)?;

        let drivers = match parent {
            Some(p) => self.resolve_bindings(desc, module, p, bindings, path, loc)?,
            None if !bindings.is_empty() => {
                return Err(BuildError::Binding {
                    module: desc.name().to_string(),
                    path: path.to_string(),
                    message: "root instances take no bindings".to_string(),
                    loc: loc.clone(),
                });
            }
            None => Vec::new(),
        };

        let info = &self.design.modules[module];
        let outputs = info
            .outputs()
            .map(|p| OutputSlot {
                port: p.name,
                signal: None,
            })
            .collect();
        let inputs: Vec<_> = info
            .inputs()
            .map(|p| (p.name, p.ty, p.loc.clone()))
            .collect();

        let id = self.design.instances.alloc_with(|id| Instance {
            id,
            name: name_id,
            module,
            parent,
            path: path.to_string(),
            ports: Vec::new(),
            bindings: drivers,
            outputs,
            children: Vec::new(),
            state: InstanceState::Realizing,
        });
        match parent {
            Some(p) => self.design.instances.get_mut(p).children.push(id),
            None => self.design.roots.push(id),
        }
        self.design.modules.get_mut(module).instances.push(id);

        let ports = inputs
            .into_iter()
            .map(|(port, ty, port_loc)| {
                let sig = self.alloc_signal(id, ty, SignalKind::Port { port }, port_loc);
                (port, sig.id)
            })
            .collect();
        self.design.instances.get_mut(id).ports = ports;

        if let Some(generator) = desc.generator() {
            let mut scope = Scope::new(self, id, desc);
            generator
                .generate(&mut scope)
                .map_err(|e| e.within(path))?;
        }

        let inst = &self.design.instances[id];
        if let Some(port) = inst.first_unassigned() {
            return Err(BuildError::UnassignedOutput {
                module: desc.name().to_string(),
                path: path.to_string(),
                port: self.resolve(port).to_string(),
            });
        }
        self.design.instances.get_mut(id).state = InstanceState::Frozen;
        debug!(%id, path, "realized instance");
        Ok(id)
    }

    fn check_unique_name(
        &self,
        parent: Option<InstanceId>,
        name: Ident,
        path: &str,
        loc: &SourceLoc,
    ) -> BuildResult<()> {
        let siblings = match parent {
            Some(p) => &self.design.instances[p].children,
            None => &self.design.roots,
        };
        if siblings
            .iter()
            .any(|s| self.design.instances[*s].name == name)
        {
            return Err(BuildError::DuplicateInstance {
                path: path.to_string(),
                loc: loc.clone(),
            });
        }
        Ok(())
    }

    /// Matches caller bindings to the module's inputs and forwards clock and
    /// reset from the parent where they are not bound.
    fn resolve_bindings(
        &self,
        desc: &ModuleDescriptor,
        module: rivet_ir::ModuleId,
        parent: InstanceId,
        bindings: &Bindings,
        path: &str,
        loc: &SourceLoc,
    ) -> BuildResult<Vec<PortBinding>> {
        let binding_error = |message: String| BuildError::Binding {
            module: desc.name().to_string(),
            path: path.to_string(),
            message,
            loc: loc.clone(),
        };
        let ports = &self.design.modules[module].ports;
        let mut drivers: Vec<PortBinding> = Vec::with_capacity(ports.len());

        for (port_name, signal) in bindings.iter() {
            let port = ports
                .iter()
                .find(|p| self.resolve(p.name) == port_name)
                .filter(|p| p.is_input())
                .ok_or_else(|| binding_error(format!("`{port_name}` is not an input port")))?;
            if drivers.iter().any(|d| d.port == port.name) {
                return Err(binding_error(format!("input `{port_name}` is bound twice")));
            }
            self.check_owned(parent, signal, loc)?;
            if signal.ty != port.ty {
                let types = &self.design.types;
                return Err(BuildError::Type {
                    path: path.to_string(),
                    message: format!(
                        "input `{port_name}` expects {}, got {}",
                        types.display(port.ty),
                        types.display(signal.ty)
                    ),
                    loc: loc.clone(),
                });
            }
            drivers.push(PortBinding {
                port: port.name,
                signal: signal.id,
            });
        }

        for port in ports.iter().filter(|p| p.is_input()) {
            if drivers.iter().any(|d| d.port == port.name) {
                continue;
            }
            let port_name = self.resolve(port.name);
            let signal = match port.role {
                PortRole::Data => {
                    return Err(binding_error(format!("input `{port_name}` is not bound")));
                }
                role => self.parent_timing_port(parent, role).ok_or_else(|| {
                    let what = if role == PortRole::Clock { "clock" } else { "reset" };
                    BuildError::Config {
                        path: path.to_string(),
                        message: format!(
                            "`{}` needs a {what} for `{port_name}` \
                             but its parent has none to forward",
                            desc.name()
                        ),
                        loc: loc.clone(),
                    }
                })?,
            };
            drivers.push(PortBinding {
                port: port.name,
                signal,
            });
        }
        Ok(drivers)
    }

    fn parent_timing_port(&self, parent: InstanceId, role: PortRole) -> Option<rivet_ir::SignalId> {
        let inst = &self.design.instances[parent];
        let port = self.design.modules[inst.module]
            .ports
            .iter()
            .find(|p| p.role == role)?;
        inst.port_signal(port.name)
    }
}
