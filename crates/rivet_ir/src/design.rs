//! Top-level design container.
//!
//! A [`Design`] holds every module, instance, and signal node produced while
//! realizing a set of root modules, along with the shared type database and
//! the name table its [`Ident`]s resolve against. It is the output of
//! realization and the input to a backend.

use crate::arena::Arena;
use crate::ids::{InstanceId, ModuleId, SignalId};
use crate::instance::Instance;
use crate::module::ModuleInfo;
use crate::signal::SignalNode;
use crate::types::TypeDb;
use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graphmap::DiGraphMap;
use rivet_common::Ident;
use serde::{Deserialize, Serialize};

/// A complete hierarchical design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    /// The system name.
    pub name: String,
    /// Interned names indexed by [`Ident`] raw value.
    pub names: Vec<String>,
    /// Shared type definitions.
    pub types: TypeDb,
    /// Module types, one per distinct descriptor.
    pub modules: Arena<ModuleId, ModuleInfo>,
    /// Every realized instance.
    pub instances: Arena<InstanceId, Instance>,
    /// The design-wide signal graph.
    pub signals: Arena<SignalId, SignalNode>,
    /// Root instances in the order they were compiled.
    pub roots: Vec<InstanceId>,
}

impl Design {
    /// Creates an empty design.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Resolves an identifier against the name table.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.names
            .get(ident.as_raw() as usize)
            .map(String::as_str)
            .unwrap_or("<unnamed>")
    }

    /// Returns the module of an instance.
    pub fn module_of(&self, instance: InstanceId) -> &ModuleInfo {
        &self.modules[self.instances[instance].module]
    }

    /// Finds an instance by its dotted path.
    pub fn find_instance(&self, path: &str) -> Option<&Instance> {
        self.instances.values().find(|i| i.path == path)
    }

    /// Finds a module by name.
    pub fn find_module(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.values().find(|m| self.resolve(m.name) == name)
    }

    /// Iterates over the signal nodes owned by an instance.
    pub fn signals_of(&self, instance: InstanceId) -> impl Iterator<Item = &SignalNode> {
        self.signals.values().filter(move |s| s.owner == instance)
    }

    /// Returns the number of modules in the design.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Returns the number of instances in the design.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Builds the module-level instantiation graph: an edge `a -> b` means
    /// some instance of `a` instantiates `b`.
    pub fn module_graph(&self) -> DiGraphMap<ModuleId, ()> {
        let mut graph = DiGraphMap::new();
        for module in self.modules.values() {
            graph.add_node(module.id);
        }
        for inst in self.instances.values() {
            if let Some(parent) = inst.parent {
                graph.add_edge(self.instances[parent].module, inst.module, ());
            }
        }
        graph
    }

    /// Returns `true` if some module (transitively) instantiates itself.
    pub fn has_instantiation_cycle(&self) -> bool {
        is_cyclic_directed(&self.module_graph())
    }

    /// Returns modules ordered leaves first, or `None` if the instantiation
    /// graph has a cycle.
    pub fn modules_bottom_up(&self) -> Option<Vec<ModuleId>> {
        let mut order = toposort(&self.module_graph(), None).ok()?;
        order.reverse();
        Some(order)
    }

    /// Visits every instance depth first, parents before children, passing
    /// the depth below its root.
    pub fn walk(&self, mut visit: impl FnMut(&Instance, usize)) {
        let mut stack: Vec<(InstanceId, usize)> =
            self.roots.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            let inst = &self.instances[id];
            visit(inst, depth);
            for child in inst.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
    }
}
