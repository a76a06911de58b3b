//! Realized module instances.
//!
//! An [`Instance`] is one occurrence of a module in the hierarchy. It owns the
//! port nodes its generator reads, the bindings that feed those ports from
//! the parent, and one write-once [`OutputSlot`] per output port.

use crate::ids::{InstanceId, ModuleId, SignalId};
use rivet_common::Ident;
use serde::{Deserialize, Serialize};

/// Lifecycle of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceState {
    /// The generator is running; outputs may still be assigned.
    Realizing,
    /// The generator returned and every output was checked; immutable.
    Frozen,
}

/// A parent-side signal driving one input port of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    /// The bound input port.
    pub port: Ident,
    /// The driving signal, owned by the parent instance.
    pub signal: SignalId,
}

/// The write-once slot for one output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSlot {
    /// The output port.
    pub port: Ident,
    /// The signal assigned by the generator, if any.
    pub signal: Option<SignalId>,
}

/// One realized occurrence of a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    /// The unique ID of this instance in the design.
    pub id: InstanceId,
    /// The instance name, unique among its siblings.
    pub name: Ident,
    /// The module this is an instance of.
    pub module: ModuleId,
    /// The instantiating parent; `None` for roots.
    pub parent: Option<InstanceId>,
    /// Dotted hierarchical path, e.g. `top.child`.
    pub path: String,
    /// The port node for each input port, in interface order.
    pub ports: Vec<(Ident, SignalId)>,
    /// Parent-side drivers of the input ports; empty for roots.
    pub bindings: Vec<PortBinding>,
    /// Output slots in interface order.
    pub outputs: Vec<OutputSlot>,
    /// Child instances in creation order.
    pub children: Vec<InstanceId>,
    /// Lifecycle state.
    pub state: InstanceState,
}

impl Instance {
    /// Returns the port node backing the named input.
    pub fn port_signal(&self, port: Ident) -> Option<SignalId> {
        self.ports
            .iter()
            .find(|(name, _)| *name == port)
            .map(|(_, id)| *id)
    }

    /// Returns the output slot for the named port.
    pub fn output(&self, port: Ident) -> Option<&OutputSlot> {
        self.outputs.iter().find(|s| s.port == port)
    }

    /// Returns the mutable output slot for the named port.
    pub fn output_mut(&mut self, port: Ident) -> Option<&mut OutputSlot> {
        self.outputs.iter_mut().find(|s| s.port == port)
    }

    /// Returns the parent-side driver of the named input.
    pub fn binding(&self, port: Ident) -> Option<SignalId> {
        self.bindings
            .iter()
            .find(|b| b.port == port)
            .map(|b| b.signal)
    }

    /// Returns the first output port without an assigned signal.
    pub fn first_unassigned(&self) -> Option<Ident> {
        self.outputs
            .iter()
            .find(|s| s.signal.is_none())
            .map(|s| s.port)
    }

    /// Returns `true` for instances with no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` once the instance has been frozen.
    pub fn is_frozen(&self) -> bool {
        self.state == InstanceState::Frozen
    }
}
