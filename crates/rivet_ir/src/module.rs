//! Module interfaces.
//!
//! A [`ModuleInfo`] records one module type in the design: its name, its
//! port interface, and every instance realized from it. A descriptor that is
//! instantiated several times contributes a single `ModuleInfo`.

use crate::ids::{InstanceId, ModuleId};
use crate::port::{Port, PortDirection, PortRole};
use rivet_common::{ContentHash, Ident};
use serde::{Deserialize, Serialize};

/// A module type in the design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// The unique ID of this module in the design.
    pub id: ModuleId,
    /// The module name.
    pub name: Ident,
    /// Identity of the descriptor this module was declared by.
    pub descriptor: u64,
    /// The external port interface in declaration order.
    pub ports: Vec<Port>,
    /// Fingerprint of the port interface.
    pub interface_hash: ContentHash,
    /// Every realized instance of this module.
    pub instances: Vec<InstanceId>,
}

impl ModuleInfo {
    /// Looks up a port by name.
    pub fn port(&self, name: Ident) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Iterates over input ports of every role.
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_input())
    }

    /// Iterates over output ports.
    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter().filter(|p| p.is_output())
    }

    /// Returns the clock port, if the module declares one.
    pub fn clock_port(&self) -> Option<&Port> {
        self.ports.iter().find(|p| p.role == PortRole::Clock)
    }

    /// Returns the reset port, if the module declares one.
    pub fn reset_port(&self) -> Option<&Port> {
        self.ports.iter().find(|p| p.role == PortRole::Reset)
    }
}

/// Serializes the parts of a port that define interface compatibility.
///
/// `shape` renders a port type; it must be stable across type databases.
pub fn interface_bytes<'a>(
    ports: impl IntoIterator<Item = &'a Port>,
    resolve: impl Fn(Ident) -> &'a str,
    shape: impl Fn(&Port) -> String,
) -> Vec<u8> {
    let mut out = Vec::new();
    for port in ports {
        out.extend_from_slice(resolve(port.name).as_bytes());
        out.push(0);
        out.push(match port.direction {
            PortDirection::Input => b'i',
            PortDirection::Output => b'o',
        });
        out.push(match port.role {
            PortRole::Data => b'd',
            PortRole::Clock => b'c',
            PortRole::Reset => b'r',
        });
        out.extend_from_slice(shape(port).as_bytes());
        out.push(0);
    }
    out
}
