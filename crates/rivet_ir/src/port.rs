//! Port definitions for module interfaces.
//!
//! A [`Port`] is one named, typed, directional entry of a module's external
//! interface. Clock and reset ports are ordinary 1-bit inputs tagged with a
//! [`PortRole`] so instantiation can connect them implicitly.

use crate::ids::TypeId;
use rivet_common::{Ident, SourceLoc};
use serde::{Deserialize, Serialize};

/// The direction of a port on a module boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// An input port (data flows into the module).
    Input,
    /// An output port (data flows out of the module).
    Output,
}

/// What an input port is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortRole {
    /// A data port, bound explicitly by the instantiating parent.
    Data,
    /// The module's clock; connected from the parent's clock when not bound.
    Clock,
    /// The module's reset; connected from the parent's reset when not bound.
    Reset,
}

/// A port in a module's external interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// The port name, unique within the module.
    pub name: Ident,
    /// The direction of data flow.
    pub direction: PortDirection,
    /// What the port carries.
    pub role: PortRole,
    /// The declared type of the port.
    pub ty: TypeId,
    /// Where the port was declared.
    pub loc: SourceLoc,
}

impl Port {
    /// Returns `true` for input ports of any role.
    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    /// Returns `true` for output ports.
    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// Returns `true` for clock and reset ports.
    pub fn is_timing(&self) -> bool {
        self.role != PortRole::Data
    }
}
