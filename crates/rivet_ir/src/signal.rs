//! The signal graph.
//!
//! Every value flowing through a design is a [`SignalNode`] in one
//! design-wide arena. Nodes are immutable once allocated and only ever refer
//! to nodes allocated before them, so the graph is acyclic by construction.
//! A [`Signal`] is the copyable handle generator code passes around.

use crate::ids::{InstanceId, SignalId, TypeId};
use rivet_common::{BitsValue, Ident, SourceLoc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed handle to a node in the signal graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signal {
    /// The node this handle refers to.
    pub id: SignalId,
    /// The node's type, cached so operators can check shapes without a lookup.
    pub ty: TypeId,
}

impl Signal {
    /// Creates a handle.
    pub fn new(id: SignalId, ty: TypeId) -> Self {
        Self { id, ty }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.ty)
    }
}

/// A primitive combinational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    /// Bitwise AND of two equal-width operands.
    And,
    /// Bitwise OR of two equal-width operands.
    Or,
    /// Bitwise XOR of two equal-width operands.
    Xor,
    /// Bitwise complement of one operand.
    Not,
    /// `[select, a, b]`: yields `a` when `select` is 0 and `b` when it is 1.
    Mux,
    /// Concatenation; the first operand lands in the most significant bits.
    Concat,
    /// Extracts `width(result)` bits starting at bit `low` of one operand.
    Slice {
        /// The least significant bit taken from the operand.
        low: u32,
    },
}

impl OpKind {
    /// Returns the operator's mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpKind::And => "and",
            OpKind::Or => "or",
            OpKind::Xor => "xor",
            OpKind::Not => "not",
            OpKind::Mux => "mux",
            OpKind::Concat => "concat",
            OpKind::Slice { .. } => "slice",
        }
    }
}

/// Whether a register's reset is sampled on the clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetKind {
    /// Reset takes effect on the next active clock edge.
    Sync,
    /// Reset takes effect immediately.
    Async,
}

/// Reset wiring of a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterReset {
    /// The reset signal.
    pub signal: SignalId,
    /// Synchronous or asynchronous reset.
    pub kind: ResetKind,
    /// The value loaded while reset is asserted.
    pub value: BitsValue,
}

/// How a signal node produces its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    /// An input port of the owning instance (including clock and reset).
    Port {
        /// The port name.
        port: Ident,
    },
    /// A literal constant.
    Const(BitsValue),
    /// The result of a primitive operator.
    Op {
        /// The operator.
        op: OpKind,
        /// Operand nodes, in operator order.
        operands: Vec<SignalId>,
    },
    /// The input delayed by one clock step.
    Register {
        /// The value being registered.
        input: SignalId,
        /// The clock the register samples on.
        clock: SignalId,
        /// Optional reset wiring.
        reset: Option<RegisterReset>,
    },
    /// A named field of a struct-typed signal.
    Field {
        /// The struct-typed signal.
        base: SignalId,
        /// The field name.
        field: Ident,
        /// The field's position in declaration order.
        index: u32,
    },
    /// A constant-index element of an array-typed signal.
    Index {
        /// The array-typed signal.
        base: SignalId,
        /// The element index; element 0 is least significant.
        index: u32,
    },
    /// An output of a child instance, as seen from its parent.
    InstanceOutput {
        /// The child instance.
        instance: InstanceId,
        /// The child's output port.
        port: Ident,
    },
}

impl SignalKind {
    /// Returns the nodes this node reads, in order.
    pub fn operands(&self) -> Vec<SignalId> {
        match self {
            SignalKind::Port { .. } | SignalKind::Const(_) | SignalKind::InstanceOutput { .. } => {
                Vec::new()
            }
            SignalKind::Op { operands, .. } => operands.clone(),
            SignalKind::Register {
                input,
                clock,
                reset,
            } => {
                let mut ids = vec![*input, *clock];
                if let Some(r) = reset {
                    ids.push(r.signal);
                }
                ids
            }
            SignalKind::Field { base, .. } | SignalKind::Index { base, .. } => vec![*base],
        }
    }

    /// Returns `true` for register nodes.
    pub fn is_register(&self) -> bool {
        matches!(self, SignalKind::Register { .. })
    }
}

/// A node in the design-wide signal graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalNode {
    /// The node's ID.
    pub id: SignalId,
    /// The node's type; fixed at creation.
    pub ty: TypeId,
    /// The instance whose generator created this node.
    pub owner: InstanceId,
    /// How the node produces its value.
    pub kind: SignalKind,
    /// Optional debug name.
    pub name: Option<Ident>,
    /// Where in generator code the node was created.
    pub loc: SourceLoc,
}

impl SignalNode {
    /// Returns the handle for this node.
    pub fn handle(&self) -> Signal {
        Signal::new(self.id, self.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, kind: SignalKind) -> SignalNode {
        SignalNode {
            id: SignalId::from_raw(id),
            ty: TypeId::from_raw(0),
            owner: InstanceId::from_raw(0),
            kind,
            name: None,
            loc: SourceLoc::UNKNOWN,
        }
    }

    #[test]
    fn leaf_nodes_have_no_operands() {
        let port = node(0, SignalKind::Port { port: Ident::from_raw(1) });
        let konst = node(1, SignalKind::Const(BitsValue::zero(4)));
        assert!(port.kind.operands().is_empty());
        assert!(konst.kind.operands().is_empty());
    }

    #[test]
    fn register_operands_include_clock_and_reset() {
        let reg = node(
            5,
            SignalKind::Register {
                input: SignalId::from_raw(2),
                clock: SignalId::from_raw(0),
                reset: Some(RegisterReset {
                    signal: SignalId::from_raw(1),
                    kind: ResetKind::Sync,
                    value: BitsValue::zero(8),
                }),
            },
        );
        assert!(reg.kind.is_register());
        assert_eq!(
            reg.kind.operands(),
            vec![SignalId::from_raw(2), SignalId::from_raw(0), SignalId::from_raw(1)]
        );
    }

    #[test]
    fn handle_matches_node() {
        let n = node(3, SignalKind::Const(BitsValue::ones(1)));
        assert_eq!(n.handle(), Signal::new(SignalId::from_raw(3), TypeId::from_raw(0)));
        assert_eq!(n.handle().to_string(), "%3: t0");
    }

    #[test]
    fn mnemonics() {
        assert_eq!(OpKind::Mux.mnemonic(), "mux");
        assert_eq!(OpKind::Slice { low: 3 }.mnemonic(), "slice");
    }

    #[test]
    fn node_serde_roundtrip() {
        let n = node(
            2,
            SignalKind::Op {
                op: OpKind::Concat,
                operands: vec![SignalId::from_raw(0), SignalId::from_raw(1)],
            },
        );
        let json = serde_json::to_string(&n).unwrap();
        let restored: SignalNode = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, n);
    }
}
