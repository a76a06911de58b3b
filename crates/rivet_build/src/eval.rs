//! Construction-time evaluation of combinational signals.
//!
//! [`fold`] computes the value of a signal from constants and from values
//! supplied for input ports in an [`Env`]. Child inputs are followed through
//! their bindings and child outputs through their output slots, so a value
//! can be folded across the hierarchy. Registers never fold; a multiplexer
//! only needs its selected arm to fold.
//!
//! Struct and array values are packed: the first struct field is most
//! significant, array element 0 is least significant.

use std::collections::HashMap;

use rivet_common::BitsValue;
use rivet_ir::{Design, OpKind, SignalId, SignalKind};

/// Values for port signals (or any other node) keyed by signal ID.
pub type Env = HashMap<SignalId, BitsValue>;

/// Folds `signal` to a constant, or returns `None` if it depends on a
/// register or an unbound port.
///
/// A value whose width differs from its node's type, whether supplied in
/// `env` or produced along the way, makes every dependent signal fold to
/// `None`.
pub fn fold(design: &Design, signal: SignalId, env: &Env) -> Option<BitsValue> {
    Folder {
        design,
        env,
        memo: HashMap::new(),
    }
    .eval(signal)
}

struct Folder<'a> {
    design: &'a Design,
    env: &'a Env,
    memo: HashMap<SignalId, Option<BitsValue>>,
}

impl Folder<'_> {
    fn eval(&mut self, id: SignalId) -> Option<BitsValue> {
        if let Some(v) = self.memo.get(&id) {
            return v.clone();
        }
        let value = match self.env.get(&id) {
            Some(v) => Some(v.clone()),
            None => self.compute(id),
        };
        let value = value.filter(|v| self.has_node_width(id, v));
        self.memo.insert(id, value.clone());
        value
    }

    fn has_node_width(&self, id: SignalId, value: &BitsValue) -> bool {
        self.design
            .signals
            .try_get(id)
            .is_some_and(|node| self.design.types.width_of(node.ty) == value.width())
    }

    fn compute(&mut self, id: SignalId) -> Option<BitsValue> {
        let design = self.design;
        let node = design.signals.try_get(id)?;
        match &node.kind {
            SignalKind::Const(value) => Some(value.clone()),
            SignalKind::Port { port } => {
                let driver = design.instances[node.owner].binding(*port)?;
                self.eval(driver)
            }
            SignalKind::InstanceOutput { instance, port } => {
                let driver = design.instances.try_get(*instance)?.output(*port)?.signal?;
                self.eval(driver)
            }
            SignalKind::Register { .. } => None,
            SignalKind::Op {
                op: OpKind::Mux,
                operands,
            } => {
                let [select, a, b] = operands.as_slice() else {
                    return None;
                };
                let arm = if self.eval(*select)?.is_zero() { a } else { b };
                self.eval(*arm)
            }
            SignalKind::Op { op, operands } => {
                let values = operands
                    .iter()
                    .map(|o| self.eval(*o))
                    .collect::<Option<Vec<_>>>()?;
                match (op, values.as_slice()) {
                    (OpKind::And, [a, b]) => Some(a & b),
                    (OpKind::Or, [a, b]) => Some(a | b),
                    (OpKind::Xor, [a, b]) => Some(a ^ b),
                    (OpKind::Not, [a]) => Some(!a),
                    (OpKind::Concat, parts) => Some(BitsValue::concat(parts)),
                    (OpKind::Slice { low }, [base]) => {
                        Some(base.slice(*low, design.types.width_of(node.ty)))
                    }
                    _ => None,
                }
            }
            SignalKind::Field { base, index, .. } => {
                let base_ty = design.signals.try_get(*base)?.ty;
                let low = design.types.field_offset(base_ty, *index as usize);
                let value = self.eval(*base)?;
                Some(value.slice(low, design.types.width_of(node.ty)))
            }
            SignalKind::Index { base, index } => {
                let width = design.types.width_of(node.ty);
                let value = self.eval(*base)?;
                Some(value.slice(index * width, width))
            }
        }
    }
}
