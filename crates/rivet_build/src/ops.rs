//! The operator library.
//!
//! Each operator is a method on [`Scope`] that validates its operand types,
//! appends one node to the signal graph, and returns the new [`Signal`].
//! Operators never modify their operands.
//!
//! Multiplexer polarity: `mux(select, a, b)` yields `a` when `select` is 0
//! and `b` when `select` is 1, i.e. `[a, b][select]`.

use rivet_common::{BitsValue, SourceLoc};
use rivet_ir::{OpKind, RegisterReset, ResetKind, Signal, SignalKind, Type, TypeId};

use crate::errors::BuildResult;
use crate::scope::Scope;

/// Options for [`Scope::reg_with`].
#[derive(Debug, Clone, Default)]
pub struct RegOptions {
    /// Reset behavior; `None` builds a register without reset.
    pub reset: Option<ResetKind>,
    /// Value loaded on reset. Defaults to all zeros.
    pub reset_value: Option<BitsValue>,
    /// Debug name for the register.
    pub name: Option<String>,
}

impl RegOptions {
    /// A register with a synchronous reset to zero.
    pub fn sync_reset() -> Self {
        Self {
            reset: Some(ResetKind::Sync),
            ..Self::default()
        }
    }

    /// A register with an asynchronous reset to zero.
    pub fn async_reset() -> Self {
        Self {
            reset: Some(ResetKind::Async),
            ..Self::default()
        }
    }

    /// Sets the reset value.
    pub fn with_value(mut self, value: BitsValue) -> Self {
        self.reset_value = Some(value);
        self
    }

    /// Sets the debug name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Scope<'_> {
    /// Bitwise AND.
    #[track_caller]
    pub fn and(&mut self, a: Signal, b: Signal) -> BuildResult<Signal> {
        self.bitwise(OpKind::And, a, b, SourceLoc::caller())
    }

    /// Bitwise OR.
    #[track_caller]
    pub fn or(&mut self, a: Signal, b: Signal) -> BuildResult<Signal> {
        self.bitwise(OpKind::Or, a, b, SourceLoc::caller())
    }

    /// Bitwise XOR.
    #[track_caller]
    pub fn xor(&mut self, a: Signal, b: Signal) -> BuildResult<Signal> {
        self.bitwise(OpKind::Xor, a, b, SourceLoc::caller())
    }

    /// Bitwise complement.
    #[track_caller]
    pub fn not(&mut self, a: Signal) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        self.check(a, &loc)?;
        self.expect_bits("not", a, &loc)?;
        Ok(self.op(OpKind::Not, a.ty, vec![a], loc))
    }

    /// Two-way multiplexer: `a` when `select` is 0, `b` when it is 1.
    ///
    /// `select` must be 1 bit wide; `a` and `b` may be of any type as long
    /// as it is the same.
    #[track_caller]
    pub fn mux(&mut self, select: Signal, a: Signal, b: Signal) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        for s in [select, a, b] {
            self.check(s, &loc)?;
        }
        if self.ctx.design.types.bits_width(select.ty) != Some(1) {
            let message = format!("mux select must be bits<1>, got {}", self.type_name(select));
            return Err(self.type_error(message, loc));
        }
        if a.ty != b.ty {
            let message = format!(
                "mux operands differ: {} and {}",
                self.type_name(a),
                self.type_name(b)
            );
            return Err(self.type_error(message, loc));
        }
        Ok(self.op(OpKind::Mux, a.ty, vec![select, a, b], loc))
    }

    /// Concatenates bit vectors; `parts[0]` lands in the most significant bits.
    #[track_caller]
    pub fn concat(&mut self, parts: &[Signal]) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        if parts.is_empty() {
            return Err(self.type_error("concat needs at least one operand", loc));
        }
        let mut width = 0u64;
        for part in parts {
            self.check(*part, &loc)?;
            width += u64::from(self.expect_bits("concat", *part, &loc)?);
        }
        let width = u32::try_from(width).map_err(|_| {
            self.type_error(format!("concat result of {width} bits is too wide"), loc.clone())
        })?;
        let ty = self.ctx.design.types.make_bits(width)?;
        Ok(self.op(OpKind::Concat, ty, parts.to_vec(), loc))
    }

    /// Extracts `width` bits of `base` starting at bit `low` (bit 0 is the
    /// least significant).
    #[track_caller]
    pub fn slice(&mut self, base: Signal, low: u32, width: u32) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        self.check(base, &loc)?;
        let base_width = self.expect_bits("slice", base, &loc)?;
        let in_range = width > 0 && low.checked_add(width).is_some_and(|end| end <= base_width);
        if !in_range {
            let message = format!("slice [{low} +: {width}] out of range for bits<{base_width}>");
            return Err(self.type_error(message, loc));
        }
        let ty = self.ctx.design.types.make_bits(width)?;
        Ok(self.op(OpKind::Slice { low }, ty, vec![base], loc))
    }

    /// Delays `input` by one clock step using the module's clock.
    #[track_caller]
    pub fn reg(&mut self, input: Signal) -> BuildResult<Signal> {
        self.register(input, RegOptions::default(), SourceLoc::caller())
    }

    /// Delays `input` by one clock step with reset and naming options.
    #[track_caller]
    pub fn reg_with(&mut self, input: Signal, options: RegOptions) -> BuildResult<Signal> {
        self.register(input, options, SourceLoc::caller())
    }

    /// Projects the named field of a struct-typed signal.
    #[track_caller]
    pub fn field(&mut self, base: Signal, name: &str) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        self.check(base, &loc)?;
        let types = &self.ctx.design.types;
        if !matches!(types.get(base.ty), Type::Struct { .. }) {
            let message = format!("cannot take field `{name}` of {}", types.display(base.ty));
            return Err(self.type_error(message, loc));
        }
        let Some((index, ty)) = types.field(base.ty, name) else {
            let message = format!("{} has no field `{name}`", types.display(base.ty));
            return Err(self.type_error(message, loc));
        };
        let field = self.ctx.interner.get_or_intern(name);
        let kind = SignalKind::Field {
            base: base.id,
            field,
            index: index as u32,
        };
        Ok(self.push(ty, kind, loc))
    }

    /// Projects element `index` of an array-typed signal.
    #[track_caller]
    pub fn index(&mut self, base: Signal, index: u32) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        self.check(base, &loc)?;
        let Some((element, len)) = self.ctx.design.types.element(base.ty) else {
            let message = format!("cannot index into {}", self.type_name(base));
            return Err(self.type_error(message, loc));
        };
        if index >= len {
            let message = format!("index {index} out of range for {}", self.type_name(base));
            return Err(self.type_error(message, loc));
        }
        Ok(self.push(element, SignalKind::Index { base: base.id, index }, loc))
    }

    /// A constant of type `ty`; `value` must be exactly as wide as the type.
    #[track_caller]
    pub fn constant(&mut self, ty: TypeId, value: BitsValue) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        if self.ctx.design.types.try_get(ty).is_none() {
            return Err(self.type_error(format!("unknown type {ty}"), loc));
        }
        let width = self.ctx.design.types.width_of(ty);
        if value.width() != width {
            let message = format!(
                "constant is {} bits wide but {} needs {width}",
                value.width(),
                self.ctx.design.types.display(ty)
            );
            return Err(self.type_error(message, loc));
        }
        Ok(self.push(ty, SignalKind::Const(value), loc))
    }

    /// A `width`-bit constant holding `value`, truncated to `width` bits.
    #[track_caller]
    pub fn constant_u64(&mut self, width: u32, value: u64) -> BuildResult<Signal> {
        let loc = SourceLoc::caller();
        let ty = self
            .ctx
            .design
            .types
            .make_bits(width)
            .map_err(|e| self.type_error(e.to_string(), loc.clone()))?;
        Ok(self.push(ty, SignalKind::Const(BitsValue::from_u64(value, width)), loc))
    }

    fn bitwise(&mut self, op: OpKind, a: Signal, b: Signal, loc: SourceLoc) -> BuildResult<Signal> {
        self.check(a, &loc)?;
        self.check(b, &loc)?;
        let name = op.mnemonic();
        self.expect_bits(name, a, &loc)?;
        self.expect_bits(name, b, &loc)?;
        if a.ty != b.ty {
            let message = format!(
                "{name} operands differ: {} and {}",
                self.type_name(a),
                self.type_name(b)
            );
            return Err(self.type_error(message, loc));
        }
        Ok(self.op(op, a.ty, vec![a, b], loc))
    }

    fn register(
        &mut self,
        input: Signal,
        options: RegOptions,
        loc: SourceLoc,
    ) -> BuildResult<Signal> {
        self.check(input, &loc)?;
        let clock = self.clock().map_err(|_| {
            self.config_error("register needs a clock but the module declares none", loc.clone())
        })?;
        let reset = match options.reset {
            None => None,
            Some(kind) => {
                let signal = self.reset().map_err(|_| {
                    self.config_error(
                        "register reset needs a reset port on the module",
                        loc.clone(),
                    )
                })?;
                let width = self.width(input);
                let value = options.reset_value.unwrap_or_else(|| BitsValue::zero(width));
                if value.width() != width {
                    let message = format!(
                        "reset value is {} bits wide but the register is {width}",
                        value.width()
                    );
                    return Err(self.type_error(message, loc));
                }
                Some(RegisterReset {
                    signal: signal.id,
                    kind,
                    value,
                })
            }
        };
        let kind = SignalKind::Register {
            input: input.id,
            clock: clock.id,
            reset,
        };
        let reg = self.push(input.ty, kind, loc);
        match options.name {
            Some(name) => {
                let ident = self.ctx.interner.get_or_intern(&name);
                self.ctx.design.signals.get_mut(reg.id).name = Some(ident);
                Ok(reg)
            }
            None => Ok(reg),
        }
    }

    fn op(&mut self, op: OpKind, ty: TypeId, operands: Vec<Signal>, loc: SourceLoc) -> Signal {
        let operands = operands.into_iter().map(|s| s.id).collect();
        self.push(ty, SignalKind::Op { op, operands }, loc)
    }

    fn expect_bits(&self, op: &str, signal: Signal, loc: &SourceLoc) -> BuildResult<u32> {
        self.ctx.design.types.bits_width(signal.ty).ok_or_else(|| {
            self.type_error(
                format!("{op} needs bit vectors, got {}", self.type_name(signal)),
                loc.clone(),
            )
        })
    }
}
