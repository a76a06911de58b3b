//! The type system: fixed-width bit vectors, arrays, and named-field structs.
//!
//! All types in a design are hash-consed into a [`TypeDb`], which assigns each
//! distinct shape a [`TypeId`]. Because identical shapes always intern to the
//! same ID, structural equality within one database is an ID comparison.
//!
//! Packed layout, used by concatenation and constant folding:
//! - struct fields are laid out in declaration order, the first field in the
//!   most significant bits;
//! - array element `0` occupies the least significant bits.

use crate::ids::TypeId;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// A hardware type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// A bit vector of known, positive width.
    Bits {
        /// The number of bits.
        width: u32,
    },
    /// A fixed-length array of one element type.
    Array {
        /// The type of each element.
        element: TypeId,
        /// The number of elements.
        len: u32,
    },
    /// A struct with ordered, uniquely named fields.
    Struct {
        /// Field names and types in declaration order.
        fields: Vec<(String, TypeId)>,
    },
}

/// Errors raised while constructing a type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// A bit vector was declared with width zero.
    #[error("bit width must be positive")]
    ZeroWidth,
    /// An array was declared with length zero.
    #[error("array length must be positive")]
    ZeroLength,
    /// A struct was declared without fields.
    #[error("struct must declare at least one field")]
    EmptyStruct,
    /// A struct declared the same field name twice.
    #[error("duplicate struct field `{0}`")]
    DuplicateField(String),
    /// The total width of the type does not fit in 32 bits.
    #[error("type is {0} bits wide, more than the supported {max}", max = u32::MAX)]
    TooWide(u64),
    /// A type ID did not come from this database.
    #[error("unknown type {0}")]
    Unknown(TypeId),
}

/// Central type database of hash-consed types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDb {
    types: Vec<Type>,
}

impl TypeDb {
    /// Creates a new, empty type database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a `Bits` type of the given width.
    pub fn make_bits(&mut self, width: u32) -> Result<TypeId, TypeError> {
        if width == 0 {
            return Err(TypeError::ZeroWidth);
        }
        Ok(self.intern(Type::Bits { width }))
    }

    /// Interns an array of `len` elements of type `element`.
    pub fn make_array(&mut self, element: TypeId, len: u32) -> Result<TypeId, TypeError> {
        if len == 0 {
            return Err(TypeError::ZeroLength);
        }
        let elem_width = self.checked_width(element)?;
        check_fits(u64::from(elem_width) * u64::from(len))?;
        Ok(self.intern(Type::Array { element, len }))
    }

    /// Interns a struct type with the given fields in order.
    pub fn make_struct<S: Into<String>>(
        &mut self,
        fields: impl IntoIterator<Item = (S, TypeId)>,
    ) -> Result<TypeId, TypeError> {
        let mut out: Vec<(String, TypeId)> = Vec::new();
        let mut total = 0u64;
        for (name, ty) in fields {
            let name = name.into();
            if out.iter().any(|(existing, _)| *existing == name) {
                return Err(TypeError::DuplicateField(name));
            }
            total += u64::from(self.checked_width(ty)?);
            out.push((name, ty));
        }
        if out.is_empty() {
            return Err(TypeError::EmptyStruct);
        }
        check_fits(total)?;
        Ok(self.intern(Type::Struct { fields: out }))
    }

    /// Returns `true` if `a` and `b` have the same shape.
    ///
    /// Hash-consing makes this an ID comparison.
    pub fn equals(&self, a: TypeId, b: TypeId) -> bool {
        a == b
    }

    /// Compares a type in this database with a type in another database by
    /// shape, recursively.
    pub fn structurally_equal(&self, a: TypeId, other: &TypeDb, b: TypeId) -> bool {
        match (self.try_get(a), other.try_get(b)) {
            (Some(Type::Bits { width: wa }), Some(Type::Bits { width: wb })) => wa == wb,
            (
                Some(Type::Array { element: ea, len: la }),
                Some(Type::Array { element: eb, len: lb }),
            ) => la == lb && self.structurally_equal(*ea, other, *eb),
            (Some(Type::Struct { fields: fa }), Some(Type::Struct { fields: fb })) => {
                fa.len() == fb.len()
                    && fa.iter().zip(fb).all(|((na, ta), (nb, tb))| {
                        na == nb && self.structurally_equal(*ta, other, *tb)
                    })
            }
            _ => false,
        }
    }

    /// Returns the packed bit width of a type.
    ///
    /// `bits -> width`, `array -> len * width(element)`,
    /// `struct -> sum of field widths`.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn width_of(&self, id: TypeId) -> u32 {
        match self.get(id) {
            Type::Bits { width } => *width,
            Type::Array { element, len } => self.width_of(*element) * len,
            Type::Struct { fields } => fields.iter().map(|(_, ty)| self.width_of(*ty)).sum(),
        }
    }

    /// Returns the width if `id` is a `Bits` type.
    pub fn bits_width(&self, id: TypeId) -> Option<u32> {
        match self.try_get(id)? {
            Type::Bits { width } => Some(*width),
            _ => None,
        }
    }

    /// Looks up a struct field by name, returning its index and type.
    pub fn field(&self, id: TypeId, name: &str) -> Option<(usize, TypeId)> {
        match self.try_get(id)? {
            Type::Struct { fields } => fields
                .iter()
                .position(|(n, _)| n == name)
                .map(|i| (i, fields[i].1)),
            _ => None,
        }
    }

    /// Returns the low bit offset of struct field `index` in the packed layout.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a struct or `index` is out of range.
    pub fn field_offset(&self, id: TypeId, index: usize) -> u32 {
        match self.get(id) {
            Type::Struct { fields } => fields[index + 1..]
                .iter()
                .map(|(_, ty)| self.width_of(*ty))
                .sum(),
            other => panic!("field_offset on non-struct type {other:?}"),
        }
    }

    /// Returns the element type and length if `id` is an array.
    pub fn element(&self, id: TypeId) -> Option<(TypeId, u32)> {
        match self.try_get(id)? {
            Type::Array { element, len } => Some((*element, *len)),
            _ => None,
        }
    }

    /// Renders a type, e.g. `bits<8>[4]` or `struct { valid: bits<1> }`.
    pub fn display(&self, id: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, id);
        out
    }

    fn write_type(&self, out: &mut String, id: TypeId) {
        match self.try_get(id) {
            None => {
                let _ = write!(out, "<unknown {id}>");
            }
            Some(Type::Bits { width }) => {
                let _ = write!(out, "bits<{width}>");
            }
            Some(Type::Array { element, len }) => {
                self.write_type(out, *element);
                let _ = write!(out, "[{len}]");
            }
            Some(Type::Struct { fields }) => {
                out.push_str("struct { ");
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{name}: ");
                    self.write_type(out, *ty);
                }
                out.push_str(" }");
            }
        }
    }

    /// Interns a type, returning the existing ID if the shape is already known.
    ///
    /// Callers are responsible for the shape invariants; use the `make_*`
    /// constructors from outside this crate.
    pub(crate) fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(i) = self.types.iter().position(|existing| *existing == ty) {
            return TypeId::from_raw(i as u32);
        }
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Returns a reference to the type with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.as_raw() as usize]
    }

    /// Returns the type with the given ID, or `None` if it is unknown.
    pub fn try_get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.as_raw() as usize)
    }

    /// Returns the number of interned types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types have been interned.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn checked_width(&self, id: TypeId) -> Result<u32, TypeError> {
        if self.try_get(id).is_none() {
            return Err(TypeError::Unknown(id));
        }
        Ok(self.width_of(id))
    }
}

fn check_fits(width: u64) -> Result<(), TypeError> {
    if width > u64::from(u32::MAX) {
        return Err(TypeError::TooWide(width));
    }
    Ok(())
}
