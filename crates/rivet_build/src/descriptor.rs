//! Module descriptors and the generator protocol.
//!
//! A [`ModuleDescriptor`] declares a module's port interface and carries the
//! [`Generator`] that builds its body. Declaring and realizing are separate
//! steps: building a descriptor only records ports, and the generator runs
//! once per instance when the instance is realized.

use crate::errors::{BuildError, BuildResult};
use crate::scope::Scope;
use rivet_common::SourceLoc;
use rivet_ir::{PortDirection, PortRole, TypeDb, TypeError, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to a declared module.
pub type ModuleRef = Arc<ModuleDescriptor>;

/// Process-unique identity of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DescriptorId(u64);

impl DescriptorId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

/// A type description that does not depend on any [`TypeDb`].
///
/// Port types are declared before a design exists, so descriptors carry
/// `TypeSpec`s and intern them into the design's database on first use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// A bit vector.
    Bits(u32),
    /// A fixed-length array.
    Array(Box<TypeSpec>, u32),
    /// A struct with ordered named fields.
    Struct(Vec<(String, TypeSpec)>),
}

impl TypeSpec {
    /// A bit vector of `width` bits.
    pub fn bits(width: u32) -> Self {
        TypeSpec::Bits(width)
    }

    /// A signed or unsigned integer of `width` bits; integers are bit vectors.
    pub fn int(width: u32) -> Self {
        TypeSpec::Bits(width)
    }

    /// An array of `len` elements.
    pub fn array(element: TypeSpec, len: u32) -> Self {
        TypeSpec::Array(Box::new(element), len)
    }

    /// A struct with the given fields in order.
    pub fn structure<S: Into<String>>(fields: impl IntoIterator<Item = (S, TypeSpec)>) -> Self {
        TypeSpec::Struct(fields.into_iter().map(|(n, t)| (n.into(), t)).collect())
    }

    /// Interns this type into `db`.
    pub fn intern(&self, db: &mut TypeDb) -> Result<TypeId, TypeError> {
        match self {
            TypeSpec::Bits(width) => db.make_bits(*width),
            TypeSpec::Array(element, len) => {
                let element = element.intern(db)?;
                db.make_array(element, *len)
            }
            TypeSpec::Struct(fields) => {
                let mut interned = Vec::with_capacity(fields.len());
                for (name, ty) in fields {
                    interned.push((name.clone(), ty.intern(db)?));
                }
                db.make_struct(interned)
            }
        }
    }
}

/// The body-building callback of a module.
///
/// Implemented for every `Fn(&mut Scope<'_>) -> BuildResult<()>` closure.
pub trait Generator: Send + Sync {
    /// Builds the body of one instance: reads inputs from `scope`, creates
    /// signals, instantiates children, and assigns every output.
    fn generate(&self, scope: &mut Scope<'_>) -> BuildResult<()>;
}

impl<F> Generator for F
where
    F: Fn(&mut Scope<'_>) -> BuildResult<()> + Send + Sync,
{
    fn generate(&self, scope: &mut Scope<'_>) -> BuildResult<()> {
        self(scope)
    }
}

/// Port name for a clock or reset, either explicit or from `rivet.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PortName {
    Named(String),
    Configured,
}

/// One declared port.
#[derive(Debug, Clone)]
pub struct PortDecl {
    pub(crate) name: PortName,
    /// Direction of data flow.
    pub direction: PortDirection,
    /// Data, clock, or reset.
    pub role: PortRole,
    /// The declared type.
    pub ty: TypeSpec,
    /// Declaration site.
    pub loc: SourceLoc,
}

impl PortDecl {
    /// Returns the explicit name, or `None` for ports named by configuration.
    pub fn explicit_name(&self) -> Option<&str> {
        match &self.name {
            PortName::Named(name) => Some(name),
            PortName::Configured => None,
        }
    }
}

/// A reusable module declaration: port interface plus generator.
pub struct ModuleDescriptor {
    id: DescriptorId,
    name: String,
    ports: Vec<PortDecl>,
    generator: Option<Box<dyn Generator>>,
    loc: SourceLoc,
}

impl ModuleDescriptor {
    /// Starts declaring a module.
    #[track_caller]
    pub fn builder(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            name: name.into(),
            ports: Vec::new(),
            generator: None,
            loc: SourceLoc::caller(),
        }
    }

    /// Returns the descriptor's identity.
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Returns the module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared ports in order.
    pub fn ports(&self) -> &[PortDecl] {
        &self.ports
    }

    /// Returns the declaration site.
    pub fn loc(&self) -> &SourceLoc {
        &self.loc
    }

    /// Returns `true` if the descriptor has a generator.
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub(crate) fn generator(&self) -> Option<&dyn Generator> {
        self.generator.as_deref()
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("ports", &self.ports)
            .field("has_generator", &self.generator.is_some())
            .finish()
    }
}

/// Builder returned by [`ModuleDescriptor::builder`].
pub struct ModuleBuilder {
    name: String,
    ports: Vec<PortDecl>,
    generator: Option<Box<dyn Generator>>,
    loc: SourceLoc,
}

impl ModuleBuilder {
    /// Declares a data input.
    #[track_caller]
    pub fn input(self, name: impl Into<String>, ty: TypeSpec) -> Self {
        let name = PortName::Named(name.into());
        self.port(name, PortDirection::Input, PortRole::Data, ty)
    }

    /// Declares an output.
    #[track_caller]
    pub fn output(self, name: impl Into<String>, ty: TypeSpec) -> Self {
        let name = PortName::Named(name.into());
        self.port(name, PortDirection::Output, PortRole::Data, ty)
    }

    /// Declares the module's clock input.
    #[track_caller]
    pub fn clock(self, name: impl Into<String>) -> Self {
        let name = PortName::Named(name.into());
        self.port(name, PortDirection::Input, PortRole::Clock, TypeSpec::bits(1))
    }

    /// Declares the module's clock input, named by `[clock] port`.
    #[track_caller]
    pub fn default_clock(self) -> Self {
        self.port(PortName::Configured, PortDirection::Input, PortRole::Clock, TypeSpec::bits(1))
    }

    /// Declares the module's reset input.
    #[track_caller]
    pub fn reset(self, name: impl Into<String>) -> Self {
        let name = PortName::Named(name.into());
        self.port(name, PortDirection::Input, PortRole::Reset, TypeSpec::bits(1))
    }

    /// Declares the module's reset input, named by `[clock] reset_port`.
    #[track_caller]
    pub fn default_reset(self) -> Self {
        self.port(PortName::Configured, PortDirection::Input, PortRole::Reset, TypeSpec::bits(1))
    }

    /// Sets the generator closure.
    pub fn generator<F>(self, generator: F) -> Self
    where
        F: Fn(&mut Scope<'_>) -> BuildResult<()> + Send + Sync + 'static,
    {
        self.generator_impl(generator)
    }

    /// Sets a generator implemented by a custom type.
    pub fn generator_impl<G: Generator + 'static>(mut self, generator: G) -> Self {
        self.generator = Some(Box::new(generator));
        self
    }

    /// Finishes the declaration.
    ///
    /// Fails with a binding error on duplicate port names or a second clock
    /// or reset port.
    pub fn build(self) -> BuildResult<ModuleRef> {
        for (i, port) in self.ports.iter().enumerate() {
            let earlier = &self.ports[..i];
            let clash = match &port.name {
                PortName::Named(name) => earlier
                    .iter()
                    .any(|p| p.explicit_name() == Some(name.as_str())),
                PortName::Configured => false,
            };
            if clash {
                return Err(self.binding_error(port, "is declared twice"));
            }
            if port.role != PortRole::Data && earlier.iter().any(|p| p.role == port.role) {
                let what = if port.role == PortRole::Clock {
                    "is a second clock port"
                } else {
                    "is a second reset port"
                };
                return Err(self.binding_error(port, what));
            }
        }
        Ok(Arc::new(ModuleDescriptor {
            id: DescriptorId::next(),
            name: self.name,
            ports: self.ports,
            generator: self.generator,
            loc: self.loc,
        }))
    }

    #[track_caller]
    fn port(
        mut self,
        name: PortName,
        direction: PortDirection,
        role: PortRole,
        ty: TypeSpec,
    ) -> Self {
        self.ports.push(PortDecl {
            name,
            direction,
            role,
            ty,
            loc: SourceLoc::caller(),
        });
        self
    }

    fn binding_error(&self, port: &PortDecl, what: &str) -> BuildError {
        let name = port.explicit_name().unwrap_or("<configured>");
        BuildError::Binding {
            module: self.name.clone(),
            path: String::new(),
            message: format!("port `{name}` {what}"),
            loc: port.loc.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn descriptor_ids_are_unique() {
        let a = ModuleDescriptor::builder("A").build().unwrap();
        let b = ModuleDescriptor::builder("A").build().unwrap();
        assert_ne!(a.id(), b.id());
        assert!(!a.has_generator());
    }

    #[test]
    fn ports_in_declaration_order() {
        let m = ModuleDescriptor::builder("Mux2")
            .input("select", TypeSpec::bits(1))
            .input("a", TypeSpec::int(32))
            .input("b", TypeSpec::int(32))
            .output("out", TypeSpec::int(32))
            .generator(|_| Ok(()))
            .build()
            .unwrap();
        let names: Vec<_> = m.ports().iter().filter_map(PortDecl::explicit_name).collect();
        assert_eq!(names, ["select", "a", "b", "out"]);
        assert!(m.has_generator());
        assert_eq!(m.name(), "Mux2");
        assert!(!m.loc().is_unknown());
    }

    #[test]
    fn duplicate_port_rejected() {
        let err = ModuleDescriptor::builder("Bad")
            .input("a", TypeSpec::bits(1))
            .output("a", TypeSpec::bits(1))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BindingError);
        assert!(err.to_string().contains("`a` is declared twice"));
    }

    #[test]
    fn second_clock_rejected() {
        let err = ModuleDescriptor::builder("Bad")
            .clock("clk")
            .default_clock()
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("second clock"));
    }

    #[test]
    fn type_spec_interns_shapes() {
        let mut db = TypeDb::new();
        let spec = TypeSpec::structure([
            ("valid", TypeSpec::bits(1)),
            ("data", TypeSpec::array(TypeSpec::bits(8), 4)),
        ]);
        let a = spec.intern(&mut db).unwrap();
        let b = spec.clone().intern(&mut db).unwrap();
        assert_eq!(a, b);
        assert_eq!(db.width_of(a), 33);
        assert_eq!(TypeSpec::bits(0).intern(&mut db), Err(TypeError::ZeroWidth));
    }
}
