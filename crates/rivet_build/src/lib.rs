//! Module realization: from descriptors and generators to a validated design.
//!
//! User code declares modules with [`ModuleDescriptor::builder`], giving each
//! a typed port interface and a generator closure. [`compile`] (or
//! [`System::compile_with`]) instantiates the roots, runs every generator
//! exactly once per instance through a [`Scope`], validates the finished
//! hierarchy, and hands it to a [`Backend`].
//!
//! # Usage
//!
//! ```ignore
//! let mux2 = ModuleDescriptor::builder("Mux2")
//!     .input("select", TypeSpec::bits(1))
//!     .input("a", TypeSpec::int(32))
//!     .input("b", TypeSpec::int(32))
//!     .output("out", TypeSpec::int(32))
//!     .generator(|s| {
//!         let (sel, a, b) = (s.input("select")?, s.input("a")?, s.input("b")?);
//!         let out = s.mux(sel, a, b)?;
//!         s.assign("out", out)
//!     })
//!     .build()?;
//! let design = System::named([mux2], "MUX2").compile()?;
//! ```

#![warn(missing_docs)]

pub mod compile;
pub mod context;
pub mod descriptor;
pub mod errors;
pub mod eval;
pub mod instantiate;
pub mod ops;
pub mod scope;
pub mod validate;

pub use compile::{
    compile, Backend, BackendError, CompileError, JsonBackend, NullBackend, System,
    ValidatedDesign,
};
pub use context::BuildContext;
pub use descriptor::{
    DescriptorId, Generator, ModuleBuilder, ModuleDescriptor, ModuleRef, PortDecl, TypeSpec,
};
pub use errors::{BuildError, BuildResult, ErrorKind};
pub use instantiate::{Bindings, InstanceHandle};
pub use ops::RegOptions;
pub use scope::Scope;

pub use rivet_common::BitsValue;
pub use rivet_ir::{ResetKind, Signal};
