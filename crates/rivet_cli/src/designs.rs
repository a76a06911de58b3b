//! The reference designs bundled with the `rivet` binary.

use rivet_build::{Bindings, BuildResult, ModuleDescriptor, ModuleRef, TypeSpec};

/// A named design the CLI can compile.
pub struct BundledDesign {
    /// The name used on the command line.
    pub name: &'static str,
    /// One-line summary shown by `rivet list`.
    pub summary: &'static str,
    build: fn() -> BuildResult<ModuleRef>,
}

impl BundledDesign {
    /// Builds the root module descriptor of this design.
    pub fn root(&self) -> BuildResult<ModuleRef> {
        (self.build)()
    }
}

/// All bundled designs, in listing order.
pub const DESIGNS: &[BundledDesign] = &[
    BundledDesign {
        name: "mux2",
        summary: "32-bit two-way multiplexer",
        build: mux2,
    },
    BundledDesign {
        name: "or_ints",
        summary: "bitwise OR wrapped in a parent module",
        build: top_or_ints,
    },
    BundledDesign {
        name: "concat",
        summary: "two 4-bit inputs concatenated into one byte",
        build: signal_concat,
    },
    BundledDesign {
        name: "buffer",
        summary: "two-stage registered pipeline gated by a valid bit",
        build: buffer,
    },
];

/// Looks up a bundled design by name.
pub fn find(name: &str) -> Option<&'static BundledDesign> {
    DESIGNS.iter().find(|d| d.name == name)
}

fn mux2() -> BuildResult<ModuleRef> {
    ModuleDescriptor::builder("MUX2")
        .input("select", TypeSpec::bits(1))
        .input("a", TypeSpec::bits(32))
        .input("b", TypeSpec::bits(32))
        .output("out", TypeSpec::bits(32))
        .generator(|s| {
            let select = s.input("select")?;
            let a = s.input("a")?;
            let b = s.input("b")?;
            let out = s.mux(select, a, b)?;
            s.assign("out", out)
        })
        .build()
}

fn or_ints() -> BuildResult<ModuleRef> {
    ModuleDescriptor::builder("OrInts")
        .input("a", TypeSpec::int(32))
        .input("b", TypeSpec::int(32))
        .output("c", TypeSpec::int(32))
        .generator(|s| {
            let a = s.input("a")?;
            let b = s.input("b")?;
            let c = s.or(a, b)?;
            s.assign("c", c)
        })
        .build()
}

fn top_or_ints() -> BuildResult<ModuleRef> {
    let inner = or_ints()?;
    ModuleDescriptor::builder("Top_OrInts")
        .input("a", TypeSpec::int(32))
        .input("b", TypeSpec::int(32))
        .output("c", TypeSpec::int(32))
        .generator(move |s| {
            let a = s.input("a")?;
            let b = s.input("b")?;
            let bindings = Bindings::new().bind("a", a).bind("b", b);
            let child = s.instantiate(&inner, "or_ints", bindings)?;
            let c = child.output("c")?;
            s.assign("c", c)
        })
        .build()
}

fn signal_concat() -> BuildResult<ModuleRef> {
    ModuleDescriptor::builder("Signal_concat")
        .input("a", TypeSpec::int(4))
        .input("b", TypeSpec::int(4))
        .output("out", TypeSpec::int(8))
        .generator(|s| {
            let a = s.input("a")?;
            let b = s.input("b")?;
            let out = s.concat(&[a, b])?;
            s.assign("out", out)
        })
        .build()
}

fn buffer() -> BuildResult<ModuleRef> {
    ModuleDescriptor::builder("Buffer")
        .default_clock()
        .input(
            "master",
            TypeSpec::structure([("valid", TypeSpec::int(1)), ("data", TypeSpec::int(32))]),
        )
        .output("out", TypeSpec::int(32))
        .generator(|s| {
            let master = s.input("master")?;
            let valid = s.field(master, "valid")?;
            let data = s.field(master, "data")?;
            let delayed = s.reg(data)?;
            let delayed = s.reg(delayed)?;
            let zero = s.constant_u64(32, 0)?;
            let out = s.mux(valid, delayed, zero)?;
            s.assign("out", out)
        })
        .build()
}
