//! End-to-end compilation of the four reference designs.

use rivet_build::eval::{fold, Env};
use rivet_build::{
    compile, BitsValue, JsonBackend, ModuleDescriptor, ModuleRef, System, TypeSpec,
};
use rivet_config::{LintLevel, SystemConfig};
use rivet_diagnostics::DiagnosticSink;
use rivet_ir::{Design, OpKind, SignalId, SignalKind};

fn mux2() -> ModuleRef {
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
        .unwrap()
}

fn or_ints() -> ModuleRef {
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
        .unwrap()
}

fn top_or_ints() -> ModuleRef {
    let inner = or_ints();
    ModuleDescriptor::builder("Top_OrInts")
        .input("a", TypeSpec::int(32))
        .input("b", TypeSpec::int(32))
        .output("c", TypeSpec::int(32))
        .generator(move |s| {
            let a = s.input("a")?;
            let b = s.input("b")?;
            let child = s.instantiate(
                &inner,
                "or_ints",
                rivet_build::Bindings::new().bind("a", a).bind("b", b),
            )?;
            let c = child.output("c")?;
            s.assign("c", c)
        })
        .build()
        .unwrap()
}

fn signal_concat() -> ModuleRef {
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
        .unwrap()
}

fn buffer() -> ModuleRef {
    ModuleDescriptor::builder("Buffer")
        .clock("clk")
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
        .unwrap()
}

fn output(design: &Design, path: &str, port: &str) -> SignalId {
    let inst = design.find_instance(path).unwrap();
    inst.outputs
        .iter()
        .find(|s| design.resolve(s.port) == port)
        .and_then(|s| s.signal)
        .unwrap()
}

fn input(design: &Design, path: &str, port: &str) -> SignalId {
    let inst = design.find_instance(path).unwrap();
    inst.ports
        .iter()
        .find(|(p, _)| design.resolve(*p) == port)
        .map(|(_, id)| *id)
        .unwrap()
}

#[test]
fn mux2_output_is_bits32() {
    let design = System::named([mux2()], "MUX2").compile().unwrap();
    let out = output(&design, "MUX2", "out");
    let ty = design.signals[out].ty;
    assert_eq!(design.types.display(ty), "bits<32>");
    assert!(matches!(
        design.signals[out].kind,
        SignalKind::Op { op: OpKind::Mux, .. }
    ));
}

#[test]
fn mux2_selects_a_on_zero_and_b_on_one() {
    let design = System::named([mux2()], "MUX2").compile().unwrap();
    let out = output(&design, "MUX2", "out");
    let env_for = |select: u64| {
        Env::from([
            (input(&design, "MUX2", "select"), BitsValue::from_u64(select, 1)),
            (input(&design, "MUX2", "a"), BitsValue::from_u64(0xAAAA_0000, 32)),
            (input(&design, "MUX2", "b"), BitsValue::from_u64(0x0000_BBBB, 32)),
        ])
    };
    for _ in 0..2 {
        assert_eq!(fold(&design, out, &env_for(0)).unwrap().to_u64(), Some(0xAAAA_0000));
        assert_eq!(fold(&design, out, &env_for(1)).unwrap().to_u64(), Some(0x0000_BBBB));
    }
}

#[test]
fn or_ints_hierarchy() {
    let design = System::named([top_or_ints()], "Top_OrInts").compile().unwrap();
    assert_eq!(design.module_count(), 2);
    assert_eq!(design.instance_count(), 2);
    let child = design.find_instance("Top_OrInts.or_ints").unwrap();
    assert_eq!(child.bindings.len(), 2);
    assert_eq!(design.modules_bottom_up().unwrap().len(), 2);

    let env = Env::from([
        (input(&design, "Top_OrInts", "a"), BitsValue::from_u64(0b1100, 32)),
        (input(&design, "Top_OrInts", "b"), BitsValue::from_u64(0b1010, 32)),
    ]);
    let c = output(&design, "Top_OrInts", "c");
    assert!(matches!(design.signals[c].kind, SignalKind::InstanceOutput { .. }));
    assert_eq!(fold(&design, c, &env).unwrap().to_u64(), Some(0b1110));
}

#[test]
fn or_ints_instantiated_twice_shares_module() {
    let inner = or_ints();
    let top = ModuleDescriptor::builder("Twice")
        .input("a", TypeSpec::int(32))
        .input("b", TypeSpec::int(32))
        .output("c", TypeSpec::int(32))
        .generator(move |s| {
            let a = s.input("a")?;
            let b = s.input("b")?;
            let first = s.instantiate(
                &inner,
                "first",
                rivet_build::Bindings::new().bind("a", a).bind("b", b),
            )?;
            let ab = first.output("c")?;
            let second = s.instantiate(
                &inner,
                "second",
                rivet_build::Bindings::new().bind("a", ab).bind("b", a),
            )?;
            s.assign("c", second.output("c")?)
        })
        .build()
        .unwrap();
    let design = System::named([top], "Twice").compile().unwrap();
    assert_eq!(design.module_count(), 2);
    let leaf = design.find_module("OrInts").unwrap();
    assert_eq!(leaf.instances.len(), 2);
}

#[test]
fn concat_places_first_operand_high() {
    let design = System::named([signal_concat()], "Signal_concat").compile().unwrap();
    let out = output(&design, "Signal_concat", "out");
    assert_eq!(design.types.display(design.signals[out].ty), "bits<8>");
    let env = Env::from([
        (input(&design, "Signal_concat", "a"), BitsValue::from_binary_str("1010").unwrap()),
        (input(&design, "Signal_concat", "b"), BitsValue::from_binary_str("0101").unwrap()),
    ]);
    assert_eq!(fold(&design, out, &env).unwrap().to_string(), "10100101");
}

#[test]
fn buffer_registers_data_twice() {
    let design = System::named([buffer()], "Buffer").compile().unwrap();
    let root = design.find_instance("Buffer").unwrap();
    assert_eq!(root.ports.len(), 2);
    let registers: Vec<_> = design
        .signals_of(root.id)
        .filter(|n| n.kind.is_register())
        .collect();
    assert_eq!(registers.len(), 2);
    let SignalKind::Register { input: second_input, .. } = registers[1].kind else {
        unreachable!()
    };
    assert_eq!(second_input, registers[0].id);

    let out = output(&design, "Buffer", "out");
    let env = Env::from([(
        input(&design, "Buffer", "master"),
        BitsValue::from_u64(0x1234, 33),
    )]);
    // `valid` is the top bit and is 0, so the constant arm is not taken and
    // the registered arm cannot fold.
    assert_eq!(fold(&design, out, &env), None);
    let env = Env::from([(
        input(&design, "Buffer", "master"),
        BitsValue::from_u64(1 << 32, 33),
    )]);
    assert_eq!(fold(&design, out, &env).unwrap().to_u64(), Some(0));
}

#[test]
fn buffer_lint_flags_registers_without_reset() {
    let mut config = SystemConfig::named("Buffer");
    config.lint.registers_without_reset = LintLevel::Warn;
    let sink = DiagnosticSink::new();
    compile(&[buffer()], &config, &sink).unwrap();
    assert_eq!(sink.warning_count(), 2);
    assert!(sink
        .diagnostics()
        .iter()
        .all(|d| d.code.to_string() == "W301" && d.path.as_deref() == Some("Buffer")));

    config.lint.registers_without_reset = LintLevel::Deny;
    let err = compile(&[buffer()], &config, &DiagnosticSink::new()).unwrap_err();
    assert_eq!(err.code().to_string(), "E311");
}

#[test]
fn all_designs_in_one_system() {
    let system = System::named(
        [mux2(), top_or_ints(), signal_concat(), buffer()],
        "all",
    );
    let mut backend = JsonBackend::new(Vec::new());
    let design = system.compile_with(&mut backend).unwrap();
    assert_eq!(design.roots.len(), 4);
    assert_eq!(design.module_count(), 5);
    let json: serde_json::Value = serde_json::from_slice(&backend.into_inner()).unwrap();
    assert_eq!(json["roots"].as_array().unwrap().len(), 4);
    assert_eq!(system.sink().warning_count(), 0);
}
