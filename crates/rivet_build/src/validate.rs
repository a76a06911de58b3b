//! Whole-design validation and lints.
//!
//! [`validate`] re-checks the invariants realization is supposed to have
//! established, across the complete hierarchy, before a design may leave the
//! builder: every instance frozen with every output assigned at the port's
//! type, every signal reading only earlier signals of its own instance, every
//! binding driven from the parent, and no module instantiating itself. It
//! then runs the configured lints.

use std::collections::HashSet;

use petgraph::algo::tarjan_scc;
use rivet_common::SourceLoc;
use rivet_config::{LintLevel, SystemConfig};
use rivet_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use rivet_ir::{Design, Instance, PortRole, SignalId, SignalKind};
use tracing::debug;

use crate::compile::ValidatedDesign;
use crate::errors::{BuildError, BuildResult, W300, W301};

/// Validates a fully realized design and runs lints.
///
/// Lint findings at `warn` go to `sink`; a finding at `deny` fails the
/// design.
pub fn validate(
    design: Design,
    config: &SystemConfig,
    sink: &DiagnosticSink,
) -> BuildResult<ValidatedDesign> {
    check_hierarchy(&design)?;
    for inst in design.instances.values() {
        check_instance(&design, inst)?;
    }
    check_signals(&design)?;
    run_lints(&design, config, sink)?;
    debug!(
        instances = design.instance_count(),
        signals = design.signals.len(),
        "design validated"
    );
    Ok(ValidatedDesign::new(design))
}

fn check_hierarchy(design: &Design) -> BuildResult<()> {
    if !design.has_instantiation_cycle() {
        return Ok(());
    }
    let graph = design.module_graph();
    let cycle = tarjan_scc(&graph)
        .into_iter()
        .find(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .unwrap_or_default();
    let names: Vec<String> = cycle
        .iter()
        .map(|m| design.resolve(design.modules[*m].name).to_string())
        .collect();
    let module = names.first().cloned().unwrap_or_default();
    let path = cycle
        .first()
        .and_then(|m| design.modules[*m].instances.first())
        .map(|i| design.instances[*i].path.clone())
        .unwrap_or_default();
    let mut cycle = names;
    cycle.push(module.clone());
    Err(BuildError::CyclicInstantiation {
        module,
        path,
        cycle,
        loc: SourceLoc::UNKNOWN,
    })
}

fn check_instance(design: &Design, inst: &Instance) -> BuildResult<()> {
    let module = design.module_of(inst.id);
    let module_name = design.resolve(module.name);
    if let Some(port) = inst.first_unassigned() {
        return Err(BuildError::UnassignedOutput {
            module: module_name.to_string(),
            path: inst.path.clone(),
            port: design.resolve(port).to_string(),
        });
    }
    if !inst.is_frozen() {
        return Err(BuildError::Frozen {
            path: inst.path.clone(),
            message: "was never frozen".to_string(),
            loc: SourceLoc::UNKNOWN,
        });
    }

    for slot in &inst.outputs {
        let (Some(port), Some(id)) = (module.port(slot.port), slot.signal) else {
            continue;
        };
        let node = &design.signals[id];
        check_owner(design, inst, id)?;
        if node.ty != port.ty {
            return Err(mismatch(design, inst, slot.port, port.ty, node.ty));
        }
    }

    if let Some(parent) = inst.parent {
        let parent = &design.instances[parent];
        for port in module.inputs() {
            let Some(driver) = inst.binding(port.name) else {
                return Err(BuildError::Binding {
                    module: module_name.to_string(),
                    path: inst.path.clone(),
                    message: format!("input `{}` is not bound", design.resolve(port.name)),
                    loc: SourceLoc::UNKNOWN,
                });
            };
            check_owner(design, parent, driver)?;
            let ty = design.signals[driver].ty;
            if ty != port.ty {
                return Err(mismatch(design, inst, port.name, port.ty, ty));
            }
        }
    }
    Ok(())
}

fn check_signals(design: &Design) -> BuildResult<()> {
    for node in design.signals.values() {
        let owner = &design.instances[node.owner];
        for operand in node.kind.operands() {
            if operand >= node.id {
                return Err(BuildError::Type {
                    path: owner.path.clone(),
                    message: format!("{} reads {operand}, which is not defined before it", node.id),
                    loc: node.loc.clone(),
                });
            }
            check_owner(design, owner, operand)?;
        }
        if let SignalKind::Register { clock, .. } = &node.kind {
            let is_clock = matches!(
                &design.signals[*clock].kind,
                SignalKind::Port { port }
                    if design
                        .module_of(node.owner)
                        .port(*port)
                        .is_some_and(|p| p.role == PortRole::Clock)
            );
            if !is_clock {
                return Err(BuildError::Config {
                    path: owner.path.clone(),
                    message: format!("register {} is not clocked by its module's clock", node.id),
                    loc: node.loc.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_owner(design: &Design, inst: &Instance, id: SignalId) -> BuildResult<()> {
    let owner = design.signals[id].owner;
    if owner != inst.id {
        return Err(BuildError::ForeignSignal {
            path: inst.path.clone(),
            signal: id,
            owner: design.instances[owner].path.clone(),
            loc: design.signals[id].loc.clone(),
        });
    }
    Ok(())
}

fn mismatch(
    design: &Design,
    inst: &Instance,
    port: rivet_common::Ident,
    expected: rivet_ir::TypeId,
    got: rivet_ir::TypeId,
) -> BuildError {
    BuildError::Type {
        path: inst.path.clone(),
        message: format!(
            "port `{}` expects {}, got {}",
            design.resolve(port),
            design.types.display(expected),
            design.types.display(got)
        ),
        loc: SourceLoc::UNKNOWN,
    }
}

struct Finding {
    path: String,
    message: String,
    loc: SourceLoc,
}

fn run_lints(design: &Design, config: &SystemConfig, sink: &DiagnosticSink) -> BuildResult<()> {
    let unused = if config.lint.unused_inputs == LintLevel::Allow {
        Vec::new()
    } else {
        unused_inputs(design)
    };
    report(
        "unused_inputs",
        config.lint.unused_inputs,
        W300,
        unused,
        sink,
    )?;

    let unreset = if config.lint.registers_without_reset == LintLevel::Allow {
        Vec::new()
    } else {
        registers_without_reset(design)
    };
    report(
        "registers_without_reset",
        config.lint.registers_without_reset,
        W301,
        unreset,
        sink,
    )
}

fn unused_inputs(design: &Design) -> Vec<Finding> {
    let mut read: HashSet<SignalId> = HashSet::new();
    for node in design.signals.values() {
        read.extend(node.kind.operands());
    }
    for inst in design.instances.values() {
        read.extend(inst.outputs.iter().filter_map(|s| s.signal));
        read.extend(inst.bindings.iter().map(|b| b.signal));
    }

    let mut findings = Vec::new();
    for inst in design.instances.values() {
        let module = design.module_of(inst.id);
        for (port, id) in &inst.ports {
            let is_data = module.port(*port).is_some_and(|p| p.role == PortRole::Data);
            if is_data && !read.contains(id) {
                findings.push(Finding {
                    path: inst.path.clone(),
                    message: format!("input `{}` is never read", design.resolve(*port)),
                    loc: design.signals[*id].loc.clone(),
                });
            }
        }
    }
    findings
}

fn registers_without_reset(design: &Design) -> Vec<Finding> {
    design
        .signals
        .values()
        .filter(|n| matches!(n.kind, SignalKind::Register { reset: None, .. }))
        .map(|n| Finding {
            path: design.instances[n.owner].path.clone(),
            message: format!("register {} has no reset", n.id),
            loc: n.loc.clone(),
        })
        .collect()
}

fn report(
    lint: &'static str,
    level: LintLevel,
    code: DiagnosticCode,
    findings: Vec<Finding>,
    sink: &DiagnosticSink,
) -> BuildResult<()> {
    for finding in findings {
        match level {
            LintLevel::Allow => {}
            LintLevel::Warn => sink.emit(
                Diagnostic::warning(code, finding.message)
                    .at_path(finding.path)
                    .at_location(finding.loc)
                    .with_note(format!("`{lint}` is set to `warn` in rivet.toml")),
            ),
            LintLevel::Deny => {
                return Err(BuildError::Lint {
                    lint,
                    path: finding.path,
                    message: finding.message,
                });
            }
        }
    }
    Ok(())
}
