//! The `rivet compile` command.

use std::io::{self, Write};
use std::path::Path;

use rivet_build::{CompileError, JsonBackend, System};
use rivet_config::{load_config, load_config_from_str, ConfigError, SystemConfig, CONFIG_FILE_NAME};
use rivet_diagnostics::{Diagnostic, DiagnosticRenderer, JsonRenderer, TerminalRenderer};
use rivet_ir::Design;
use tracing::info;

use crate::designs::{self, BundledDesign};
use crate::{CompileArgs, GlobalArgs, ReportFormat};

/// Compiles a bundled design and reports the result.
///
/// Returns exit code 0 on success and 1 when the design fails to build.
pub fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let bundled = designs::find(&args.design)
        .ok_or_else(|| format!("unknown design `{}` (see `rivet list`)", args.design))?;
    let config = resolve_config(global.config.as_deref(), bundled.name)?;
    info!(design = bundled.name, system = %config.system.name, "compiling");

    let stdout = io::stdout();
    let stderr = io::stderr();
    let code = compile_design(
        bundled,
        config,
        args.format,
        global,
        &mut stdout.lock(),
        &mut stderr.lock(),
    )?;
    Ok(code)
}

/// Reads the configuration from `path`, then `./rivet.toml`, falling back to defaults.
fn resolve_config(path: Option<&str>, design: &str) -> Result<SystemConfig, ConfigError> {
    match path {
        Some(path) => load_config_from_str(&std::fs::read_to_string(path)?),
        None if Path::new(CONFIG_FILE_NAME).is_file() => load_config(Path::new(".")),
        None => Ok(SystemConfig::named(design)),
    }
}

fn compile_design(
    bundled: &BundledDesign,
    config: SystemConfig,
    format: ReportFormat,
    global: &GlobalArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<i32, Box<dyn std::error::Error>> {
    let root = match bundled.root() {
        Ok(root) => root,
        Err(e) => {
            render(&[e.to_diagnostic()], format, global, err)?;
            return Ok(1);
        }
    };

    let system = System::new([root], config);
    let result = match format {
        ReportFormat::Text => system.compile().map_err(CompileError::from),
        ReportFormat::Json => system.compile_with(&mut JsonBackend::new(&mut *out)),
    };
    render(&system.sink().take_all(), format, global, err)?;

    match result {
        Ok(design) => {
            if format == ReportFormat::Text && !global.quiet {
                write!(out, "{}", instance_tree(&design))?;
                writeln!(
                    out,
                    "compiled `{}`: {} modules, {} instances, {} signals",
                    design.name,
                    design.module_count(),
                    design.instance_count(),
                    design.signals.len()
                )?;
            }
            Ok(0)
        }
        Err(CompileError::Build(_)) => Ok(1),
        Err(CompileError::Backend(e)) => Err(e.into()),
    }
}

/// Renders diagnostics to `err`. Warnings are dropped under `--quiet`.
fn render(
    diagnostics: &[Diagnostic],
    format: ReportFormat,
    global: &GlobalArgs,
    err: &mut dyn Write,
) -> io::Result<()> {
    let renderer: Box<dyn DiagnosticRenderer> = match format {
        ReportFormat::Text => Box::new(TerminalRenderer::new(global.color)),
        ReportFormat::Json => Box::new(JsonRenderer),
    };
    for diag in diagnostics {
        if global.quiet && !diag.severity.is_error() {
            continue;
        }
        writeln!(err, "{}", renderer.render(diag).trim_end())?;
    }
    Ok(())
}

/// Formats the instance hierarchy, one `name (Module)` line per instance.
fn instance_tree(design: &Design) -> String {
    let mut out = String::new();
    design.walk(|inst, depth| {
        let module = design.resolve(design.modules[inst.module].name);
        out.push_str(&format!(
            "{}{} ({module})\n",
            "  ".repeat(depth),
            design.resolve(inst.name)
        ));
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(quiet: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose: false,
            color: false,
            config: None,
        }
    }

    fn run_design(
        name: &str,
        config: SystemConfig,
        format: ReportFormat,
        quiet: bool,
    ) -> (i32, String, String) {
        let bundled = designs::find(name).unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code =
            compile_design(bundled, config, format, &global(quiet), &mut out, &mut err).unwrap();
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn text_output_prints_instance_tree() {
        let (code, out, err) =
            run_design("or_ints", SystemConfig::named("or"), ReportFormat::Text, false);
        assert_eq!(code, 0);
        assert!(err.is_empty());
        assert!(out.starts_with("Top_OrInts (Top_OrInts)\n  or_ints (OrInts)\n"));
        assert!(out.contains("2 modules, 2 instances"));
    }

    #[test]
    fn quiet_suppresses_tree() {
        let (code, out, _) = run_design("mux2", SystemConfig::named("m"), ReportFormat::Text, true);
        assert_eq!(code, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn json_output_is_the_design() {
        let (code, out, _) =
            run_design("concat", SystemConfig::named("cat"), ReportFormat::Json, false);
        assert_eq!(code, 0);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["name"], "cat");
    }

    #[test]
    fn denied_lint_fails_with_diagnostic() {
        let config = load_config_from_str(
            r#"
            [system]
            name = "buf"

            [lint]
            registers_without_reset = "deny"
            "#,
        )
        .unwrap();
        let (code, out, err) = run_design("buffer", config, ReportFormat::Text, false);
        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert!(err.contains("error[E311]"), "{err}");
    }

    #[test]
    fn warnings_are_rendered_unless_quiet() {
        let config = load_config_from_str(
            r#"
            [system]
            name = "buf"

            [lint]
            registers_without_reset = "warn"
            "#,
        )
        .unwrap();
        let (code, _, err) = run_design("buffer", config.clone(), ReportFormat::Text, false);
        assert_eq!(code, 0);
        assert!(err.contains("warning[W301]"), "{err}");

        let (_, _, err) = run_design("buffer", config, ReportFormat::Text, true);
        assert!(err.is_empty());
    }

    #[test]
    fn configured_clock_name_reaches_buffer() {
        let config = load_config_from_str(
            r#"
            [system]
            name = "buf"

            [clock]
            port = "sys_clk"
            "#,
        )
        .unwrap();
        let (code, _, _) = run_design("buffer", config.clone(), ReportFormat::Text, false);
        assert_eq!(code, 0);

        let root = designs::find("buffer").unwrap().root().unwrap();
        let design = System::new([root], config).compile().unwrap();
        let clock = design.find_module("Buffer").unwrap().clock_port().unwrap();
        assert_eq!(design.resolve(clock.name), "sys_clk");
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[system]\nname = \"custom\"\n").unwrap();
        let config = resolve_config(path.to_str(), "mux2").unwrap();
        assert_eq!(config.system.name, "custom");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            resolve_config(path.to_str(), "mux2"),
            Err(ConfigError::IoError(_))
        ));
    }
}
