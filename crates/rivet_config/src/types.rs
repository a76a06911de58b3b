//! Configuration types deserialized from `rivet.toml`.

use serde::Deserialize;

/// The top-level configuration for one compilation.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// System metadata (name, output directory).
    pub system: SystemMeta,
    /// Default clock and reset port names.
    #[serde(default)]
    pub clock: ClockConfig,
    /// Lint levels for the final validation pass.
    #[serde(default)]
    pub lint: LintConfig,
}

impl SystemConfig {
    /// Creates a configuration with the given system name and defaults
    /// everywhere else.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            system: SystemMeta {
                name: name.into(),
                output_directory: None,
            },
            clock: ClockConfig::default(),
            lint: LintConfig::default(),
        }
    }
}

/// System metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemMeta {
    /// The name of the compiled system.
    pub name: String,
    /// Output directory passed through to the backend. The construction
    /// layer never touches the filesystem itself.
    #[serde(default)]
    pub output_directory: Option<String>,
}

/// Default names for implicit timing ports.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    /// Port name used by `clock()` declarations without an explicit name.
    #[serde(default = "default_clock_port")]
    pub port: String,
    /// Port name used by `reset()` declarations without an explicit name.
    #[serde(default = "default_reset_port")]
    pub reset_port: String,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            port: default_clock_port(),
            reset_port: default_reset_port(),
        }
    }
}

fn default_clock_port() -> String {
    "clk".to_string()
}

fn default_reset_port() -> String {
    "rst".to_string()
}

/// How a lint finding is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintLevel {
    /// Do not report.
    Allow,
    /// Report as a warning.
    #[default]
    Warn,
    /// Report as an error and abort compilation.
    Deny,
}

/// Lint levels applied after a design has been validated.
#[derive(Debug, Clone, Deserialize)]
pub struct LintConfig {
    /// An input port that no signal in its instance reads.
    #[serde(default)]
    pub unused_inputs: LintLevel,
    /// A register created without a reset.
    #[serde(default = "allow")]
    pub registers_without_reset: LintLevel,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            unused_inputs: LintLevel::Warn,
            registers_without_reset: LintLevel::Allow,
        }
    }
}

fn allow() -> LintLevel {
    LintLevel::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_uses_defaults() {
        let config = SystemConfig::named("MUX2");
        assert_eq!(config.system.name, "MUX2");
        assert!(config.system.output_directory.is_none());
        assert_eq!(config.clock.port, "clk");
        assert_eq!(config.clock.reset_port, "rst");
        assert_eq!(config.lint.unused_inputs, LintLevel::Warn);
        assert_eq!(config.lint.registers_without_reset, LintLevel::Allow);
    }

    #[test]
    fn lint_level_parses_lowercase() {
        let lint: LintConfig = toml::from_str(
            r#"
            unused_inputs = "deny"
            registers_without_reset = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(lint.unused_inputs, LintLevel::Deny);
        assert_eq!(lint.registers_without_reset, LintLevel::Warn);
    }
}
