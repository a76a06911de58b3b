//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::SystemConfig;
use std::path::Path;

/// The configuration file name looked up inside a project directory.
pub const CONFIG_FILE_NAME: &str = "rivet.toml";

/// Loads and validates `<project_dir>/rivet.toml`.
pub fn load_config(project_dir: &Path) -> Result<SystemConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE_NAME))?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SystemConfig, ConfigError> {
    let config: SystemConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and port names are usable.
fn validate_config(config: &SystemConfig) -> Result<(), ConfigError> {
    if config.system.name.is_empty() {
        return Err(ConfigError::MissingField("system.name".to_string()));
    }
    if config.clock.port.is_empty() {
        return Err(ConfigError::ValidationError(
            "clock.port must not be empty".to_string(),
        ));
    }
    if config.clock.port == config.clock.reset_port {
        return Err(ConfigError::ValidationError(format!(
            "clock and reset ports share the name `{}`",
            config.clock.port
        )));
    }
    Ok(())
}
