//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "ember.toml";

/// Loads and validates `ember.toml` from a project directory.
///
/// Relative compile unit and user file paths are resolved against
/// `project_dir`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    let mut config = load_config_from_str(&content)?;
    config.build = config.build.resolve_relative(project_dir);
    Ok(config)
}

/// Parses and validates an `ember.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.id.trim().is_empty() {
        return Err(ConfigError::MissingField("project.id".to_string()));
    }
    if config.engine.workers == 0 {
        return Err(ConfigError::ValidationError(
            "engine.workers must be at least 1".to_string(),
        ));
    }
    Ok(())
}
