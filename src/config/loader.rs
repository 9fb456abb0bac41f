//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::env;
use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without environment overlay or validation.
pub fn load_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load the effective configuration: optional file, then environment, then
/// the command-line bind override, then semantic validation.
pub fn load_config(
    path: Option<&Path>,
    bind_address: Option<String>,
) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => ServiceConfig::default(),
    };

    env::apply_process_env(&mut config)?;
    if let Some(bind_address) = bind_address {
        config.listener.bind_address = bind_address;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
