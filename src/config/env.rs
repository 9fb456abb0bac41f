//! Environment overlay.
//!
//! Reads the process environment on top of file/default settings. The
//! lookup is injected so callers (and tests) can supply any source.

use std::ffi::OsString;

use crate::config::loader::ConfigError;
use crate::config::schema::{LogFormat, Secret, ServiceConfig};

/// Application config string, returned verbatim in responses.
pub const APP_CONFIG_VAR: &str = "MY_APP_CONFIG";
/// Database secret. Only presence is observable.
pub const DB_PASSWORD_VAR: &str = "MY_DB_PASSWORD";
/// Service name attached to trace segments.
pub const SERVICE_NAME_VAR: &str = "SERVICE_NAME";
/// OTLP collector endpoint.
pub const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";
/// Log output format (`pretty` or `json`).
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

/// Apply environment values from the real process environment.
///
/// Values that are not valid UTF-8 still count as set; they are converted
/// lossily.
pub fn apply_process_env(config: &mut ServiceConfig) -> Result<(), ConfigError> {
    apply_env(config, |name| os_value(std::env::var_os(name)))
}

fn os_value(value: Option<OsString>) -> Option<String> {
    value.map(|v| v.to_string_lossy().into_owned())
}

/// Apply environment values using `lookup` as the source.
pub fn apply_env<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    config.app.app_config = lookup(APP_CONFIG_VAR);
    config.app.db_password = lookup(DB_PASSWORD_VAR)
        .filter(|v| !v.is_empty())
        .map(Secret::new);

    if let Some(name) = lookup(SERVICE_NAME_VAR).filter(|v| !v.is_empty()) {
        config.observability.service_name = name;
    }

    if let Some(endpoint) = non_empty(lookup(OTLP_ENDPOINT_VAR)) {
        config.observability.otlp_endpoint = Some(endpoint);
    }

    if let Some(raw) = non_empty(lookup(LOG_FORMAT_VAR)) {
        config.observability.log_format =
            LogFormat::parse(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                name: LOG_FORMAT_VAR,
                value: raw,
            })?;
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
