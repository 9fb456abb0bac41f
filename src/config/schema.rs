//! Configuration schema definitions.
//!
//! File-backed settings derive Serde traits for deserialization from TOML.
//! Values that only ever come from the process environment (the app config
//! string and the database secret) live in [`AppSettings`] and are skipped
//! by Serde.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Service name used when `SERVICE_NAME` is unset or empty.
pub const DEFAULT_SERVICE_NAME: &str = "azni-flask-app";

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Logging and trace export settings.
    pub observability: ObservabilityConfig,

    /// Environment-sourced payload settings.
    #[serde(skip)]
    pub app: AppSettings,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Parse a format name, ignoring case. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Name attached to every emitted segment.
    pub service_name: String,

    /// Default log filter, overridden by `RUST_LOG`.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// OTLP/gRPC collector endpoint. Span export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "azni=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            otlp_endpoint: None,
        }
    }
}

/// Settings exposed (or masked) in the greeting payload.
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    /// Free-form application config string, returned verbatim.
    pub app_config: Option<String>,

    /// Database password. Only its presence is ever observable.
    pub db_password: Option<Secret>,
}

/// A string that never renders its contents through formatting traits.
///
/// Use [`expose`](Self::expose) to read the value where it is genuinely
/// needed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Mask printed in place of the value.
    pub const MASK: &'static str = "*****";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", Self::MASK)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::MASK)
    }
}
