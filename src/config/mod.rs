//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (MY_APP_CONFIG, MY_DB_PASSWORD, SERVICE_NAME, ...)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc with the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; responses never re-read the environment
//! - All file fields have defaults so no file is required
//! - The database secret is wrapped in [`Secret`] and never formatted in clear

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppSettings, ListenerConfig, LogFormat, ObservabilityConfig, Secret, ServiceConfig,
    TimeoutConfig, DEFAULT_SERVICE_NAME,
};
