//! Structured logging.
//!
//! Installs the global subscriber: `EnvFilter` (from `RUST_LOG`, falling
//! back to the configured level), a `fmt` layer in pretty or JSON form, and
//! the OpenTelemetry bridge when span export is configured.
//!
//! Initialization is best-effort. Exporter failures and an already-installed
//! subscriber are reported and the service keeps running.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::observability::tracing::{build_provider, TelemetryError, TelemetryGuard};

pub fn init(config: &ObservabilityConfig) -> TelemetryGuard {
    let (guard, export_error) = match build_provider(config) {
        Ok(provider) => (TelemetryGuard::new(provider), None),
        Err(e) => (TelemetryGuard::default(), Some(e)),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    let otel_layer = guard
        .tracer(&config.service_name)
        .map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()));

    if let Err(e) = installed {
        tracing::warn!(error = %e, "Keeping existing subscriber");
    }

    match export_error {
        Some(e) => tracing::warn!(error = %e, "Span export disabled"),
        None if guard.is_exporting() => tracing::info!(
            endpoint = config.otlp_endpoint.as_deref().unwrap_or_default(),
            service_name = %config.service_name,
            "Span export enabled"
        ),
        None => tracing::debug!("Span export not configured"),
    }

    guard
}
