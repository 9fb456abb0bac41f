//! OpenTelemetry span export.
//!
//! Export is optional: with no OTLP endpoint configured, spans stay local to
//! the log subscriber. A collector that cannot be reached never affects
//! request handling; the batch exporter drops and logs on its own task.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};

use crate::config::ObservabilityConfig;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to create exporter: {0}")]
    Exporter(String),

    #[error("Failed to install subscriber: {0}")]
    Subscriber(String),
}

/// Build a tracer provider exporting to the configured OTLP endpoint.
///
/// Returns `Ok(None)` when export is not configured.
pub fn build_provider(
    config: &ObservabilityConfig,
) -> Result<Option<TracerProvider>, TelemetryError> {
    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        return Ok(None);
    };

    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(TelemetryError::Exporter(format!(
            "endpoint {endpoint:?} must start with http:// or https://"
        )));
    }

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
        .build();

    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());

    Ok(Some(provider))
}

/// Owns the tracer provider and flushes it on shutdown.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    provider: Option<TracerProvider>,
}

impl TelemetryGuard {
    pub fn new(provider: Option<TracerProvider>) -> Self {
        Self { provider }
    }

    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }

    pub fn tracer(&self, service_name: &str) -> Option<Tracer> {
        self.provider
            .as_ref()
            .map(|p| p.tracer(service_name.to_string()))
    }

    /// Flush pending spans and stop the exporter.
    pub fn shutdown(mut self) {
        self.flush();
    }

    fn flush(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Span exporter shutdown failed");
            }
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        self.flush();
    }
}
