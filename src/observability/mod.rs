//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → recorder.rs segment_layer (root segment per request)
//!     → handler: Subsegment guard + put_annotation
//!
//! Spans and events
//!     → logging.rs (EnvFilter + fmt, pretty or JSON)
//!     → tracing.rs (OpenTelemetry bridge, OTLP export when configured)
//! ```
//!
//! # Design Decisions
//! - One recorder per process, injected through handler state
//! - Subsegments end on drop so no exit path leaks an open span
//! - Export is optional and never fails a request

pub mod logging;
pub mod recorder;
pub mod tracing;

pub use recorder::{segment_layer, AnnotationValue, Subsegment, TraceRecorder};
pub use self::tracing::{TelemetryError, TelemetryGuard};
