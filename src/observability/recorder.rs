//! Trace recorder: segments, subsegments and annotations.
//!
//! A single [`TraceRecorder`] is built at startup and shared through handler
//! state. Segments are opened by middleware (see [`segment_layer`]); handlers
//! open [`Subsegment`] guards which end themselves when dropped, so every exit
//! path closes them.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, Request, Response};
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TraceContextExt;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, MakeSpan, OnResponse, TraceLayer};
use tracing::field::Empty;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Tracing client bound to a service name.
#[derive(Debug)]
pub struct TraceRecorder {
    service_name: String,
    open_subsegments: Arc<AtomicUsize>,
}

impl TraceRecorder {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            open_subsegments: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Number of subsegments begun but not yet ended.
    pub fn open_subsegments(&self) -> usize {
        self.open_subsegments.load(Ordering::Acquire)
    }

    /// Open the root segment for an inbound request.
    ///
    /// A W3C `traceparent` header, when present and valid, becomes the
    /// remote parent of the segment.
    pub fn begin_segment<B>(&self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");

        let span = tracing::info_span!(
            "segment",
            otel.name = %self.service_name,
            otel.kind = "server",
            service.name = %self.service_name,
            http.method = %request.method(),
            http.target = %request.uri().path(),
            http.status_code = Empty,
            request_id = %request_id,
        );

        if let Some(parent) = extract_remote_context(request.headers()) {
            span.set_parent(parent);
        }

        span
    }

    /// Open a subsegment under the current span.
    pub fn begin_subsegment(&self, name: impl Into<String>) -> Subsegment {
        let name = name.into();
        let span = tracing::info_span!(
            "subsegment",
            otel.name = %name,
            service.name = %self.service_name,
        );
        self.open_subsegments.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(parent: &span, subsegment = %name, "subsegment begun");

        Subsegment {
            name,
            span,
            started: Instant::now(),
            annotations: Vec::new(),
            open: Arc::clone(&self.open_subsegments),
            ended: false,
        }
    }
}

/// Value of an annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Int(v) => write!(f, "{v}"),
            AnnotationValue::Bool(v) => write!(f, "{v}"),
            AnnotationValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for AnnotationValue {
    fn from(v: i64) -> Self {
        AnnotationValue::Int(v)
    }
}

impl From<usize> for AnnotationValue {
    fn from(v: usize) -> Self {
        AnnotationValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<bool> for AnnotationValue {
    fn from(v: bool) -> Self {
        AnnotationValue::Bool(v)
    }
}

impl From<&str> for AnnotationValue {
    fn from(v: &str) -> Self {
        AnnotationValue::Str(v.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(v: String) -> Self {
        AnnotationValue::Str(v)
    }
}

impl From<AnnotationValue> for opentelemetry::Value {
    fn from(v: AnnotationValue) -> Self {
        match v {
            AnnotationValue::Int(v) => v.into(),
            AnnotationValue::Bool(v) => v.into(),
            AnnotationValue::Str(v) => v.into(),
        }
    }
}

/// Scoped nested span. Ends on drop.
#[derive(Debug)]
pub struct Subsegment {
    name: String,
    span: Span,
    started: Instant,
    annotations: Vec<(String, AnnotationValue)>,
    open: Arc<AtomicUsize>,
    ended: bool,
}

impl Subsegment {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach an indexed key/value to this subsegment. A repeated key
    /// replaces the earlier value.
    pub fn put_annotation(&mut self, key: impl Into<String>, value: impl Into<AnnotationValue>) {
        let key = key.into();
        let value = value.into();

        self.span.set_attribute(key.clone(), value.clone());
        tracing::debug!(
            parent: &self.span,
            annotation.key = %key,
            annotation.value = %value,
            "annotation"
        );

        match self.annotations.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.annotations.push((key, value)),
        }
    }

    pub fn annotation(&self, key: &str) -> Option<&AnnotationValue> {
        self.annotations
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// End the subsegment now instead of at scope exit.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.open.fetch_sub(1, Ordering::AcqRel);
        tracing::debug!(
            parent: &self.span,
            subsegment = %self.name,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            "subsegment ended"
        );
    }
}

impl Drop for Subsegment {
    fn drop(&mut self) {
        self.finish();
    }
}

/// [`MakeSpan`] that opens a recorder segment per request.
#[derive(Debug, Clone)]
pub struct SegmentSpan {
    recorder: Arc<TraceRecorder>,
}

impl SegmentSpan {
    pub fn new(recorder: Arc<TraceRecorder>) -> Self {
        Self { recorder }
    }
}

impl<B> MakeSpan<B> for SegmentSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        self.recorder.begin_segment(request)
    }
}

/// Records the status code on the segment and logs completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentOnResponse;

impl<B> OnResponse<B> for SegmentOnResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status().as_u16();
        span.record("http.status_code", status);
        tracing::info!(
            parent: span,
            status,
            latency_ms = latency.as_millis() as u64,
            "request completed"
        );
    }
}

pub type SegmentLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    SegmentSpan,
    DefaultOnRequest,
    SegmentOnResponse,
>;

/// Middleware wrapping every request in a root segment.
pub fn segment_layer(recorder: Arc<TraceRecorder>) -> SegmentLayer {
    TraceLayer::new_for_http()
        .make_span_with(SegmentSpan::new(recorder))
        .on_response(SegmentOnResponse)
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

fn extract_remote_context(headers: &HeaderMap) -> Option<opentelemetry::Context> {
    if headers.is_empty() {
        return None;
    }
    let ctx = opentelemetry::global::get_text_map_propagator(|prop| {
        prop.extract(&HeaderExtractor(headers))
    });
    if ctx.span().span_context().is_valid() {
        Some(ctx)
    } else {
        None
    }
}
