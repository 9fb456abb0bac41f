//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the `/` handler
//! - Wire up middleware (request ID, trace segment, timeout)
//! - Serve on a bound listener until shutdown

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::config::{AppSettings, ServiceConfig};
use crate::http::handlers;
use crate::lifecycle::ShutdownListener;
use crate::observability::{segment_layer, TraceRecorder};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub recorder: Arc<TraceRecorder>,
}

impl AppState {
    pub fn new(settings: AppSettings, recorder: Arc<TraceRecorder>) -> Self {
        Self {
            settings: Arc::new(settings),
            recorder,
        }
    }
}

/// HTTP server for the greeting service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server. `recorder` is the process-wide tracing
    /// client; it is shared with the segment middleware and the handlers.
    pub fn new(config: ServiceConfig, recorder: Arc<TraceRecorder>) -> Self {
        let state = AppState::new(config.app.clone(), recorder);
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires or the process receives a termination signal.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownListener,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service_name = %self.config.observability.service_name,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.recv_or_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layer order, outermost first: set request id, propagate request id,
/// trace segment, timeout.
#[allow(deprecated)]
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let recorder = Arc::clone(&state.recorder);
    Router::new()
        .route("/", get(handlers::index))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeouts.request_secs,
        )))
        .layer(segment_layer(recorder))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use crate::http::response::GREETING_MESSAGE;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;
    use tracing::field::{Field, Visit};
    use tracing::span::Attributes;
    use tracing::{Event, Id, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::registry::LookupSpan;
    use tracing_subscriber::Layer;

    /// An `annotation` event as seen by the subscriber.
    #[derive(Debug, Clone, PartialEq)]
    struct CapturedAnnotation {
        span_name: Option<String>,
        key: String,
        value: String,
    }

    #[derive(Clone, Default)]
    struct AnnotationCapture(Arc<Mutex<Vec<CapturedAnnotation>>>);

    struct OtelName(String);

    #[derive(Default)]
    struct Fields {
        message: Option<String>,
        otel_name: Option<String>,
        key: Option<String>,
        value: Option<String>,
    }

    impl Visit for Fields {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            let rendered = format!("{value:?}");
            match field.name() {
                "message" => self.message = Some(rendered),
                "otel.name" => self.otel_name = Some(rendered),
                "annotation.key" => self.key = Some(rendered),
                "annotation.value" => self.value = Some(rendered),
                _ => {}
            }
        }
    }

    impl<S> Layer<S> for AnnotationCapture
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let mut fields = Fields::default();
            attrs.record(&mut fields);
            if let (Some(name), Some(span)) = (fields.otel_name, ctx.span(id)) {
                span.extensions_mut().insert(OtelName(name));
            }
        }

        fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
            let mut fields = Fields::default();
            event.record(&mut fields);
            if fields.message.as_deref() != Some("annotation") {
                return;
            }
            let span_name = ctx
                .event_span(event)
                .and_then(|span| span.extensions().get::<OtelName>().map(|n| n.0.clone()));
            if let (Some(key), Some(value)) = (fields.key, fields.value) {
                self.0.lock().unwrap().push(CapturedAnnotation {
                    span_name,
                    key,
                    value,
                });
            }
        }
    }

    fn router_with(settings: AppSettings) -> (Router, Arc<TraceRecorder>) {
        let recorder = Arc::new(TraceRecorder::new("test-service"));
        let config = ServiceConfig::default();
        let state = AppState::new(settings, Arc::clone(&recorder));
        (build_router(&config, state), recorder)
    }

    async fn get_root(router: Router) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_returns_json_greeting() {
        let (router, recorder) = router_with(AppSettings::default());
        let (status, headers, body) = get_root(router).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(body["message"], GREETING_MESSAGE);
        assert!(body["config"].is_null());
        assert!(body["db_credentials"]["password"].is_null());
        assert_eq!(recorder.open_subsegments(), 0);
    }

    #[tokio::test]
    async fn root_annotates_prepare_response_with_body_length() {
        let capture = AnnotationCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _default = tracing::subscriber::set_default(subscriber);

        let (router, _) = router_with(AppSettings {
            app_config: Some("prod".into()),
            db_password: Some(Secret::new("s3cr3t")),
        });
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let captured = capture.0.lock().unwrap().clone();
        assert_eq!(
            captured,
            vec![CapturedAnnotation {
                span_name: Some(handlers::PREPARE_RESPONSE.to_string()),
                key: handlers::RESPONSE_SIZE.to_string(),
                value: bytes.len().to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn root_masks_password() {
        let (router, _) = router_with(AppSettings {
            app_config: Some("prod".into()),
            db_password: Some(Secret::new("s3cr3t")),
        });
        let (_, _, body) = get_root(router).await;

        assert_eq!(body["config"], "prod");
        assert_eq!(body["db_credentials"]["password"], "*****");
        assert!(!body.to_string().contains("s3cr3t"));
    }

    #[tokio::test]
    async fn incoming_request_id_is_propagated() {
        let (router, _) = router_with(AppSettings::default());
        let response = router
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-123");
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let (router, _) = router_with(AppSettings::default());
        let response = router
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_on_root_is_method_not_allowed() {
        let (router, _) = router_with(AppSettings::default());
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
