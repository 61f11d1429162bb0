//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OpenTelemetry tracer provider for one service
//! - Extract W3C trace context from incoming requests
//! - Create spans that nest under the active context
//! - Inject trace context into outbound requests
//!
//! A [`RequestContext`] is created per request and passed by reference into
//! every stage. Starting a span from it yields a child of the active span;
//! [`RequestContext::with_span`] derives the context for nested work. The
//! OpenTelemetry `Context` travels inside it, never through thread-locals.

use std::borrow::Cow;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{
    SpanContext, SpanKind, Status, TraceContextExt, TraceError, Tracer as _,
    TracerProvider as _,
};
use opentelemetry::{Context, KeyValue, Value};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Config, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_otlp::WithExportConfig;

use crate::observability::telemetry::Telemetry;

/// Header carrying the W3C trace context.
pub const TRACEPARENT: &str = "traceparent";

/// Instrumentation scope of every span this crate creates.
pub const TRACER_NAME: &str = "otel-pipeline";

/// Status description of a span dropped before it was ended.
pub const CANCELLED: &str = "request cancelled";

/// Resource identifying the process in exported traces.
pub fn service_resource(service_name: &str) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ])
}

/// Build the tracer provider for a service.
///
/// Every span is sampled. With an OTLP endpoint, finished spans are batched
/// to the collector on the tokio runtime; without one they are created and
/// propagated but not exported.
#[allow(deprecated)]
pub fn init_tracer_provider(
    service_name: &str,
    otlp_endpoint: Option<&str>,
) -> Result<TracerProvider, TraceError> {
    let config = Config::default()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(service_resource(service_name));

    let mut builder = TracerProvider::builder().with_config(config);

    if let Some(endpoint) = otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;
        builder = builder.with_batch_exporter(exporter, runtime::Tokio);
        tracing::info!(service = %service_name, endpoint = %endpoint, "Exporting traces over OTLP");
    }

    Ok(builder.build())
}

/// Flush and stop the provider.
///
/// The batch processor blocks while draining, so this runs off the async
/// worker threads.
pub async fn shutdown_tracer_provider(provider: TracerProvider) {
    match tokio::task::spawn_blocking(move || provider.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Tracer provider shutdown failed"),
        Err(e) => tracing::warn!(error = %e, "Tracer provider shutdown task failed"),
    }
}

/// Read side of the propagator over an HTTP header map.
struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Write side of the propagator over an HTTP header map.
struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// An in-progress unit of work.
///
/// Ended explicitly with [`Span::end`]. A span dropped without being ended
/// (the request future was cancelled) is closed with an error status.
pub struct Span {
    cx: Context,
    ended: bool,
}

impl Span {
    /// Identifiers of this span.
    pub fn span_context(&self) -> SpanContext {
        self.cx.span().span_context().clone()
    }

    pub fn set_attribute(&self, key: &'static str, value: impl Into<Value>) {
        self.cx.span().set_attribute(KeyValue::new(key, value));
    }

    /// Mark the work as succeeded. The message is kept as a span event since
    /// an `Ok` status carries no description.
    pub fn set_ok(&self, message: &'static str) {
        let span = self.cx.span();
        span.add_event(message, Vec::new());
        span.set_status(Status::Ok);
    }

    pub fn set_error(&self, description: impl Into<Cow<'static, str>>) {
        self.cx.span().set_status(Status::error(description));
    }

    pub fn end(mut self) {
        self.ended = true;
        self.cx.span().end();
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if !self.ended {
            let span = self.cx.span();
            span.set_status(Status::error(CANCELLED));
            span.end();
        }
    }
}

/// Request-scoped context: the active span, the tracer and the counter sink.
#[derive(Clone)]
pub struct RequestContext {
    cx: Context,
    tracer: Tracer,
    telemetry: Arc<dyn Telemetry>,
}

impl RequestContext {
    /// Context with no active span; the first span starts a new trace.
    pub fn new(tracer: Tracer, telemetry: Arc<dyn Telemetry>) -> Self {
        Self {
            cx: Context::new(),
            tracer,
            telemetry,
        }
    }

    /// Context for a request whose caller may have sent a `traceparent`.
    /// Absent or invalid headers start a new trace.
    pub fn from_headers(tracer: Tracer, telemetry: Arc<dyn Telemetry>, headers: &HeaderMap) -> Self {
        let cx = TraceContextPropagator::new()
            .extract_with_context(&Context::new(), &HeaderExtractor(headers));
        Self {
            cx,
            tracer,
            telemetry,
        }
    }

    /// The active span's identifiers, invalid if no span is active.
    pub fn span_context(&self) -> SpanContext {
        self.cx.span().span_context().clone()
    }

    pub fn telemetry(&self) -> &Arc<dyn Telemetry> {
        &self.telemetry
    }

    /// Start an internal span nested under the active one.
    pub fn start_span(&self, name: &'static str) -> Span {
        self.start_span_with_kind(name, SpanKind::Internal)
    }

    pub fn start_span_with_kind(&self, name: &'static str, kind: SpanKind) -> Span {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.tracer, &self.cx);
        Span {
            cx: self.cx.with_span(span),
            ended: false,
        }
    }

    /// Derive the context in which `span` is the active span.
    pub fn with_span(&self, span: &Span) -> Self {
        Self {
            cx: span.cx.clone(),
            tracer: self.tracer.clone(),
            telemetry: self.telemetry.clone(),
        }
    }

    /// Write the active span as `traceparent` into outbound headers.
    pub fn inject(&self, headers: &mut HeaderMap) {
        TraceContextPropagator::new().inject_context(&self.cx, &mut HeaderInjector(headers));
    }

    pub fn add_counter(&self, name: &'static str, delta: u64, labels: &[(&'static str, String)]) {
        self.telemetry.add_counter(name, delta, labels);
    }

    pub fn add_float_counter(
        &self,
        name: &'static str,
        delta: f64,
        labels: &[(&'static str, String)],
    ) {
        self.telemetry.add_float_counter(name, delta, labels);
    }
}

/// Tracer backed by an in-memory exporter, for tests.
#[cfg(test)]
pub(crate) fn test_tracer() -> (
    Tracer,
    TracerProvider,
    opentelemetry_sdk::testing::trace::InMemorySpanExporter,
) {
    let exporter = opentelemetry_sdk::testing::trace::InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    (provider.tracer(TRACER_NAME), provider, exporter)
}
