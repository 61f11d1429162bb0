//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use otel_pipeline::config::{ServiceConfig, ValidationConfig};
use otel_pipeline::observability::tracing::TRACER_NAME;
use otel_pipeline::observability::MemoryTelemetry;
use otel_pipeline::{HttpServer, Shutdown};
use tokio::net::TcpListener;

/// Config with no simulated latency and a local listener.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = Some("127.0.0.1:0".into());
    config.validation = ValidationConfig::instant();
    config.timeouts.request_secs = 10;
    config
}

/// Spans one service finished, recorded in memory.
pub struct Recorder {
    pub telemetry: Arc<MemoryTelemetry>,
    pub exporter: InMemorySpanExporter,
    provider: TracerProvider,
}

impl Recorder {
    pub fn new() -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        Self {
            telemetry: Arc::new(MemoryTelemetry::new()),
            exporter,
            provider,
        }
    }

    pub fn tracer(&self) -> Tracer {
        self.provider.tracer(TRACER_NAME)
    }

    /// Finished spans in the order they ended.
    pub fn spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap()
    }

    pub fn spans_named(&self, name: &str) -> Vec<SpanData> {
        self.spans()
            .into_iter()
            .filter(|span| span.name == name)
            .collect()
    }
}

pub fn attribute(span: &SpanData, key: &str) -> Option<String> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.as_str().into_owned())
}

/// Start the authorization service on an ephemeral port.
pub async fn start_authorization(
    config: ServiceConfig,
    recorder: &Recorder,
    shutdown: &Shutdown,
) -> SocketAddr {
    let server =
        HttpServer::authorization(config, recorder.telemetry.clone(), recorder.tracer());
    spawn(server, shutdown).await
}

/// Start the payment service on an ephemeral port, pointed at `auth_base_url`.
pub async fn start_payment(
    mut config: ServiceConfig,
    auth_base_url: String,
    recorder: &Recorder,
    shutdown: &Shutdown,
) -> SocketAddr {
    config.authorization.base_url = auth_base_url;
    let server =
        HttpServer::payment(config, recorder.telemetry.clone(), recorder.tracer()).unwrap();
    spawn(server, shutdown).await
}

async fn spawn(server: HttpServer, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    addr
}

/// Both services wired together, each with its own recorder. Dropping the
/// stack stops both servers.
pub struct Stack {
    pub payment_addr: SocketAddr,
    pub authorization_addr: SocketAddr,
    pub payment: Recorder,
    pub authorization: Recorder,
    pub payment_telemetry: Arc<MemoryTelemetry>,
    pub authorization_telemetry: Arc<MemoryTelemetry>,
    pub shutdown: Shutdown,
}

impl Stack {
    pub async fn start() -> Self {
        Self::start_with(test_config()).await
    }

    pub async fn start_with(config: ServiceConfig) -> Self {
        let shutdown = Shutdown::new();
        let payment = Recorder::new();
        let authorization = Recorder::new();

        let authorization_addr =
            start_authorization(config.clone(), &authorization, &shutdown).await;
        let payment_addr = start_payment(
            config,
            format!("http://{authorization_addr}"),
            &payment,
            &shutdown,
        )
        .await;

        Self {
            payment_addr,
            authorization_addr,
            payment_telemetry: payment.telemetry.clone(),
            authorization_telemetry: authorization.telemetry.clone(),
            payment,
            authorization,
            shutdown,
        }
    }

    pub fn payment_url(&self) -> String {
        format!("http://{}/payment", self.payment_addr)
    }

    pub fn authorization_url(&self) -> String {
        format!("http://{}/authorization", self.authorization_addr)
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
