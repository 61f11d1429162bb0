//! Startup orchestration.
//!
//! Order: metrics exporter, tracer provider, telemetry sink, server,
//! listener. Any error here is fatal; nothing after the listener is bound
//! aborts the process. The tracer provider is flushed once the server stops.

use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use opentelemetry::trace::{TraceError, TracerProvider as _};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, ServiceConfig, ServiceKind};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics::init_metrics;
use crate::observability::telemetry::{MetricsTelemetry, Telemetry};
use crate::observability::tracing::{init_tracer_provider, shutdown_tracer_provider, TRACER_NAME};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("metrics address: {0}")]
    MetricsAddress(#[from] AddrParseError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("trace exporter: {0}")]
    Tracing(#[from] TraceError),

    #[error("authorization client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Build the server for `kind` and serve until `shutdown` fires.
pub async fn run_service(
    kind: ServiceKind,
    config: ServiceConfig,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let observability = &config.observability;
    let provider = init_tracer_provider(
        config.service_name(kind),
        observability
            .traces_enabled
            .then_some(observability.otlp_endpoint.as_str()),
    )?;
    let tracer = provider.tracer(TRACER_NAME);

    let telemetry: Arc<dyn Telemetry> = Arc::new(MetricsTelemetry::new());
    let address = config.bind_address(kind).to_string();

    let server = match kind {
        ServiceKind::Payment => HttpServer::payment(config, telemetry, tracer)?,
        ServiceKind::Authorization => HttpServer::authorization(config, telemetry, tracer),
    };

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let result = server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve);

    shutdown_tracer_provider(provider).await;
    result
}
