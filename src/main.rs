//! Payment / authorization services.
//!
//! ```text
//!  client ──POST /payment──▶ payment-api ──POST /authorization──▶ authorization-api
//!                              │  product-validation span          │  user-validation span
//!                              │  init/error-payment, tpv          │  init/error-auth
//!                              ◀──────── {"token": ...} / 401 ─────┘
//! ```
//!
//! Run one process per service:
//! `otel-pipeline authorization` and `otel-pipeline payment`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use otel_pipeline::config::{load_config, ServiceConfig, ServiceKind};
use otel_pipeline::lifecycle::{run_service, signals, Shutdown, StartupError};
use otel_pipeline::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "otel-pipeline")]
#[command(about = "Payment and authorization services with distributed tracing", long_about = None)]
struct Cli {
    /// Service to run.
    #[arg(value_enum)]
    service: ServiceKind,

    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    init_logging(&config.observability.log_level);

    tracing::info!(
        service = %config.service_name(cli.service),
        bind_address = %config.bind_address(cli.service),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let shutdown = Arc::new(Shutdown::new());
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::forward_signals(&signal_shutdown).await;
    });

    let result = run_service(cli.service, config, &shutdown).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Service failed");
    }

    tracing::info!("Shutdown complete");
    result
}
