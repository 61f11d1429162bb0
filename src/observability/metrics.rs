//! Metrics collection and exposition.
//!
//! # Metrics
//! - `init-payment` (counter): payment requests received
//! - `error-payment` (counter): payment requests that failed, tagged `error`
//! - `init-auth` (counter): authorization requests received
//! - `error-auth` (counter): authorization requests that failed
//! - `tpv` (float sum): authorized payment amounts, tagged `productId`
//!
//! The Prometheus exporter rewrites `-` to `_` in exposed names.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const INIT_PAYMENT: &str = "init-payment";
pub const ERROR_PAYMENT: &str = "error-payment";
pub const INIT_AUTH: &str = "init-auth";
pub const ERROR_AUTH: &str = "error-auth";
pub const TPV: &str = "tpv";

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics exporter started");
    Ok(())
}
