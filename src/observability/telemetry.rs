//! Counter sink abstraction.
//!
//! The request path only ever talks to [`Telemetry`] for counters; exporter
//! wiring lives outside the core. Spans go through the OpenTelemetry tracer
//! instead.

use std::sync::Arc;

use metrics::Label;

/// Receives counter increments.
pub trait Telemetry: Send + Sync + 'static {
    /// Add to an integer counter.
    fn add_counter(&self, name: &'static str, delta: u64, labels: &[(&'static str, String)]);

    /// Add to a floating point running sum.
    fn add_float_counter(&self, name: &'static str, delta: f64, labels: &[(&'static str, String)]);
}

/// Sink backed by the `metrics` facade.
///
/// Counters go to whatever recorder is installed (Prometheus in production,
/// a no-op otherwise).
#[derive(Debug, Clone, Default)]
pub struct MetricsTelemetry;

impl MetricsTelemetry {
    pub fn new() -> Self {
        Self
    }
}

fn to_labels(labels: &[(&'static str, String)]) -> Vec<Label> {
    labels
        .iter()
        .map(|(key, value)| Label::new(*key, value.clone()))
        .collect()
}

impl Telemetry for MetricsTelemetry {
    fn add_counter(&self, name: &'static str, delta: u64, labels: &[(&'static str, String)]) {
        metrics::counter!(name, to_labels(labels)).increment(delta);
    }

    // The facade has no float counter; a gauge that is only ever incremented
    // carries the same running sum.
    fn add_float_counter(&self, name: &'static str, delta: f64, labels: &[(&'static str, String)]) {
        metrics::gauge!(name, to_labels(labels)).increment(delta);
    }
}

/// Counts one error for a request that never reached a response.
///
/// Armed when a handler starts; [`CancellationGuard::disarm`] is called on
/// every path that produces a response. Dropping an armed guard (the request
/// future was cancelled, e.g. by the request deadline) adds one to `counter`
/// labelled `error = "cancelled"`.
pub struct CancellationGuard {
    telemetry: Arc<dyn Telemetry>,
    counter: &'static str,
    armed: bool,
}

impl CancellationGuard {
    pub fn new(telemetry: Arc<dyn Telemetry>, counter: &'static str) -> Self {
        Self {
            telemetry,
            counter,
            armed: true,
        }
    }

    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancellationGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::info!(counter = self.counter, "Request cancelled before responding");
            self.telemetry
                .add_counter(self.counter, 1, &[("error", "cancelled".to_string())]);
        }
    }
}
