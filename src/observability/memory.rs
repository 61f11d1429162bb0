//! In-process telemetry recorder.
//!
//! Keeps every counter increment in memory so tests can assert on what a
//! request emitted.

use dashmap::DashMap;

use crate::observability::telemetry::Telemetry;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CounterKey {
    name: &'static str,
    labels: Vec<(&'static str, String)>,
}

impl CounterKey {
    fn new(name: &'static str, labels: &[(&'static str, String)]) -> Self {
        let mut labels = labels.to_vec();
        labels.sort();
        Self { name, labels }
    }
}

/// Telemetry sink that records into memory.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    counters: DashMap<CounterKey, f64>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of a counter across all label sets.
    pub fn counter_total(&self, name: &str) -> f64 {
        self.counters
            .iter()
            .filter(|entry| entry.key().name == name)
            .map(|entry| *entry.value())
            .sum()
    }

    /// Value of a counter for one exact label set.
    pub fn counter_value(&self, name: &'static str, labels: &[(&'static str, &str)]) -> f64 {
        let labels = labels
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect::<Vec<_>>();
        self.counters
            .get(&CounterKey::new(name, &labels))
            .map(|v| *v)
            .unwrap_or(0.0)
    }

    fn add(&self, name: &'static str, delta: f64, labels: &[(&'static str, String)]) {
        *self
            .counters
            .entry(CounterKey::new(name, labels))
            .or_insert(0.0) += delta;
    }
}

impl Telemetry for MemoryTelemetry {
    fn add_counter(&self, name: &'static str, delta: u64, labels: &[(&'static str, String)]) {
        self.add(name, delta as f64, labels);
    }

    fn add_float_counter(&self, name: &'static str, delta: f64, labels: &[(&'static str, String)]) {
        self.add(name, delta, labels);
    }
}
