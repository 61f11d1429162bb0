//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handlers produce:
//!     → tracing.rs (OpenTelemetry spans carried by an explicit RequestContext)
//!     → metrics.rs (request/error counters, tpv)
//!     → logging.rs (structured log events)
//!
//! Spans go to the service's tracer provider (OTLP batch exporter in
//! production, in-memory exporter in tests).
//! Counters are handed to a Telemetry sink:
//!     → MetricsTelemetry (metrics facade, production)
//!     → MemoryTelemetry  (in-process recorder, tests)
//! ```
//!
//! # Design Decisions
//! - Trace context is passed explicitly, never held in thread-locals
//! - W3C `traceparent` crosses the process boundary
//! - Counter updates are atomic; nothing reads them back on the hot path

pub mod logging;
pub mod memory;
pub mod metrics;
pub mod telemetry;
pub mod tracing;

pub use self::memory::MemoryTelemetry;
pub use self::telemetry::{CancellationGuard, MetricsTelemetry, Telemetry};
pub use self::tracing::{RequestContext, Span};
