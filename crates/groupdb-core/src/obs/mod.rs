//! Observability: mutation telemetry and the sink abstraction.
//!
//! This module does not access storage. The engine reports through an
//! injected [`MetricsSink`]; [`EventCounters`] is the in-memory sink.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventCounters, EventOps, EventState, IndexCounters, TableCounters};
pub use sink::{MetricsEvent, MetricsSink};
