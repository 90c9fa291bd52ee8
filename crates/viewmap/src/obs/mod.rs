//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Service code never touches metrics state directly; every counter flows
//! through `MetricsEvent` and the active `MetricsSink`.

pub(crate) mod metrics;
pub(crate) mod sink;


// re-exports
pub use metrics::{EntityCounters, EntitySummary, EventOps, EventReport, EventState};
pub use sink::{
    CallKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink,
};
