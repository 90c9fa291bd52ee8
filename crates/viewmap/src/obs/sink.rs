//! Metrics sink boundary.
//!
//! Service and aggregation code MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// CallKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallKind {
    Get,
    Create,
    Update,
    Delete,
    Aggregate,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    CallStart {
        kind: CallKind,
        entity_path: &'static str,
    },
    CallFinish {
        kind: CallKind,
        entity_path: &'static str,
        rows: u64,
        failed: bool,
    },
    FacetAttached {
        facet: &'static str,
        rows: u64,
        filtered: bool,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default thread-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::CallStart { kind, entity_path } => {
                metrics::with_state_mut(|m| {
                    let ops = &mut m.ops;
                    let counter = match kind {
                        CallKind::Get => &mut ops.get_calls,
                        CallKind::Create => &mut ops.create_calls,
                        CallKind::Update => &mut ops.update_calls,
                        CallKind::Delete => &mut ops.delete_calls,
                        CallKind::Aggregate => &mut ops.aggregate_calls,
                    };
                    *counter = counter.saturating_add(1);

                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.calls = entry.calls.saturating_add(1);
                });
            }

            MetricsEvent::CallFinish {
                kind,
                entity_path,
                rows,
                failed,
            } => {
                metrics::with_state_mut(|m| {
                    if failed {
                        m.ops.failed_calls = m.ops.failed_calls.saturating_add(1);
                    }
                    match kind {
                        CallKind::Get | CallKind::Aggregate => {
                            m.ops.rows_read = m.ops.rows_read.saturating_add(rows);
                        }
                        CallKind::Create | CallKind::Update => {
                            m.ops.rows_written = m.ops.rows_written.saturating_add(rows);
                        }
                        CallKind::Delete => {
                            m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(rows);
                        }
                    }

                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.rows = entry.rows.saturating_add(rows);
                    if failed {
                        entry.failed_calls = entry.failed_calls.saturating_add(1);
                    }
                });
            }

            MetricsEvent::FacetAttached { rows, filtered, .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.facets_attached = m.ops.facets_attached.saturating_add(1);
                    m.ops.facet_rows = m.ops.facet_rows.saturating_add(rows);
                    if filtered {
                        m.ops.facets_filtered = m.ops.facets_filtered.saturating_add(1);
                    }
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state for endpoint/test plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

/// Span
/// RAII guard that emits start/finish events for one service call.
/// A span dropped without `complete` is reported as failed, so early `?`
/// returns are still accounted for.

pub(crate) struct Span {
    kind: CallKind,
    entity_path: &'static str,
    rows: u64,
    completed: bool,
}

impl Span {
    #[must_use]
    pub(crate) fn new(kind: CallKind, entity_path: &'static str) -> Self {
        record(MetricsEvent::CallStart { kind, entity_path });

        Self {
            kind,
            entity_path,
            rows: 0,
            completed: false,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }

    /// Mark the call successful; finish is still emitted on drop.
    pub(crate) const fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        record(MetricsEvent::CallFinish {
            kind: self.kind,
            entity_path: self.entity_path,
            rows: self.rows,
            failed: !self.completed,
        });
    }
}
