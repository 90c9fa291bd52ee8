use serde::{Deserialize, Serialize};
use std::{cell::RefCell, cmp::Ordering, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters for service calls.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Service entrypoints
    pub get_calls: u64,
    pub create_calls: u64,
    pub update_calls: u64,
    pub delete_calls: u64,
    pub aggregate_calls: u64,
    pub failed_calls: u64,

    // Rows touched
    pub rows_read: u64,
    pub rows_written: u64,
    pub rows_deleted: u64,

    // Aggregation
    pub facets_attached: u64,
    pub facets_filtered: u64,
    pub facet_rows: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub calls: u64,
    pub failed_calls: u64,
    pub rows: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub counters: EventState,
    /// Per-entity counters, busiest first.
    pub entity_counters: Vec<EntitySummary>,
}

///
/// EntitySummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntitySummary {
    pub path: String,
    pub calls: u64,
    pub failed_calls: u64,
    pub rows: u64,
    pub avg_rows_per_call: f64,
}

#[must_use]
#[expect(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let counters = with_state(Clone::clone);

    let mut entity_counters: Vec<EntitySummary> = counters
        .entities
        .iter()
        .map(|(path, ops)| EntitySummary {
            path: path.clone(),
            calls: ops.calls,
            failed_calls: ops.failed_calls,
            rows: ops.rows,
            avg_rows_per_call: if ops.calls == 0 {
                0.0
            } else {
                ops.rows as f64 / ops.calls as f64
            },
        })
        .collect();

    entity_counters.sort_by(|a, b| match b.calls.cmp(&a.calls) {
        Ordering::Equal => a.path.cmp(&b.path),
        other => other,
    });

    EventReport {
        counters,
        entity_counters,
    }
}
