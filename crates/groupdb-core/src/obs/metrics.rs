use crate::{
    model::{IndexId, Ordinal},
    obs::sink::{MetricsEvent, MetricsSink},
};
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Aggregated counters since the last reset.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub tables: BTreeMap<Ordinal, TableCounters>,
    pub group_indexes: BTreeMap<IndexId, IndexCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Row mutations
    pub row_writes: u64,
    pub row_deletes: u64,
    pub updates_in_place: u64,
    pub updates_rekeyed: u64,
    pub orphans_written: u64,

    // Index maintenance
    pub index_inserts: u64,
    pub index_removes: u64,
    pub group_index_inserts: u64,
    pub group_index_removes: u64,

    // Structural
    pub propagations: u64,
    pub rows_rekeyed: u64,
    pub cascades: u64,
    pub rows_cascaded: u64,
}

///
/// TableCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableCounters {
    pub row_writes: u64,
    pub row_deletes: u64,
    pub row_updates: u64,
    pub index_inserts: u64,
    pub index_removes: u64,
    pub rows_rekeyed: u64,
}

///
/// IndexCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexCounters {
    pub inserts: u64,
    pub removes: u64,
}

///
/// EventCounters
///
/// In-memory sink. Single-threaded, like the engine calls feeding it.
///

#[derive(Debug, Default)]
pub struct EventCounters {
    state: RefCell<EventState>,
}

impl EventCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> EventState {
        self.state.borrow().clone()
    }

    /// Reset all counters (useful in tests).
    pub fn reset(&self) {
        *self.state.borrow_mut() = EventState::default();
    }
}

impl MetricsSink for EventCounters {
    fn record(&self, event: MetricsEvent) {
        let mut guard = self.state.borrow_mut();
        let m = &mut *guard;

        match event {
            MetricsEvent::RowWrite { table, orphan } => {
                m.ops.row_writes = m.ops.row_writes.saturating_add(1);
                if orphan {
                    m.ops.orphans_written = m.ops.orphans_written.saturating_add(1);
                }
                let entry = m.tables.entry(table).or_default();
                entry.row_writes = entry.row_writes.saturating_add(1);
            }

            MetricsEvent::RowDelete { table } => {
                m.ops.row_deletes = m.ops.row_deletes.saturating_add(1);
                let entry = m.tables.entry(table).or_default();
                entry.row_deletes = entry.row_deletes.saturating_add(1);
            }

            MetricsEvent::RowUpdate { table, in_place } => {
                if in_place {
                    m.ops.updates_in_place = m.ops.updates_in_place.saturating_add(1);
                } else {
                    m.ops.updates_rekeyed = m.ops.updates_rekeyed.saturating_add(1);
                }
                let entry = m.tables.entry(table).or_default();
                entry.row_updates = entry.row_updates.saturating_add(1);
            }

            MetricsEvent::IndexDelta {
                table,
                inserts,
                removes,
            } => {
                m.ops.index_inserts = m.ops.index_inserts.saturating_add(inserts);
                m.ops.index_removes = m.ops.index_removes.saturating_add(removes);
                let entry = m.tables.entry(table).or_default();
                entry.index_inserts = entry.index_inserts.saturating_add(inserts);
                entry.index_removes = entry.index_removes.saturating_add(removes);
            }

            MetricsEvent::GroupIndexDelta {
                index,
                inserts,
                removes,
            } => {
                m.ops.group_index_inserts = m.ops.group_index_inserts.saturating_add(inserts);
                m.ops.group_index_removes = m.ops.group_index_removes.saturating_add(removes);
                let entry = m.group_indexes.entry(index).or_default();
                entry.inserts = entry.inserts.saturating_add(inserts);
                entry.removes = entry.removes.saturating_add(removes);
            }

            MetricsEvent::Propagation {
                table,
                rows_rekeyed,
                ..
            } => {
                m.ops.propagations = m.ops.propagations.saturating_add(1);
                m.ops.rows_rekeyed = m.ops.rows_rekeyed.saturating_add(rows_rekeyed);
                let entry = m.tables.entry(table).or_default();
                entry.rows_rekeyed = entry.rows_rekeyed.saturating_add(rows_rekeyed);
            }

            MetricsEvent::Cascade { rows_deleted, .. } => {
                m.ops.cascades = m.ops.cascades.saturating_add(1);
                m.ops.rows_cascaded = m.ops.rows_cascaded.saturating_add(rows_deleted);
            }
        }
    }
}

///
/// TESTS
///
