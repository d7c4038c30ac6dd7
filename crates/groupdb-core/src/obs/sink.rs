//! Metrics sink boundary.
//!
//! Engine logic never touches counters directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.

use crate::model::{IndexId, Ordinal};

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    RowWrite {
        table: Ordinal,
        orphan: bool,
    },
    RowDelete {
        table: Ordinal,
    },
    RowUpdate {
        table: Ordinal,
        in_place: bool,
    },
    IndexDelta {
        table: Ordinal,
        inserts: u64,
        removes: u64,
    },
    GroupIndexDelta {
        index: IndexId,
        inserts: u64,
        removes: u64,
    },
    Propagation {
        table: Ordinal,
        rows_scanned: u64,
        rows_rekeyed: u64,
    },
    Cascade {
        table: Ordinal,
        rows_deleted: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}
