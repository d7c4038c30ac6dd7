use crate::db::data::MAX_ROW_BYTES;
use serde::Deserialize;

/// Default cell budget for one spatial box entry.
pub const DEFAULT_SPATIAL_MAX_CELLS: usize = 4;

///
/// StoreConfig
///
/// Engine-wide knobs. Deserializable so hosts can load it with the rest of
/// their configuration; missing fields take the defaults.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Emit a `tracing` debug event for every mutation step.
    pub debug: bool,

    /// Max z-order cells one spatial entry may fan out to.
    pub spatial_max_cells: usize,

    /// Max encoded size of one row payload.
    pub max_row_bytes: usize,
}

impl StoreConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            debug: false,
            spatial_max_cells: DEFAULT_SPATIAL_MAX_CELLS,
            max_row_bytes: MAX_ROW_BYTES,
        }
    }

    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub const fn with_spatial_max_cells(mut self, cells: usize) -> Self {
        self.spatial_max_cells = if cells == 0 { 1 } else { cells };
        self
    }

    #[must_use]
    pub const fn with_max_row_bytes(mut self, bytes: usize) -> Self {
        self.max_row_bytes = bytes;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

///
/// TESTS
///
