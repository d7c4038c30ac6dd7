//! Core runtime for GroupDB: hierarchical-key row storage with table and
//! group index maintenance over an ordered key-value backend.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod serialize;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum number of columns in one table or group index key.
///
/// Keeps index keys within bounded sizes and bounds the scratch buffer a
/// single entry needs.
pub const MAX_INDEX_COLUMNS: usize = 8;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, backends, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{HKeyMaintenanceScope, RowStore, UpdatePath, data::Row, key::HKey},
        model::{ColumnKind, Ordinal, Schema, SchemaBuilder, TableDef},
        value::Value,
    };
}
