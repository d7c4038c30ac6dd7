//! Row mutation: write, delete, and update of single rows with table-index
//! upkeep, listener notification, and the structural follow-ups (group
//! index deltas, descendant propagation, cascade) they trigger.

mod delete;
mod update;
mod write;

pub use update::UpdatePath;

use crate::{
    db::{
        RowStore,
        backend::Backend,
        data::{self, Row},
        index::{IndexRowBuilder, remove_entries, table_index_entries},
        key::HKey,
        propagate::HKeyMaintenanceScope,
    },
    error::InternalError,
    model::{IndexId, TableModel},
    obs::MetricsEvent,
};
use std::collections::BTreeSet;

///
/// MutationOptions
///
/// `indexes` restricts the table indexes a write maintains (deletes always
/// clear every index). `scope` filters which descendant tables propagation
/// may re-key. `propagate = false` suppresses propagation entirely.
///

#[derive(Clone, Debug)]
pub struct MutationOptions {
    pub indexes: Option<BTreeSet<IndexId>>,
    pub scope: HKeyMaintenanceScope,
    pub propagate: bool,
}

impl MutationOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            indexes: None,
            scope: HKeyMaintenanceScope::All,
            propagate: true,
        }
    }

    #[must_use]
    pub fn only_indexes(mut self, indexes: impl IntoIterator<Item = IndexId>) -> Self {
        self.indexes = Some(indexes.into_iter().collect());
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: HKeyMaintenanceScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn without_propagation(mut self) -> Self {
        self.propagate = false;
        self
    }
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RowStore<'_> {
    // Shape check shared by every entry point: arity, column kinds, and a
    // fully non-null primary key.
    pub(crate) fn validate_row(
        &self,
        table: &TableModel,
        row: &Row,
    ) -> Result<(), InternalError> {
        if row.values.len() != table.columns.len() {
            return Err(InternalError::store_invariant(format!(
                "row for '{}' has {} values, table has {} columns",
                table.name,
                row.values.len(),
                table.columns.len()
            )));
        }

        for (column, value) in table.columns.iter().zip(&row.values) {
            if !column.kind.accepts(value) {
                return Err(InternalError::store_invariant(format!(
                    "column '{}.{}' cannot hold a {} value",
                    table.name,
                    column.name,
                    value.label()
                )));
            }
        }

        if table
            .primary_key
            .iter()
            .any(|pos| row.values.get(*pos).is_none_or(crate::value::Value::is_null))
        {
            return Err(InternalError::store_invariant(format!(
                "row for '{}' has a null primary key",
                table.name
            )));
        }

        Ok(())
    }

    /// Remove a row and every table-index entry it owns, at its current key.
    /// Shared by top-level deletes, propagation, and cascade; it never
    /// propagates and never touches group indexes.
    pub(crate) fn unlink_row(
        &self,
        txn: &mut dyn Backend,
        table: &TableModel,
        hkey: &HKey,
        hkey_bytes: &[u8],
        row: &Row,
    ) -> Result<(), InternalError> {
        self.notify(|listener| listener.on_delete_pre(hkey, row))?;

        let key = data::row_key(table.group, hkey_bytes);
        txn.lock(&key)?;

        let mut scratch = IndexRowBuilder::new();
        let mut removes = 0;
        for index in &table.indexes {
            let entries = table_index_entries(
                &mut scratch,
                index,
                row,
                hkey_bytes,
                self.config.spatial_max_cells,
            )?;
            removes += remove_entries(txn, &entries)?;
        }

        txn.clear(&key)?;
        data::decrement_row_count(txn, table.ordinal)?;

        self.record(MetricsEvent::IndexDelta {
            table: table.ordinal,
            inserts: 0,
            removes,
        });

        Ok(())
    }

    // Fails with NoSuchRow unless a row is stored at `hkey`.
    pub(crate) fn require_row(
        &self,
        txn: &dyn Backend,
        table: &TableModel,
        hkey: &HKey,
        hkey_bytes: &[u8],
    ) -> Result<(), InternalError> {
        if txn.get(&data::row_key(table.group, hkey_bytes))?.is_none() {
            return Err(InternalError::no_such_row(&table.name, hkey.to_string()));
        }

        Ok(())
    }
}
