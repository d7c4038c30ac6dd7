//! Descendant propagation.
//!
//! After a structural change at hkey K, every stored strict descendant of K
//! in scope is re-derived against the current state. Rows whose hkey moved
//! are unlinked at their current key and re-inserted without propagation.
//! The scan visits rows root to leaf, so a child is re-derived only after
//! any ancestor moved earlier in the same scan.

use crate::{
    db::{
        RowStore,
        backend::Backend,
        data::{self, DataRow},
        hkey_builder::HKeyBuilder,
        key::HKey,
    },
    error::InternalError,
    model::{Ordinal, Schema, TableModel},
    obs::MetricsEvent,
};
use std::collections::BTreeSet;

///
/// HKeyMaintenanceScope
///
/// Tables whose rows propagation may re-key. Rows of other tables inside the
/// scanned range keep their key and their index entries.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum HKeyMaintenanceScope {
    #[default]
    All,
    Tables(BTreeSet<Ordinal>),
}

impl HKeyMaintenanceScope {
    /// Scope admitting no table at all.
    #[must_use]
    pub const fn none() -> Self {
        Self::Tables(BTreeSet::new())
    }

    #[must_use]
    pub fn tables(tables: impl IntoIterator<Item = Ordinal>) -> Self {
        Self::Tables(tables.into_iter().collect())
    }

    /// Every table whose hkey layout runs through `table`.
    #[must_use]
    pub fn descendants_of(schema: &Schema, table: Ordinal) -> Self {
        Self::tables(schema.descendants(table))
    }

    #[must_use]
    pub fn contains(&self, table: Ordinal) -> bool {
        match self {
            Self::All => true,
            Self::Tables(tables) => tables.contains(&table),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::All => false,
            Self::Tables(tables) => tables.is_empty(),
        }
    }
}

impl RowStore<'_> {
    /// Re-derive the in-scope descendants of the hkey encoded as `root`.
    /// Returns the number of rows that moved.
    pub(crate) fn propagate(
        &self,
        txn: &mut dyn Backend,
        table: &TableModel,
        root: &[u8],
        scope: &HKeyMaintenanceScope,
    ) -> Result<u64, InternalError> {
        if scope.is_empty() {
            return Ok(0);
        }

        // Materialized up front; each re-derivation still reads live state.
        let rows = data::scan_descendants(txn, table.group, root, self.config.max_row_bytes)?;
        let scanned = rows.len() as u64;
        let builder = HKeyBuilder::new(self.schema);

        let mut rekeyed = 0;
        for DataRow {
            hkey,
            hkey_bytes,
            row,
        } in rows
        {
            if !scope.contains(row.table) {
                continue;
            }
            let model = self.schema.table(row.table)?;
            let target = builder.build(txn, model, &row)?;
            if target == hkey {
                continue;
            }

            self.unlink_row(txn, model, &hkey, &hkey_bytes, &row)?;
            let moved = self.store_row(txn, &row, None, scope, false)?;
            tracing::trace!(
                target: "groupdb::store",
                table = %model.name,
                from = %hkey,
                to = %moved,
                "re-keyed descendant"
            );
            rekeyed += 1;
        }

        if rekeyed > 0 {
            self.debug_log(format!(
                "propagation below {} re-keyed {rekeyed} of {scanned} rows",
                table.name
            ));
        }
        self.record(MetricsEvent::Propagation {
            table: table.ordinal,
            rows_scanned: scanned,
            rows_rekeyed: rekeyed,
        });

        Ok(rekeyed)
    }

    /// Adopt orphans that belong under a freshly written row of `table`.
    /// Orphans of any missing `table` row sit below the all-null layout of
    /// `table`, so that range is re-derived.
    pub(crate) fn adopt_orphans(
        &self,
        txn: &mut dyn Backend,
        table: &TableModel,
        scope: &HKeyMaintenanceScope,
    ) -> Result<u64, InternalError> {
        let orphan_prefix = HKey::null_for_layout(table.hkey_layout()).try_to_bytes()?;

        self.propagate(txn, table, &orphan_prefix, scope)
    }
}

///
/// TESTS
///
