use crate::{
    db::{
        GroupIndexAction, RowStore,
        backend::Backend,
        group_index::RowAt,
        data::{self, RawRow, Row},
        hkey_builder::HKeyBuilder,
        index::{IndexRowBuilder, insert_entries, table_index_entries},
        key::HKey,
        mutation::MutationOptions,
        primary_index,
        propagate::HKeyMaintenanceScope,
    },
    error::InternalError,
    model::IndexId,
    obs::MetricsEvent,
};
use std::collections::BTreeSet;

impl RowStore<'_> {
    /// Insert `row` under the hkey derived from the current state, maintain
    /// every index, and adopt any orphans that now belong under it.
    pub fn write_row(&self, txn: &mut dyn Backend, row: &Row) -> Result<HKey, InternalError> {
        self.write_row_with(txn, row, &MutationOptions::default())
    }

    pub fn write_row_with(
        &self,
        txn: &mut dyn Backend,
        row: &Row,
        options: &MutationOptions,
    ) -> Result<HKey, InternalError> {
        let table = self.schema.table(row.table)?;
        let hkey = self.store_row(
            txn,
            row,
            options.indexes.as_ref(),
            &options.scope,
            options.propagate,
        )?;

        // Runs after adoption so chains completed by adopted rows are covered.
        let hkey_bytes = hkey.try_to_bytes()?;
        let target = RowAt {
            table,
            hkey: &hkey,
            hkey_bytes: &hkey_bytes,
            row,
        };
        self.maintain_group_indexes(txn, &target, GroupIndexAction::Store, None, None)?;

        Ok(hkey)
    }

    /// Physical write and table-index upkeep without group-index maintenance.
    /// Propagation re-inserts rows through here with `propagate = false`.
    pub(crate) fn store_row(
        &self,
        txn: &mut dyn Backend,
        row: &Row,
        indexes: Option<&BTreeSet<IndexId>>,
        scope: &HKeyMaintenanceScope,
        propagate: bool,
    ) -> Result<HKey, InternalError> {
        let table = self.schema.table(row.table)?;
        self.validate_row(table, row)?;

        let hkey = HKeyBuilder::new(self.schema).build(txn, table, row)?;
        let hkey_bytes = hkey.try_to_bytes()?;
        let key = data::row_key(table.group, &hkey_bytes);
        self.debug_log(format!("write {} at {hkey}", table.name));

        txn.lock(&key)?;
        if txn.get(&key)?.is_some() {
            let pk = primary_index(table)?;
            return Err(InternalError::duplicate_key(&pk.name, hkey.to_string()));
        }

        self.notify(|listener| listener.on_insert_pre(&hkey, row))?;
        let raw = RawRow::try_encode(row, self.config.max_row_bytes)?;
        txn.set(&key, raw.as_bytes())?;

        let mut scratch = IndexRowBuilder::new();
        let mut inserts = 0;
        let mut wrote_primary = false;
        for index in &table.indexes {
            if indexes.is_some_and(|selected| !selected.contains(&index.id)) {
                continue;
            }
            let entries = table_index_entries(
                &mut scratch,
                index,
                row,
                &hkey_bytes,
                self.config.spatial_max_cells,
            )?;
            inserts += insert_entries(txn, &index.name, &entries, &hkey_bytes)?;
            wrote_primary |= index.primary;
        }
        if wrote_primary {
            data::increment_row_count(txn, table.ordinal)?;
        }

        self.notify(|listener| listener.on_insert_post(&hkey, row))?;

        let orphan = hkey.is_orphan();
        if orphan {
            tracing::trace!(target: "groupdb::store", table = %table.name, %hkey, "stored orphan row");
        }
        self.record(MetricsEvent::IndexDelta {
            table: table.ordinal,
            inserts,
            removes: 0,
        });
        self.record(MetricsEvent::RowWrite {
            table: table.ordinal,
            orphan,
        });

        if propagate && table.has_children() {
            self.adopt_orphans(txn, table, scope)?;
        }

        Ok(hkey)
    }
}
