use crate::{
    db::{
        GroupIndexAction, RowStore,
        backend::Backend,
        data::Row,
        group_index::RowAt,
        hkey_builder::HKeyBuilder,
        key::HKey,
        mutation::MutationOptions,
    },
    error::InternalError,
    obs::MetricsEvent,
};

impl RowStore<'_> {
    /// Delete the row stored under `row`'s hkey.
    ///
    /// With `cascade` the row and its whole subtree are removed. Without it,
    /// descendants stay and are re-keyed as orphans.
    pub fn delete_row(
        &self,
        txn: &mut dyn Backend,
        row: &Row,
        cascade: bool,
    ) -> Result<HKey, InternalError> {
        self.delete_row_with(txn, row, cascade, &MutationOptions::default())
    }

    pub fn delete_row_with(
        &self,
        txn: &mut dyn Backend,
        row: &Row,
        cascade: bool,
        options: &MutationOptions,
    ) -> Result<HKey, InternalError> {
        let table = self.schema.table(row.table)?;
        self.validate_row(table, row)?;

        let hkey = HKeyBuilder::new(self.schema).build(txn, table, row)?;
        let hkey_bytes = hkey.try_to_bytes()?;
        self.require_row(txn, table, &hkey, &hkey_bytes)?;
        self.debug_log(format!(
            "delete {} at {hkey} (cascade={cascade})",
            table.name
        ));

        let target = RowAt {
            table,
            hkey: &hkey,
            hkey_bytes: &hkey_bytes,
            row,
        };

        if cascade {
            self.cascade_delete(txn, &target)?;
            return Ok(hkey);
        }

        // Group-index entries are computed while the subtree is still attached.
        self.maintain_group_indexes(txn, &target, GroupIndexAction::Delete, None, None)?;

        self.unlink_row(txn, table, &hkey, &hkey_bytes, row)?;
        self.notify(|listener| listener.on_delete_post(&hkey, row))?;
        self.record(MetricsEvent::RowDelete {
            table: table.ordinal,
        });

        if options.propagate && table.has_children() {
            self.propagate(txn, table, &hkey_bytes, &options.scope)?;
        }

        Ok(hkey)
    }
}
