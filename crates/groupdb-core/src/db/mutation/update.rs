use crate::{
    db::{
        GroupIndexAction, RowStore,
        backend::Backend,
        data::{self, RawRow, Row},
        group_index::RowAt,
        hkey_builder::HKeyBuilder,
        index::{IndexRowBuilder, insert_entries, remove_entries, table_index_entries},
        mutation::MutationOptions,
        propagate::HKeyMaintenanceScope,
    },
    error::InternalError,
    model::TableModel,
    obs::MetricsEvent,
};

///
/// UpdatePath
///
/// How an update was applied.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdatePath {
    /// Packed over the old payload at the same hkey.
    InPlace,

    /// Applied as delete(old) + write(new).
    Rekeyed,
}

impl RowStore<'_> {
    /// Replace `old` with `new`.
    ///
    /// Same row type, same key fields, and untouched large objects take the
    /// in-place path. Anything else is re-keyed, scoped to the tables whose
    /// hkeys depend on this one when a key field moved.
    ///
    /// A blob column forces the re-key path only when its value changed; a
    /// row that merely carries a blob is still updated in place. Key fields
    /// compare by their encoded key bytes, so `0.0` to `-0.0` is a change.
    pub fn update_row(
        &self,
        txn: &mut dyn Backend,
        old: &Row,
        new: &Row,
    ) -> Result<UpdatePath, InternalError> {
        if old.table != new.table {
            return Err(InternalError::store_invariant(format!(
                "update moves a row from table {} to table {}",
                old.table, new.table
            )));
        }
        let table = self.schema.table(old.table)?;
        self.validate_row(table, old)?;
        self.validate_row(table, new)?;

        let hkey = HKeyBuilder::new(self.schema).build(txn, table, old)?;
        let hkey_bytes = hkey.try_to_bytes()?;
        self.require_row(txn, table, &hkey, &hkey_bytes)?;

        let key_fields = table.key_fields();
        let same_keys = old.same_at(new, &key_fields);
        let same_objects = old.same_at(new, &table.large_object_columns());

        if old.version == new.version && same_keys && same_objects {
            let target = RowAt {
                table,
                hkey: &hkey,
                hkey_bytes: &hkey_bytes,
                row: old,
            };
            self.update_in_place(txn, &target, new)?;
            self.record(MetricsEvent::RowUpdate {
                table: table.ordinal,
                in_place: true,
            });

            return Ok(UpdatePath::InPlace);
        }

        // Only a moved key field can move descendants.
        let scope = if same_keys {
            HKeyMaintenanceScope::none()
        } else {
            HKeyMaintenanceScope::descendants_of(self.schema, table.ordinal)
        };
        self.debug_log(format!(
            "re-key update of {} at {hkey} (scope={scope:?})",
            table.name
        ));

        let options = MutationOptions::new().scope(scope);
        self.delete_row_with(txn, old, false, &options)?;
        self.write_row_with(txn, new, &options)?;

        self.record(MetricsEvent::RowUpdate {
            table: table.ordinal,
            in_place: false,
        });

        Ok(UpdatePath::Rekeyed)
    }

    fn update_in_place(
        &self,
        txn: &mut dyn Backend,
        target: &RowAt<'_>,
        new: &Row,
    ) -> Result<(), InternalError> {
        let RowAt {
            table,
            hkey,
            hkey_bytes,
            row: old,
        } = *target;
        self.debug_log(format!("in-place update of {} at {hkey}", table.name));

        let raw = RawRow::try_encode(new, self.config.max_row_bytes)?;
        self.notify(|listener| listener.on_update_pre(hkey, old, new))?;

        let changed = old.changed_columns(new);
        self.maintain_group_indexes(
            txn,
            target,
            GroupIndexAction::Delete,
            Some(&changed),
            None,
        )?;

        let key = data::row_key(table.group, hkey_bytes);
        txn.lock(&key)?;
        txn.set(&key, raw.as_bytes())?;

        self.refresh_table_indexes(txn, table, hkey_bytes, old, new)?;

        let stored = RowAt { row: new, ..*target };
        self.maintain_group_indexes(
            txn,
            &stored,
            GroupIndexAction::Store,
            Some(&changed),
            None,
        )?;

        self.notify(|listener| listener.on_update_post(hkey, old, new))
    }

    // Only indexes whose declared columns changed are rewritten. Spatial
    // entries are always rewritten; comparing derived cells costs as much.
    fn refresh_table_indexes(
        &self,
        txn: &mut dyn Backend,
        table: &TableModel,
        hkey_bytes: &[u8],
        old: &Row,
        new: &Row,
    ) -> Result<(), InternalError> {
        let mut scratch = IndexRowBuilder::new();
        let (mut inserts, mut removes) = (0, 0);

        for index in &table.indexes {
            if !index.is_spatial() && old.same_at(new, &index.columns) {
                continue;
            }
            let max_cells = self.config.spatial_max_cells;
            let stale = table_index_entries(&mut scratch, index, old, hkey_bytes, max_cells)?;
            removes += remove_entries(txn, &stale)?;
            let fresh = table_index_entries(&mut scratch, index, new, hkey_bytes, max_cells)?;
            inserts += insert_entries(txn, &index.name, &fresh, hkey_bytes)?;
        }

        self.record(MetricsEvent::IndexDelta {
            table: table.ordinal,
            inserts,
            removes,
        });

        Ok(())
    }
}
