//! Cascading delete.
//!
//! The branch (the row plus every stored descendant, root to leaf) is
//! materialized first. Group-index entries are removed for the whole branch
//! while it is still intact, then each row is unlinked. Propagation is
//! bypassed: nothing in the branch survives to be re-keyed.

use crate::{
    db::{
        GroupIndexAction, RowStore,
        backend::Backend,
        data::{self, DataRow},
        group_index::RowAt,
    },
    error::InternalError,
    obs::MetricsEvent,
};

impl RowStore<'_> {
    /// Delete `target` and its subtree. Returns the number of rows removed.
    pub(crate) fn cascade_delete(
        &self,
        txn: &mut dyn Backend,
        target: &RowAt<'_>,
    ) -> Result<u64, InternalError> {
        let mut branch = vec![DataRow {
            hkey: target.hkey.clone(),
            hkey_bytes: target.hkey_bytes.to_vec(),
            row: target.row.clone(),
        }];
        branch.extend(data::scan_descendants(
            txn,
            target.table.group,
            target.hkey_bytes,
            self.config.max_row_bytes,
        )?);

        // phase 1: group indexes, against the intact branch
        for entry in &branch {
            let table = self.schema.table(entry.row.table)?;
            let at = RowAt {
                table,
                hkey: &entry.hkey,
                hkey_bytes: &entry.hkey_bytes,
                row: &entry.row,
            };
            self.maintain_group_indexes(txn, &at, GroupIndexAction::Cascade, None, None)?;
        }

        // phase 2: rows and their table-index entries
        for entry in &branch {
            let table = self.schema.table(entry.row.table)?;
            self.unlink_row(txn, table, &entry.hkey, &entry.hkey_bytes, &entry.row)?;
            self.notify(|listener| listener.on_delete_post(&entry.hkey, &entry.row))?;
            self.record(MetricsEvent::RowDelete {
                table: table.ordinal,
            });
        }

        let removed = branch.len() as u64;
        tracing::trace!(
            target: "groupdb::store",
            table = %target.table.name,
            hkey = %target.hkey,
            rows = removed,
            "cascade delete"
        );
        self.record(MetricsEvent::Cascade {
            table: target.table.ordinal,
            rows_deleted: removed,
        });

        Ok(removed)
    }
}
