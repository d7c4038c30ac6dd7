//! Group-index maintenance.
//!
//! A group index covers a root-to-leaf path of tables in one group. It holds
//! one entry per leaf-table row whose whole ancestor chain along the path is
//! stored (inner-join branch semantics). The entry value is the leaf row's
//! hkey.
//!
//! STORE and DELETE for a row of any path table add or remove every entry
//! whose chain runs through that row. CASCADE removes only the entry of a
//! leaf-table row, so a branch scan that visits every row removes each entry
//! exactly once.

use crate::{
    db::{
        RowStore,
        backend::Backend,
        data::{self, DataRow, Row},
        hkey_builder::HKeyBuilder,
        index::{GROUP_INDEX_PREFIX, IndexEntry, IndexRowBuilder, insert_entries, remove_entries},
        key::{HKey, prefix_successor},
    },
    error::InternalError,
    model::{GroupIndexModel, IndexId, TableModel},
    obs::MetricsEvent,
};
use std::collections::BTreeMap;

///
/// GroupIndexAction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupIndexAction {
    Store,
    Delete,
    Cascade,
}

///
/// RowAt
///
/// A row together with the hkey it is (or is about to be) stored under.
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct RowAt<'r> {
    pub(crate) table: &'r TableModel,
    pub(crate) hkey: &'r HKey,
    pub(crate) hkey_bytes: &'r [u8],
    pub(crate) row: &'r Row,
}

// One complete branch: a row per path table, root first, plus the leaf hkey.
struct Branch {
    rows: Vec<Row>,
    leaf_hkey: Vec<u8>,
}

impl RowStore<'_> {
    // ─────────────────────────────────────────────
    // Public entry points
    // ─────────────────────────────────────────────

    /// STORE the group-index entries of a stored row, limited to `indexes`.
    pub fn write_index_rows(
        &self,
        txn: &mut dyn Backend,
        row: &Row,
        indexes: &[IndexId],
    ) -> Result<u64, InternalError> {
        self.index_rows(txn, row, indexes, GroupIndexAction::Store)
    }

    /// DELETE the group-index entries of a stored row, limited to `indexes`.
    pub fn delete_index_rows(
        &self,
        txn: &mut dyn Backend,
        row: &Row,
        indexes: &[IndexId],
    ) -> Result<u64, InternalError> {
        self.index_rows(txn, row, indexes, GroupIndexAction::Delete)
    }

    /// Clear a group index and rebuild it from every stored leaf-table row.
    /// Returns the number of entries written.
    pub fn rebuild_group_index(
        &self,
        txn: &mut dyn Backend,
        index: IndexId,
    ) -> Result<u64, InternalError> {
        let model = self.schema.group_index(index)?;
        let leaf = self.schema.table(model.leaf())?;

        let mut low = vec![GROUP_INDEX_PREFIX];
        low.extend_from_slice(&model.id.0.to_be_bytes());
        let high = prefix_successor(&low);
        let cleared = txn.clear_range(&low, high.as_deref())?;
        self.debug_log(format!(
            "rebuild group index '{}': cleared {cleared} entries",
            model.name
        ));

        let mut written = 0;
        for DataRow {
            hkey,
            hkey_bytes,
            row,
        } in data::scan_group(txn, model.group, self.config.max_row_bytes)?
        {
            if row.table != leaf.ordinal {
                continue;
            }
            let target = RowAt {
                table: leaf,
                hkey: &hkey,
                hkey_bytes: &hkey_bytes,
                row: &row,
            };
            written += self.maintain_group_indexes(
                txn,
                &target,
                GroupIndexAction::Store,
                None,
                Some(std::slice::from_ref(&index)),
            )?;
        }

        Ok(written)
    }

    fn index_rows(
        &self,
        txn: &mut dyn Backend,
        row: &Row,
        indexes: &[IndexId],
        action: GroupIndexAction,
    ) -> Result<u64, InternalError> {
        let table = self.schema.table(row.table)?;
        self.validate_row(table, row)?;

        let hkey = HKeyBuilder::new(self.schema).build(txn, table, row)?;
        let hkey_bytes = hkey.try_to_bytes()?;
        self.require_row(txn, table, &hkey, &hkey_bytes)?;

        let target = RowAt {
            table,
            hkey: &hkey,
            hkey_bytes: &hkey_bytes,
            row,
        };
        self.maintain_group_indexes(txn, &target, action, None, Some(indexes))
    }

    // ─────────────────────────────────────────────
    // Maintenance
    // ─────────────────────────────────────────────

    /// Apply `action` to every group index of the row's table, narrowed to
    /// those reading a `changed` column and to `only` when given. Returns the
    /// number of entries touched.
    pub(crate) fn maintain_group_indexes(
        &self,
        txn: &mut dyn Backend,
        target: &RowAt<'_>,
        action: GroupIndexAction,
        changed: Option<&[usize]>,
        only: Option<&[IndexId]>,
    ) -> Result<u64, InternalError> {
        let ordinal = target.table.ordinal;
        let candidates = self.schema.group_indexes_for(ordinal);
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut touched = 0;
        for index in candidates {
            if only.is_some_and(|ids| !ids.contains(&index.id)) {
                continue;
            }
            if let Some(changed) = changed
                && !index.columns_of(ordinal).any(|column| changed.contains(&column))
            {
                continue;
            }
            if action == GroupIndexAction::Cascade && index.leaf() != ordinal {
                continue;
            }

            let entries = self.group_index_entries(txn, index, target)?;
            let (mut inserts, mut removes) = (0, 0);
            for (entry, leaf_hkey) in &entries {
                match action {
                    GroupIndexAction::Store => {
                        let entry = std::slice::from_ref(entry);
                        inserts += insert_entries(txn, &index.name, entry, leaf_hkey)?;
                    }
                    GroupIndexAction::Delete | GroupIndexAction::Cascade => {
                        removes += remove_entries(txn, std::slice::from_ref(entry))?;
                    }
                }
            }

            if !entries.is_empty() {
                self.debug_log(format!(
                    "group index '{}': {action:?} {} entries for {}",
                    index.name,
                    entries.len(),
                    target.hkey
                ));
            }
            self.record(MetricsEvent::GroupIndexDelta {
                index: index.id,
                inserts,
                removes,
            });
            touched += inserts + removes;
        }

        Ok(touched)
    }

    // Entries of every complete branch of `index` that runs through the row.
    fn group_index_entries(
        &self,
        txn: &dyn Backend,
        index: &GroupIndexModel,
        target: &RowAt<'_>,
    ) -> Result<Vec<(IndexEntry, Vec<u8>)>, InternalError> {
        let Some(position) = index.path.iter().position(|t| *t == target.table.ordinal) else {
            return Ok(Vec::new());
        };
        let Some(branches) = self.branches_through(txn, index, position, target)? else {
            return Ok(Vec::new());
        };

        let mut scratch = IndexRowBuilder::new();
        let mut out = Vec::with_capacity(branches.len());
        for branch in branches {
            let mut values = Vec::with_capacity(index.columns.len());
            for column in &index.columns {
                let slot = index
                    .path
                    .iter()
                    .position(|t| *t == column.table)
                    .and_then(|slot| branch.rows.get(slot))
                    .ok_or_else(|| {
                        InternalError::index_invariant(format!(
                            "group index '{}' reads table {} off its path",
                            index.name, column.table
                        ))
                    })?;
                values.push(slot.values.get(column.column).cloned().unwrap_or_default());
            }

            scratch.start(GROUP_INDEX_PREFIX, index.id);
            for value in &values {
                scratch.push_value(value)?;
            }
            let entry = scratch.finish(index.unique, &values, &branch.leaf_hkey);
            out.push((entry, branch.leaf_hkey));
        }

        Ok(out)
    }

    // Complete branches containing the row at path slot `position`, or None
    // when an ancestor on the path is missing.
    fn branches_through(
        &self,
        txn: &dyn Backend,
        index: &GroupIndexModel,
        position: usize,
        target: &RowAt<'_>,
    ) -> Result<Option<Vec<Branch>>, InternalError> {
        let group = target.table.group;
        let limit = self.config.max_row_bytes;

        let mut chain = Vec::with_capacity(index.path.len());
        for ancestor in &index.path[..position] {
            let depth = self.schema.table(*ancestor)?.hkey_layout().depth();
            let prefix = target.hkey.prefix(depth);
            let prefix_bytes = prefix.try_to_bytes()?;
            match data::read_row(txn, group, &prefix, &prefix_bytes, limit)? {
                Some(row) => chain.push(row),
                None => return Ok(None),
            }
        }
        chain.push(target.row.clone());

        if position + 1 == index.path.len() {
            return Ok(Some(vec![Branch {
                rows: chain,
                leaf_hkey: target.hkey_bytes.to_vec(),
            }]));
        }

        let below = data::scan_descendants(txn, group, target.hkey_bytes, limit)?;
        let by_key: BTreeMap<&[u8], &Row> = below
            .iter()
            .map(|entry| (entry.hkey_bytes.as_slice(), &entry.row))
            .collect();

        // path tables strictly between the row and the leaf
        let mut middle = Vec::new();
        for table in &index.path[position + 1..index.path.len() - 1] {
            middle.push(self.schema.table(*table)?.hkey_layout().depth());
        }

        let mut branches = Vec::new();
        for leaf in below.iter().filter(|entry| entry.row.table == index.leaf()) {
            let mut rows = chain.clone();
            let mut complete = true;
            for depth in &middle {
                let bytes = leaf.hkey.prefix(*depth).try_to_bytes()?;
                match by_key.get(bytes.as_slice()) {
                    Some(row) => rows.push((*row).clone()),
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if complete {
                rows.push(leaf.row.clone());
                branches.push(Branch {
                    rows,
                    leaf_hkey: leaf.hkey_bytes.clone(),
                });
            }
        }

        Ok(Some(branches))
    }
}
