//! HKey construction.
//!
//! A row's own segment comes from its primary-key columns. Every ancestor
//! segment is copied from the parent's primary-key index entry, whose value
//! is the parent's full hkey. A missing parent (or a null join column) makes
//! the row an orphan: every ancestor column is null.

use crate::{
    db::{
        backend::Backend,
        data::Row,
        index::{IndexRowBuilder, TABLE_INDEX_PREFIX},
        key::HKey,
        primary_index,
    },
    error::InternalError,
    model::{HKeyLayout, ParentJoin, Schema, TableModel},
    value::Value,
};

///
/// HKeyBuilder
///

pub(crate) struct HKeyBuilder<'a> {
    schema: &'a Schema,
}

impl<'a> HKeyBuilder<'a> {
    #[must_use]
    pub(crate) const fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub(crate) fn build(
        &self,
        txn: &dyn Backend,
        table: &TableModel,
        row: &Row,
    ) -> Result<HKey, InternalError> {
        let layout = table.hkey_layout();

        let mut hkey = match &table.parent {
            Some(join) => match self.parent_hkey(txn, join, row)? {
                Some(parent) => {
                    check_parent_layout(layout, &parent)?;
                    parent
                }
                None => orphan_ancestors(layout),
            },
            None => HKey::new(),
        };

        hkey.push_segment(table.ordinal);
        for value in row.values_at(&table.primary_key) {
            hkey.push_value(value);
        }

        Ok(hkey)
    }

    // Parent hkey through its primary-key index, keyed by our join columns.
    fn parent_hkey(
        &self,
        txn: &dyn Backend,
        join: &ParentJoin,
        row: &Row,
    ) -> Result<Option<HKey>, InternalError> {
        let values = row.values_at(&join.columns);
        if values.iter().any(Value::is_null) {
            return Ok(None);
        }

        let pk = primary_index(self.schema.table(join.parent)?)?;

        let mut scratch = IndexRowBuilder::new();
        scratch.start(TABLE_INDEX_PREFIX, pk.id);
        for value in &values {
            scratch.push_value(value)?;
        }
        let entry = scratch.finish(true, &values, &[]);

        txn.get(&entry.key)?
            .map(|bytes| HKey::try_from_bytes(&bytes).map_err(InternalError::from))
            .transpose()
    }
}

// Every ancestor segment present, every column null.
fn orphan_ancestors(layout: &HKeyLayout) -> HKey {
    let mut hkey = HKey::new();
    for segment in layout.ancestor_segments() {
        hkey.push_segment(segment.table);
        for _ in &segment.columns {
            hkey.push_value(Value::Null);
        }
    }

    hkey
}

// The parent's stored hkey must have exactly our ancestor shape.
fn check_parent_layout(layout: &HKeyLayout, parent: &HKey) -> Result<(), InternalError> {
    let expected = layout.ancestor_segments();
    if parent.depth() != expected.len() {
        return Err(InternalError::index_corruption(format!(
            "parent hkey {parent} has {} segments, layout expects {}",
            parent.depth(),
            expected.len()
        )));
    }

    for (segment, model) in parent.segments().iter().zip(expected) {
        if segment.ordinal != model.table || segment.values.len() != model.columns.len() {
            return Err(InternalError::index_corruption(format!(
                "parent hkey {parent} does not match table {} at its segment",
                model.table
            )));
        }
    }

    Ok(())
}

///
/// TESTS
///
