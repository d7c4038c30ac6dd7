//! Module: db::data
//! Responsibility: physical row storage under hkey-ordered keys.
//! Does not own: index entries or hkey construction.
//! Boundary: rows are addressed by `(group, hkey)`; scans decode keys back
//! into hkeys and payloads back into rows.

mod key;
mod row;
mod status;

pub use row::{MAX_ROW_BYTES, Row};

pub(crate) use key::{group_prefix, row_key};
pub(crate) use row::RawRow;
pub(crate) use status::{decrement_row_count, increment_row_count, row_count};

use crate::{
    db::{
        backend::Backend,
        key::{HKey, descendant_bounds, prefix_successor},
    },
    error::InternalError,
    model::GroupId,
};

///
/// DataRow
///
/// One physically stored row together with the key it lives at.
///

#[derive(Clone, Debug)]
pub(crate) struct DataRow {
    pub(crate) hkey: HKey,
    pub(crate) hkey_bytes: Vec<u8>,
    pub(crate) row: Row,
}

/// Read the row stored at an encoded hkey.
pub(crate) fn read_row(
    txn: &dyn Backend,
    group: GroupId,
    hkey: &HKey,
    hkey_bytes: &[u8],
    limit: usize,
) -> Result<Option<Row>, InternalError> {
    let Some(table) = hkey.leaf_ordinal() else {
        return Ok(None);
    };

    txn.get(&row_key(group, hkey_bytes))?
        .map(|bytes| RawRow::from_bytes(bytes).try_decode(table, limit))
        .transpose()
}

/// Every row strictly below `hkey_bytes`, in hkey order.
pub(crate) fn scan_descendants(
    txn: &dyn Backend,
    group: GroupId,
    hkey_bytes: &[u8],
    limit: usize,
) -> Result<Vec<DataRow>, InternalError> {
    let (low, high) = descendant_bounds(hkey_bytes);
    scan_rows(txn, &row_key(group, &low), Some(&row_key(group, &high)), limit)
}

/// Every row of `group`, in hkey order.
pub(crate) fn scan_group(
    txn: &dyn Backend,
    group: GroupId,
    limit: usize,
) -> Result<Vec<DataRow>, InternalError> {
    let low = group_prefix(group);
    let high = prefix_successor(&low);
    scan_rows(txn, &low, high.as_deref(), limit)
}

fn scan_rows(
    txn: &dyn Backend,
    low: &[u8],
    high: Option<&[u8]>,
    limit: usize,
) -> Result<Vec<DataRow>, InternalError> {
    txn.scan(low, high)?
        .into_iter()
        .map(|(key, value)| {
            let hkey_bytes = key::hkey_bytes_of(&key)?.to_vec();
            let hkey = HKey::try_from_bytes(&hkey_bytes)?;
            let table = hkey.leaf_ordinal().ok_or_else(|| {
                InternalError::store_corruption("row stored under an empty hkey")
            })?;
            let row = RawRow::from_bytes(value).try_decode(table, limit)?;

            Ok(DataRow {
                hkey,
                hkey_bytes,
                row,
            })
        })
        .collect()
}
