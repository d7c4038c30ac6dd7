use crate::{
    db::{backend::Backend, data::key::STATUS_PREFIX},
    error::InternalError,
    model::Ordinal,
};

fn status_key(table: Ordinal) -> [u8; 5] {
    let ordinal = table.0.to_be_bytes();
    [
        STATUS_PREFIX,
        ordinal[0],
        ordinal[1],
        ordinal[2],
        ordinal[3],
    ]
}

/// Current row count of `table`; absent counters read as zero.
pub(crate) fn row_count(txn: &dyn Backend, table: Ordinal) -> Result<u64, InternalError> {
    let Some(raw) = txn.get(&status_key(table))? else {
        return Ok(0);
    };
    let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
        InternalError::store_corruption(format!(
            "row count of table {table} has {} bytes",
            raw.len()
        ))
    })?;

    Ok(u64::from_be_bytes(bytes))
}

pub(crate) fn increment_row_count(
    txn: &mut dyn Backend,
    table: Ordinal,
) -> Result<(), InternalError> {
    let count = row_count(txn, table)?.saturating_add(1);
    txn.set(&status_key(table), &count.to_be_bytes())
}

pub(crate) fn decrement_row_count(
    txn: &mut dyn Backend,
    table: Ordinal,
) -> Result<(), InternalError> {
    let count = row_count(txn, table)?.saturating_sub(1);
    txn.set(&status_key(table), &count.to_be_bytes())
}

///
/// TESTS
///
