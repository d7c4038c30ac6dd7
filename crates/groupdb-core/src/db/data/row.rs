use crate::{
    db::key::encode_component,
    error::InternalError,
    model::{Ordinal, TableModel},
    serialize::{deserialize, serialize},
    value::Value,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// Default max serialized bytes for a single row.
pub const MAX_ROW_BYTES: usize = 4 * 1024 * 1024;

///
/// Row
///
/// A tuple of column values bound to a table. `version` names the row type
/// the values were produced against; rows written before an alter keep the
/// older version until rewritten.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub table: Ordinal,
    pub version: u32,
    pub values: Vec<Value>,
}

impl Row {
    /// Row of the table's current type.
    #[must_use]
    pub fn new(table: &TableModel, values: Vec<Value>) -> Self {
        Self {
            table: table.ordinal,
            version: table.version,
            values,
        }
    }

    #[must_use]
    pub const fn with_version(table: Ordinal, version: u32, values: Vec<Value>) -> Self {
        Self {
            table,
            version,
            values,
        }
    }

    #[must_use]
    pub fn value(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Values at `positions`; missing positions read as null.
    #[must_use]
    pub fn values_at(&self, positions: &[usize]) -> Vec<Value> {
        positions
            .iter()
            .map(|pos| self.values.get(*pos).cloned().unwrap_or_default())
            .collect()
    }

    /// Whether the two rows agree on every listed column, as key bytes.
    #[must_use]
    pub fn same_at(&self, other: &Self, positions: &[usize]) -> bool {
        positions
            .iter()
            .all(|pos| same_value(self.values.get(*pos), other.values.get(*pos)))
    }

    /// Positions whose value differs between the two rows.
    #[must_use]
    pub fn changed_columns(&self, other: &Self) -> Vec<usize> {
        let width = self.values.len().max(other.values.len());
        (0..width)
            .filter(|pos| !same_value(self.values.get(*pos), other.values.get(*pos)))
            .collect()
    }
}

// Equality as the index codec sees it: `-0.0` differs from `0.0` and NaN
// equals itself. Values the codec rejects (blobs) fall back to `==`.
fn same_value(left: Option<&Value>, right: Option<&Value>) -> bool {
    let (Some(left), Some(right)) = (left, right) else {
        return left == right;
    };
    let (mut left_bytes, mut right_bytes) = (Vec::new(), Vec::new());
    match (
        encode_component(&mut left_bytes, left),
        encode_component(&mut right_bytes, right),
    ) {
        (Ok(()), Ok(())) => left_bytes == right_bytes,
        _ => left == right,
    }
}

///
/// RawRowError
///

#[derive(Debug, ThisError)]
pub(crate) enum RawRowError {
    #[error("row exceeds max size: {len} bytes (limit {limit})")]
    TooLarge { len: usize, limit: usize },
}

impl From<RawRowError> for InternalError {
    fn from(err: RawRowError) -> Self {
        Self::store_unsupported(err.to_string())
    }
}

// Payload stored under a row key; the table comes from the hkey leaf.
#[derive(Deserialize, Serialize)]
struct RowPayload {
    version: u32,
    values: Vec<Value>,
}

///
/// RawRow
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct RawRow(Vec<u8>);

impl RawRow {
    pub(crate) fn try_encode(row: &Row, limit: usize) -> Result<Self, InternalError> {
        let bytes = serialize(&RowPayload {
            version: row.version,
            values: row.values.clone(),
        })?;
        if bytes.len() > limit {
            return Err(RawRowError::TooLarge {
                len: bytes.len(),
                limit,
            }
            .into());
        }

        Ok(Self(bytes))
    }

    pub(crate) const fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub(crate) fn try_decode(&self, table: Ordinal, limit: usize) -> Result<Row, InternalError> {
        let payload: RowPayload = deserialize(&self.0, limit).map_err(|err| {
            InternalError::store_corruption(format!("row of table {table} failed to decode: {err}"))
        })?;

        Ok(Row::with_version(table, payload.version, payload.values))
    }
}

///
/// TESTS
///
