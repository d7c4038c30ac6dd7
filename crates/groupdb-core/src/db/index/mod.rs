//! Module: db::index
//! Responsibility: table-index and group-index entry keys and their upkeep.
//! Does not own: which rows are indexed or when (see `db::mutation`).
//! Boundary: entry keys are `prefix ++ index id ++ components [++ hkey]`;
//! entry values are the hkey bytes of the indexed row.

pub(crate) mod spatial;

use crate::{
    db::{
        backend::Backend,
        data::Row,
        key::{HKey, decode_component, encode_component, prefix_successor},
    },
    error::InternalError,
    model::{IndexId, IndexModel},
    value::Value,
};

/// Table-index entries.
pub(crate) const TABLE_INDEX_PREFIX: u8 = 0x20;

/// Group-index entries.
pub(crate) const GROUP_INDEX_PREFIX: u8 = 0x21;

///
/// IndexRowBuilder
///
/// Scratch buffer for composing index keys. Owned by one call; reset per key.
///

#[derive(Debug, Default)]
pub(crate) struct IndexRowBuilder {
    buf: Vec<u8>,
}

impl IndexRowBuilder {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn start(&mut self, prefix: u8, index: IndexId) {
        self.buf.clear();
        self.buf.push(prefix);
        self.buf.extend_from_slice(&index.0.to_be_bytes());
    }

    pub(crate) fn push_value(&mut self, value: &Value) -> Result<(), InternalError> {
        encode_component(&mut self.buf, value)?;
        Ok(())
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Finish the key: unique entries without nulls stand alone, every other
    /// entry is disambiguated by the row's hkey.
    pub(crate) fn finish(&mut self, unique: bool, values: &[Value], hkey_bytes: &[u8]) -> IndexEntry {
        let probe = unique && !values.iter().any(Value::is_null);
        if !probe {
            self.push_bytes(hkey_bytes);
        }

        IndexEntry {
            key: self.buf.clone(),
            probe,
            values: values.to_vec(),
        }
    }
}

///
/// IndexEntry
///
/// `probe` entries must be checked for an existing holder before insert.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct IndexEntry {
    pub(crate) key: Vec<u8>,
    pub(crate) probe: bool,
    pub(crate) values: Vec<Value>,
}

/// Entries a row contributes to one table index. Spatial indexes fan out to
/// one entry per occupied cell.
pub(crate) fn table_index_entries(
    scratch: &mut IndexRowBuilder,
    index: &IndexModel,
    row: &Row,
    hkey_bytes: &[u8],
    max_cells: usize,
) -> Result<Vec<IndexEntry>, InternalError> {
    if let Some(model) = &index.spatial {
        let mut entries = Vec::new();
        for z in spatial::z_values(model, row, max_cells) {
            scratch.start(TABLE_INDEX_PREFIX, index.id);
            scratch.push_bytes(&z.to_be_bytes());
            entries.push(scratch.finish(false, &[Value::Uint(z)], hkey_bytes));
        }
        return Ok(entries);
    }

    let values = row.values_at(&index.columns);
    scratch.start(TABLE_INDEX_PREFIX, index.id);
    for value in &values {
        scratch.push_value(value)?;
    }

    Ok(vec![scratch.finish(index.unique, &values, hkey_bytes)])
}

/// Insert entries pointing at `hkey_bytes`.
/// A probed key already held by a different row is a duplicate.
pub(crate) fn insert_entries(
    txn: &mut dyn Backend,
    index_name: &str,
    entries: &[IndexEntry],
    hkey_bytes: &[u8],
) -> Result<u64, InternalError> {
    let mut inserted = 0;
    for entry in entries {
        if entry.probe
            && let Some(holder) = txn.get(&entry.key)?
            && holder != hkey_bytes
        {
            return Err(InternalError::duplicate_key(
                index_name,
                format_components(&entry.values),
            ));
        }
        txn.set(&entry.key, hkey_bytes)?;
        inserted += 1;
    }

    Ok(inserted)
}

pub(crate) fn remove_entries(
    txn: &mut dyn Backend,
    entries: &[IndexEntry],
) -> Result<u64, InternalError> {
    for entry in entries {
        txn.clear(&entry.key)?;
    }

    Ok(entries.len() as u64)
}

///
/// IndexRow
///
/// One decoded index entry: its key components and the hkey it points at.
/// Spatial entries carry their z-value as a single `Uint` component.
///

#[derive(Clone, Debug, PartialEq)]
pub struct IndexRow {
    pub values: Vec<Value>,
    pub hkey: HKey,
}

/// Every entry of one index, in key order.
pub(crate) fn scan_index(
    txn: &dyn Backend,
    prefix: u8,
    index: IndexId,
    components: usize,
    spatial: bool,
) -> Result<Vec<IndexRow>, InternalError> {
    let mut low = vec![prefix];
    low.extend_from_slice(&index.0.to_be_bytes());
    let high = prefix_successor(&low);

    txn.scan(&low, high.as_deref())?
        .into_iter()
        .map(|(key, value)| {
            let body = &key[low.len()..];
            let values = if spatial {
                let z: [u8; 8] = body
                    .get(..8)
                    .and_then(|raw| raw.try_into().ok())
                    .ok_or_else(|| {
                        InternalError::index_corruption(format!("index {index}: short z-value"))
                    })?;
                vec![Value::Uint(u64::from_be_bytes(z))]
            } else {
                let mut pos = 0;
                let mut values = Vec::with_capacity(components);
                for _ in 0..components {
                    let value = decode_component(body, &mut pos).map_err(|err| {
                        InternalError::index_corruption(format!("index {index}: {err}"))
                    })?;
                    values.push(value);
                }
                values
            };

            Ok(IndexRow {
                values,
                hkey: HKey::try_from_bytes(&value)?,
            })
        })
        .collect()
}

/// Human-readable key tuple for diagnostics.
#[must_use]
pub(crate) fn format_components(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}

///
/// TESTS
///
