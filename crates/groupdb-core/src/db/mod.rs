//! Module: db
//! Responsibility: the row-storage engine. Rows of one group are clustered
//! under hierarchical keys; table and group indexes are kept consistent with
//! every row mutation inside the caller's transaction.
//! Does not own: commit, retry, durability, or schema changes.

pub mod backend;
pub mod data;
pub mod key;
pub mod listener;

pub(crate) mod index;

mod cascade;
mod group_index;
mod hkey_builder;
mod mutation;
mod propagate;

#[cfg(test)]
mod tests;

pub use group_index::GroupIndexAction;
pub use index::IndexRow;
pub use mutation::{MutationOptions, UpdatePath};
pub use propagate::HKeyMaintenanceScope;

use crate::{
    config::StoreConfig,
    db::{
        backend::Backend,
        data::Row,
        hkey_builder::HKeyBuilder,
        index::{GROUP_INDEX_PREFIX, IndexRowBuilder, TABLE_INDEX_PREFIX},
        key::HKey,
        listener::RowListener,
    },
    error::InternalError,
    model::{IndexId, IndexModel, Ordinal, Schema, TableModel},
    obs::{MetricsEvent, MetricsSink},
    value::Value,
};

///
/// RowStore
///
/// Stateless mutation engine over one schema. Every operation runs inside
/// the transaction handle it is given and holds nothing between calls, so a
/// `RowStore` can be shared by any number of sequential transactions.
///
/// Backend and listener failures propagate unchanged. Nothing is retried or
/// rolled back here; a failed call leaves the transaction for its owner to
/// abort.
///

pub struct RowStore<'a> {
    schema: &'a Schema,
    config: StoreConfig,
    listeners: Vec<&'a dyn RowListener>,
    metrics: Option<&'a dyn MetricsSink>,
}

impl<'a> RowStore<'a> {
    #[must_use]
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            config: StoreConfig::default(),
            listeners: Vec::new(),
            metrics: None,
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a listener; listeners run in registration order.
    #[must_use]
    pub fn with_listener(mut self, listener: &'a dyn RowListener) -> Self {
        self.listeners.push(listener);
        self
    }

    #[must_use]
    pub const fn with_metrics(mut self, sink: &'a dyn MetricsSink) -> Self {
        self.metrics = Some(sink);
        self
    }

    #[must_use]
    pub const fn schema(&self) -> &'a Schema {
        self.schema
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ─────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────

    /// The hkey `row` would be stored under in the current state.
    pub fn hkey_for(&self, txn: &dyn Backend, row: &Row) -> Result<HKey, InternalError> {
        let table = self.schema.table(row.table)?;
        HKeyBuilder::new(self.schema).build(txn, table, row)
    }

    /// Point lookup through the table's primary-key index.
    pub fn read_row(
        &self,
        txn: &dyn Backend,
        table: Ordinal,
        primary_key: &[Value],
    ) -> Result<Option<(HKey, Row)>, InternalError> {
        let model = self.schema.table(table)?;
        if primary_key.len() != model.primary_key.len() || primary_key.iter().any(Value::is_null)
        {
            return Ok(None);
        }
        let pk = primary_index(model)?;

        let mut scratch = IndexRowBuilder::new();
        scratch.start(TABLE_INDEX_PREFIX, pk.id);
        for value in primary_key {
            scratch.push_value(value)?;
        }
        let entry = scratch.finish(true, primary_key, &[]);

        let Some(hkey_bytes) = txn.get(&entry.key)? else {
            return Ok(None);
        };
        let hkey = HKey::try_from_bytes(&hkey_bytes)?;
        let row = data::read_row(
            txn,
            model.group,
            &hkey,
            &hkey_bytes,
            self.config.max_row_bytes,
        )?
        .ok_or_else(|| {
            InternalError::index_corruption(format!(
                "primary index of '{}' points at missing row {hkey}",
                model.name
            ))
        })?;

        Ok(Some((hkey, row)))
    }

    /// Physical read at an exact hkey.
    pub fn read_row_at(&self, txn: &dyn Backend, hkey: &HKey) -> Result<Option<Row>, InternalError> {
        let Some(ordinal) = hkey.leaf_ordinal() else {
            return Ok(None);
        };
        let table = self.schema.table(ordinal)?;
        let hkey_bytes = hkey.try_to_bytes()?;

        data::read_row(
            txn,
            table.group,
            hkey,
            &hkey_bytes,
            self.config.max_row_bytes,
        )
    }

    /// Every entry of a table or group index, in key order.
    pub fn scan_index(
        &self,
        txn: &dyn Backend,
        index: IndexId,
    ) -> Result<Vec<IndexRow>, InternalError> {
        if let Ok(model) = self.schema.group_index(index) {
            return index::scan_index(txn, GROUP_INDEX_PREFIX, index, model.columns.len(), false);
        }
        let Some((_, model)) = self.schema.table_index(index) else {
            return Err(InternalError::schema_invariant(format!(
                "unknown index {index}"
            )));
        };

        index::scan_index(
            txn,
            TABLE_INDEX_PREFIX,
            index,
            model.columns.len(),
            model.is_spatial(),
        )
    }

    pub fn row_count(&self, txn: &dyn Backend, table: Ordinal) -> Result<u64, InternalError> {
        self.schema.table(table)?;
        data::row_count(txn, table)
    }

    // ─────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.config.debug {
            tracing::debug!(target: "groupdb::store", "{}", s.as_ref());
        }
    }

    fn record(&self, event: MetricsEvent) {
        if let Some(sink) = self.metrics {
            sink.record(event);
        }
    }

    fn notify(
        &self,
        hook: impl Fn(&dyn RowListener) -> Result<(), InternalError>,
    ) -> Result<(), InternalError> {
        for listener in &self.listeners {
            hook(*listener)?;
        }

        Ok(())
    }
}

fn primary_index(table: &TableModel) -> Result<&IndexModel, InternalError> {
    table.primary_index().ok_or_else(|| {
        InternalError::schema_invariant(format!("table '{}' has no primary index", table.name))
    })
}
